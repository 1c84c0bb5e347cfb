use crate::model::{EntryKind, LedgerEntry, OrderId};
use rust_decimal::Decimal;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum LedgerAction {
    /// Appends one entry of `kind`. A post tagged with an order that already has an
    /// entry of the same kind returns that entry instead.
    Post {
        kind: EntryKind,
        amount: Decimal,
        order_id: Option<OrderId>,
        deadline: Instant,
    },
    Balance,
    /// The entry already posted for `(order_id, kind)`, if any.
    Posting { order_id: OrderId, kind: EntryKind },
    /// The account's entries, oldest first, read from the log.
    Entries,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerActionResult {
    Post(LedgerEntry),
    Balance(Decimal),
    Posting(Option<LedgerEntry>),
    Entries(Vec<LedgerEntry>),
}
