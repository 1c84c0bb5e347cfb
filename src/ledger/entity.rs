//! Entity trait implementation for [`Account`].
//!
//! Accounts exist implicitly with a zero balance. The first action on an account a
//! shard has not seen rebuilds its projection from the entry log (`on_missing`), and
//! any storage failure or timeout evicts the projection so the next action rebuilds
//! it again.

use super::{LedgerAction, LedgerActionResult, LedgerContext, LedgerError};
use crate::model::{Account, AccountKey, NewLedgerEntry};
use crate::storage::StorageError;
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

#[async_trait]
impl ActorEntity for Account {
    type Id = AccountKey;
    type Create = ();
    type Action = LedgerAction;
    type ActionResult = LedgerActionResult;
    type Context = LedgerContext;
    type Error = LedgerError;

    fn from_create_params(key: AccountKey, _params: ()) -> Result<Self, Self::Error> {
        Ok(Account::empty(key))
    }

    async fn on_missing(
        key: &AccountKey,
        action: &LedgerAction,
        ctx: &LedgerContext,
    ) -> Result<Option<Self>, Self::Error> {
        let deadline = match action {
            LedgerAction::Post { deadline, .. } => *deadline,
            _ => ctx.deadline(),
        };
        let key = *key;
        let load = async {
            let balance = ctx.store.sum_entries_for_account(key).await?;
            let entries = ctx.store.entries_for_account(key).await?;
            Ok::<_, StorageError>((balance, entries))
        };
        let (balance, entries) = timeout_at(deadline, load)
            .await
            .map_err(|_| LedgerError::Timeout(key))??;

        debug!(account = %key, %balance, entries = entries.len(), "Projection rebuilt");
        Ok(Some(Account::from_entries(key, balance, entries)))
    }

    async fn handle_action(
        &mut self,
        action: LedgerAction,
        ctx: &LedgerContext,
    ) -> Result<LedgerActionResult, Self::Error> {
        match action {
            LedgerAction::Post {
                kind,
                amount,
                order_id,
                deadline,
            } => {
                if amount <= Decimal::ZERO {
                    return Err(LedgerError::InvalidAmount(amount));
                }
                if let Some(order_id) = order_id {
                    if let Some(existing) = self.order_postings.get(&(order_id, kind)) {
                        debug!(account = %self.key, %order_id, ?kind, "Duplicate post ignored");
                        return Ok(LedgerActionResult::Post(existing.clone()));
                    }
                }

                let signed = kind.signed(amount);
                if kind.is_outflow() && self.balance + signed < Decimal::ZERO {
                    return Err(LedgerError::InsufficientBalance {
                        account: self.key,
                        balance: self.balance,
                        requested: amount,
                    });
                }
                if Instant::now() >= deadline {
                    return Err(LedgerError::Timeout(self.key));
                }

                let new_entry = NewLedgerEntry {
                    account: self.key,
                    order_id,
                    amount: signed,
                    kind,
                    created_at: Utc::now(),
                };
                let entry = match timeout_at(deadline, ctx.store.append_entry(new_entry)).await {
                    Err(_) => return Err(LedgerError::Timeout(self.key)),
                    Ok(Err(StorageError::InsufficientBalance {
                        account,
                        balance,
                        requested,
                    })) => {
                        return Err(LedgerError::InsufficientBalance {
                            account,
                            balance,
                            requested,
                        })
                    }
                    Ok(result) => result?,
                };

                self.balance += entry.amount;
                if let Some(order_id) = entry.order_id {
                    self.order_postings
                        .insert((order_id, entry.kind), entry.clone());
                }
                info!(account = %self.key, entry_id = %entry.id, amount = %entry.amount, balance = %self.balance, "Posted");
                Ok(LedgerActionResult::Post(entry))
            }
            LedgerAction::Balance => Ok(LedgerActionResult::Balance(self.balance)),
            LedgerAction::Posting { order_id, kind } => Ok(LedgerActionResult::Posting(
                self.order_postings.get(&(order_id, kind)).cloned(),
            )),
            LedgerAction::Entries => {
                let entries = timeout_at(ctx.deadline(), ctx.store.entries_for_account(self.key))
                    .await
                    .map_err(|_| LedgerError::Timeout(self.key))??;
                Ok(LedgerActionResult::Entries(entries))
            }
        }
    }

    fn invalidates_state(error: &LedgerError) -> bool {
        matches!(error, LedgerError::Timeout(_) | LedgerError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountType, EntryKind, OrderId};
    use crate::storage::{LedgerStore, MemoryStorage};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn context() -> (LedgerContext, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let ctx = LedgerContext::new(storage.clone(), Duration::from_secs(1));
        (ctx, storage)
    }

    fn post(kind: EntryKind, amount: Decimal, order_id: Option<OrderId>) -> LedgerAction {
        LedgerAction::Post {
            kind,
            amount,
            order_id,
            deadline: Instant::now() + Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_debit_cannot_overdraw() {
        let (ctx, storage) = context();
        let wallet = AccountKey::new(AccountType::UserWallet, 1);
        let mut account = Account::empty(wallet);

        account
            .handle_action(post(EntryKind::Topup, dec!(30000), None), &ctx)
            .await
            .unwrap();
        let result = account
            .handle_action(post(EntryKind::Debit, dec!(50000), None), &ctx)
            .await;
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                account: wallet,
                balance: dec!(30000),
                requested: dec!(50000)
            })
        );
        assert_eq!(account.balance, dec!(30000));
        assert_eq!(storage.entries_for_account(wallet).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_tagged_post_is_idempotent() {
        let (ctx, storage) = context();
        let earnings = AccountKey::new(AccountType::DriverEarnings, 3);
        let mut account = Account::empty(earnings);

        let first = account
            .handle_action(post(EntryKind::Credit, dec!(4.50), Some(OrderId(9))), &ctx)
            .await
            .unwrap();
        let second = account
            .handle_action(post(EntryKind::Credit, dec!(4.50), Some(OrderId(9))), &ctx)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(account.balance, dec!(4.50));
        assert_eq!(storage.sum_entries_for_account(earnings).await.unwrap(), dec!(4.50));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let (ctx, _) = context();
        let mut account = Account::empty(AccountKey::new(AccountType::UserWallet, 1));
        for amount in [dec!(0), dec!(-5)] {
            let result = account
                .handle_action(post(EntryKind::Topup, amount, None), &ctx)
                .await;
            assert_eq!(result, Err(LedgerError::InvalidAmount(amount)));
        }
    }

    #[tokio::test]
    async fn test_on_missing_rebuilds_from_log() {
        let (ctx, _) = context();
        let earnings = AccountKey::new(AccountType::DriverEarnings, 5);
        let mut account = Account::empty(earnings);
        account
            .handle_action(post(EntryKind::Credit, dec!(7), Some(OrderId(1))), &ctx)
            .await
            .unwrap();
        account
            .handle_action(post(EntryKind::Withdrawal, dec!(2), None), &ctx)
            .await
            .unwrap();

        let mut rebuilt = Account::on_missing(&earnings, &LedgerAction::Balance, &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rebuilt, account);

        let lookup = |order_id| LedgerAction::Posting {
            order_id,
            kind: EntryKind::Credit,
        };
        let found = rebuilt.handle_action(lookup(OrderId(1)), &ctx).await.unwrap();
        match found {
            LedgerActionResult::Posting(Some(entry)) => assert_eq!(entry.amount, dec!(7)),
            other => panic!("expected the order's credit, got {other:?}"),
        }
        assert_eq!(
            rebuilt.handle_action(lookup(OrderId(2)), &ctx).await.unwrap(),
            LedgerActionResult::Posting(None)
        );
    }
}
