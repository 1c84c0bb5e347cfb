//! # Ledger Client
//!
//! Provides a high‑level API for the Ledger account actors.
use crate::ledger::{LedgerAction, LedgerActionResult, LedgerError};
use crate::model::{Account, AccountKey, AccountType, EntryKind, LedgerEntry, OrderId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Client for the Ledger.
#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<Account>,
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<Account>) -> Self {
        Self { inner }
    }

    /// Appends an entry of `kind` for a positive `amount`.
    ///
    /// Debits and withdrawals fail with `InsufficientBalance` rather than overdraw.
    #[instrument(skip(self))]
    pub async fn post(
        &self,
        account: AccountKey,
        amount: Decimal,
        kind: EntryKind,
        order_id: Option<OrderId>,
        deadline: Instant,
    ) -> Result<LedgerEntry, LedgerError> {
        debug!("Sending request");
        let action = LedgerAction::Post {
            kind,
            amount,
            order_id,
            deadline,
        };
        match self.inner.perform_action(account, action).await {
            Ok(LedgerActionResult::Post(entry)) => Ok(entry),
            Ok(_) => unreachable!("Post action must return Post result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn balance_of(
        &self,
        account_type: AccountType,
        account_id: u32,
    ) -> Result<Decimal, LedgerError> {
        debug!("Sending request");
        let account = AccountKey::new(account_type, account_id);
        match self.inner.perform_action(account, LedgerAction::Balance).await {
            Ok(LedgerActionResult::Balance(balance)) => Ok(balance),
            Ok(_) => unreachable!("Balance action must return Balance result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// The entry posted to `account` for `(order_id, kind)`, if one was.
    ///
    /// Answered by the account's actor, so a post for the same account sent earlier
    /// has been applied or rejected by the time this returns.
    #[instrument(skip(self))]
    pub async fn posting(
        &self,
        account: AccountKey,
        order_id: OrderId,
        kind: EntryKind,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        debug!("Sending request");
        let action = LedgerAction::Posting { order_id, kind };
        match self.inner.perform_action(account, action).await {
            Ok(LedgerActionResult::Posting(entry)) => Ok(entry),
            Ok(_) => unreachable!("Posting action must return Posting result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// The account's entries, oldest first.
    #[instrument(skip(self))]
    pub async fn entries(&self, account: AccountKey) -> Result<Vec<LedgerEntry>, LedgerError> {
        debug!("Sending request");
        match self.inner.perform_action(account, LedgerAction::Entries).await {
            Ok(LedgerActionResult::Entries(entries)) => Ok(entries),
            Ok(_) => unreachable!("Entries action must return Entries result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }
}

#[async_trait]
impl ActorClient<Account> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ResourceClient<Account> {
        &self.inner
    }

    fn map_error(e: FrameworkError<LedgerError>) -> Self::Error {
        match e {
            FrameworkError::Entity(e) => e,
            other => LedgerError::ActorCommunicationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_framework::mock::{create_mock_client, expect_action};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[tokio::test]
    async fn test_post_forwards_magnitude_and_tag() {
        let (inner, mut receiver) = create_mock_client::<Account>(10);
        let ledger = LedgerClient::new(inner);
        let earnings = AccountKey::new(AccountType::DriverEarnings, 2);

        let deadline = Instant::now() + Duration::from_secs(1);
        let post_task = tokio::spawn(async move {
            ledger
                .post(earnings, dec!(4.50), EntryKind::Credit, Some(OrderId(6)), deadline)
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, earnings);
        match action {
            LedgerAction::Post {
                kind,
                amount,
                order_id,
                ..
            } => {
                assert_eq!(kind, EntryKind::Credit);
                assert_eq!(amount, dec!(4.50));
                assert_eq!(order_id, Some(OrderId(6)));
            }
            other => panic!("Expected Post action, got {other:?}"),
        }
        responder
            .send(Err(FrameworkError::Entity(LedgerError::Timeout(earnings))))
            .unwrap();

        let result = post_task.await.unwrap();
        assert_eq!(result, Err(LedgerError::Timeout(earnings)));
        assert!(result.unwrap_err().class().is_retryable());
    }

    #[tokio::test]
    async fn test_closed_actor_is_infrastructure_error() {
        let (inner, receiver) = create_mock_client::<Account>(1);
        drop(receiver);
        let ledger = LedgerClient::new(inner);

        let result = ledger.balance_of(AccountType::UserWallet, 1).await;
        assert!(matches!(
            result,
            Err(LedgerError::ActorCommunicationError(_))
        ));
    }
}
