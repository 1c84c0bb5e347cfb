//! # Mock Framework & Testing Guide
//!
//! The `MockClient<T>` type hands out a real `ResourceClient<T>` whose requests are answered
//! from a queue of expectations instead of an actor. It lets you script return values (and
//! failures) for unit tests of code that *calls* a resource, without spawning the resource.
//!
//! ## When to use Mocks vs Real Actors
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **Speed** | Instant (in-memory) | Fast (but involves tokio spawn) |
//! | **Determinism** | Scripted answers | Subject to scheduler |
//! | **State** | No real state (expectations) | Real state management |
//! | **Use Case** | Testing logic *around* the client | Testing the actor itself or full system |
//! | **Error Injection** | Easy (`return_err`) | Hard (requires specific state) |
//!
//! ## Testing Strategies
//!
//! 1. **Pure mock**: script a `MockClient` and drive the code that owns the client.
//! 2. **Single actor**: spawn one `ResourceActor` with a unit or in-memory context.
//! 3. **Actor with mocked dependencies**: spawn the actor under test and hand it
//!    clients from [`create_mock_client`], then answer its outgoing requests with
//!    [`expect_action`] and friends. See `tests/order_actor_test.rs` in the
//!    dispatch-engine crate.
//! 4. **Full system**: boot every actor and drive the public facade.
//!
//! ## Testing Failure Scenarios
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Account { id: u32 }
//! #[derive(Debug)] struct AccountCreate;
//! #[derive(Debug)] enum AccountAction { Balance }
//! #[derive(Debug, Clone, PartialEq, thiserror::Error)] #[error("account error")] struct AccountError;
//!
//! #[async_trait]
//! impl ActorEntity for Account {
//!     type Id = u32; type Create = AccountCreate; type Action = AccountAction;
//!     type ActionResult = i64; type Context = (); type Error = AccountError;
//!     fn from_create_params(id: u32, _: AccountCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     async fn handle_action(&mut self, _: AccountAction, _: &()) -> Result<i64, Self::Error> { Ok(0) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Account>::new();
//!     let client = mock.client();
//!
//!     // Simulate a downstream failure
//!     mock.expect_action(1).return_err(FrameworkError::ActorClosed);
//!
//!     let result = client.perform_action(1, AccountAction::Balance).await;
//!     assert!(matches!(result, Err(FrameworkError::ActorClosed)));
//!     mock.verify();
//! }
//! ```

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// One scripted answer, consumed in FIFO order.
enum Expectation<T: ActorEntity> {
    Create {
        response: Result<T, FrameworkError<T::Error>>,
    },
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError<T::Error>>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError<T::Error>>,
    },
    Select {
        response: Result<Vec<T>, FrameworkError<T::Error>>,
    },
}

fn lock<T: ActorEntity>(expectations: &Expectations<T>) -> MutexGuard<'_, VecDeque<Expectation<T>>> {
    // A panicking test thread must not hide the remaining expectations from verify().
    expectations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A mock client with expectation tracking for fluent testing.
///
/// Requests arriving in a different order than the expectations, or for a different ID,
/// make the background task panic, which surfaces as `ActorDropped` on the caller side.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations. Must be called inside a runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();

                match (request, expectation) {
                    (
                        ResourceRequest::Create { respond_to, .. },
                        Some(Expectation::Create { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Get { id, respond_to },
                        Some(Expectation::Get {
                            id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(id, expected, "get for an unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Action { id, respond_to, .. },
                        Some(Expectation::Action {
                            id: expected,
                            response,
                        }),
                    ) => {
                        assert_eq!(id, expected, "action for an unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Select { respond_to, .. },
                        Some(Expectation::Select { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => {
                        panic!("Unexpected request or expectation mismatch: {request:?}");
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T> {
        ExpectationBuilder::new(self.expectations.clone(), |response| Expectation::Create {
            response,
        })
    }

    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::Get { id, response }
        })
    }

    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::Action { id, response }
        })
    }

    pub fn expect_select(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        ExpectationBuilder::new(self.expectations.clone(), |response| Expectation::Select {
            response,
        })
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

/// Finishes an expectation with the value the mock should answer.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    expectations: Expectations<T>,
    build: Box<dyn FnOnce(Result<R, FrameworkError<T::Error>>) -> Expectation<T> + Send>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    fn new(
        expectations: Expectations<T>,
        build: impl FnOnce(Result<R, FrameworkError<T::Error>>) -> Expectation<T> + Send + 'static,
    ) -> Self {
        Self {
            expectations,
            build: Box::new(build),
        }
    }

    pub fn return_ok(self, value: R) {
        let expectation = (self.build)(Ok(value));
        lock(&self.expectations).push_back(expectation);
    }

    pub fn return_err(self, error: FrameworkError<T::Error>) {
        let expectation = (self.build)(Err(error));
        lock(&self.expectations).push_back(expectation);
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a client and the receiver its requests land on.
///
/// # Testing Strategy
/// When the code under test is itself an actor (e.g. the order actor calling the ledger),
/// hand it this client and play the dependency by hand: receive each request, assert on
/// it, and answer through its `respond_to` sender. Delays and failures are then
/// deterministic.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Waits for the next request and returns it if it is a Create.
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Create, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create {
            id,
            params,
            respond_to,
        }) => Some((id, params, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is a Get.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is an Action.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ActorEntity;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Courier {
        id: u32,
        zone: String,
    }

    #[derive(Debug)]
    struct CourierCreate {
        zone: String,
    }

    #[derive(Debug)]
    enum CourierAction {
        Ping,
    }

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    #[error("Courier error")]
    struct CourierError;

    #[async_trait]
    impl ActorEntity for Courier {
        type Id = u32;
        type Create = CourierCreate;
        type Action = CourierAction;
        type ActionResult = u32;
        type Context = ();
        type Error = CourierError;

        fn from_create_params(id: u32, params: CourierCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                zone: params.zone,
            })
        }

        async fn handle_action(
            &mut self,
            _action: CourierAction,
            _ctx: &Self::Context,
        ) -> Result<u32, Self::Error> {
            Ok(self.id)
        }
    }

    fn courier(id: u32, zone: &str) -> Courier {
        Courier {
            id,
            zone: zone.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_client_channel_helpers() {
        let (client, mut receiver) = create_mock_client::<Courier>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(
                    4,
                    CourierCreate {
                        zone: "north".to_string(),
                    },
                )
                .await
        });

        let (id, payload, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(id, 4);
        assert_eq!(payload.zone, "north");
        responder.send(Ok(courier(4, "north"))).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(courier(4, "north")));
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<Courier>::new();

        mock.expect_get(1).return_ok(Some(courier(1, "south")));
        mock.expect_action(1)
            .return_err(FrameworkError::Entity(CourierError));
        mock.expect_select()
            .return_ok(vec![courier(1, "south"), courier(2, "south")]);

        let client = mock.client();

        let fetched = client.get(1).await.unwrap();
        assert_eq!(fetched.unwrap().zone, "south");

        let failed = client.perform_action(1, CourierAction::Ping).await;
        assert_eq!(failed, Err(FrameworkError::Entity(CourierError)));

        let all = client.select(|c| c.zone == "south").await.unwrap();
        assert_eq!(all.len(), 2);

        mock.verify();
    }

    #[tokio::test]
    async fn test_mismatched_request_drops_response() {
        let mut mock = MockClient::<Courier>::new();
        mock.expect_get(1).return_ok(None);

        let result = mock.client().perform_action(1, CourierAction::Ping).await;
        assert_eq!(result, Err(FrameworkError::ActorDropped));
    }
}
