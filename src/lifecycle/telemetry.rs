//! # Tracing setup
//!
//! Installs a compact `tracing-subscriber` formatter whose level comes from `RUST_LOG`.
//!
//! ```bash
//! # State changes only
//! RUST_LOG=info cargo run
//!
//! # Payloads, actor requests and candidate ranking
//! RUST_LOG=debug cargo run
//!
//! # One component
//! RUST_LOG=info,dispatch_engine::matching=debug cargo run
//! ```
//!
//! Actor logs carry `entity_type` and `shard` fields instead of a module target, so a
//! dispatch reads as one line per hop:
//!
//! ```text
//! INFO Created entity_type="Order" shard=3 id=order_1 size=1
//! INFO dispatch_with: Transitioned order_id=order_1 from=confirmed to=pickup_assigned version=2
//! INFO dispatch_with: Driver assigned order_id=order_1 driver_id=driver_7
//! ```

/// Installs the global subscriber. Call once, before the system starts.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type and shard fields identify the actor
        .compact()
        .init();
}
