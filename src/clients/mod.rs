//! Type-safe wrappers around [`ResourceClient`](actor_framework::ResourceClient).

pub mod geo_client;
pub mod ledger_client;
pub mod order_client;

pub use geo_client::*;
pub use ledger_client::*;
pub use order_client::*;
