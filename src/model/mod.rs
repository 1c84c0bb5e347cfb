//! Pure data structures shared by the actors, clients and storage collaborators.

pub mod caller;
pub mod driver;
pub mod ledger;
pub mod order;

pub use caller::*;
pub use driver::*;
pub use ledger::*;
pub use order::*;
