pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod presenter;
pub mod seed;
pub mod store;
pub mod votes; // session vote ledgers and the toggle state machine

// Re-export commonly used items for tests / external users
pub use controller::Platform;
pub use error::{Error, Result};
pub use store::inmem::InMemStore;
