pub mod crypto;
pub mod handlers;
pub mod store;
