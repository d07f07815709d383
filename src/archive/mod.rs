pub mod cache;
pub mod client;
pub mod error;
pub mod granule;
pub mod session;
