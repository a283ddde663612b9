pub mod auth;
pub mod backup;
pub mod breach;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod vault;
