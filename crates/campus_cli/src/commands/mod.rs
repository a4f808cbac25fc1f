//! CLI command implementations.

pub mod load;
pub mod login;
pub mod notify;
pub mod serve;
pub mod write;
