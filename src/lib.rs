// ABOUTME: Library root for banksmith - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deployer;
pub mod diagnostics;
pub mod error;
pub mod lock;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod types;
