// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod app;
pub mod cli;
pub mod config;
pub mod feed;
pub mod logs;
pub mod protocol;
pub mod tui;
