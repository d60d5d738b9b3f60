//! Desktop admin client for importing product catalogues.
//!
//! The import page asks the backend for a signed upload destination, sends
//! the chosen file there and reports problems through toast notifications.

pub mod app;
pub mod config;
#[cfg(any(debug_assertions, test))]
pub mod mock;
pub mod notify;
pub mod query;
pub mod upload;
pub mod utils;
