//! SVC library exports

pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod rebase;
pub mod render;
pub mod server;

pub use error::{Result, SvcError};
