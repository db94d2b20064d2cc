pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod projection;
pub mod scale;
pub mod traffic;

pub use error::{Error, Result};
