pub mod config;
pub mod descriptor;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod services;
pub mod ui;

pub use error::{ReleaseError, Result};
