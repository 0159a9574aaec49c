//! Autoclassify - failure line classification core
//!
//! Scores a CI failure line against autoclassifier matches and bug search
//! suggestions, ranks and hides candidates, and picks a default
//! classification. The pipeline is pure and synchronous; the surrounding
//! modules provide configuration, the per-line editing state and a CLI.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod patterns;
pub mod session;

pub use classify::{overlap, Classification, Classifier, LineOption, OptionType};
pub use error::{ClassifyError, Result};
