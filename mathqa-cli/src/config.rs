//! Configuration module
//!
//! Handles CLI configuration including the backend URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the evaluation backend
    pub backend_url: String,
}
