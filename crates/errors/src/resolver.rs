//! Weight resolver error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    #[error("resolver {operation} failed: {message}")]
    Failed { operation: String, message: String },

    #[error("resolver returned an invalid weight for {package}: {weight}")]
    InvalidWeight { package: String, weight: f64 },
}
