//! Environment-variable helpers for provider credentials.

use thiserror::Error;

/// An environment variable required by a provider is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVar(pub String);

/// Reads an environment variable, returning a structured error if it's
/// missing.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVar> {
    std::env::var(name).map_err(|_| MissingEnvVar(name.to_string()))
}
