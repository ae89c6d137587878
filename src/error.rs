use thiserror::Error;

/// Result type used across the optimizer.
///
/// Errors are carried as [`anyhow::Error`] so that callers can attach context while rules and
/// drivers propagate them. Typed failures are raised as [`OptError`] and can be recovered with
/// `err.downcast_ref::<OptError>()`.
pub type OptResult<T> = anyhow::Result<T>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptError {
    /// Structural precondition of an operator violated at construction time.
    #[error("Malformed plan: {0}")]
    MalformedPlan(String),
    /// A rule was handed operators its pattern should have excluded.
    #[error("Invalid rule binding: {0}")]
    InvalidRule(String),
}

impl OptError {
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        OptError::MalformedPlan(msg.into())
    }
}
