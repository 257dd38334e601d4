use thiserror::Error;

/// Errors raised by feature construction.
///
/// Out-of-range category indices are deliberately not part of this taxonomy:
/// validating every index on the forward path would dominate the cost of the
/// lookup itself, so bounds are the caller's responsibility (debug builds
/// assert inside the gather).
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Invalid construction parameters or inputs inconsistent with the
    /// configured feature lists.
    #[error("configuration error: {0}")]
    Config(String),

    /// A supplied tensor does not match the documented shape contract for
    /// its feature group.
    #[error("shape error: {0}")]
    Shape(String),
}
