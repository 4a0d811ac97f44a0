//! Error types shared by the analysis pipeline.

/// Failures raised while aggregating or balancing a block table.
///
/// None of these are retryable: each one means the input table or the
/// session configuration is malformed, so callers surface them immediately
/// instead of producing partial aggregates.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("column '{0}' not found in the table schema")]
    InvalidColumn(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("balance average is zero; percent deviation is undefined")]
    DivisionByZero,
}
