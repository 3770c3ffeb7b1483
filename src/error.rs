use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The company record lacks the identity fields needed to evaluate it.
    #[error("Input validation error: {0}")]
    InputValidation(String),

    #[error("{dimension} evaluation failed: {message}")]
    Evaluator { dimension: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvaluationError {
    pub fn evaluator(dimension: &str, err: impl std::fmt::Display) -> Self {
        EvaluationError::Evaluator {
            dimension: dimension.to_string(),
            message: err.to_string(),
        }
    }
}
