use serde::Serialize;
use thiserror::Error;

/// Failures of the alignment engine.
///
/// These are reported per trace: a batch keeps aligning the other traces when one of them fails.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum AlignmentError {
    /// The net or its markings are not structurally well-formed; detected before any search starts.
    #[error("malformed model: {0}")]
    MalformedModel(String),

    /// The search exhausted its frontier: the final marking cannot be reached from the initial marking.
    #[error("no alignment found: the final marking is not reachable")]
    NoAlignmentFound,

    /// The search hit its deadline.
    /// A configured cost exceeds `MAX_COST`, or the cost of a path does not fit.
    #[error("cost out of range: {0}")]
    CostOutOfRange(String),

    #[error("timeout{}", .lower_bound.map(|bound| format!(" (the optimal cost is at least {})", bound)).unwrap_or_default())]
    Timeout { lower_bound: Option<usize> },
}

pub type AlignmentResult<T> = Result<T, AlignmentError>;

#[cfg(test)]
mod tests {
    use super::AlignmentError;

    #[test]
    fn error_messages() {
        assert_eq!(
            AlignmentError::Timeout {
                lower_bound: Some(3)
            }
            .to_string(),
            "timeout (the optimal cost is at least 3)"
        );
        assert_eq!(
            AlignmentError::Timeout { lower_bound: None }.to_string(),
            "timeout"
        );
        assert_eq!(
            AlignmentError::CostOutOfRange("x".to_string()).to_string(),
            "cost out of range: x"
        );
        assert!(
            AlignmentError::MalformedModel("x".to_string())
                .to_string()
                .contains("x")
        );
    }
}
