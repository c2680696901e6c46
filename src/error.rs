//! Error types for the anofox-distcast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Hint appended to failures raised while evaluating a model's specials
/// against future data.
pub const MISSING_REGRESSOR_HINT: &str = "Unable to compute required variables from provided \
`future_data`. Does your model require extra variables to produce forecasts?";

/// Errors that can occur while producing forecasts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Neither a horizon nor future data could be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// Evaluating the model's specials against future data failed.
    #[error("{cause}\n{hint}")]
    SpecialsEvaluation {
        #[source]
        cause: Box<ForecastError>,
        hint: String,
    },

    /// The caller interrupted the computation.
    #[error("forecast cancelled by user interrupt")]
    Cancelled,

    /// More than one response variable carries a non-identity transformation.
    #[error(
        "unsupported transformation: {count} response variables are transformed, \
         back-transformation supports at most one"
    )]
    UnsupportedTransform { count: usize },

    /// A point forecast aggregator returned the wrong number of values.
    #[error("point forecast `{summary}` returned {got} values, expected {expected}")]
    Validation {
        summary: String,
        expected: usize,
        got: usize,
    },

    /// A cell of a model table failed.
    #[error("forecast failed for key `{key}` and model `{model}`: {source}")]
    Cell {
        key: String,
        model: String,
        #[source]
        source: Box<ForecastError>,
    },

    /// A variable required by the model is not available.
    #[error("object '{0}' not found")]
    MissingVariable(String),

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Frequency inference failed.
    #[error("could not infer frequency: {0}")]
    FrequencyInference(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    /// Wrap a failure raised during specials evaluation.
    ///
    /// Cancellation is passed through untouched.
    pub fn specials(cause: ForecastError) -> Self {
        match cause {
            ForecastError::Cancelled => ForecastError::Cancelled,
            cause => ForecastError::SpecialsEvaluation {
                cause: Box::new(cause),
                hint: MISSING_REGRESSOR_HINT.to_string(),
            },
        }
    }

    /// Attribute a failure to a (key, model) cell of a model table.
    pub fn in_cell(self, key: &str, model: &str) -> Self {
        match self {
            ForecastError::Cancelled => ForecastError::Cancelled,
            source => ForecastError::Cell {
                key: key.to_string(),
                model: model.to_string(),
                source: Box::new(source),
            },
        }
    }

    /// The innermost error, skipping cell attribution.
    pub fn root(&self) -> &ForecastError {
        match self {
            ForecastError::Cell { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), ForecastError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::Config("no horizon".to_string());
        assert_eq!(err.to_string(), "configuration error: no horizon");

        let err = ForecastError::UnsupportedTransform { count: 2 };
        assert!(err.to_string().contains("2 response variables"));

        let err = ForecastError::Validation {
            summary: "median".to_string(),
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "point forecast `median` returned 2 values, expected 3"
        );

        let err = ForecastError::MissingVariable("price".to_string());
        assert_eq!(err.to_string(), "object 'price' not found");
    }

    #[test]
    fn specials_error_keeps_cause_and_adds_hint() {
        let err = ForecastError::specials(ForecastError::MissingVariable("x".to_string()));
        let msg = err.to_string();
        assert!(msg.starts_with("object 'x' not found"));
        assert!(msg.contains("future_data"));
        assert!(matches!(err, ForecastError::SpecialsEvaluation { .. }));
    }

    #[test]
    fn cancellation_is_never_wrapped() {
        assert_eq!(
            ForecastError::specials(ForecastError::Cancelled),
            ForecastError::Cancelled
        );
        assert_eq!(
            ForecastError::Cancelled.in_cell("a", "naive"),
            ForecastError::Cancelled
        );
    }

    #[test]
    fn cell_errors_expose_root() {
        let err = ForecastError::EmptyData.in_cell("a", "naive");
        assert_eq!(err.root(), &ForecastError::EmptyData);
        assert!(err.to_string().contains("key `a`"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
