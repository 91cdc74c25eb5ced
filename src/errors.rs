use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SmoothingError {
    #[error("log-linear fit needs at least 2 count buckets with support, got {0}")]
    InsufficientSupport(usize),
    #[error("non-finite or negative {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },
}

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("cannot smooth model: {0}")]
    Smoothing(#[from] SmoothingError),
    #[error("interpolation weights must satisfy 0 <= l1, 0 <= l2, l1 + l2 < 1, got ({0}, {1})")]
    InvalidLambdas(f64, f64),
    #[error("training collection contains no tokens")]
    EmptyTraining,
    #[error("{0} models are not estimated from counts")]
    NotEstimable(&'static str),
}

#[derive(Error, Debug, PartialEq)]
pub enum EvaluationError {
    #[error("evaluation collection contains no words")]
    EmptyCollection,
    #[error("n-best list for reference {0:?} has no hypotheses")]
    EmptyNBestList(String),
}

/// Fail when `value` is NaN, infinite or negative.
pub(crate) fn check_value(what: &'static str, value: f64) -> Result<f64, SmoothingError> {
    if value.is_finite() && value >= 0. {
        Ok(value)
    } else {
        Err(SmoothingError::InvalidValue { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(check_value("count", 2.5), Ok(2.5));
        assert_eq!(check_value("count", 0.), Ok(0.));
        assert!(check_value("count", -0.1).is_err());
        assert!(check_value("count", f64::NAN).is_err());
        assert!(check_value("count", f64::INFINITY).is_err());
    }
}
