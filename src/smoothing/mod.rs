pub mod backoff;
pub mod katz;
pub mod log_linear;

pub use self::backoff::{BackoffView, KatzLevel};
pub use self::katz::{normalize_katz, normalize_katz_nested, KatzOutcome, MIN_RESERVED_MASS};
pub use self::log_linear::{fit_smoother, LogLinearSmoother};
