pub mod counter;
pub mod data_reader;
pub mod errors;
pub mod evaluator;
pub mod io;
pub mod lms;
pub mod nbest;
pub mod ngram_counts;
pub mod smoothing;
pub mod stat_utils;
pub mod tuning;
