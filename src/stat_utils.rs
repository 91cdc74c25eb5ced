use std::f64::consts::LN_2;

/// Levenshtein distance between two token sequences, unit cost for
/// insertions, deletions and substitutions.
pub fn edit_distance<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> usize {
    // Single row of the DP table, indexed by hypothesis prefix length.
    let mut row: Vec<usize> = (0..=hypothesis.len()).collect();
    for (i, r) in reference.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, h) in hypothesis.iter().enumerate() {
            let substitution = diagonal + usize::from(r != h);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[hypothesis.len()]
}

pub fn ln_to_log2(ln: f64) -> f64 {
    ln / LN_2
}

/// `2^(-mean log2 p)` for a total of `log2_sum` over `n_symbols` symbols.
pub fn perplexity_from_log2(log2_sum: f64, n_symbols: f64) -> f64 {
    0.5f64.powf(log2_sum / n_symbols)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
