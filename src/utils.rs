use std::cmp::Ordering;

use crate::config::constant::TOLERANCE;

/// Standardised form of an external id: trimmed and lower-cased.
pub fn standardise(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Compares floats, ordering NaN after everything else.
pub fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a, b) {
        (x, y) if x.is_nan() && y.is_nan() => Ordering::Equal,
        (x, _) if x.is_nan() => Ordering::Greater,
        (_, y) if y.is_nan() => Ordering::Less,
        (_, _) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// True when `a` and `b` differ by no more than the absolute or relative tolerance.
pub fn approx_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= TOLERANCE || diff <= TOLERANCE * a.abs().max(b.abs())
}

pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
