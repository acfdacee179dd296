//! Reading aggregation helpers.
//!
//! Small pure functions over the readings of flooded reports.

use crate::storage::models::ImpactCategory;

/// Rounding error allowed in a spread, in units of `f64::EPSILON` times the
/// largest magnitude involved. Covers readings whose decimal spread equals
/// the limit (0.5 and 0.8 against 0.3) and nothing wider.
pub const SPREAD_ULPS: f64 = 4.0;

/// Smallest and largest reading. `None` when there are none.
pub fn depth_range(depths: &[f64]) -> Option<(f64, f64)> {
    let first = *depths.first()?;
    Some(
        depths
            .iter()
            .fold((first, first), |(lo, hi), &d| (lo.min(d), hi.max(d))),
    )
}

/// Max minus min of the readings. `None` when there are none.
pub fn depth_spread(depths: &[f64]) -> Option<f64> {
    depth_range(depths).map(|(min, max)| max - min)
}

/// Whether the readings agree within `max_spread` (inclusive).
pub fn depths_consistent(depths: &[f64], max_spread: f64) -> bool {
    match depth_range(depths) {
        Some((min, max)) => {
            let magnitude = min.abs().max(max.abs()).max(max_spread.abs());
            let tolerance = magnitude * SPREAD_ULPS * f64::EPSILON;
            max - min <= max_spread + tolerance
        }
        None => false,
    }
}

pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Per-category counts in [`ImpactCategory::ALL`] order.
pub fn category_counts(categories: &[ImpactCategory]) -> [(ImpactCategory, usize); 3] {
    ImpactCategory::ALL.map(|category| {
        let count = categories.iter().filter(|c| **c == category).count();
        (category, count)
    })
}

/// Most frequent category. Ties go to the most severe one.
pub fn modal_category(categories: &[ImpactCategory]) -> Option<(ImpactCategory, usize)> {
    category_counts(categories)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then(a.cmp(b)))
}

/// The category held by strictly more than half of the votes, if any.
pub fn majority_category(categories: &[ImpactCategory]) -> Option<ImpactCategory> {
    let (category, count) = modal_category(categories)?;
    if count * 2 > categories.len() {
        Some(category)
    } else {
        None
    }
}
