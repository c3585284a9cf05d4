//! Tiered-setup classification.

use crate::types::IndicatorSnapshot;

/// True iff `short > medium > long`, both strictly.
///
/// A missing snapshot is a non-match. NaN never compares greater, so it
/// falls out as false as well.
pub fn classify(snapshot: Option<&IndicatorSnapshot>) -> bool {
    match snapshot {
        Some(s) => s.short > s.medium && s.medium > s.long,
        None => false,
    }
}
