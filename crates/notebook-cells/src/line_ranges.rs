//! Line-range set maintenance.
//!
//! The cell model and its consumers track sets of affected lines as sorted,
//! disjoint, maximal [`LineRange`] lists. [`merge_and_join_intersections`]
//! folds new ranges into such a list, coalescing ranges that overlap or touch.

use crate::cell::LineRange;

/// Merge `added` into `existing`, in place.
///
/// `existing` must be sorted by `first` and maximal (disjoint, non-adjacent).
/// `added` may be unsorted and may overlap itself or existing entries. After
/// the call `existing` is again sorted and maximal and covers the union of
/// both inputs; ranges that merely touch (`a.last + 1 == b.first`) are
/// coalesced as well.
pub fn merge_and_join_intersections(existing: &mut Vec<LineRange>, added: Vec<LineRange>) {
    if added.is_empty() {
        return;
    }

    existing.extend(added);
    existing.sort_by_key(|r| (r.first, r.last));

    let mut merged: Vec<LineRange> = Vec::with_capacity(existing.len());
    for range in existing.drain(..) {
        match merged.last_mut() {
            Some(last) if last.touches(&range) => {
                last.last = last.last.max(range.last);
            }
            _ => merged.push(range),
        }
    }

    *existing = merged;
}
