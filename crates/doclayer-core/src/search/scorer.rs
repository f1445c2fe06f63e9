//! Token-overlap relevance scoring.
//!
//! ```text
//! score(Q, F) = |Q ∩ F| / |Q|
//! ```
//!
//! Where `Q` is the distinct query token set and `F` an entry fingerprint.
//! The score lies in `[0, 1]`, is zero for disjoint sets and never decreases
//! as more query tokens appear in the fingerprint. Fingerprint size does not
//! enter the formula, so long functions are not penalized.

use std::collections::BTreeSet;

/// Fraction of query tokens present in the fingerprint.
///
/// An empty query scores `0.0` against everything.
#[inline]
pub fn overlap_score(query: &BTreeSet<String>, fingerprint: &BTreeSet<String>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let shared = query.intersection(fingerprint).count();
    shared as f32 / query.len() as f32
}
