//! Local hp-refinement candidate generation
//!
//! A candidate is a small [Mesh1D] spanning exactly one parent element's
//! interval, proposing either a pure order change (p-refinement), a midpoint
//! split (h-refinement), or both at once.

use super::{Elem, Mesh1D};
use smallvec::SmallVec;

/// Upper bound on candidates per element; sets the stack allocation size of
/// the returned `SmallVec`
pub const MAX_CANDIDATES: usize = 10;

/// Generate the fixed set of local refinement candidates for one element
///
/// The set always contains the three no-split variants with orders
/// `order`, `order + 1` and `order + 2`, followed by the four midpoint-split
/// variants with order deltas `(0, 0)`, `(1, 0)`, `(0, 1)` and `(1, 1)` on
/// the two halves. Elements with `order > 1` additionally offer the
/// order-decreasing splits `(-1, 0)`, `(0, -1)` and `(-1, -1)`, which trade
/// local order for the extra breakpoint. The `order > 1` guard keeps the
/// decrease from producing a degenerate order-0 half when `order == 1`.
pub fn generate_candidates(elem: &Elem) -> SmallVec<[Mesh1D; MAX_CANDIDATES]> {
    let Elem { left, right, order } = *elem;
    let midpoint = elem.midpoint();

    let p_candidate =
        |delta: u8| Mesh1D::from_parts(vec![left, right], vec![order + delta]);
    let hp_candidate = |delta_left: i8, delta_right: i8| {
        Mesh1D::from_parts(
            vec![left, midpoint, right],
            vec![offset_order(order, delta_left), offset_order(order, delta_right)],
        )
    };

    let mut candidates: SmallVec<[Mesh1D; MAX_CANDIDATES]> = SmallVec::new();
    candidates.push(p_candidate(0));
    candidates.push(p_candidate(1));
    candidates.push(p_candidate(2));
    candidates.push(hp_candidate(0, 0));
    candidates.push(hp_candidate(1, 0));
    candidates.push(hp_candidate(0, 1));
    candidates.push(hp_candidate(1, 1));

    if order > 1 {
        candidates.push(hp_candidate(-1, 0));
        candidates.push(hp_candidate(0, -1));
        candidates.push(hp_candidate(-1, -1));
    }

    candidates
}

fn offset_order(order: u8, delta: i8) -> u8 {
    (order as i16 + delta as i16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(left: f64, right: f64, order: u8) -> Elem {
        Elem { left, right, order }
    }

    #[test]
    fn candidate_counts() {
        assert_eq!(generate_candidates(&parent(0.0, 1.0, 1)).len(), 7);
        assert_eq!(generate_candidates(&parent(0.0, 1.0, 2)).len(), 10);
        assert_eq!(generate_candidates(&parent(0.0, 1.0, 5)).len(), 10);
    }

    #[test]
    fn candidates_span_the_parent_interval() {
        for order in 1..=4 {
            for candidate in generate_candidates(&parent(-2.0, 6.0, order)) {
                let (left, right) = candidate.span();
                assert_eq!(left, -2.0);
                assert_eq!(right, 6.0);
            }
        }
    }

    #[test]
    fn no_split_variants_raise_the_order() {
        let candidates = generate_candidates(&parent(-2.0, 6.0, 3));
        assert_eq!(candidates[0].orders(), &[3]);
        assert_eq!(candidates[1].orders(), &[4]);
        assert_eq!(candidates[2].orders(), &[5]);
    }

    #[test]
    fn split_variants_cut_at_the_midpoint() {
        let candidates = generate_candidates(&parent(-2.0, 6.0, 3));
        for candidate in candidates[3..].iter() {
            assert_eq!(candidate.num_elems(), 2);
            assert_eq!(candidate.points()[1], 2.0);
        }
        assert_eq!(candidates[3].orders(), &[3, 3]);
        assert_eq!(candidates[4].orders(), &[4, 3]);
        assert_eq!(candidates[5].orders(), &[3, 4]);
        assert_eq!(candidates[6].orders(), &[4, 4]);
    }

    #[test]
    fn order_decreasing_splits_require_order_above_one() {
        let order_2 = generate_candidates(&parent(0.0, 1.0, 2));
        assert_eq!(order_2[7].orders(), &[1, 2]);
        assert_eq!(order_2[8].orders(), &[2, 1]);
        assert_eq!(order_2[9].orders(), &[1, 1]);

        // order 1 offers no decrease: a half with order 0 would be degenerate
        let order_1 = generate_candidates(&parent(0.0, 1.0, 1));
        assert!(order_1
            .iter()
            .all(|candidate| candidate.orders().iter().all(|&o| o >= 1)));
    }
}
