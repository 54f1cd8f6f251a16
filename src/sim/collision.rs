//! Collision detection between the actor and the field
//!
//! Everything is axis-aligned: the actor box against obstacle boxes, and the
//! actor box against the top and bottom of the field.

use super::rect::Rect;
use super::state::ObstaclePair;

/// Which half of an obstacle pair was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairHalf {
    Top,
    Bottom,
}

/// Strict AABB overlap; touching edges do not count
///
/// Symmetric: `overlaps(a, b) == overlaps(b, a)`.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// True if the actor box has left `[0, field_height - actor.height]` vertically
#[inline]
pub fn out_of_bounds(actor: &Rect, field_height: f32) -> bool {
    actor.top() < 0.0 || actor.top() > field_height - actor.height()
}

/// First obstacle the actor overlaps, in queue order (top before bottom)
pub fn first_hit<'a>(
    actor: &Rect,
    pairs: impl IntoIterator<Item = &'a ObstaclePair>,
) -> Option<(u32, PairHalf)> {
    pairs.into_iter().find_map(|pair| {
        if overlaps(actor, &pair.top()) {
            Some((pair.id, PairHalf::Top))
        } else if overlaps(actor, &pair.bottom()) {
            Some((pair.id, PairHalf::Bottom))
        } else {
            None
        }
    })
}
