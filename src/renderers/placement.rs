//! Horizontal slots for lines that share vertical space with an image

use crate::models::Rect;

/// Where a line may be placed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSlot {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// Slot for a line whose top edge would be at `y`
///
/// When the line's band crosses the obstacle, the line takes the wider free
/// side (left on ties). If neither side reaches `min_span`, the line moves
/// below the obstacle and gets the full content width.
pub fn slot_for_band(
    content: &Rect,
    y: f32,
    line_height: f32,
    obstacle: Option<&Rect>,
    min_span: f32,
) -> LineSlot {
    let full = LineSlot { x: content.x, y, width: content.width };
    let Some(obstacle) = obstacle else {
        return full;
    };
    if !obstacle.overlaps_band(y, y + line_height)
        || obstacle.right() <= content.x
        || obstacle.x >= content.right()
    {
        return full;
    }

    let left = (obstacle.x - content.x).max(0.0);
    let right = (content.right() - obstacle.right()).max(0.0);
    let (x, width) = if left >= right {
        (content.x, left)
    } else {
        (obstacle.right(), right)
    };

    if width >= min_span {
        LineSlot { x, y, width }
    } else {
        LineSlot {
            x: content.x,
            y: obstacle.bottom().max(y),
            width: content.width,
        }
    }
}
