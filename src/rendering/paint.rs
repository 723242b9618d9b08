//! Display-list commands handed to the paint collaborator.
//!
//! Coordinates are in screen space: document `y` minus the scroll offset.

use serde::Serialize;

pub type Rgba = (u8, u8, u8, u8);

/// Default text colour.
pub const TEXT_COLOR: Rgba = (30, 30, 30, 255);
/// Default colour for `a` elements without their own `color`.
pub const LINK_COLOR: Rgba = (25, 100, 210, 255);
pub const CONTROL_BACKGROUND: Rgba = (240, 240, 240, 255);
pub const CONTROL_TEXT: Rgba = (50, 50, 50, 255);
pub const RULE_COLOR: Rgba = (128, 128, 128, 255);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    /// A run of words on one line sharing font size and colour
    Text {
        x: i32,
        y: i32,
        width: u32,
        text: String,
        font_size: f32,
        rgba: Rgba,
    },
    /// Replaced content; `handle` is `None` while the image is undecoded
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        handle: Option<u64>,
    },
    /// Track on the right edge with the thumb at `thumb_y`
    Scrollbar {
        x: i32,
        width: u32,
        track_height: u32,
        thumb_y: i32,
        thumb_height: u32,
    },
}

impl PaintCommand {
    /// Screen-space top edge.
    pub fn y(&self) -> i32 {
        match self {
            PaintCommand::SolidRect { y, .. }
            | PaintCommand::Text { y, .. }
            | PaintCommand::Image { y, .. } => *y,
            PaintCommand::Scrollbar { .. } => 0,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            PaintCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

pub(crate) fn rgba(c: [u8; 4]) -> Rgba {
    (c[0], c[1], c[2], c[3])
}
