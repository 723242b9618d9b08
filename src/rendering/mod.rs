//! Layout and the frame handed to the paint collaborator.

use serde::Serialize;

use crate::Viewport;

pub mod digest;
pub mod layout;
pub mod paint;

pub use layout::{FixedMetrics, LayoutConfig, LayoutEngine, TextMeasure};
pub use paint::PaintCommand;

/// Output of one render: the paint-pass display list plus scroll metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub viewport: Viewport,
    /// Scroll offset after clamping to the scrollable range
    pub scroll_y: i32,
    /// Document height learned by the measurement pass
    pub total_height: i32,
    pub display_list: Vec<PaintCommand>,
}

impl Frame {
    /// Largest meaningful scroll offset.
    pub fn max_scroll(&self) -> i32 {
        let height = i32::try_from(self.viewport.height).unwrap_or(i32::MAX);
        self.total_height.saturating_sub(height).max(0)
    }

    pub fn has_scrollbar(&self) -> bool {
        i64::from(self.total_height) > i64::from(self.viewport.height)
    }

    /// Visible text runs in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.display_list.iter().filter_map(PaintCommand::text)
    }
}
