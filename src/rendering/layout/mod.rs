//! Layout Engine: a two-pass block/inline flow with floats and word wrap.
//!
//! [`LayoutEngine::layout`] first runs a measurement pass with drawing
//! suppressed to learn the document height, then an identical paint pass that
//! writes the authoritative geometry into every element and produces the
//! display list. All per-pass state lives in a [`LayoutContext`] dropped at
//! the end of the pass.

use log::debug;

use crate::dom::Document;
use crate::rendering::paint::PaintCommand;
use crate::rendering::Frame;
use crate::{Error, Result, Viewport};

mod context;
mod flow;

pub use context::{Bounds, FloatSide, FloatZone, LayoutContext, Pass};

use flow::Flow;

/// Smallest scrollbar thumb, in pixels.
const MIN_THUMB_HEIGHT: i32 = 20;

/// Bound on every resolved length, text metric and viewport extent, so
/// sums of a few of them stay inside `i32`.
const MAX_COORD: i32 = 1 << 24;

fn to_coord(value: u32) -> i32 {
    value.min(MAX_COORD as u32) as i32
}

fn clamp_coord(value: i32) -> i32 {
    value.clamp(-MAX_COORD, MAX_COORD)
}

/// Text metrics supplied by whoever owns the fonts.
pub trait TextMeasure: Send + Sync {
    /// Advance width of `text` set at `font_size` pixels.
    fn text_width(&self, text: &str, font_size: f32) -> i32;

    /// Height of one line of text at `font_size` pixels.
    fn line_height(&self, font_size: f32) -> i32;

    /// Width of the gap a collapsed whitespace run turns into.
    fn space_width(&self, font_size: f32) -> i32 {
        self.text_width(" ", font_size)
    }
}

/// Fixed-pitch metrics: every character advances `glyph_advance * font_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    pub glyph_advance: f32,
    pub line_height: f32,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            glyph_advance: 0.5,
            line_height: 1.25,
        }
    }
}

impl TextMeasure for FixedMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> i32 {
        (text.chars().count() as f32 * font_size * self.glyph_advance).round() as i32
    }

    fn line_height(&self, font_size: f32) -> i32 {
        (font_size * self.line_height).round() as i32
    }
}

/// Layout constants.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Default text size and the `em`/`rem` multiplier
    pub root_font_size: f32,
    /// Box for images whose intrinsic size is unknown
    pub image_placeholder: (u32, u32),
    /// Extra left padding on `ul`, `ol` and `blockquote`
    pub list_indent: i32,
    pub scrollbar_width: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_font_size: 16.0,
            image_placeholder: (50, 50),
            list_indent: 40,
            scrollbar_width: 12,
        }
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
    metrics: Box<dyn TextMeasure>,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    /// Engine using [`FixedMetrics`].
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_metrics(config, Box::new(FixedMetrics::default()))
    }

    pub fn with_metrics(config: LayoutConfig, metrics: Box<dyn TextMeasure>) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `doc` for `viewport`, writing every element's geometry, and
    /// return the paint-pass frame. `scroll_y` is clamped to the scrollable
    /// range.
    pub fn layout(&self, doc: &mut Document, viewport: Viewport, scroll_y: i32) -> Result<Frame> {
        if doc.is_empty() {
            return Err(Error::EmptyDocument);
        }
        if viewport.width == 0 || viewport.height == 0 {
            return Err(Error::RenderError(format!(
                "viewport {}x{} has no area",
                viewport.width, viewport.height
            )));
        }

        let total_height = self.run_pass(doc, viewport, Pass::Measure, 0).content_bottom;
        debug!("measure pass: total height {total_height}");

        let height = to_coord(viewport.height);
        let max_scroll = total_height.saturating_sub(height).max(0);
        let scroll_y = scroll_y.clamp(0, max_scroll);

        let ctx = self.run_pass(doc, viewport, Pass::Paint, scroll_y);
        let mut display_list = ctx.display_list;
        if total_height > height {
            display_list.push(self.scrollbar(viewport, total_height, scroll_y));
        }
        debug!(
            "paint pass: {} commands at scroll {scroll_y}",
            display_list.len()
        );

        Ok(Frame {
            viewport,
            scroll_y,
            total_height,
            display_list,
        })
    }

    fn run_pass(&self, doc: &mut Document, viewport: Viewport, pass: Pass, scroll_y: i32) -> LayoutContext {
        doc.reset_geometry();
        let bounds = Bounds {
            left: 0,
            right: to_coord(viewport.width),
            containing_height: Some(to_coord(viewport.height)),
        };
        let ctx = LayoutContext::new(pass, viewport, scroll_y, bounds);
        let mut flow = Flow::new(doc, &self.config, self.metrics.as_ref(), ctx);
        flow.run();
        let mut ctx = flow.into_context();
        ctx.content_bottom = ctx.content_bottom.max(ctx.y);
        ctx
    }

    fn scrollbar(&self, viewport: Viewport, total_height: i32, scroll_y: i32) -> PaintCommand {
        let track = to_coord(viewport.height);
        let total = i64::from(total_height.max(1));
        let thumb_height = (i64::from(track) * i64::from(track) / total).min(i64::from(track)) as i32;
        let thumb_height = thumb_height.clamp(MIN_THUMB_HEIGHT.min(track), track);
        let max_scroll = total_height.saturating_sub(track);
        let thumb_y = if max_scroll > 0 {
            (i64::from(scroll_y) * i64::from(track - thumb_height) / i64::from(max_scroll)) as i32
        } else {
            0
        };
        let width = self.config.scrollbar_width;
        PaintCommand::Scrollbar {
            x: to_coord(viewport.width).saturating_sub(width),
            width: width.max(0) as u32,
            track_height: track as u32,
            thumb_y,
            thumb_height: thumb_height as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_metrics_scale_with_font_size() {
        let m = FixedMetrics::default();
        assert_eq!(m.text_width("abcd", 16.0), 32);
        assert_eq!(m.space_width(16.0), 8);
        assert_eq!(m.line_height(16.0), 20);
        assert_eq!(m.line_height(32.0), 40);
    }

    #[test]
    fn empty_document_is_an_error() {
        let mut doc = Document::new();
        let err = LayoutEngine::default()
            .layout(&mut doc, Viewport::default(), 0)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn scrollbar_thumb_tracks_scroll() {
        let engine = LayoutEngine::default();
        let viewport = Viewport {
            width: 200,
            height: 100,
        };
        match engine.scrollbar(viewport, 400, 300) {
            PaintCommand::Scrollbar {
                x,
                thumb_y,
                thumb_height,
                ..
            } => {
                assert_eq!(x, 188);
                assert_eq!(thumb_height, 25);
                assert_eq!(thumb_y, 75);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
