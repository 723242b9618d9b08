//! RFox Render Core
//!
//! The document-rendering core of the RFox browser: it turns raw HTML bytes
//! into a styled, positioned box tree ready for paint.
//!
//! # Pipeline
//!
//! - **Markup Parser** ([`html`]): a forgiving single-pass tree builder
//! - **Document Model** ([`dom`]): an arena tree with attributes, computed
//!   styles and geometry per element
//! - **Style Engine** ([`css`]): stylesheet parsing, selector matching,
//!   `var()` resolution and the cascade
//! - **Layout Engine** ([`rendering`]): two-pass block/inline flow with
//!   floats and word wrap, producing a display list
//!
//! Networking, scripting and rasterization live outside this crate; they
//! feed bytes in and consume the [`dom::Document`] and [`rendering::Frame`].
//!
//! # Example
//!
//! ```
//! use rfrender::{Engine, EngineConfig, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig {
//!     viewport: Viewport { width: 400, height: 300 },
//!     ..Default::default()
//! };
//!
//! let mut engine = rfrender::new_engine(config)?;
//! engine.load_html(b"<title>Demo</title><style>p { color: green }</style><p>Hello</p>")?;
//! let frame = engine.render(0)?;
//! assert_eq!(frame.texts().collect::<Vec<_>>(), vec!["Hello"]);
//!
//! let snapshot = engine.render_text_snapshot()?;
//! assert_eq!(snapshot.title, "Demo");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod css;
pub mod dom;
pub mod engine;
pub mod html;
pub mod rendering;

pub use dom::{Document, NodeId};
pub use engine::{NoExternalStylesheets, RenderEngine, StylesheetSource};
pub use rendering::{Frame, PaintCommand};

use css::StyleConfig;
use rendering::LayoutConfig;

/// Configuration for the rendering core
///
/// Every field has a default, so a JSON config only needs the keys it
/// changes.
///
/// # Examples
///
/// ```
/// let cfg = rfrender::EngineConfig::from_json(r#"{ "viewport": { "width": 800, "height": 600 } }"#).unwrap();
/// assert_eq!(cfg.viewport.width, 800);
/// assert_eq!(cfg.root_font_size, 16.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Default text size and the `em`/`rem` multiplier
    pub root_font_size: f32,
    /// `@media (max-width: N)` blocks with `N` below this are skipped
    pub mobile_breakpoint: u32,
    /// Size reserved for images with no known intrinsic size
    pub image_placeholder: (u32, u32),
    /// Extra left padding for `ul`, `ol` and `blockquote`
    pub list_indent: i32,
    pub scrollbar_width: i32,
    /// Character advance of the default metrics, as a ratio of font size
    pub glyph_advance: f32,
    /// Line height of the default metrics, as a ratio of font size
    pub line_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            root_font_size: 16.0,
            mobile_breakpoint: 800,
            image_placeholder: (50, 50),
            list_indent: 40,
            scrollbar_width: 12,
            glyph_advance: 0.5,
            line_height: 1.25,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport {}x{} has no area",
                self.viewport.width, self.viewport.height
            )));
        }
        let ratios = [
            ("root_font_size", self.root_font_size),
            ("glyph_advance", self.glyph_advance),
            ("line_height", self.line_height),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ConfigError(format!("{name} must be positive, got {value}")));
            }
        }
        if self.list_indent < 0 || self.scrollbar_width < 0 {
            return Err(Error::ConfigError("indents and widths must not be negative".into()));
        }
        Ok(())
    }

    pub fn style_config(&self) -> StyleConfig {
        StyleConfig {
            mobile_breakpoint: self.mobile_breakpoint,
        }
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            root_font_size: self.root_font_size,
            image_placeholder: self.image_placeholder,
            list_indent: self.list_indent,
            scrollbar_width: self.scrollbar_width,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// A textual snapshot of a loaded page
///
/// Returned by `Engine::render_text_snapshot`; handy for textual tests and
/// quick inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSnapshot {
    /// Page title
    pub title: String,
    /// Text content of the body
    pub text: String,
}

/// Core trait for rendering engine implementations
pub trait Engine {
    /// Create a new engine instance with the given configuration
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Parse `html`, discard the previous document and cascade the new
    /// document's stylesheets
    fn load_html(&mut self, html: &[u8]) -> Result<()>;

    /// Lay out the current document at `scroll_y` and return the frame
    fn render(&mut self, scroll_y: i32) -> Result<Frame>;

    /// Render the current page as a text snapshot
    fn render_text_snapshot(&self) -> Result<TextSnapshot>;

    /// The live document, if one is loaded
    fn document(&self) -> Option<&Document>;

    /// Set an attribute; visible from the next render
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Write a computed-style entry; visible from the next render
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    /// Change the viewport used by subsequent renders
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    // --- Higher-level convenience helpers (default implementations) ---

    /// First element matching `selectors` in the live document
    fn query_selector(&self, selectors: &str) -> Option<NodeId> {
        self.document().and_then(|doc| doc.query_selector(selectors))
    }

    /// Attribute value of `node`, owned so it outlives later mutations
    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document()
            .and_then(|doc| doc.get_attribute(node, name))
            .map(str::to_string)
    }

    /// Close the engine and release the document
    fn close(self) -> Result<()>;
}

/// Create a new engine with the default backend and no external stylesheets
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    RenderEngine::new(config)
}
