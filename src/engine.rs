//! The navigation pipeline: parse, collect stylesheets, cascade, lay out.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::css::StyleEngine;
use crate::dom::{Document, NodeId};
use crate::rendering::{FixedMetrics, Frame, LayoutEngine, TextMeasure};
use crate::{html, Engine, EngineConfig, Error, Result, TextSnapshot, Viewport};

/// Supplies the text of external stylesheets referenced by
/// `<link rel="stylesheet" href="...">`. Fetching is the caller's concern;
/// the engine only asks for text it can cascade.
pub trait StylesheetSource: Send + Sync {
    /// Stylesheet text for `href`, or `None` when it is unavailable.
    fn stylesheet(&self, href: &str) -> Option<String>;
}

impl StylesheetSource for HashMap<String, String> {
    fn stylesheet(&self, href: &str) -> Option<String> {
        self.get(href).cloned()
    }
}

/// Ignores every `<link>` stylesheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalStylesheets;

impl StylesheetSource for NoExternalStylesheets {
    fn stylesheet(&self, _href: &str) -> Option<String> {
        None
    }
}

/// Owns the live document and the style and layout engines that act on it.
pub struct RenderEngine {
    config: EngineConfig,
    document: Option<Document>,
    stylesheets: Vec<String>,
    styles: StyleEngine,
    layout: LayoutEngine,
    source: Box<dyn StylesheetSource>,
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("config", &self.config)
            .field("loaded", &self.document.is_some())
            .field("stylesheets", &self.stylesheets.len())
            .finish_non_exhaustive()
    }
}

impl RenderEngine {
    /// Engine that resolves `<link>` stylesheets through `source`.
    pub fn with_source(config: EngineConfig, source: Box<dyn StylesheetSource>) -> Result<Self> {
        let metrics = FixedMetrics {
            glyph_advance: config.glyph_advance,
            line_height: config.line_height,
        };
        Self::with_parts(config, source, Box::new(metrics))
    }

    /// Engine with custom text metrics, e.g. backed by a real font rasterizer.
    pub fn with_parts(
        config: EngineConfig,
        source: Box<dyn StylesheetSource>,
        metrics: Box<dyn TextMeasure>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            styles: StyleEngine::new(config.style_config()),
            layout: LayoutEngine::with_metrics(config.layout_config(), metrics),
            config,
            document: None,
            stylesheets: Vec::new(),
            source,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    pub fn style_engine(&self) -> &StyleEngine {
        &self.styles
    }

    /// Stylesheet texts collected for the current document, in cascade order.
    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    /// Cascade an extra stylesheet after the document's own sheets.
    pub fn add_stylesheet(&mut self, css: &str) -> Result<usize> {
        self.stylesheets.push(css.to_string());
        self.restyle()
    }

    /// Re-run the cascade over the collected stylesheets. Script-driven
    /// mutations that should affect matching call this before rendering.
    pub fn restyle(&mut self) -> Result<usize> {
        let doc = self
            .document
            .as_mut()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))?;
        Ok(self.styles.apply(doc, &self.stylesheets))
    }

    /// Inline `<style>` bodies and linked sheets in document order.
    fn collect_stylesheets(&self, doc: &Document) -> Vec<String> {
        let mut sheets = Vec::new();
        for id in doc.elements() {
            let Some(el) = doc.element(id) else { continue };
            match el.tag() {
                "style" => {
                    let css = doc.text_content(id);
                    if !css.trim().is_empty() {
                        sheets.push(css);
                    }
                }
                "link" if is_stylesheet_link(el.attribute("rel")) => {
                    let Some(href) = el.href() else { continue };
                    match self.source.stylesheet(href) {
                        Some(css) => sheets.push(css),
                        None => warn!("stylesheet {href} unavailable"),
                    }
                }
                _ => {}
            }
        }
        sheets
    }

    fn loaded(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))
    }

    fn loaded_mut(&mut self) -> Result<&mut Document> {
        self.document
            .as_mut()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))
    }
}

fn is_stylesheet_link(rel: Option<&str>) -> bool {
    rel.is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|r| r.eq_ignore_ascii_case("stylesheet"))
    })
}

impl Engine for RenderEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        Self::with_source(config, Box::new(NoExternalStylesheets))
    }

    fn load_html(&mut self, html: &[u8]) -> Result<()> {
        // The previous tree and its image handles go before the next is built.
        self.document = None;
        self.stylesheets.clear();

        let mut doc = html::parse(html);
        let sheets = self.collect_stylesheets(&doc);
        debug!("collected {} stylesheets", sheets.len());
        let applied = self.styles.apply(&mut doc, &sheets);
        info!(
            "loaded document: {} nodes, {} rules, {} declarations applied",
            doc.len(),
            self.styles.rules().len(),
            applied
        );

        self.stylesheets = sheets;
        self.document = Some(doc);
        Ok(())
    }

    fn render(&mut self, scroll_y: i32) -> Result<Frame> {
        let viewport = self.config.viewport;
        let doc = self
            .document
            .as_mut()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))?;
        self.layout.layout(doc, viewport, scroll_y)
    }

    fn render_text_snapshot(&self) -> Result<TextSnapshot> {
        let doc = self.loaded()?;
        let text = doc
            .body()
            .map(|body| doc.text_content(body))
            .unwrap_or_default();
        Ok(TextSnapshot {
            title: doc.title().unwrap_or_default(),
            text,
        })
    }

    fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.loaded_mut()?.set_attribute(node, name, value)
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.loaded_mut()?.set_style(node, property, value)
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport {}x{} has no area",
                viewport.width, viewport.height
            )));
        }
        self.config.viewport = viewport;
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        if let Some(doc) = self.document.take() {
            debug!("closing engine, dropping {} nodes", doc.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Hi</title>
        <style>p { color: red }</style>
        <link rel="stylesheet" href="site.css">
        </head><body><p class="x">hello world</p></body></html>"#;

    #[test]
    fn render_before_load_is_an_error() {
        let mut engine = RenderEngine::new(EngineConfig::default()).unwrap();
        assert!(matches!(engine.render(0), Err(Error::RenderError(_))));
        assert!(engine.render_text_snapshot().is_err());
    }

    #[test]
    fn linked_sheets_cascade_after_earlier_inline_styles() {
        let mut sheets = HashMap::new();
        sheets.insert("site.css".to_string(), ".x { color: blue }".to_string());
        let mut engine = RenderEngine::with_source(EngineConfig::default(), Box::new(sheets)).unwrap();
        engine.load_html(PAGE.as_bytes()).unwrap();

        assert_eq!(engine.stylesheets().len(), 2);
        let p = engine.query_selector("p").unwrap();
        assert_eq!(engine.document().unwrap().get_style(p, "color"), Some("blue"));
    }

    #[test]
    fn missing_linked_sheet_is_skipped() {
        let mut engine = RenderEngine::new(EngineConfig::default()).unwrap();
        engine.load_html(PAGE.as_bytes()).unwrap();
        assert_eq!(engine.stylesheets().len(), 1);
        let p = engine.query_selector("p").unwrap();
        assert_eq!(engine.document().unwrap().get_style(p, "color"), Some("red"));
    }

    #[test]
    fn snapshot_has_title_and_body_text() {
        let mut engine = RenderEngine::new(EngineConfig::default()).unwrap();
        engine.load_html(PAGE.as_bytes()).unwrap();
        let snap = engine.render_text_snapshot().unwrap();
        assert_eq!(snap.title, "Hi");
        assert_eq!(snap.text, "hello world");
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let mut engine = RenderEngine::new(EngineConfig::default()).unwrap();
        let err = engine
            .set_viewport(Viewport {
                width: 0,
                height: 10,
            })
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn stylesheet_rel_tokens() {
        assert!(is_stylesheet_link(Some("stylesheet")));
        assert!(is_stylesheet_link(Some("alternate Stylesheet")));
        assert!(!is_stylesheet_link(Some("icon")));
        assert!(!is_stylesheet_link(None));
    }
}
