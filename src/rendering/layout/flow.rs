//! The recursive flow walk shared by both passes.

use std::collections::HashMap;

use crate::css::values::{parse_color, Length, LengthContext};
use crate::dom::{Document, Element, Node, NodeId, Rect, ROOT_TAG};
use crate::rendering::paint::{
    rgba, PaintCommand, Rgba, CONTROL_BACKGROUND, CONTROL_TEXT, LINK_COLOR, RULE_COLOR, TEXT_COLOR,
};

use super::context::{Bounds, FloatSide, FloatZone, LayoutContext, Pass};
use super::{clamp_coord, to_coord, LayoutConfig, TextMeasure, MAX_COORD};

/// Tags laid out as blocks unless `display` says otherwise.
const BLOCK_TAGS: &[&str] = &[
    ROOT_TAG, "html", "body", "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li",
    "br", "hr", "table", "tr", "tbody", "thead", "tfoot", "form", "header", "footer", "nav",
    "section", "main", "aside", "figure", "figcaption", "dt", "dd", "dl", "center", "article",
    "summary", "details", "blockquote", "pre", "address",
];

/// Elements that never produce boxes.
const NON_RENDERED: &[&str] = &["head", "title", "style", "script", "meta", "link", "template"];

const HR_HEIGHT: i32 = 2;
const CONTROL_HEIGHT: i32 = 28;
const CONTROL_PADDING: i32 = 10;

/// Values passed down the tree.
#[derive(Debug, Clone, Copy)]
struct Inherited {
    font_size: f32,
    color: Rgba,
}

#[derive(Debug, Clone, Copy, Default)]
struct Edges {
    top: i32,
    right: i32,
    bottom: i32,
    left: i32,
}

impl Edges {
    fn horizontal(&self) -> i32 {
        self.left.saturating_add(self.right)
    }
}

pub(super) struct Flow<'a> {
    doc: &'a mut Document,
    config: &'a LayoutConfig,
    metrics: &'a dyn TextMeasure,
    ctx: LayoutContext,
    /// Unwrapped content width of auto-width floats, measured once per pass
    preferred_widths: HashMap<NodeId, i32>,
}

impl<'a> Flow<'a> {
    pub(super) fn new(
        doc: &'a mut Document,
        config: &'a LayoutConfig,
        metrics: &'a dyn TextMeasure,
        ctx: LayoutContext,
    ) -> Self {
        Self {
            doc,
            config,
            metrics,
            ctx,
            preferred_widths: HashMap::new(),
        }
    }

    pub(super) fn run(&mut self) {
        let inherited = Inherited {
            font_size: self.config.root_font_size,
            color: TEXT_COLOR,
        };
        let root = self.doc.root();
        self.ctx.push_ink();
        self.layout_node(root, inherited);
        self.ctx.pop_ink();
    }

    pub(super) fn into_context(self) -> LayoutContext {
        self.ctx
    }

    fn layout_node(&mut self, id: NodeId, inherited: Inherited) {
        let text = match self.doc.node(id) {
            Some(Node::Text(text)) => Some(text.clone()),
            Some(Node::Element(_)) => None,
            None => return,
        };
        match text {
            Some(text) => self.layout_text(&text, inherited),
            None => self.layout_element(id, inherited),
        }
    }

    fn layout_children(&mut self, id: NodeId, inherited: Inherited) {
        let children: Vec<NodeId> = self.doc.children(id).collect();
        for child in children {
            self.layout_node(child, inherited);
        }
    }

    fn layout_element(&mut self, id: NodeId, inherited: Inherited) {
        let Some(el) = self.doc.element(id) else {
            return;
        };
        let tag = el.tag().to_string();
        if NON_RENDERED.contains(&tag.as_str()) {
            return;
        }
        let display = el.style("display").map(|d| d.trim().to_ascii_lowercase());
        let page_box = matches!(tag.as_str(), ROOT_TAG | "html" | "body");
        if display.as_deref() == Some("none") && !page_box {
            return;
        }

        let inherited = self.inherit(el, &tag, inherited);
        let float = match el.style("float").map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("left") && !page_box => Some(FloatSide::Left),
            Some(v) if v.eq_ignore_ascii_case("right") && !page_box => Some(FloatSide::Right),
            _ => None,
        };
        let block = is_block(&tag, display.as_deref());

        if let Some(side) = float {
            return self.layout_float(id, &tag, side, inherited);
        }
        match tag.as_str() {
            "br" => self.layout_br(id, inherited),
            "img" => self.layout_image(id, block, inherited),
            "input" | "button" => self.layout_control(id, &tag),
            _ if block => self.layout_block(id, &tag, inherited),
            _ => self.layout_inline(id, inherited),
        }
    }

    fn inherit(&self, el: &Element, tag: &str, parent: Inherited) -> Inherited {
        let font_size = el
            .style("font-size")
            .and_then(|v| self.font_size(v, parent.font_size))
            .or_else(|| heading_size(tag))
            .unwrap_or(parent.font_size);
        let color = el
            .style("color")
            .and_then(parse_color)
            .map(rgba)
            .or_else(|| (tag == "a").then_some(LINK_COLOR))
            .unwrap_or(parent.color);
        Inherited { font_size, color }
    }

    fn font_size(&self, value: &str, parent: f32) -> Option<f32> {
        let keyword = match value.trim().to_ascii_lowercase().as_str() {
            "xx-small" => Some(9.0),
            "x-small" => Some(10.0),
            "small" => Some(13.0),
            "medium" => Some(16.0),
            "large" => Some(18.0),
            "x-large" => Some(24.0),
            "xx-large" => Some(32.0),
            "smaller" => Some(parent / 1.2),
            "larger" => Some(parent * 1.2),
            _ => None,
        };
        keyword
            .or_else(|| Length::parse(value)?.resolve(Some(parent), &self.lengths()))
            .filter(|px| *px > 0.0)
            .map(|px| px.min(MAX_COORD as f32))
    }

    fn text_width(&self, text: &str, font_size: f32) -> i32 {
        clamp_coord(self.metrics.text_width(text, font_size)).max(0)
    }

    fn line_height(&self, font_size: f32) -> i32 {
        clamp_coord(self.metrics.line_height(font_size)).max(0)
    }

    fn space_width(&self, font_size: f32) -> i32 {
        clamp_coord(self.metrics.space_width(font_size)).max(0)
    }

    fn lengths(&self) -> LengthContext {
        LengthContext {
            root_font_size: self.config.root_font_size,
            viewport_width: self.ctx.viewport.width as f32,
            viewport_height: self.ctx.viewport.height as f32,
        }
    }

    /// A length property in whole pixels; `None` for `auto`, unparsable
    /// values and percentages without a basis.
    fn length(&self, el: &Element, property: &str, basis: Option<i32>) -> Option<i32> {
        let length = Length::parse(el.style(property)?)?;
        length
            .resolve(basis.map(|b| b as f32), &self.lengths())
            .map(|px| clamp_coord(px.round() as i32))
    }

    /// `margin-*` or `padding-*` edges. Horizontal percentages use the
    /// containing width, vertical ones its definite height (else zero).
    fn edges(&self, el: &Element, prefix: &str, bounds: Bounds) -> Edges {
        let side = |name: &str, basis: Option<i32>| {
            self.length(el, &format!("{prefix}-{name}"), basis)
                .unwrap_or(0)
        };
        Edges {
            top: side("top", bounds.containing_height),
            right: side("right", Some(bounds.width())),
            bottom: side("bottom", bounds.containing_height),
            left: side("left", Some(bounds.width())),
        }
    }

    fn background(el: &Element) -> Option<Rgba> {
        el.style("background-color")
            .and_then(parse_color)
            .filter(|c| c[3] > 0)
            .map(rgba)
    }

    fn set_rect(&mut self, id: NodeId, rect: Rect) {
        if let Some(el) = self.doc.element_mut(id) {
            el.rect = rect;
        }
    }

    fn fill(&mut self, slot: usize, rect: Rect, color: Rgba) {
        if rect.is_empty() {
            return;
        }
        if let Some(screen) = self.ctx.visible(rect) {
            self.ctx.paint_at(
                slot,
                PaintCommand::SolidRect {
                    x: screen.x,
                    y: screen.y,
                    width: screen.width as u32,
                    height: screen.height as u32,
                    rgba: color,
                },
            );
        }
    }

    fn layout_block(&mut self, id: NodeId, tag: &str, inherited: Inherited) {
        self.ctx.break_line();
        let Some(el) = self.doc.element(id) else {
            return;
        };
        let (clear_left, clear_right) = clear_sides(el);
        let cb = self.ctx.bounds;
        let mut margin = self.edges(el, "margin", cb);
        let mut padding = self.edges(el, "padding", cb);
        if matches!(tag, "ul" | "ol" | "blockquote") {
            padding.left = padding.left.saturating_add(self.config.list_indent);
        }
        let explicit_width = self.length(el, "width", Some(cb.width()));
        let max_width = self.length(el, "max-width", Some(cb.width()));
        let explicit_height = self.length(el, "height", cb.containing_height);
        let min_height = self.length(el, "min-height", cb.containing_height);
        let auto_left = is_auto(el, "margin-left");
        let auto_right = is_auto(el, "margin-right");
        let background = Self::background(el);
        let is_rule = tag == "hr";

        self.ctx.clear(clear_left, clear_right);

        let mut content_width = explicit_width.unwrap_or_else(|| {
            cb.width()
                .saturating_sub(margin.horizontal())
                .saturating_sub(padding.horizontal())
        });
        if let Some(max) = max_width {
            content_width = content_width.min(max);
        }
        let content_width = content_width.max(0);
        let border_width = content_width.saturating_add(padding.horizontal());
        let free = cb
            .width()
            .saturating_sub(border_width)
            .saturating_sub(margin.horizontal());
        match (auto_left, auto_right) {
            (true, true) => margin.left = (free / 2).max(0),
            (true, false) => margin.left = free.max(0),
            _ => {}
        }

        let border_x = cb.left.saturating_add(margin.left);
        let border_y = self.ctx.y.saturating_add(margin.top);
        let content_top = border_y.saturating_add(padding.top);
        let content_left = border_x.saturating_add(padding.left);
        let slot = self.ctx.display_list.len();

        self.ctx.push_bounds(
            Bounds {
                left: content_left,
                right: content_left.saturating_add(content_width),
                containing_height: explicit_height,
            },
            content_top,
        );
        self.ctx.push_ink();
        self.layout_children(id, inherited);
        self.ctx.break_line();
        let ink = self.ctx.pop_ink();

        let flow_height = self.ctx.y.saturating_sub(content_top);
        let default_height = if is_rule { HR_HEIGHT } else { 0 };
        let content_height = explicit_height
            .unwrap_or_else(|| flow_height.max(default_height))
            .max(min_height.unwrap_or(0));
        let border = Rect::new(
            border_x,
            border_y,
            border_width,
            padding
                .top
                .saturating_add(content_height)
                .saturating_add(padding.bottom),
        );
        self.ctx.pop_bounds(border.bottom().saturating_add(margin.bottom));

        if let Some(color) = background.or(is_rule.then_some(RULE_COLOR)) {
            self.fill(slot, border, color);
        }
        let rect = ink.map_or(border, |ink| border.union(&ink));
        self.set_rect(id, rect);
        self.ctx.add_ink(rect);
        if explicit_width.is_some() {
            let right = border.right().saturating_add(margin.right);
            self.ctx.inline_extent = self.ctx.inline_extent.max(right);
        }
    }

    fn layout_inline(&mut self, id: NodeId, inherited: Inherited) {
        let Some(el) = self.doc.element(id) else {
            return;
        };
        let cb = self.ctx.bounds;
        let margin = self.edges(el, "margin", cb);
        let padding = self.edges(el, "padding", cb);
        let background = Self::background(el);

        let slot = self.ctx.display_list.len();
        let (start_x, start_y) = (self.ctx.x, self.ctx.y);
        self.ctx.x = self
            .ctx
            .x
            .saturating_add(margin.left)
            .saturating_add(padding.left);
        self.ctx.push_ink();
        self.layout_children(id, inherited);
        let ink = self.ctx.pop_ink();
        self.ctx.x = self
            .ctx
            .x
            .saturating_add(padding.right)
            .saturating_add(margin.right);

        let rect = match ink {
            Some(ink) => Rect::new(
                ink.x.saturating_sub(padding.left),
                ink.y.saturating_sub(padding.top),
                ink.width.saturating_add(padding.horizontal()),
                ink.height
                    .saturating_add(padding.top)
                    .saturating_add(padding.bottom),
            ),
            None => Rect::new(start_x.saturating_add(margin.left), start_y, 0, 0),
        };
        if let Some(color) = background {
            self.fill(slot, rect, color);
        }
        self.set_rect(id, rect);
        if ink.is_some() {
            self.ctx.add_ink(rect);
        }
    }

    fn layout_text(&mut self, text: &str, inherited: Inherited) {
        let font_size = inherited.font_size;
        let line_height = self.line_height(font_size);
        let space = self.space_width(font_size);
        for word in text.split_ascii_whitespace() {
            let width = self.text_width(word, font_size);
            let gap = if self.ctx.line_has_content { space } else { 0 };
            let gap = self.ctx.fit(width, gap);
            let glyphs = Rect::new(self.ctx.x.saturating_add(gap), self.ctx.y, width, line_height);
            self.paint_word(word, glyphs, font_size, inherited.color, space);
            self.ctx.place_inline(glyphs);
        }
    }

    /// Emit a word, extending the previous run when it continues the same line.
    fn paint_word(&mut self, word: &str, glyphs: Rect, font_size: f32, color: Rgba, space: i32) {
        let Some(screen) = self.ctx.visible(glyphs) else {
            return;
        };
        if let Some(PaintCommand::Text {
            x,
            y,
            width,
            text,
            font_size: run_size,
            rgba: run_color,
        }) = self.ctx.display_list.last_mut()
        {
            let continues = *y == screen.y
                && *run_size == font_size
                && *run_color == color
                && x.saturating_add(*width as i32).saturating_add(space) == screen.x;
            if continues {
                text.push(' ');
                text.push_str(word);
                *width = screen.right().saturating_sub(*x).max(0) as u32;
                return;
            }
        }
        self.ctx.paint(PaintCommand::Text {
            x: screen.x,
            y: screen.y,
            width: screen.width.max(0) as u32,
            text: word.to_string(),
            font_size,
            rgba: color,
        });
    }

    fn layout_br(&mut self, id: NodeId, inherited: Inherited) {
        let line_height = self.line_height(inherited.font_size);
        self.set_rect(id, Rect::new(self.ctx.x, self.ctx.y, 0, line_height));
        if self.ctx.line_has_content {
            self.ctx.break_line();
        } else {
            self.ctx.y = self.ctx.y.saturating_add(line_height);
            self.ctx.start_line();
        }
    }

    /// Used size of replaced content: styles, then attributes, then the
    /// intrinsic size, keeping the aspect ratio when one axis is given.
    fn replaced_size(&self, id: NodeId) -> (i32, i32) {
        let Some(el) = self.doc.element(id) else {
            return (0, 0);
        };
        let cb = self.ctx.bounds;
        let (intrinsic_w, intrinsic_h) = el
            .image
            .map(|img| (to_coord(img.width), to_coord(img.height)))
            .unwrap_or((
                to_coord(self.config.image_placeholder.0),
                to_coord(self.config.image_placeholder.1),
            ));
        let attr = |name: &str| {
            el.attribute(name)
                .and_then(|v| v.trim().parse::<i32>().ok())
                .map(clamp_coord)
        };
        let width = self
            .length(el, "width", Some(cb.width()))
            .or_else(|| attr("width"));
        let height = self
            .length(el, "height", cb.containing_height)
            .or_else(|| attr("height"));
        match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if intrinsic_w > 0 => (w, scale(intrinsic_h, w, intrinsic_w)),
            (None, Some(h)) if intrinsic_h > 0 => (scale(intrinsic_w, h, intrinsic_h), h),
            (Some(w), None) => (w, intrinsic_h),
            (None, Some(h)) => (intrinsic_w, h),
            (None, None) => (intrinsic_w, intrinsic_h),
        }
    }

    fn layout_image(&mut self, id: NodeId, block: bool, inherited: Inherited) {
        let (mut width, mut height) = self.replaced_size(id);
        let handle = self
            .doc
            .element(id)
            .and_then(|el| el.image)
            .map(|img| img.key);
        if block {
            self.ctx.break_line();
        }

        let gap = if self.ctx.line_has_content {
            self.space_width(inherited.font_size)
        } else {
            0
        };
        // Shrink to the space left on this line before considering a wrap.
        let y = self.ctx.y;
        let start = self.ctx.x.max(self.ctx.line_left(y)).saturating_add(gap);
        let remaining = self.ctx.line_right(y).saturating_sub(start);
        if width > remaining && remaining > 0 {
            height = scale(height, remaining, width);
            width = remaining;
        }
        let mut gap = self.ctx.fit(width, gap);
        let y = self.ctx.y;
        let line_width = self.ctx.line_right(y).saturating_sub(self.ctx.line_left(y));
        if width > line_width && line_width > 0 {
            height = scale(height, line_width, width);
            width = line_width;
            gap = self.ctx.fit(width, gap);
        }

        let rect = Rect::new(self.ctx.x.saturating_add(gap), self.ctx.y, width, height);
        if let Some(screen) = self.ctx.visible(rect) {
            self.ctx.paint(PaintCommand::Image {
                x: screen.x,
                y: screen.y,
                width: width.max(0) as u32,
                height: height.max(0) as u32,
                handle,
            });
        }
        self.ctx.place_inline(rect);
        self.set_rect(id, rect);
        if block {
            self.ctx.break_line();
        }
    }

    /// `input` or `button` as a fixed-height control box labelled with its
    /// value or placeholder. A button falls back to its own text, which is
    /// drawn as the label rather than laid out as children.
    fn layout_control(&mut self, id: NodeId, tag: &str) {
        let Some(el) = self.doc.element(id) else {
            return;
        };
        let is_button = tag == "button";
        let default_kind = if is_button { "submit" } else { "text" };
        let kind = el
            .attribute("type")
            .unwrap_or(default_kind)
            .to_ascii_lowercase();
        if !is_button && kind == "hidden" {
            return;
        }
        let label = el
            .attribute("value")
            .or_else(|| el.attribute("placeholder"))
            .map(str::to_string)
            .or_else(|| {
                is_button
                    .then(|| self.doc.text_content(id))
                    .filter(|text| !text.is_empty())
            })
            .unwrap_or_else(|| match kind.as_str() {
                "submit" | "button" | "reset" => "Submit".to_string(),
                _ => String::new(),
            });
        let font_size = self.config.root_font_size;
        let label_width = self.text_width(&label, font_size);
        let cb = self.ctx.bounds;
        let width = self
            .length(el, "width", Some(cb.width()))
            .unwrap_or(label_width.saturating_add(2 * CONTROL_PADDING));
        let height = self
            .length(el, "height", cb.containing_height)
            .unwrap_or(CONTROL_HEIGHT);
        let background = Self::background(el).unwrap_or(CONTROL_BACKGROUND);

        let gap = if self.ctx.line_has_content {
            self.space_width(font_size)
        } else {
            0
        };
        let gap = self.ctx.fit(width, gap);
        let rect = Rect::new(self.ctx.x.saturating_add(gap), self.ctx.y, width, height);
        let slot = self.ctx.display_list.len();
        self.fill(slot, rect, background);
        if !label.is_empty() {
            let line_height = self.line_height(font_size);
            let text = Rect::new(
                rect.x.saturating_add(CONTROL_PADDING),
                rect.y.saturating_add(height.saturating_sub(line_height) / 2),
                label_width,
                line_height,
            );
            if let Some(screen) = self.ctx.visible(text) {
                self.ctx.paint(PaintCommand::Text {
                    x: screen.x,
                    y: screen.y,
                    width: label_width.max(0) as u32,
                    text: label,
                    font_size,
                    rgba: CONTROL_TEXT,
                });
            }
        }
        self.ctx.place_inline(rect);
        self.set_rect(id, rect);
    }

    fn layout_float(&mut self, id: NodeId, tag: &str, side: FloatSide, inherited: Inherited) {
        let Some(el) = self.doc.element(id) else {
            return;
        };
        let cb = self.ctx.bounds;
        let (clear_left, clear_right) = clear_sides(el);
        let margin = self.edges(el, "margin", cb);
        let padding = self.edges(el, "padding", cb);
        let explicit_width = self.length(el, "width", Some(cb.width()));
        let max_width = self.length(el, "max-width", Some(cb.width()));
        let explicit_height = self.length(el, "height", cb.containing_height);
        let background = Self::background(el);
        let handle = el.image.map(|img| img.key);
        let replaced = tag == "img";

        let (content_width, replaced_height) = if replaced {
            let (w, h) = self.replaced_size(id);
            (w, Some(h))
        } else {
            let available = cb
                .width()
                .saturating_sub(margin.horizontal())
                .saturating_sub(padding.horizontal())
                .max(0);
            let width = match explicit_width {
                Some(w) => w,
                None => self.shrink_to_fit(id, inherited, available).min(available),
            };
            (width, None)
        };
        let content_width = max_width
            .map_or(content_width, |max| content_width.min(max))
            .max(0);
        let outer_width = margin
            .horizontal()
            .saturating_add(padding.horizontal())
            .saturating_add(content_width);

        let top = self.float_top(side, outer_width, clear_left, clear_right);
        let outer_x = match side {
            FloatSide::Left => self.ctx.line_left(top),
            FloatSide::Right => self.ctx.line_right(top).saturating_sub(outer_width),
        };
        let border_x = outer_x.saturating_add(margin.left);
        let border_y = top.saturating_add(margin.top);
        let content_top = border_y.saturating_add(padding.top);
        let content_left = border_x.saturating_add(padding.left);

        let saved = self.ctx.save_line();
        let slot = self.ctx.display_list.len();
        self.ctx.push_bounds(
            Bounds {
                left: content_left,
                right: content_left.saturating_add(content_width),
                containing_height: explicit_height,
            },
            content_top,
        );
        self.ctx.push_ink();
        if !replaced {
            self.layout_children(id, inherited);
        }
        self.ctx.break_line();
        let ink = self.ctx.pop_ink();
        let flow_height = self.ctx.y.saturating_sub(content_top);
        self.ctx.pop_bounds(saved.y());
        self.ctx.restore_line(saved);

        let content_height = replaced_height.or(explicit_height).unwrap_or(flow_height);
        let border = Rect::new(
            border_x,
            border_y,
            content_width.saturating_add(padding.horizontal()),
            padding
                .top
                .saturating_add(content_height)
                .saturating_add(padding.bottom),
        );
        if let Some(color) = background {
            self.fill(slot, border, color);
        }
        if replaced {
            if let Some(screen) = self.ctx.visible(border) {
                self.ctx.paint(PaintCommand::Image {
                    x: screen.x,
                    y: screen.y,
                    width: border.width.max(0) as u32,
                    height: border.height.max(0) as u32,
                    handle,
                });
            }
        }

        let rect = ink.map_or(border, |ink| border.union(&ink));
        self.ctx.add_float(FloatZone {
            side,
            rect: Rect::new(
                outer_x,
                top,
                outer_width,
                rect.bottom().saturating_add(margin.bottom).saturating_sub(top),
            ),
        });
        self.set_rect(id, rect);
        self.ctx.add_ink(rect);
        self.ctx.inline_extent = self
            .ctx
            .inline_extent
            .max(outer_x.saturating_add(outer_width));
        if side == FloatSide::Left {
            self.ctx.x = self.ctx.x.max(self.ctx.line_left(self.ctx.y));
        }
    }

    /// Top edge for a float `outer_width` wide. Right floats start below
    /// any right float already occupying the band; any float moves down
    /// until it fits beside the others.
    fn float_top(&self, side: FloatSide, outer_width: i32, clear_left: bool, clear_right: bool) -> i32 {
        let mut y = self.ctx.cleared_y(self.ctx.y, clear_left, clear_right);
        loop {
            if side == FloatSide::Right {
                let below = self
                    .ctx
                    .active_floats(y, FloatSide::Right)
                    .map(|f| f.rect.bottom())
                    .max();
                if let Some(bottom) = below {
                    y = bottom;
                    continue;
                }
            }
            let room = self.ctx.line_right(y).saturating_sub(self.ctx.line_left(y));
            match self.ctx.next_float_bottom(y) {
                Some(bottom) if room < outer_width => y = bottom,
                _ => return y,
            }
        }
    }

    /// Shrink-to-fit width: the unwrapped content width, capped at
    /// `available`.
    fn shrink_to_fit(&mut self, id: NodeId, inherited: Inherited, available: i32) -> i32 {
        self.preferred_width(id, inherited).min(available)
    }

    /// Widest line the subtree produces when nothing wraps, measured in a
    /// scratch context that draws nothing. Nested floats reuse their cached
    /// width, so each subtree is measured once per pass.
    fn preferred_width(&mut self, id: NodeId, inherited: Inherited) -> i32 {
        if let Some(width) = self.preferred_widths.get(&id) {
            return *width;
        }
        let scratch = LayoutContext::new(
            Pass::Measure,
            self.ctx.viewport,
            0,
            Bounds {
                left: 0,
                right: MAX_COORD,
                containing_height: None,
            },
        );
        let saved = std::mem::replace(&mut self.ctx, scratch);
        self.ctx.push_ink();
        self.layout_children(id, inherited);
        let width = self.ctx.inline_extent;
        self.ctx = saved;
        self.preferred_widths.insert(id, width);
        width
    }
}

/// `value * num / den` without intermediate overflow.
fn scale(value: i32, num: i32, den: i32) -> i32 {
    if den == 0 {
        return value;
    }
    let scaled = i64::from(value) * i64::from(num) / i64::from(den);
    scaled.clamp(i64::from(-MAX_COORD), i64::from(MAX_COORD)) as i32
}

fn is_block(tag: &str, display: Option<&str>) -> bool {
    match display {
        Some(d) if d.starts_with("inline") => false,
        Some("block" | "flex" | "grid" | "list-item" | "table" | "flow-root") => true,
        _ => BLOCK_TAGS.contains(&tag),
    }
}

fn is_auto(el: &Element, property: &str) -> bool {
    el.style(property)
        .and_then(Length::parse)
        .is_some_and(|length| length.is_auto())
}

fn clear_sides(el: &Element) -> (bool, bool) {
    match el.style("clear").map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("left") => (true, false),
        Some("right") => (false, true),
        Some("both") => (true, true),
        _ => (false, false),
    }
}

fn heading_size(tag: &str) -> Option<f32> {
    match tag {
        "h1" => Some(32.0),
        "h2" => Some(28.0),
        "h3" => Some(24.0),
        "h4" => Some(20.0),
        "h5" => Some(16.0),
        "h6" => Some(14.0),
        _ => None,
    }
}
