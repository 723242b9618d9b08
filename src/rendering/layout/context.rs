//! Per-pass layout state: cursor, line, containing-block bounds, float
//! exclusion zones, ink accumulation and the display list.

use crate::dom::Rect;
use crate::rendering::paint::PaintCommand;
use crate::Viewport;

/// Which traversal is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Learn extents; nothing is drawn
    Measure,
    /// Authoritative placement with drawing enabled
    Paint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatSide {
    Left,
    Right,
}

/// Space reserved by a float, margins included, in document space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatZone {
    pub side: FloatSide,
    pub rect: Rect,
}

impl FloatZone {
    /// True while `y` lies within the zone's vertical span.
    pub fn active_at(&self, y: i32) -> bool {
        y >= self.rect.y && y < self.rect.bottom()
    }
}

/// Horizontal extent of the containing block's content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub right: i32,
    /// Definite content height, when the block has one
    pub containing_height: Option<i32>,
}

impl Bounds {
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left).max(0)
    }
}

/// Saved line state, restored after laying out an out-of-flow box.
#[derive(Debug, Clone, Copy)]
pub struct LineState {
    x: i32,
    y: i32,
    line_height: i32,
    line_has_content: bool,
    bounds: Bounds,
}

impl LineState {
    pub fn y(&self) -> i32 {
        self.y
    }
}

#[derive(Debug)]
pub struct LayoutContext {
    pub pass: Pass,
    pub viewport: Viewport,
    pub scroll_y: i32,
    /// Cursor, top-left of the next inline item
    pub x: i32,
    pub y: i32,
    /// Tallest item on the current line
    pub line_height: i32,
    pub line_has_content: bool,
    pub bounds: Bounds,
    margin_stack: Vec<Bounds>,
    pub floats: Vec<FloatZone>,
    ink: Vec<Option<Rect>>,
    /// Lowest edge of anything placed so far
    pub content_bottom: i32,
    /// Rightmost edge reached by inline content, for shrink-to-fit
    pub inline_extent: i32,
    pub display_list: Vec<PaintCommand>,
}

impl LayoutContext {
    pub fn new(pass: Pass, viewport: Viewport, scroll_y: i32, bounds: Bounds) -> Self {
        Self {
            pass,
            viewport,
            scroll_y,
            x: bounds.left,
            y: 0,
            line_height: 0,
            line_has_content: false,
            bounds,
            margin_stack: Vec::new(),
            floats: Vec::new(),
            ink: Vec::new(),
            content_bottom: 0,
            inline_extent: bounds.left,
            display_list: Vec::new(),
        }
    }

    pub fn painting(&self) -> bool {
        self.pass == Pass::Paint
    }

    /// Left edge for a line at `y`, pushed right by active left floats.
    pub fn line_left(&self, y: i32) -> i32 {
        self.active_floats(y, FloatSide::Left)
            .map(|f| f.rect.right())
            .fold(self.bounds.left, i32::max)
    }

    /// Right edge for a line at `y`, pulled left by active right floats.
    pub fn line_right(&self, y: i32) -> i32 {
        self.active_floats(y, FloatSide::Right)
            .map(|f| f.rect.x)
            .fold(self.bounds.right, i32::min)
    }

    /// Floats of `side` active at `y` that overlap the current bounds.
    pub fn active_floats(&self, y: i32, side: FloatSide) -> impl Iterator<Item = &FloatZone> + '_ {
        let bounds = self.bounds;
        self.floats.iter().filter(move |f| {
            f.side == side
                && f.active_at(y)
                && f.rect.right() > bounds.left
                && f.rect.x < bounds.right
        })
    }

    /// Nearest bottom edge below `y` among floats active at `y`.
    pub fn next_float_bottom(&self, y: i32) -> Option<i32> {
        self.floats
            .iter()
            .filter(|f| f.active_at(y))
            .map(|f| f.rect.bottom())
            .min()
    }

    /// Finish the current line and move to the start of the next one.
    pub fn break_line(&mut self) {
        if self.line_has_content {
            self.y = self.y.saturating_add(self.line_height);
        }
        self.start_line();
    }

    /// Reset line state at the current `y`.
    pub fn start_line(&mut self) {
        self.line_height = 0;
        self.line_has_content = false;
        self.x = self.line_left(self.y);
    }

    /// Make room for an item `width` wide on the current line. Wraps when the
    /// line already has content, and on an empty line steps below floats
    /// until the item fits or no float is left in the way.
    pub fn fit(&mut self, width: i32, gap: i32) -> i32 {
        let right = self.line_right(self.y);
        if self.line_has_content && self.x.saturating_add(gap).saturating_add(width) <= right {
            return gap;
        }
        if self.line_has_content {
            self.break_line();
        }
        loop {
            let left = self.line_left(self.y);
            self.x = self.x.max(left);
            if self.x.saturating_add(width) <= self.line_right(self.y) {
                break;
            }
            match self.next_float_bottom(self.y) {
                Some(bottom) => {
                    self.y = bottom;
                    self.x = self.line_left(self.y);
                }
                None => break,
            }
        }
        0
    }

    /// Advance `y` past active floats of the given sides.
    pub fn clear(&mut self, left: bool, right: bool) {
        let cleared = self.cleared_y(self.y, left, right);
        if cleared != self.y {
            self.y = cleared;
            self.start_line();
        }
    }

    /// First `y` at or below `y` clear of every float on the given sides.
    pub fn cleared_y(&self, y: i32, left: bool, right: bool) -> i32 {
        self.floats
            .iter()
            .filter(|f| match f.side {
                FloatSide::Left => left,
                FloatSide::Right => right,
            })
            .map(|f| f.rect.bottom())
            .fold(y, i32::max)
    }

    /// Record an item of `rect` placed on the current line.
    pub fn place_inline(&mut self, rect: Rect) {
        self.x = rect.right();
        self.line_height = self.line_height.max(rect.height);
        self.line_has_content = true;
        self.inline_extent = self.inline_extent.max(rect.right());
        self.add_ink(rect);
    }

    /// Enter a block whose content box spans `bounds`, starting at `y`.
    pub fn push_bounds(&mut self, bounds: Bounds, y: i32) {
        self.margin_stack.push(self.bounds);
        self.bounds = bounds;
        self.y = y;
        self.start_line();
    }

    /// Leave a block; the cursor moves to `y` in the restored bounds.
    pub fn pop_bounds(&mut self, y: i32) {
        if let Some(bounds) = self.margin_stack.pop() {
            self.bounds = bounds;
        }
        self.y = y;
        self.start_line();
    }

    pub fn save_line(&self) -> LineState {
        LineState {
            x: self.x,
            y: self.y,
            line_height: self.line_height,
            line_has_content: self.line_has_content,
            bounds: self.bounds,
        }
    }

    pub fn restore_line(&mut self, state: LineState) {
        self.x = state.x;
        self.y = state.y;
        self.line_height = state.line_height;
        self.line_has_content = state.line_has_content;
        self.bounds = state.bounds;
    }

    pub fn push_ink(&mut self) {
        self.ink.push(None);
    }

    /// Union of everything drawn since the matching [`LayoutContext::push_ink`].
    pub fn pop_ink(&mut self) -> Option<Rect> {
        self.ink.pop().flatten()
    }

    /// Grow the innermost open element around `rect`.
    pub fn add_ink(&mut self, rect: Rect) {
        self.content_bottom = self.content_bottom.max(rect.bottom());
        if let Some(top) = self.ink.last_mut() {
            let merged = match *top {
                Some(current) => current.union(&rect),
                None => rect,
            };
            *top = Some(merged);
        }
    }

    pub fn add_float(&mut self, zone: FloatZone) {
        self.content_bottom = self.content_bottom.max(zone.rect.bottom());
        self.floats.push(zone);
    }

    /// Document-space `rect` to screen space, or `None` when off screen or
    /// when drawing is suppressed.
    pub fn visible(&self, rect: Rect) -> Option<Rect> {
        if !self.painting() {
            return None;
        }
        let top = self.scroll_y;
        let bottom = self.scroll_y.saturating_add(super::to_coord(self.viewport.height));
        (rect.bottom() > top && rect.y < bottom).then(|| Rect {
            y: rect.y.saturating_sub(self.scroll_y),
            ..rect
        })
    }

    pub fn paint(&mut self, command: PaintCommand) {
        if self.painting() {
            self.display_list.push(command);
        }
    }

    /// Insert a background under commands emitted since `slot`.
    pub fn paint_at(&mut self, slot: usize, command: PaintCommand) {
        if self.painting() {
            let slot = slot.min(self.display_list.len());
            self.display_list.insert(slot, command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(width: i32) -> LayoutContext {
        let viewport = Viewport {
            width: width as u32,
            height: 100,
        };
        let bounds = Bounds {
            left: 0,
            right: width,
            containing_height: None,
        };
        LayoutContext::new(Pass::Paint, viewport, 0, bounds)
    }

    #[test]
    fn floats_narrow_lines_only_while_active() {
        let mut ctx = context(400);
        ctx.add_float(FloatZone {
            side: FloatSide::Right,
            rect: Rect::new(300, 0, 100, 60),
        });
        ctx.add_float(FloatZone {
            side: FloatSide::Left,
            rect: Rect::new(0, 0, 50, 30),
        });
        assert_eq!(ctx.line_right(0), 300);
        assert_eq!(ctx.line_left(0), 50);
        assert_eq!(ctx.line_left(30), 0);
        assert_eq!(ctx.line_right(60), 400);
        assert_eq!(ctx.next_float_bottom(10), Some(30));
    }

    #[test]
    fn fit_wraps_and_steps_below_floats() {
        let mut ctx = context(100);
        ctx.place_inline(Rect::new(0, 0, 60, 20));
        assert_eq!(ctx.fit(30, 8), 8);
        assert_eq!(ctx.fit(40, 8), 0);
        assert_eq!((ctx.x, ctx.y), (0, 20));

        ctx.add_float(FloatZone {
            side: FloatSide::Left,
            rect: Rect::new(0, 20, 80, 50),
        });
        ctx.start_line();
        ctx.fit(40, 0);
        assert_eq!((ctx.x, ctx.y), (0, 70));
    }

    #[test]
    fn clear_moves_past_selected_sides() {
        let mut ctx = context(100);
        ctx.add_float(FloatZone {
            side: FloatSide::Left,
            rect: Rect::new(0, 0, 10, 40),
        });
        ctx.add_float(FloatZone {
            side: FloatSide::Right,
            rect: Rect::new(90, 0, 10, 70),
        });
        ctx.clear(true, false);
        assert_eq!(ctx.y, 40);
        ctx.clear(true, true);
        assert_eq!(ctx.y, 70);
    }

    #[test]
    fn ink_accumulates_per_open_element() {
        let mut ctx = context(100);
        ctx.push_ink();
        ctx.push_ink();
        ctx.add_ink(Rect::new(0, 0, 10, 10));
        ctx.add_ink(Rect::new(20, 5, 10, 10));
        let inner = ctx.pop_ink();
        assert_eq!(inner, Some(Rect::new(0, 0, 30, 15)));
        assert_eq!(ctx.pop_ink(), None);
        assert_eq!(ctx.content_bottom, 15);
    }

    #[test]
    fn visibility_culls_and_shifts() {
        let mut ctx = context(100);
        ctx.scroll_y = 50;
        assert_eq!(ctx.visible(Rect::new(0, 60, 10, 10)), Some(Rect::new(0, 10, 10, 10)));
        assert_eq!(ctx.visible(Rect::new(0, 0, 10, 50)), None);
        assert_eq!(ctx.visible(Rect::new(0, 150, 10, 10)), None);
        ctx.pass = Pass::Measure;
        assert_eq!(ctx.visible(Rect::new(0, 60, 10, 10)), None);
    }

    #[test]
    fn huge_extents_saturate_instead_of_overflowing() {
        let mut ctx = context(100);
        ctx.place_inline(Rect::new(i32::MAX - 5, 0, 1 << 24, i32::MAX));
        assert_eq!(ctx.x, i32::MAX);
        assert_eq!(ctx.fit(1 << 24, 8), 0);
        assert_eq!(ctx.y, i32::MAX);
        assert!(ctx.visible(Rect::new(0, i32::MAX - 1, 10, 10)).is_none());
    }
}
