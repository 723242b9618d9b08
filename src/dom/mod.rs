//! Document model: an arena-backed node tree with per-element attribute,
//! computed-style and geometry tables.
//!
//! Nodes live in an [`indextree::Arena`]; the arena owns every node and parent
//! links are plain arena handles, so the tree never forms ownership cycles.
//! Dropping a [`Document`] releases every node, including image handles.

use indextree::Arena;
use serde::Serialize;

pub use indextree::NodeId;

use crate::{Error, Result};

mod printing;
mod query;

/// Tag of the synthetic root every parsed document hangs from.
pub const ROOT_TAG: &str = "document";

/// Pixel rectangle in document space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()).saturating_sub(x),
            height: self.bottom().max(other.bottom()).saturating_sub(y),
        }
    }

    /// Inclusive containment, matching how click targets are resolved.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Handle to an image decoded by the asset collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    /// Opaque key the paint collaborator uses to find its texture
    pub key: u64,
    /// Intrinsic width in pixels
    pub width: u32,
    /// Intrinsic height in pixels
    pub height: u32,
}

/// An element node.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    href: Option<String>,
    src: Option<String>,
    /// Geometry written by the most recent layout pass
    pub rect: Rect,
    /// Decoded image for replaced content, if one was supplied
    pub image: Option<ImageHandle>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Lower-cased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in first-insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert or overwrite an attribute. An existing name keeps its position.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "href" => self.href = Some(value.to_string()),
            "src" => self.src = Some(value.to_string()),
            _ => {}
        }
        upsert(&mut self.attributes, name, value);
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    /// Computed styles in first-insertion order.
    pub fn styles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        upsert(&mut self.styles, property.to_ascii_lowercase(), value);
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Whitespace-delimited token check against the `class` attribute.
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|c| c.split_ascii_whitespace().any(|t| t == class))
            .unwrap_or(false)
    }
}

fn upsert(table: &mut Vec<(String, String)>, key: String, value: &str) {
    if let Some(slot) = table.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value.to_string();
    } else {
        table.push((key, value.to_string()));
    }
}

/// A node of the document tree.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }
}

/// A parsed document. Created per navigation and dropped as a whole.
#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the synthetic root.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(Node::Element(Element::new(ROOT_TAG)));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// True when the root has no children, i.e. nothing can be rendered.
    pub fn is_empty(&self) -> bool {
        self.root.children(&self.arena).next().is_none()
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.root.descendants(&self.arena).count()
    }

    /// Allocate a detached element; attach it with [`Document::append_child`].
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(Node::Element(Element::new(tag)))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(Node::Text(text.to_string()))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.element(parent).is_none() {
            return Err(Error::InvalidNode(format!("{parent:?} cannot hold children")));
        }
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|e| Error::InvalidNode(e.to_string()))
    }

    /// Detach `node` and drop its subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        if node == self.root || self.node(node).is_none() {
            return Err(Error::InvalidNode(format!("{node:?} cannot be removed")));
        }
        node.remove_subtree(&mut self.arena);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena
            .get(id)
            .filter(|n| !n.is_removed())
            .map(|n| n.get())
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.arena
            .get_mut(id)
            .filter(|n| !n.is_removed())
            .and_then(|n| n.get_mut().as_element_mut())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::as_text)
    }

    /// Tag of an element node, `None` for text.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.ancestors(&self.arena).skip(1)
    }

    /// `id` and all of its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    /// Every element in document order, root first.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|id| self.element(*id).is_some())
            .collect()
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    /// Mutation entry point for script bindings; takes effect on the next render.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.expect_element_mut(id)?.set_attribute(name, value);
        Ok(())
    }

    pub fn get_style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.style(property))
    }

    /// Mutation entry point for script bindings; takes effect on the next render.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> Result<()> {
        self.expect_element_mut(id)?.set_style(property, value);
        Ok(())
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.element(id).map(|el| el.rect)
    }

    /// Attach a decoded image supplying the element's intrinsic size.
    pub fn set_image(&mut self, id: NodeId, image: ImageHandle) -> Result<()> {
        self.expect_element_mut(id)?.image = Some(image);
        Ok(())
    }

    /// Zero every element's geometry ahead of a layout pass.
    pub(crate) fn reset_geometry(&mut self) {
        for id in self.elements() {
            if let Some(el) = self.element_mut(id) {
                el.rect = Rect::default();
            }
        }
    }

    fn expect_element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.element_mut(id)
            .ok_or_else(|| Error::InvalidNode(format!("{id:?} is not a live element")))
    }
}
