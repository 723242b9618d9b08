//! Lookups and class-list helpers used by script bindings and hit testing.

use super::{Document, NodeId};
use crate::css::selector::matches_selector;
use crate::Result;

impl Document {
    /// First element in document order whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|n| self.element(*n).and_then(|el| el.id()) == Some(id))
    }

    pub fn query_selector(&self, selectors: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|n| matches_selector(self, *n, selectors))
    }

    pub fn query_selector_all(&self, selectors: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|n| matches_selector(self, *n, selectors))
            .collect()
    }

    /// Elements with the given tag in document order; `*` matches every
    /// element except the synthetic root.
    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .skip(1)
            .filter(|n| {
                self.tag(*n)
                    .is_some_and(|t| tag == "*" || t.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    /// Elements carrying every class in the whitespace-separated `classes`.
    pub fn elements_by_class_name(&self, classes: &str) -> Vec<NodeId> {
        let wanted: Vec<&str> = classes.split_ascii_whitespace().collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.descendants(self.root)
            .filter(|n| {
                self.element(*n)
                    .is_some_and(|el| wanted.iter().all(|c| el.has_class(c)))
            })
            .collect()
    }

    /// Concatenated text of `node`'s subtree, space separated.
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .filter_map(|n| self.text(n))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text of the first `<title>`, if any.
    pub fn title(&self) -> Option<String> {
        self.elements_by_tag_name("title")
            .first()
            .map(|t| self.text_content(*t))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.elements_by_tag_name("body").first().copied()
    }

    /// Deepest element whose geometry contains the document-space point.
    /// Later siblings paint over earlier ones, so they are tried first.
    pub fn element_at(&self, x: i32, y: i32) -> Option<NodeId> {
        self.hit_test(self.root, x, y)
    }

    fn hit_test(&self, node: NodeId, x: i32, y: i32) -> Option<NodeId> {
        let children: Vec<NodeId> = self.children(node).collect();
        for child in children.into_iter().rev() {
            if let Some(hit) = self.hit_test(child, x, y) {
                return Some(hit);
            }
        }
        let el = self.element(node)?;
        (node != self.root && !el.rect.is_empty() && el.rect.contains(x, y)).then_some(node)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    /// Add `class` unless already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        if self.has_class(node, class) {
            return Ok(());
        }
        let current = self.get_attribute(node, "class").unwrap_or("").trim();
        let updated = if current.is_empty() {
            class.to_string()
        } else {
            format!("{current} {class}")
        };
        self.set_attribute(node, "class", &updated)
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        let current = self.get_attribute(node, "class").unwrap_or("");
        let updated = current
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(node, "class", &updated)
    }

    /// Flip `class` and return whether it is now present.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> Result<bool> {
        if self.has_class(node, class) {
            self.remove_class(node, class)?;
            Ok(false)
        } else {
            self.add_class(node, class)?;
            Ok(true)
        }
    }
}
