//! Style Engine: stylesheet parsing, selector matching and the cascade.
//!
//! [`StyleEngine::apply`] rebuilds its rule and variable tables from scratch on
//! every call, matches every rule against every element, orders the matches
//! by (specificity, source order) and writes the `var()`-resolved values into
//! each element's computed-style table. Later writes win, so the highest
//! priority declaration for a property is the one left behind.

use std::collections::HashMap;

use log::info;

use crate::dom::{Document, NodeId};

pub mod parser;
pub mod selector;
pub mod values;
pub mod variables;

pub use parser::{RuleSet, StyleRule};
pub use selector::{matches_selector, Selector, Specificity};
pub use values::{parse_color, Length, LengthContext};
pub use variables::resolve_vars;

/// Knobs for stylesheet interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleConfig {
    /// `@media (max-width: N)` blocks with `N` below this are skipped
    pub mobile_breakpoint: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 800,
        }
    }
}

/// Owns the per-navigation rule and variable tables.
#[derive(Debug, Clone, Default)]
pub struct StyleEngine {
    config: StyleConfig,
    rule_set: RuleSet,
}

impl StyleEngine {
    pub fn new(config: StyleConfig) -> Self {
        Self {
            config,
            rule_set: RuleSet::new(),
        }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Rules collected by the most recent [`StyleEngine::apply`].
    pub fn rules(&self) -> &[StyleRule] {
        self.rule_set.rules()
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.rule_set.variable(name)
    }

    /// Substitute `var()` references against the current variable table.
    pub fn resolve(&self, value: &str) -> String {
        resolve_vars(value, self.rule_set.variables())
    }

    /// Cascade `stylesheets` (in order) onto every element of `doc`.
    /// Returns the number of declarations written.
    pub fn apply<S: AsRef<str>>(&mut self, doc: &mut Document, stylesheets: &[S]) -> usize {
        self.rule_set.clear();
        for sheet in stylesheets {
            self.rule_set
                .parse_stylesheet(sheet.as_ref(), self.config.mobile_breakpoint);
        }

        let matches = self.collect_matches(doc);
        for &(_, _, node, index) in &matches {
            let rule = &self.rule_set.rules()[index];
            let value = self.resolve(&rule.value);
            if let Some(el) = doc.element_mut(node) {
                el.set_style(&rule.property, &value);
            }
        }

        info!(
            "applied {} declarations from {} rules",
            matches.len(),
            self.rule_set.rules().len()
        );
        matches.len()
    }

    /// Every (rule, node) match, sorted into cascade order.
    fn collect_matches(&self, doc: &Document) -> Vec<(Specificity, usize, NodeId, usize)> {
        let elements = doc.elements();
        let mut matched_nodes: HashMap<&str, Vec<NodeId>> = HashMap::new();
        let mut matches = Vec::new();
        for (index, rule) in self.rule_set.rules().iter().enumerate() {
            let nodes = matched_nodes
                .entry(rule.selector.as_str())
                .or_insert_with(|| match Selector::parse(&rule.selector) {
                    Some(selector) => elements
                        .iter()
                        .copied()
                        .filter(|id| selector.matches(doc, *id))
                        .collect(),
                    None => Vec::new(),
                });
            for &node in nodes.iter() {
                matches.push((rule.specificity, rule.order, node, index));
            }
        }
        matches.sort_by_key(|&(specificity, order, _, _)| (specificity, order));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse;

    fn styled(html: &str, css: &str) -> (Document, StyleEngine) {
        let mut doc = parse(html.as_bytes());
        let mut engine = StyleEngine::default();
        engine.apply(&mut doc, &[css]);
        (doc, engine)
    }

    fn style_of(doc: &Document, id: &str, property: &str) -> Option<String> {
        let node = doc.get_element_by_id(id)?;
        doc.get_style(node, property).map(str::to_string)
    }

    #[test]
    fn class_beats_type_regardless_of_order() {
        let (doc, _) = styled(
            r#"<p id="t" class="x">a</p>"#,
            ".x { color: blue } p { color: red }",
        );
        assert_eq!(style_of(&doc, "t", "color").as_deref(), Some("blue"));
    }

    #[test]
    fn later_rule_wins_on_equal_specificity() {
        let (doc, _) = styled(r#"<p id="t">a</p>"#, "p { color: red } p { color: green }");
        assert_eq!(style_of(&doc, "t", "color").as_deref(), Some("green"));
    }

    #[test]
    fn important_does_not_elevate() {
        let (doc, _) = styled(
            r#"<p id="t">a</p>"#,
            "p { color: red !important } p { color: green }",
        );
        assert_eq!(style_of(&doc, "t", "color").as_deref(), Some("green"));
    }

    #[test]
    fn variables_resolve_at_apply_time() {
        let (doc, engine) = styled(
            r#"<p id="a">x</p><p id="b" class="m">y</p>"#,
            ":root { --c: red } p { color: var(--c) } .m { color: var(--missing, green) }",
        );
        assert_eq!(style_of(&doc, "a", "color").as_deref(), Some("red"));
        assert_eq!(style_of(&doc, "b", "color").as_deref(), Some("green"));
        assert_eq!(engine.variable("--c"), Some("red"));
        assert_eq!(engine.resolve("1px solid var(--c)"), "1px solid red");
    }

    #[test]
    fn stylesheets_cascade_in_sequence() {
        let mut doc = parse(br#"<div id="d">x</div>"#);
        let mut engine = StyleEngine::default();
        engine.apply(&mut doc, &["div { width: 10px }", "div { width: 20px }"]);
        assert_eq!(style_of(&doc, "d", "width").as_deref(), Some("20px"));
    }

    #[test]
    fn apply_twice_is_idempotent() {
        let css = "p { margin: 1px 2px } .x { color: blue }";
        let mut doc = parse(br#"<p id="t" class="x">a</p>"#);
        let mut engine = StyleEngine::default();
        let first = engine.apply(&mut doc, &[css]);
        let node = doc.get_element_by_id("t").unwrap();
        let before: Vec<(String, String)> = doc
            .element(node)
            .unwrap()
            .styles()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let second = engine.apply(&mut doc, &[css]);
        let after: Vec<(String, String)> = doc
            .element(node)
            .unwrap()
            .styles()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(first, second);
        assert_eq!(engine.rules().len(), 5);
        assert_eq!(before, after);
    }

    #[test]
    fn narrow_media_queries_follow_breakpoint() {
        let css = "@media (max-width: 600px) { p { color: red } }";
        let mut doc = parse(br#"<p id="t">a</p>"#);
        StyleEngine::new(StyleConfig { mobile_breakpoint: 500 }).apply(&mut doc, &[css]);
        assert_eq!(style_of(&doc, "t", "color").as_deref(), Some("red"));

        let mut doc = parse(br#"<p id="t">a</p>"#);
        StyleEngine::default().apply(&mut doc, &[css]);
        assert_eq!(style_of(&doc, "t", "color"), None);
    }
}
