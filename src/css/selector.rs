//! Selector parsing, matching and specificity.
//!
//! Combinators (` `, `>`, `+`, `~`) are all matched as "some ancestor": a
//! chain matches when its last compound matches the node and every earlier
//! compound matches a strict ancestor, consumed right to left while walking up.

use std::fmt;

use serde::Serialize;

use crate::dom::{Document, Element, NodeId};

/// Characters that end a simple selector name.
const NAME_STOP: &[char] = &[' ', '.', '#', ':', '[', '>', '+', '~'];

/// Selector specificity as (ids, classes, types), ordered lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Specificity {
    /// `#id` selectors
    pub ids: u32,
    /// `.class`, `[attr]` and single-colon pseudo-classes
    pub classes: u32,
    /// type selectors and `::pseudo-elements`
    pub types: u32,
}

impl Specificity {
    pub fn new(ids: u32, classes: u32, types: u32) -> Self {
        Self { ids, classes, types }
    }

    /// Score a complete selector string. `*` and combinators weigh nothing.
    pub fn of(selector: &str) -> Self {
        let chars: Vec<char> = selector.chars().collect();
        let mut spec = Specificity::default();
        let mut i = 0;
        let skip_name = |mut i: usize| {
            while i < chars.len() && !NAME_STOP.contains(&chars[i]) {
                i += 1;
            }
            i
        };
        while i < chars.len() {
            match chars[i] {
                '#' => {
                    spec.ids += 1;
                    i = skip_name(i + 1);
                }
                '.' => {
                    spec.classes += 1;
                    i = skip_name(i + 1);
                }
                '[' => {
                    spec.classes += 1;
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                    i += 1;
                }
                ':' => {
                    i += 1;
                    if chars.get(i) == Some(&':') {
                        spec.types += 1;
                        i += 1;
                    } else {
                        spec.classes += 1;
                    }
                    while i < chars.len() && !NAME_STOP.contains(&chars[i]) && chars[i] != '(' {
                        i += 1;
                    }
                    if chars.get(i) == Some(&'(') {
                        i = skip_parens(&chars, i);
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    spec.types += 1;
                    i = skip_name(i);
                }
                _ => i += 1,
            }
        }
        spec
    }

    /// Weighted scalar form, `ids * 10000 + classes * 100 + types`.
    pub fn value(&self) -> u32 {
        self.ids * 10_000 + self.classes * 100 + self.types
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.ids, self.classes, self.types)
    }
}

/// Index just past the parenthesised group opening at `open`.
fn skip_parens(chars: &[char], open: usize) -> usize {
    let mut depth = 0;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Universal,
    Type(String),
    Class(String),
    Id(String),
    Attribute {
        name: String,
        test: Option<(AttrOp, String)>,
    },
    PseudoClass(String),
    PseudoElement,
}

/// A parsed complex selector (one entry of a selector list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Vec<Simple>>,
}

impl Selector {
    /// Parse a single complex selector. Returns `None` when nothing selectable
    /// remains, e.g. an empty string.
    pub fn parse(source: &str) -> Option<Self> {
        let compounds: Vec<Vec<Simple>> = split_compounds(source)
            .into_iter()
            .map(parse_compound)
            .filter(|c| !c.is_empty())
            .collect();
        if compounds.is_empty() {
            None
        } else {
            Some(Self { compounds })
        }
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !matches_compound(doc, node, last) {
            return false;
        }
        let mut pending = rest.iter().rev().peekable();
        for ancestor in doc.ancestors(node) {
            match pending.peek() {
                None => break,
                Some(compound) if matches_compound(doc, ancestor, compound) => {
                    pending.next();
                }
                Some(_) => {}
            }
        }
        pending.peek().is_none()
    }
}

/// True when `node` matches any selector of the comma-separated `selectors`.
pub fn matches_selector(doc: &Document, node: NodeId, selectors: &str) -> bool {
    split_list(selectors)
        .iter()
        .filter_map(|s| Selector::parse(s))
        .any(|s| s.matches(doc, node))
}

/// Split on `delimiter` outside brackets, parentheses and quotes, trimming
/// each piece and dropping empty ones.
pub(crate) fn split_top_level(source: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth -= 1,
            (None, _) if c == delimiter && depth <= 0 => {
                parts.push(&source[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a selector list on top-level commas.
pub(crate) fn split_list(selectors: &str) -> Vec<&str> {
    split_top_level(selectors, ',')
}

fn split_compounds(selector: &str) -> Vec<&str> {
    let mut compounds = Vec::new();
    let mut depth = 0i32;
    let mut start = None;
    for (i, c) in selector.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            _ => {}
        }
        let separator = depth <= 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~'));
        // `~=` inside an attribute test is guarded by depth
        match (separator, start) {
            (true, Some(s)) => {
                compounds.push(&selector[s..i]);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        compounds.push(&selector[s..]);
    }
    compounds
}

fn parse_compound(source: &str) -> Vec<Simple> {
    let chars: Vec<char> = source.chars().collect();
    let mut simples = Vec::new();
    let mut i = 0;
    let read_name = |start: usize| {
        let mut end = start;
        while end < chars.len() && !NAME_STOP.contains(&chars[end]) && chars[end] != '(' {
            end += 1;
        }
        (chars[start..end].iter().collect::<String>(), end)
    };
    while i < chars.len() {
        match chars[i] {
            '*' => {
                simples.push(Simple::Universal);
                i += 1;
            }
            '.' => {
                let (name, end) = read_name(i + 1);
                simples.push(Simple::Class(name));
                i = end;
            }
            '#' => {
                let (name, end) = read_name(i + 1);
                simples.push(Simple::Id(name));
                i = end;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|p| i + p)
                    .unwrap_or(chars.len());
                let inner: String = chars[i + 1..close].iter().collect();
                simples.push(parse_attribute(&inner));
                i = close + 1;
            }
            ':' => {
                let element = chars.get(i + 1) == Some(&':');
                let start = if element { i + 2 } else { i + 1 };
                let (name, mut end) = read_name(start);
                if chars.get(end) == Some(&'(') {
                    end = skip_parens(&chars, end);
                }
                simples.push(if element {
                    Simple::PseudoElement
                } else {
                    Simple::PseudoClass(name.to_ascii_lowercase())
                });
                i = end;
            }
            _ => {
                let (name, end) = read_name(i);
                if end == i {
                    // stray character such as an unbalanced `(`
                    i += 1;
                    continue;
                }
                simples.push(Simple::Type(name.to_ascii_lowercase()));
                i = end;
            }
        }
    }
    simples
}

fn parse_attribute(inner: &str) -> Simple {
    let Some(eq) = inner.find('=') else {
        return Simple::Attribute {
            name: inner.trim().to_ascii_lowercase(),
            test: None,
        };
    };
    let (head, value) = (&inner[..eq], &inner[eq + 1..]);
    let (name, op) = match head.chars().last() {
        Some('~') => (&head[..head.len() - 1], AttrOp::Includes),
        Some('|') => (&head[..head.len() - 1], AttrOp::DashMatch),
        Some('^') => (&head[..head.len() - 1], AttrOp::Prefix),
        Some('$') => (&head[..head.len() - 1], AttrOp::Suffix),
        Some('*') => (&head[..head.len() - 1], AttrOp::Substring),
        _ => (head, AttrOp::Equals),
    };
    let value = value.trim();
    let value = value
        .strip_prefix(['"', '\''])
        .and_then(|v| v.strip_suffix(['"', '\'']))
        .unwrap_or(value);
    Simple::Attribute {
        name: name.trim().to_ascii_lowercase(),
        test: Some((op, value.to_string())),
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &[Simple]) -> bool {
    let Some(el) = doc.element(node) else {
        return false;
    };
    compound.iter().all(|simple| matches_simple(doc, node, el, simple))
}

fn matches_simple(doc: &Document, node: NodeId, el: &Element, simple: &Simple) -> bool {
    match simple {
        Simple::Universal => true,
        Simple::Type(tag) => el.tag() == tag.as_str(),
        Simple::Class(class) => el.has_class(class),
        Simple::Id(id) => el.id() == Some(id.as_str()),
        Simple::Attribute { name, test } => {
            let Some(actual) = el.attribute(name) else {
                return false;
            };
            match test {
                None => true,
                Some((op, expected)) => matches_attribute(*op, actual, expected),
            }
        }
        Simple::PseudoClass(name) => matches_pseudo_class(doc, node, el, name),
        Simple::PseudoElement => false,
    }
}

fn matches_attribute(op: AttrOp, actual: &str, expected: &str) -> bool {
    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => actual.split_ascii_whitespace().any(|t| t == expected),
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

fn matches_pseudo_class(doc: &Document, node: NodeId, el: &Element, name: &str) -> bool {
    match name {
        "root" => el.tag() == "html",
        "first-child" => sibling_elements(doc, node).first() == Some(&node),
        "last-child" => sibling_elements(doc, node).last() == Some(&node),
        "link" | "any-link" => el.tag() == "a" && el.href().is_some(),
        _ => false,
    }
}

fn sibling_elements(doc: &Document, node: NodeId) -> Vec<NodeId> {
    match doc.parent(node) {
        Some(parent) => doc
            .children(parent)
            .filter(|c| doc.element(*c).is_some())
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse;

    fn find(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).expect("element present")
    }

    #[test]
    fn specificity_counts_each_kind() {
        assert_eq!(Specificity::of("p"), Specificity::new(0, 0, 1));
        assert_eq!(Specificity::of(".x"), Specificity::new(0, 1, 0));
        assert_eq!(Specificity::of("#main .nav a:hover"), Specificity::new(1, 2, 1));
        assert_eq!(Specificity::of("a[href^='http'] > span::before"), Specificity::new(0, 1, 3));
        assert_eq!(Specificity::of("li:not(.done)"), Specificity::new(0, 1, 1));
        assert_eq!(Specificity::of("*"), Specificity::default());
        assert_eq!(Specificity::of("#a.b c").value(), 10_101);
    }

    #[test]
    fn specificity_orders_lexicographically() {
        assert!(Specificity::new(1, 0, 0) > Specificity::new(0, 200, 0));
        assert!(Specificity::new(0, 1, 0) > Specificity::new(0, 0, 9));
    }

    #[test]
    fn compound_and_descendant_matching() {
        let doc = parse(br#"<div id="outer" class="card wide"><ul><li id="item" class="x">a</li></ul></div>"#);
        let item = find(&doc, "item");
        assert!(matches_selector(&doc, item, "li"));
        assert!(matches_selector(&doc, item, "LI.x"));
        assert!(matches_selector(&doc, item, "#item"));
        assert!(matches_selector(&doc, item, "div li"));
        assert!(matches_selector(&doc, item, ".card.wide ul > li"));
        assert!(matches_selector(&doc, item, "div ~ li"));
        assert!(matches_selector(&doc, item, "p, li.x"));
        assert!(!matches_selector(&doc, item, "ul div li"));
        assert!(!matches_selector(&doc, item, ".card.narrow li"));
        assert!(!matches_selector(&doc, item, "li.xx"));
        assert!(!matches_selector(&doc, find(&doc, "outer"), "div div"));
    }

    #[test]
    fn attribute_selectors() {
        let doc = parse(br#"<a id="l" href="https://example.com/a.pdf" rel="noopener external" lang="en-GB">x</a>"#);
        let link = find(&doc, "l");
        assert!(matches_selector(&doc, link, "[href]"));
        assert!(matches_selector(&doc, link, "a[href^=\"https\"]"));
        assert!(matches_selector(&doc, link, "a[href$='.pdf']"));
        assert!(matches_selector(&doc, link, "[href*=example]"));
        assert!(matches_selector(&doc, link, "[rel~=external]"));
        assert!(matches_selector(&doc, link, "[lang|=en]"));
        assert!(matches_selector(&doc, link, "[id=l]"));
        assert!(!matches_selector(&doc, link, "[rel~=noop]"));
        assert!(!matches_selector(&doc, link, "[title]"));
        assert!(!matches_selector(&doc, link, "[href^='']"));
    }

    #[test]
    fn pseudo_classes() {
        let doc = parse(br#"<html><body><p id="a">1</p><p id="b">2</p><a id="c" href="/">3</a><a id="d">4</a></body></html>"#);
        let html = doc.elements_by_tag_name("html")[0];
        assert!(matches_selector(&doc, html, ":root"));
        assert!(matches_selector(&doc, find(&doc, "a"), "p:first-child"));
        assert!(!matches_selector(&doc, find(&doc, "b"), "p:first-child"));
        assert!(matches_selector(&doc, find(&doc, "d"), ":last-child"));
        assert!(matches_selector(&doc, find(&doc, "c"), "a:link"));
        assert!(!matches_selector(&doc, find(&doc, "d"), "a:any-link"));
        assert!(!matches_selector(&doc, find(&doc, "c"), "a:hover"));
        assert!(!matches_selector(&doc, find(&doc, "a"), "p::before"));
    }

    #[test]
    fn text_nodes_and_empty_selectors_never_match() {
        let doc = parse(b"<p>t</p>");
        let p = doc.elements_by_tag_name("p")[0];
        let text = doc.children(p).next().unwrap();
        assert!(!matches_selector(&doc, text, "*"));
        assert!(!matches_selector(&doc, p, ""));
        assert!(Selector::parse("  ").is_none());
    }

    #[test]
    fn split_respects_brackets_and_quotes() {
        assert_eq!(split_list("a, [data-x='1,2'], b"), vec!["a", "[data-x='1,2']", "b"]);
        assert_eq!(
            split_top_level("color: red; background: url(a;b)", ';'),
            vec!["color: red", "background: url(a;b)"]
        );
    }
}
