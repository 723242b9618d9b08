//! Forgiving single-pass HTML tree builder.
//!
//! The parser never fails: unmatched closing tags are ignored, unknown tags
//! become generic elements and anything left unterminated at end of input is
//! dropped.

use log::{debug, trace};

use crate::dom::{Document, NodeId};

mod entities;

pub use entities::decode_entities;

/// Elements that never receive children.
pub const VOID_ELEMENTS: &[&str] = &["meta", "link", "img", "br", "input", "hr"];

/// Elements whose content is opaque character data.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

/// Parse raw document bytes into a [`Document`].
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn parse(bytes: &[u8]) -> Document {
    let source = String::from_utf8_lossy(bytes);
    let mut builder = TreeBuilder::new();
    builder.feed(&source);
    let doc = builder.finish();
    debug!("parsed document with {} nodes", doc.len());
    doc
}

struct TreeBuilder {
    doc: Document,
    current: NodeId,
    text: String,
    tag: String,
    in_tag: bool,
    quote: Option<char>,
}

impl TreeBuilder {
    fn new() -> Self {
        let doc = Document::new();
        let current = doc.root();
        Self {
            doc,
            current,
            text: String::new(),
            tag: String::new(),
            in_tag: false,
            quote: None,
        }
    }

    fn feed(&mut self, src: &str) {
        for (i, c) in src.char_indices() {
            if self.in_tag {
                self.tag_char(c);
                continue;
            }
            if c != '<' {
                self.text.push(c);
                continue;
            }
            if let Some(raw) = self.raw_text_tag() {
                let closing = format!("</{raw}");
                if !starts_with_ignore_case(&src[i..], &closing) {
                    self.text.push(c);
                    continue;
                }
            }
            self.flush_text();
            self.in_tag = true;
            self.tag.clear();
        }
    }

    fn finish(mut self) -> Document {
        if self.in_tag {
            trace!("dropping unterminated tag <{}", self.tag);
        } else {
            self.flush_text();
        }
        self.doc
    }

    fn tag_char(&mut self, c: char) {
        match self.quote {
            Some(q) => {
                if c == q {
                    self.quote = None;
                }
                self.tag.push(c);
            }
            None if (c == '"' || c == '\'') && self.expects_value() => {
                self.quote = Some(c);
                self.tag.push(c);
            }
            None if c == '>' => {
                if self.tag.starts_with("!--") && !self.tag.ends_with("--") {
                    self.tag.push(c);
                    return;
                }
                self.in_tag = false;
                let tag = std::mem::take(&mut self.tag);
                self.handle_tag(&tag);
            }
            None => self.tag.push(c),
        }
    }

    // Quotes only delimit values directly after `=`; elsewhere they are
    // literal (comments, doctypes, stray apostrophes).
    fn expects_value(&self) -> bool {
        !self.tag.starts_with(['!', '?']) && self.tag.trim_end().ends_with('=')
    }

    fn raw_text_tag(&self) -> Option<&'static str> {
        let tag = self.doc.tag(self.current)?;
        RAW_TEXT_ELEMENTS.iter().copied().find(|raw| *raw == tag)
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.text);
        if raw.chars().all(|c| c.is_ascii_whitespace()) {
            return;
        }
        let content = if self.raw_text_tag().is_some() {
            raw
        } else {
            decode_entities(&collapse_whitespace(&raw))
        };
        let node = self.doc.create_text(&content);
        self.attach(node);
    }

    fn handle_tag(&mut self, source: &str) {
        let body = source.trim();
        if let Some(closing) = body.strip_prefix('/') {
            let name = closing.split_ascii_whitespace().next().unwrap_or("");
            self.close(name);
            return;
        }
        if body.starts_with(['!', '?']) {
            return;
        }

        let (body, self_closing) = match body.strip_suffix('/') {
            Some(stripped) => (stripped.trim_end(), true),
            None => (body, false),
        };
        let (name, attr_source) = match body.find(|c: char| c.is_ascii_whitespace()) {
            Some(split) => (&body[..split], &body[split..]),
            None => (body, ""),
        };
        if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            trace!("ignoring malformed tag <{source}>");
            return;
        }

        let name = name.to_ascii_lowercase();
        let node = self.doc.create_element(&name);
        if let Some(el) = self.doc.element_mut(node) {
            for (key, value) in parse_attributes(attr_source) {
                el.set_attribute(&key, &value);
            }
        }
        self.attach(node);
        if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.current = node;
        }
    }

    /// Any close tag moves the insertion point up one level, whatever its
    /// name. The root is never closed.
    fn close(&mut self, name: &str) {
        match self.doc.parent(self.current) {
            Some(parent) => self.current = parent,
            None => trace!("ignoring </{name}> at the document root"),
        }
    }

    fn attach(&mut self, node: NodeId) {
        // `current` is always an element, so appending cannot fail
        let _ = self.doc.append_child(self.current, node);
    }
}

/// Collapse runs of ASCII whitespace to one space and trim the ends.
fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Parse `name`, `name=value`, `name="value"` and `name='value'` pairs.
fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = source.chars().collect();
    let mut attrs = Vec::new();
    let mut i = 0;
    loop {
        while i < chars.len() && (chars[i].is_ascii_whitespace() || chars[i] == '/') {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_ascii_whitespace() && chars[i] != '=' {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect();
        while i < chars.len() && chars[i].is_ascii_whitespace() {
            i += 1;
        }

        let mut value = String::new();
        if i < chars.len() && chars[i] == '=' {
            i += 1;
            while i < chars.len() && chars[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let quote = chars[i];
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    value.push(chars[i]);
                    i += 1;
                }
                i += 1;
            } else {
                while i < chars.len() && !chars[i].is_ascii_whitespace() {
                    value.push(chars[i]);
                    i += 1;
                }
            }
        }

        if !name.is_empty() {
            attrs.push((name.to_ascii_lowercase(), decode_entities(&value)));
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(doc: &Document, tag: &str) -> NodeId {
        doc.elements_by_tag_name(tag)[0]
    }

    #[test]
    fn void_elements_do_not_nest() {
        let doc = parse(b"<p>a<br>b</p>");
        let p = first_element(&doc, "p");
        let children: Vec<_> = doc.children(p).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), Some("a"));
        assert_eq!(doc.tag(children[1]), Some("br"));
        assert_eq!(doc.children(children[1]).count(), 0);
        assert_eq!(doc.text(children[2]), Some("b"));
    }

    #[test]
    fn whitespace_collapses_and_blank_text_is_dropped() {
        let doc = parse(b"<div>\n  <p>  hello   world  </p>\n</div>");
        let div = first_element(&doc, "div");
        assert_eq!(doc.children(div).count(), 1);
        let p = first_element(&doc, "p");
        let texts: Vec<_> = doc.children(p).filter_map(|c| doc.text(c)).collect();
        assert_eq!(texts, vec!["hello world"]);
    }

    #[test]
    fn entities_decode_after_collapsing() {
        let doc = parse(b"<p>fish &amp;&nbsp;chips &#169;</p>");
        let p = first_element(&doc, "p");
        let text = doc.children(p).next().and_then(|c| doc.text(c)).unwrap();
        assert_eq!(text, "fish &\u{a0}chips ?");
    }

    #[test]
    fn attributes_parse_in_all_quoting_styles() {
        let doc = parse(br#"<a href="/x?a=1&amp;b=2" title='it''s' data-n=7 hidden>t</a>"#);
        let a = first_element(&doc, "a");
        let el = doc.element(a).unwrap();
        assert_eq!(el.href(), Some("/x?a=1&b=2"));
        assert_eq!(el.attribute("title"), Some("it"));
        assert_eq!(el.attribute("data-n"), Some("7"));
        assert_eq!(el.attribute("hidden"), Some(""));
    }

    #[test]
    fn quoted_values_may_contain_angle_brackets() {
        let doc = parse(br#"<div title="a>b"><span>x</span></div>"#);
        let div = first_element(&doc, "div");
        assert_eq!(doc.get_attribute(div, "title"), Some("a>b"));
        assert_eq!(doc.tag(doc.children(div).next().unwrap()), Some("span"));
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let doc = parse(b"<!DOCTYPE html><!-- a > b --><?xml?><p>x</p>");
        let tags: Vec<_> = doc.children(doc.root()).filter_map(|c| doc.tag(c)).collect();
        assert_eq!(tags, vec!["p"]);
    }

    #[test]
    fn style_and_script_bodies_are_opaque() {
        let doc = parse(b"<style>p > a { color: red }</style><script>if (a < b) { x = '</div>'; }</SCRIPT><p>after</p>");
        let style = first_element(&doc, "style");
        let css = doc.children(style).next().and_then(|c| doc.text(c)).unwrap();
        assert_eq!(css, "p > a { color: red }");
        let script = first_element(&doc, "script");
        let js = doc.children(script).next().and_then(|c| doc.text(c)).unwrap();
        assert_eq!(js, "if (a < b) { x = '</div>'; }");
        assert_eq!(doc.parent(first_element(&doc, "p")), Some(doc.root()));
    }

    #[test]
    fn close_tags_pop_one_level_regardless_of_name() {
        let doc = parse(b"<div><p>one</span>two</p></div><p>three</p>");
        let div = first_element(&doc, "div");
        let p = first_element(&doc, "p");
        let texts: Vec<_> = doc.children(p).filter_map(|c| doc.text(c)).collect();
        assert_eq!(texts, vec!["one"]);
        let div_texts: Vec<_> = doc.children(div).filter_map(|c| doc.text(c)).collect();
        assert_eq!(div_texts, vec!["two"]);
        let ps = doc.elements_by_tag_name("p");
        assert_eq!(doc.parent(ps[1]), Some(doc.root()));
    }

    #[test]
    fn close_tags_never_pass_the_root() {
        let doc = parse(b"</div><p>a</p></p></section><span>s</span>");
        let span = first_element(&doc, "span");
        assert_eq!(doc.parent(span), Some(doc.root()));
        assert_eq!(doc.parent(first_element(&doc, "p")), Some(doc.root()));
    }

    #[test]
    fn close_tag_inside_nested_inline_only_leaves_the_innermost() {
        let doc = parse(b"<div><p><b>bold</div><span>s</span>");
        let span = first_element(&doc, "span");
        assert_eq!(doc.parent(span), Some(first_element(&doc, "p")));
    }

    #[test]
    fn self_closing_and_uppercase_tags() {
        let doc = parse(b"<DIV CLASS=box><widget/><p>x</p></DIV>");
        let div = first_element(&doc, "div");
        assert_eq!(doc.get_attribute(div, "class"), Some("box"));
        let widget = first_element(&doc, "widget");
        assert_eq!(doc.children(widget).count(), 0);
        assert_eq!(doc.parent(first_element(&doc, "p")), Some(div));
    }

    #[test]
    fn unterminated_tag_is_truncated() {
        let doc = parse(b"<p>kept</p><img src=\"a.png");
        assert_eq!(doc.elements_by_tag_name("img").len(), 0);
        assert_eq!(doc.elements_by_tag_name("p").len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_document() {
        assert!(parse(b"").is_empty());
        assert!(parse(b"   \n ").is_empty());
    }
}
