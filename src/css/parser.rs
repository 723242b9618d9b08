//! Stylesheet text to [`StyleRule`]s and custom variables.

use std::collections::HashMap;

use log::{debug, trace};
use serde::Serialize;

use super::selector::{split_list, split_top_level, Specificity};
use super::values::Length;

/// Pixels per `em` inside media queries.
const MEDIA_EM_PX: f32 = 16.0;

/// One declaration bound to one selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleRule {
    pub selector: String,
    pub property: String,
    /// Declared value with `!important` stripped; `var()` is resolved at apply time
    pub value: String,
    pub specificity: Specificity,
    /// Source order across every stylesheet fed to the same [`RuleSet`]
    pub order: usize,
}

/// Rules and custom variables collected from a sequence of stylesheets.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<StyleRule>,
    variables: HashMap<String, String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.variables.clear();
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// Raw value of a custom variable, e.g. `variable("--accent")`.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Append the rules of one stylesheet. `@media` blocks with a `max-width`
    /// below `mobile_breakpoint` pixels are skipped.
    pub fn parse_stylesheet(&mut self, css: &str, mobile_breakpoint: u32) {
        let (rules_before, vars_before) = (self.rules.len(), self.variables.len());
        let css = strip_comments(css);
        self.parse_blocks(&css, mobile_breakpoint);
        debug!(
            "stylesheet parsed: {} rules, {} variables",
            self.rules.len() - rules_before,
            self.variables.len().saturating_sub(vars_before)
        );
    }

    fn parse_blocks(&mut self, css: &str, mobile_breakpoint: u32) {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut prelude_start = 0;
        let mut block_start = 0;
        for (i, c) in css.char_indices() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                continue;
            }
            match (depth, c) {
                (_, '"' | '\'') => quote = Some(c),
                (0, '{') => {
                    depth = 1;
                    block_start = i + 1;
                }
                (0, '}') => {
                    trace!("dropping stray '}}'");
                    prelude_start = i + 1;
                }
                (0, ';') => {
                    let statement = css[prelude_start..i].trim();
                    if !statement.is_empty() {
                        trace!("dropping statement '{statement}'");
                    }
                    prelude_start = i + 1;
                }
                (_, '{') => depth += 1,
                (_, '}') => {
                    depth -= 1;
                    if depth == 0 {
                        let prelude = &css[prelude_start..block_start - 1];
                        self.emit_block(prelude, &css[block_start..i], mobile_breakpoint);
                        prelude_start = i + 1;
                    }
                }
                _ => {}
            }
        }
        if depth > 0 {
            trace!("dropping unterminated block");
        }
    }

    fn emit_block(&mut self, prelude: &str, body: &str, mobile_breakpoint: u32) {
        let prelude = prelude.trim();
        let Some(at_rule) = prelude.strip_prefix('@') else {
            self.add_block(prelude, body);
            return;
        };
        let name = at_rule
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match name.as_str() {
            "media" if media_applies(at_rule, mobile_breakpoint) => {
                self.parse_blocks(body, mobile_breakpoint)
            }
            "media" => trace!("skipping @{at_rule}"),
            "supports" => self.parse_blocks(body, mobile_breakpoint),
            _ => trace!("dropping @{name} block"),
        }
    }

    fn add_block(&mut self, selectors: &str, body: &str) {
        let declarations: Vec<(String, String)> = split_top_level(body, ';')
            .into_iter()
            .filter_map(parse_declaration)
            .collect();
        for selector in split_list(selectors) {
            for (name, value) in &declarations {
                self.add_declaration(selector, name, value);
            }
        }
    }

    fn add_declaration(&mut self, selector: &str, name: &str, value: &str) {
        if name.starts_with("--") {
            if is_variable_scope(selector) {
                self.variables.insert(name.to_string(), value.to_string());
            } else {
                trace!("ignoring {name} outside :root scope ({selector})");
            }
            return;
        }
        let specificity = Specificity::of(selector);
        for (property, value) in expand_shorthand(name, value) {
            let order = self.rules.len();
            self.rules.push(StyleRule {
                selector: selector.to_string(),
                property,
                value,
                specificity,
                order,
            });
        }
    }
}

fn is_variable_scope(selector: &str) -> bool {
    [":root", "html", "body"]
        .iter()
        .any(|s| selector.eq_ignore_ascii_case(s))
}

/// Remove `/* ... */` comments. An unterminated comment runs to the end.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Split `name: value`, lower-casing the name and stripping `!important`.
fn parse_declaration(declaration: &str) -> Option<(String, String)> {
    if declaration.contains('{') {
        return None;
    }
    let (name, value) = declaration.split_once(':')?;
    let name = name.trim().to_ascii_lowercase();
    let mut value = value.trim();
    if let Some(pos) = value.to_ascii_lowercase().find("!important") {
        value = value[..pos].trim_end();
    }
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value.to_string()))
}

/// Expand `margin`/`padding` into their four longhands using edge order.
pub fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    if name != "margin" && name != "padding" {
        return vec![(name.to_string(), value.to_string())];
    }
    let normalized = value.replace(|c: char| c.is_ascii_whitespace(), " ");
    let parts = split_top_level(&normalized, ' ');
    let edges: [usize; 4] = match parts.len() {
        0 => return Vec::new(),
        1 => [0, 0, 0, 0],
        2 => [0, 1, 0, 1],
        3 => [0, 1, 2, 1],
        _ => [0, 1, 2, 3],
    };
    ["top", "right", "bottom", "left"]
        .iter()
        .zip(edges)
        .map(|(side, i)| (format!("{name}-{side}"), parts[i].to_string()))
        .collect()
}

/// False for `print` media and for `max-width` queries narrower than the
/// breakpoint.
fn media_applies(query: &str, mobile_breakpoint: u32) -> bool {
    let query = query.to_ascii_lowercase();
    if query.contains("print") {
        return false;
    }
    let mut rest = query.as_str();
    while let Some(pos) = rest.find("max-width") {
        rest = &rest[pos + "max-width".len()..];
        let value = rest
            .trim_start_matches(|c: char| c.is_whitespace() || c == ':')
            .split(|c: char| c == ')' || c.is_whitespace())
            .next()
            .unwrap_or("");
        let px = match Length::parse(value) {
            Some(Length::Px(v)) => v,
            Some(Length::Em(v)) | Some(Length::Rem(v)) => v * MEDIA_EM_PX,
            _ => continue,
        };
        if px < mobile_breakpoint as f32 {
            return false;
        }
    }
    true
}
