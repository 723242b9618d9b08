//! `var()` substitution against the custom-property table.

use std::collections::HashMap;

/// Upper bound on nested substitution rounds. Reference cycles exhaust it
/// and leave a partially substituted value behind.
pub const MAX_SUBSTITUTION_PASSES: usize = 4;

/// Replace `var(--name[, fallback])` references in `value`.
///
/// An undefined name uses its fallback, or the bare name when there is none.
pub fn resolve_vars(value: &str, variables: &HashMap<String, String>) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_SUBSTITUTION_PASSES {
        if !current.contains("var(") {
            break;
        }
        current = substitute_once(&current, variables);
    }
    current
}

fn substitute_once(value: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("var(") {
        out.push_str(&rest[..pos]);
        let args_start = pos + "var(".len();
        let Some(len) = closing_paren(&rest[args_start..]) else {
            // unterminated reference stays as written
            out.push_str(&rest[pos..]);
            return out;
        };
        let args = &rest[args_start..args_start + len];
        let (name, fallback) = match first_top_level_comma(args) {
            Some(comma) => (args[..comma].trim(), Some(args[comma + 1..].trim())),
            None => (args.trim(), None),
        };
        let replacement = variables
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .or(fallback.filter(|f| !f.is_empty()))
            .unwrap_or(name);
        out.push_str(replacement);
        rest = &rest[args_start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Byte length up to the `)` closing an already opened group.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 1;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn first_top_level_comma(s: &str) -> Option<usize> {
    let mut depth = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_defined_names() {
        let table = vars(&[("--c", "red"), ("--gap", "4px")]);
        assert_eq!(resolve_vars("var(--c)", &table), "red");
        assert_eq!(resolve_vars("var( --gap ) var(--gap)", &table), "4px 4px");
        assert_eq!(resolve_vars("1px solid var(--C)", &table), "1px solid red");
    }

    #[test]
    fn falls_back_then_to_literal_name() {
        let table = vars(&[("--c", "red")]);
        assert_eq!(resolve_vars("var(--missing, green)", &table), "green");
        assert_eq!(resolve_vars("var(--missing, rgb(0, 1, 2))", &table), "rgb(0, 1, 2)");
        assert_eq!(resolve_vars("var(--missing)", &table), "--missing");
        assert_eq!(resolve_vars("var(--missing, var(--c))", &table), "red");
    }

    #[test]
    fn nested_references_resolve_within_budget() {
        let table = vars(&[("--a", "var(--b)"), ("--b", "var(--c)"), ("--c", "blue")]);
        assert_eq!(resolve_vars("var(--a)", &table), "blue");
    }

    #[test]
    fn cycles_degrade_to_partial_values() {
        let table = vars(&[("--a", "var(--b)"), ("--b", "var(--a)")]);
        let resolved = resolve_vars("var(--a)", &table);
        assert!(resolved.starts_with("var("));
    }

    #[test]
    fn unterminated_reference_is_left_alone() {
        assert_eq!(resolve_vars("calc(var(--x", &HashMap::new()), "calc(var(--x");
    }
}
