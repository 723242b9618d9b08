//! Character reference decoding for text and attribute values.

const NAMED: &[(&str, char)] = &[
    ("nbsp", '\u{00A0}'),
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("copy", '\u{00A9}'),
    ("raquo", '\u{00BB}'),
    ("laquo", '\u{00AB}'),
];

// Longest reference we bother looking for, e.g. `&#x0007F;`
const MAX_REFERENCE_LEN: usize = 10;

/// Replace recognised character references. Unknown `&` sequences pass
/// through untouched; numeric references outside 1..=127 become `?`.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];
        match decode_reference(candidate) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode the reference following a `&`, returning the character and the
/// number of bytes consumed including the terminating `;`.
fn decode_reference(s: &str) -> Option<(char, usize)> {
    let window = &s.as_bytes()[..s.len().min(MAX_REFERENCE_LEN + 1)];
    let semi = window.iter().position(|b| *b == b';')?;
    let body = &s[..semi];
    let ch = if let Some(num) = body.strip_prefix('#') {
        let value = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        if (1..=127).contains(&value) {
            char::from_u32(value).unwrap_or('?')
        } else {
            '?'
        }
    } else {
        NAMED.iter().find(|(name, _)| *name == body).map(|(_, c)| *c)?
    };
    Some((ch, semi + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_table() {
        assert_eq!(decode_entities("a &amp; b &lt;i&gt;"), "a & b <i>");
        assert_eq!(decode_entities("&quot;q&quot; &#39;s&#39;"), "\"q\" 's'");
        assert_eq!(decode_entities("&copy; &laquo;x&raquo;"), "\u{a9} \u{ab}x\u{bb}");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn numeric_references_outside_ascii_become_question_marks() {
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&#8212;"), "?");
        assert_eq!(decode_entities("&#0;"), "?");
    }

    #[test]
    fn unknown_sequences_pass_through() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&bogus; & &amp"), "&bogus; & &amp");
        assert_eq!(decode_entities("&&lt;"), "&<");
        assert_eq!(decode_entities("&abcdefghijk;"), "&abcdefghijk;");
    }

    #[test]
    fn long_runs_without_semicolons_stay_linear() {
        let input = "& ".repeat(200_000);
        assert_eq!(decode_entities(&input), input);
    }
}
