//! Typed readings of computed-style strings: lengths and colours.

/// A CSS length as written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Percent(f32),
    Em(f32),
    Rem(f32),
    Vw(f32),
    Vh(f32),
    Vmin(f32),
    Vmax(f32),
    Auto,
}

/// Inputs needed to turn a [`Length`] into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    /// Multiplier for both `em` and `rem`
    pub root_font_size: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

const UNITS: &[(&str, fn(f32) -> Length)] = &[
    ("px", Length::Px),
    ("%", Length::Percent),
    ("rem", Length::Rem),
    ("em", Length::Em),
    ("vw", Length::Vw),
    ("vh", Length::Vh),
    ("vmin", Length::Vmin),
    ("vmax", Length::Vmax),
];

impl Length {
    /// Parse a single length. Unitless numbers are pixels; anything else
    /// (keywords, `calc()`, unknown units) yields `None`.
    pub fn parse(value: &str) -> Option<Length> {
        let value = value.trim().to_ascii_lowercase();
        if value == "auto" {
            return Some(Length::Auto);
        }
        for (suffix, unit) in UNITS {
            if let Some(number) = value.strip_suffix(*suffix) {
                return number.trim().parse::<f32>().ok().map(*unit);
            }
        }
        value.parse::<f32>().ok().map(Length::Px)
    }

    /// Resolve to pixels. Percentages need a `basis`; `auto` never resolves.
    pub fn resolve(&self, basis: Option<f32>, ctx: &LengthContext) -> Option<f32> {
        let px = match *self {
            Length::Px(v) => v,
            Length::Percent(v) => basis? * v / 100.0,
            Length::Em(v) | Length::Rem(v) => v * ctx.root_font_size,
            Length::Vw(v) => v * ctx.viewport_width / 100.0,
            Length::Vh(v) => v * ctx.viewport_height / 100.0,
            Length::Vmin(v) => v * ctx.viewport_width.min(ctx.viewport_height) / 100.0,
            Length::Vmax(v) => v * ctx.viewport_width.max(ctx.viewport_height) / 100.0,
            Length::Auto => return None,
        };
        Some(px)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Length::Auto)
    }
}

/// Parse a colour value to RGBA. `inherit`/`currentcolor` defer to the
/// caller's inherited colour and return `None`, as do unparsable values.
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let value = value.trim();
    if value.is_empty()
        || value.eq_ignore_ascii_case("inherit")
        || value.eq_ignore_ascii_case("currentcolor")
    {
        return None;
    }
    csscolorparser::parse(value).ok().map(|c| c.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: LengthContext = LengthContext {
        root_font_size: 16.0,
        viewport_width: 1000.0,
        viewport_height: 500.0,
    };

    #[test]
    fn parses_units() {
        assert_eq!(Length::parse("12px"), Some(Length::Px(12.0)));
        assert_eq!(Length::parse(" 7 "), Some(Length::Px(7.0)));
        assert_eq!(Length::parse("50%"), Some(Length::Percent(50.0)));
        assert_eq!(Length::parse("1.5em"), Some(Length::Em(1.5)));
        assert_eq!(Length::parse("2REM"), Some(Length::Rem(2.0)));
        assert_eq!(Length::parse("10vmin"), Some(Length::Vmin(10.0)));
        assert_eq!(Length::parse("auto"), Some(Length::Auto));
        assert_eq!(Length::parse("calc(1px + 2px)"), None);
        assert_eq!(Length::parse("thick"), None);
    }

    #[test]
    fn resolves_against_context() {
        assert_eq!(Length::Em(2.0).resolve(None, &CTX), Some(32.0));
        assert_eq!(Length::Rem(0.5).resolve(None, &CTX), Some(8.0));
        assert_eq!(Length::Percent(25.0).resolve(Some(400.0), &CTX), Some(100.0));
        assert_eq!(Length::Percent(25.0).resolve(None, &CTX), None);
        assert_eq!(Length::Vw(10.0).resolve(None, &CTX), Some(100.0));
        assert_eq!(Length::Vh(10.0).resolve(None, &CTX), Some(50.0));
        assert_eq!(Length::Vmax(10.0).resolve(None, &CTX), Some(100.0));
        assert_eq!(Length::Auto.resolve(Some(1.0), &CTX), None);
    }

    #[test]
    fn colours() {
        assert_eq!(parse_color("red"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("#0f0"), Some([0, 255, 0, 255]));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some([1, 2, 3, 255]));
        assert_eq!(parse_color("transparent").map(|c| c[3]), Some(0));
        assert_eq!(parse_color("currentColor"), None);
        assert_eq!(parse_color("not-a-colour"), None);
    }
}
