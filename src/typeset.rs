//! Lightweight plain-text typesetting for overlay math.
//!
//! Overlay text arrives as LaTeX fragments wrapped in `$...$` or `\(...\)`.
//! The desktop front-end draws plain glyphs, so the fragments are flattened
//! into readable Unicode: delimiters are dropped, common commands become their
//! symbols, `\frac{a}{b}` becomes `(a)/(b)` and powers become superscripts
//! when every character has one, `^(..)` otherwise.

use crate::overlay::Typesetter;
use once_cell::sync::Lazy;
use regex::Regex;

static INLINE_MATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([^$]*)\$|\\\((.*?)\\\)").expect("inline math pattern is valid")
});
static FRACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[dt]?frac\{([^{}]*)\}\{([^{}]*)\}").expect("fraction pattern is valid")
});
static SQRT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\sqrt\{([^{}]*)\}").expect("sqrt pattern is valid"));
static POWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\^(?:\{([^{}]*)\}|([0-9n+\-]))").expect("power pattern is valid")
});
static TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:text|mathrm|mathbf)\{([^{}]*)\}").expect("text pattern is valid")
});

// Prefixes must come after the commands they start (`\le` vs `\left`, `\leq`).
const SYMBOLS: &[(&str, &str)] = &[
    (r"\left", ""),
    (r"\right", ""),
    (r"\times", "×"),
    (r"\cdot", "·"),
    (r"\div", "÷"),
    (r"\pm", "±"),
    (r"\leq", "≤"),
    (r"\geq", "≥"),
    (r"\le", "≤"),
    (r"\ge", "≥"),
    (r"\neq", "≠"),
    (r"\approx", "≈"),
    (r"\infty", "∞"),
    (r"\pi", "π"),
    (r"\theta", "θ"),
    (r"\alpha", "α"),
    (r"\beta", "β"),
    (r"\sqrt", "√"),
    (r"\,", " "),
];

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        'n' => 'ⁿ',
        '+' => '⁺',
        '-' => '⁻',
        _ => return None,
    })
}

/// Flattens one math fragment (delimiters already removed).
pub fn flatten_math(source: &str) -> String {
    let mut out = TEXT.replace_all(source, "$1").into_owned();
    out = FRACTION.replace_all(&out, "($1)/($2)").into_owned();
    out = SQRT.replace_all(&out, "√($1)").into_owned();
    out = POWER
        .replace_all(&out, |caps: &regex::Captures<'_>| {
            let (exponent, braced) = match caps.get(1) {
                Some(group) => (group.as_str(), true),
                None => (caps.get(2).map_or("", |m| m.as_str()), false),
            };
            let raised: Option<String> = exponent.chars().map(superscript).collect();
            match raised {
                Some(raised) if !raised.is_empty() => raised,
                _ if braced => format!("^({exponent})"),
                _ => caps[0].to_string(),
            }
        })
        .into_owned();
    for (command, symbol) in SYMBOLS {
        out = out.replace(command, symbol);
    }
    out.replace(['{', '}'], "")
}

/// Replaces every delimited math run in `text` with its flattened form.
pub fn typeset_text(text: &str) -> String {
    INLINE_MATH
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let inner = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            flatten_math(inner)
        })
        .into_owned()
}

#[derive(Debug, Default, Clone)]
pub struct DelimiterTypesetter {
    rendered: Vec<String>,
}

impl Typesetter for DelimiterTypesetter {
    fn refresh(&mut self, index: usize, text: &str) {
        if self.rendered.len() <= index {
            self.rendered.resize(index + 1, String::new());
        }
        self.rendered[index] = typeset_text(text);
    }

    fn clear(&mut self) {
        self.rendered.clear();
    }

    fn rendered(&self, index: usize) -> Option<&str> {
        self.rendered.get(index).map(String::as_str)
    }
}
