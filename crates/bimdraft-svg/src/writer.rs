//! Low-level SVG text helpers.

use std::fmt;

/// Coordinate formatter: at most three decimals, no trailing zeros, no `-0`.
#[derive(Debug, Clone, Copy)]
pub struct Num(pub f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format!("{:.3}", self.0);
        let s = if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            s.as_str()
        };
        if s == "-0" {
            f.write_str("0")
        } else {
            f.write_str(s)
        }
    }
}

/// Escapes the five reserved markup characters. Applied exactly once, to
/// the raw caller string, at the point it is embedded.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// XML comments may not contain `--`.
pub fn comment_safe(raw: &str) -> String {
    let mut s = raw.replace("--", "- -");
    while s.contains("--") {
        s = s.replace("--", "- -");
    }
    if s.ends_with('-') {
        s.push(' ');
    }
    s
}
