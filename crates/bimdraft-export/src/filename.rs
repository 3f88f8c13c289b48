use chrono::{DateTime, TimeZone};
use std::fmt::Display;

pub const DEFAULT_PROJECT_NAME: &str = "drawing";

/// `<project>_<YYYYMMDD-HHMMSS>.<ext>`, with the project name reduced to
/// ASCII letters, digits, `-` and `_`.
pub fn suggested_filename<Tz>(
    project_name: Option<&str>,
    at: &DateTime<Tz>,
    extension: &str,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let name = sanitize(project_name.unwrap_or(DEFAULT_PROJECT_NAME));
    let name = if name.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        name
    };
    format!("{name}_{}.{extension}", at.format("%Y%m%d-%H%M%S"))
}

fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}
