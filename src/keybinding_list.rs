//! Text form of the values kept in the settings store.
//!
//! The custom keybinding list is a GVariant string array printed as
//! `['/path/a/', '/path/b/']`. Its elements are slot paths, which never
//! contain commas, quotes or brackets, so a plain split is enough.

/// Prefix `gsettings get` puts in front of an empty array
const EMPTY_ARRAY_TYPE_ANNOTATION: &str = "@as";

/// Decode a serialized list into its slot addresses, preserving order.
///
/// Elements that are empty after trimming are dropped since they cannot
/// address a real entry.
pub fn decode(raw: &str) -> Vec<String> {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix(EMPTY_ARRAY_TYPE_ANNOTATION) {
        body = rest.trim_start();
    }
    let body = body.strip_prefix('[').unwrap_or(body);
    let body = body.strip_suffix(']').unwrap_or(body);

    if body.trim().is_empty() {
        return Vec::new();
    }

    body.split(',')
        .map(|element| strip_one_quote(element.trim()))
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode slot addresses in the exact spacing and quoting GNOME writes itself
pub fn encode<S: AsRef<str>>(slots: &[S]) -> String {
    let elements: Vec<String> = slots
        .iter()
        .map(|slot| format!("'{}'", slot.as_ref()))
        .collect();
    format!("[{}]", elements.join(", "))
}

/// Decode a GVariant string literal such as `'klipBored'`
pub fn parse_string(raw: &str) -> String {
    let inner = raw.trim();
    let inner = if inner.len() >= 2
        && ((inner.starts_with('\'') && inner.ends_with('\''))
            || (inner.starts_with('"') && inner.ends_with('"')))
    {
        &inner[1..inner.len() - 1]
    } else {
        inner
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Encode a string as a single-quoted GVariant literal
pub fn quote_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

fn strip_one_quote(element: &str) -> &str {
    let element = element.strip_prefix('\'').unwrap_or(element);
    element.strip_suffix('\'').unwrap_or(element)
}
