//! POSIX shell quoting for values interpolated into command templates.

use std::borrow::Cow;
use std::collections::HashMap;

use tera::Value;

/// Quote `raw` so a POSIX shell reads it back as exactly one word.
///
/// Words made only of `[A-Za-z0-9_@%+=:,./-]` are returned unchanged so
/// commands stay readable; everything else is wrapped in single quotes with
/// embedded `'` written as `'\''`. The empty string becomes `''`.
pub fn shell_quote(raw: &str) -> Cow<'_, str> {
    if !raw.is_empty() && raw.chars().all(is_safe) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for ch in raw.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    Cow::Owned(out)
}

fn is_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Tera filter form of [`shell_quote`]. Non-string values are quoted from
/// their JSON text.
pub(crate) fn shell_quote_filter(
    value: &Value,
    _args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    };
    Ok(Value::String(shell_quote(&raw).into_owned()))
}
