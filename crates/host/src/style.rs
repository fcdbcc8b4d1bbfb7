//! Style-object formatting.
//!
//! Keys are camelCase property names; output declarations use kebab-case CSS
//! names. Numbers get a `px` unit unless the property is unitless.

use crate::value::{StyleMap, StyleValue};

/// Properties that accept bare numbers.
pub const UNITLESS_KEYS: [&str; 7] = [
    "opacity",
    "zIndex",
    "lineHeight",
    "flexGrow",
    "flexShrink",
    "order",
    "fontWeight",
];

pub fn is_unitless(key: &str) -> bool {
    UNITLESS_KEYS.contains(&key)
}

/// `justifyContent` -> `justify-content`.
pub fn css_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn format_number(n: f64) -> String {
    n.to_string()
}

pub fn css_value(key: &str, value: &StyleValue) -> String {
    match value {
        StyleValue::Str(s) => s.clone(),
        StyleValue::Num(n) if is_unitless(key) => format_number(*n),
        StyleValue::Num(n) => format!("{}px", format_number(*n)),
    }
}

pub fn declarations(style: &StyleMap) -> Vec<(String, String)> {
    style
        .iter()
        .map(|(key, value)| (css_name(key), css_value(key, value)))
        .collect()
}

/// Serialized form used for the `style` attribute: `a: b; c: d;`.
pub fn css_text(declarations: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (name, value)) in declarations.iter().enumerate() {
        if i != 0 {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}
