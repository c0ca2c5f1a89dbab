// src/sdk/args.rs

//! Formatting typed option values as `--flag value` tokens.
//!
//! Every helper returns an empty list when the value is absent, so callers
//! can just concatenate the results.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

/// `["--name", value]`, or nothing for `None` / empty strings.
pub fn string(name: &str, value: Option<&str>) -> Vec<String> {
    match value {
        Some(v) if !v.is_empty() => vec![format!("--{name}"), v.to_string()],
        _ => Vec::new(),
    }
}

/// `["--name=value"]`, or nothing for `None` / empty strings.
pub fn string_eq(name: &str, value: Option<&str>) -> Vec<String> {
    match value {
        Some(v) if !v.is_empty() => vec![format!("--{name}={v}")],
        _ => Vec::new(),
    }
}

/// `--name value` repeated once per value.
pub fn strings<S: AsRef<str>>(name: &str, values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| [format!("--{name}"), v.as_ref().to_string()])
        .collect()
}

pub fn integer(name: &str, value: Option<i64>) -> Vec<String> {
    match value {
        Some(v) => vec![format!("--{name}"), v.to_string()],
        None => Vec::new(),
    }
}

/// `--name` for true, `--no-name` for false.
pub fn bool_with_no(name: &str, value: Option<bool>) -> Vec<String> {
    match value {
        Some(true) => vec![format!("--{name}")],
        Some(false) => vec![format!("--no-{name}")],
        None => Vec::new(),
    }
}

/// `--name` only when explicitly true.
pub fn flag(name: &str, value: Option<bool>) -> Vec<String> {
    match value {
        Some(true) => vec![format!("--{name}")],
        _ => Vec::new(),
    }
}

pub fn path(name: &str, value: Option<&Path>) -> Vec<String> {
    match value {
        Some(p) => vec![format!("--{name}"), p.display().to_string()],
        None => Vec::new(),
    }
}

/// `key=value` tokens in key order.
pub fn key_values<K: Display, V: Display>(map: &BTreeMap<K, V>) -> Vec<String> {
    map.iter().map(|(k, v)| format!("{k}={v}")).collect()
}
