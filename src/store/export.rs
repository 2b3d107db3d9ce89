//! Export formats and value masking.
//!
//! Supported formats:
//! - `env` (default): `.env` lines named `<SERVICE>_API_KEY`
//! - `json`: JSON object `{ "<SERVICE>_API_KEY": "value", ... }`

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::errors::{KeystashError, Result};

/// Output format for `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Env,
    Json,
}

impl FromStr for ExportFormat {
    type Err = KeystashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" | "dotenv" => Ok(Self::Env),
            "json" => Ok(Self::Json),
            other => Err(KeystashError::InvalidInput(format!(
                "unknown export format '{other}' — use 'env' or 'json'"
            ))),
        }
    }
}

/// One decrypted key ready for export.
pub struct ExportEntry {
    pub service: String,
    pub name: String,
    pub value: Zeroizing<String>,
}

/// Upper-case `s` and replace anything outside `[A-Z0-9]` with `_`.
pub fn env_var_segment(s: &str) -> String {
    let mapped: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    let collapsed = mapped
        .split('_')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if collapsed.is_empty() {
        "KEY".to_string()
    } else if collapsed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{collapsed}")
    } else {
        collapsed
    }
}

/// Assign a variable name to every entry.
///
/// The base name is `<SERVICE>_API_KEY`.  When several keys share a
/// service, each gets its key name appended; any remaining clash gets a
/// numeric suffix.  Entries should arrive in a stable order.
pub fn assign_variable_names(entries: Vec<ExportEntry>) -> BTreeMap<String, Zeroizing<String>> {
    let mut per_base: HashMap<String, usize> = HashMap::new();
    for e in &entries {
        *per_base.entry(base_name(&e.service)).or_default() += 1;
    }

    let mut out = BTreeMap::new();
    for e in entries {
        let base = base_name(&e.service);
        let mut var = if per_base[&base] > 1 {
            format!("{base}_{}", env_var_segment(&e.name))
        } else {
            base
        };
        if out.contains_key(&var) {
            let stem = var.clone();
            let mut n = 2;
            while out.contains_key(&var) {
                var = format!("{stem}_{n}");
                n += 1;
            }
        }
        out.insert(var, e.value);
    }
    out
}

fn base_name(service: &str) -> String {
    format!("{}_API_KEY", env_var_segment(service))
}

/// Characters that never need quoting in a `.env` value.
fn is_env_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_./:+=@%-".contains(c)
}

/// Format variables as `.env` file content.
///
/// Values made only of safe characters stay bare.  Anything else is
/// single-quoted (literal for both dotenv parsers and shells), unless it
/// holds a single quote or a control character; then it is double-quoted
/// with `\\`, `"`, `$`, backtick, and control characters escaped.
pub fn format_as_env(vars: &BTreeMap<String, Zeroizing<String>>) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::new());
    for (key, value) in vars {
        if !value.is_empty() && value.chars().all(is_env_safe) {
            let _ = writeln!(out, "{key}={}", value.as_str());
        } else if !value.contains('\'') && !value.chars().any(char::is_control) {
            let _ = writeln!(out, "{key}='{}'", value.as_str());
        } else {
            let mut escaped = Zeroizing::new(String::with_capacity(value.len() + 8));
            for c in value.chars() {
                match c {
                    '\\' => escaped.push_str("\\\\"),
                    '"' => escaped.push_str("\\\""),
                    '$' => escaped.push_str("\\$"),
                    '`' => escaped.push_str("\\`"),
                    '\n' => escaped.push_str("\\n"),
                    '\r' => escaped.push_str("\\r"),
                    '\t' => escaped.push_str("\\t"),
                    c if c.is_control() => {
                        let _ = write!(escaped, "\\u{{{:04x}}}", u32::from(c));
                    }
                    c => escaped.push(c),
                }
            }
            let _ = writeln!(out, "{key}=\"{}\"", escaped.as_str());
        }
    }
    out
}

/// Format variables as a JSON object.
pub fn format_as_json(vars: &BTreeMap<String, Zeroizing<String>>) -> Result<Zeroizing<String>> {
    let plain: BTreeMap<&str, &str> = vars.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    serde_json::to_string_pretty(&plain)
        .map(Zeroizing::new)
        .map_err(|e| KeystashError::SerializationError(format!("JSON export: {e}")))
}

/// Mask a secret for display: first 3 and last 4 characters survive.
///
/// Values shorter than 8 characters are fully starred.
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 8 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(service: &str, name: &str, value: &str) -> ExportEntry {
        ExportEntry {
            service: service.into(),
            name: name.into(),
            value: Zeroizing::new(value.into()),
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, Zeroizing<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Zeroizing::new(v.to_string())))
            .collect()
    }

    #[test]
    fn env_var_segment_sanitizes() {
        assert_eq!(env_var_segment("OpenAI"), "OPENAI");
        assert_eq!(env_var_segment("google maps"), "GOOGLE_MAPS");
        assert_eq!(env_var_segment("  a--b  "), "A_B");
        assert_eq!(env_var_segment("3scale"), "_3SCALE");
        assert_eq!(env_var_segment("***"), "KEY");
    }

    #[test]
    fn single_service_uses_base_name() {
        let names = assign_variable_names(vec![
            entry("stripe", "live", "sk_live_1"),
            entry("openai", "main", "sk-1"),
        ]);
        let keys: Vec<&str> = names.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["OPENAI_API_KEY", "STRIPE_API_KEY"]);
    }

    #[test]
    fn shared_service_appends_key_name() {
        let names = assign_variable_names(vec![
            entry("stripe", "live", "a"),
            entry("stripe", "test", "b"),
        ]);
        assert_eq!(names["STRIPE_API_KEY_LIVE"].as_str(), "a");
        assert_eq!(names["STRIPE_API_KEY_TEST"].as_str(), "b");
    }

    #[test]
    fn remaining_clash_gets_numeric_suffix() {
        let names = assign_variable_names(vec![
            entry("stripe", "live", "a"),
            entry("stripe", "live", "b"),
        ]);
        assert_eq!(names["STRIPE_API_KEY_LIVE"].as_str(), "a");
        assert_eq!(names["STRIPE_API_KEY_LIVE_2"].as_str(), "b");
    }

    #[test]
    fn format_env_simple_values() {
        let out = format_as_env(&vars(&[("A", "hello"), ("B", "world")]));
        assert_eq!(out.as_str(), "A=hello\nB=world\n");
    }

    #[test]
    fn format_env_single_quotes_special_values() {
        let out = format_as_env(&vars(&[
            ("E", ""),
            ("K", "has space"),
            ("P", "price$100"),
            ("T", "run`id`"),
        ]));
        assert_eq!(
            out.as_str(),
            "E=''\nK='has space'\nP='price$100'\nT='run`id`'\n"
        );
    }

    #[test]
    fn format_env_escapes_quotes_and_control_chars() {
        let out = format_as_env(&vars(&[
            ("K", "a\"b\nc"),
            ("Q", "it's $HOME"),
            ("R", "line\rbreak\tx\\y"),
        ]));
        assert_eq!(
            out.as_str(),
            "K=\"a\\\"b\\nc\"\nQ=\"it's \\$HOME\"\nR=\"line\\rbreak\\tx\\\\y\"\n"
        );
    }

    #[test]
    fn format_env_never_emits_raw_line_breaks_in_values() {
        let out = format_as_env(&vars(&[("A", "x\ry"), ("B", "p\nq"), ("C", "ok")]));
        assert_eq!(out.lines().count(), 3);
        assert!(!out.contains('\r'));
    }

    #[test]
    fn format_json_produces_valid_json() {
        let out = format_as_json(&vars(&[("KEY", "value")])).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["KEY"], "value");
    }

    #[test]
    fn export_format_parses() {
        assert_eq!("ENV".parse::<ExportFormat>().unwrap(), ExportFormat::Env);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn mask_keeps_prefix_and_suffix() {
        assert_eq!(mask_value("sk-live-abc123"), "sk-****...c123");
    }

    #[test]
    fn mask_hides_short_values_entirely() {
        assert_eq!(mask_value("abc"), "****");
        assert_eq!(mask_value("abcdefg"), "*******");
    }
}
