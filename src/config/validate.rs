//! Configuration validation with unknown field detection.

use serde_json::Value;
use std::collections::HashSet;

use super::Config;
use crate::auth::digest::{MAX_KEY_LEN, MIN_KEY_LEN};

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["auth", "registry", "probe", "servers", "logging"];

/// Known fields for each section.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    ("auth", &["reference_file", "fixed_key"]),
    ("registry", &["path", "seed_name", "seed_url"]),
    ("probe", &["timeout_secs", "interval_secs", "user_agent"]),
    (
        "servers",
        &["start_script", "stop_script", "shell", "timeout_secs"],
    ),
    ("logging", &["format", "level", "file"]),
];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate() {
        *val = j;
    }

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(matrix[i][j + 1] + 1, matrix[i + 1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }
    matrix[a.len()][b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn unknown_field(path: String, key: &str, known: &[&str]) -> Diagnostic {
    let message = match suggest_field(key, known) {
        Some(suggestion) => format!("Unknown field '{}', {}", key, suggestion),
        None => format!("Unknown field '{}'", key),
    };
    Diagnostic::new(DiagnosticLevel::Error, path, message)
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "",
                "Config must be a JSON object",
            ));
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic::new(DiagnosticLevel::Ok, "", "Valid JSON"));

    let known_set: HashSet<&str> = KNOWN_TOP_LEVEL.iter().copied().collect();
    let mut has_unknown = false;
    for key in obj.keys() {
        if !known_set.contains(key.as_str()) {
            has_unknown = true;
            diagnostics.push(unknown_field(key.clone(), key, KNOWN_TOP_LEVEL));
        }
    }

    for (section, known) in KNOWN_SECTIONS {
        let Some(value) = obj.get(*section) else {
            continue;
        };
        let Some(fields) = value.as_object() else {
            has_unknown = true;
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                *section,
                "Section must be a JSON object",
            ));
            continue;
        };
        for key in fields.keys() {
            if !known.contains(&key.as_str()) {
                has_unknown = true;
                diagnostics.push(unknown_field(format!("{}.{}", section, key), key, known));
            }
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Ok,
            "",
            "All fields recognized",
        ));
    }

    diagnostics
}

/// Check the effective configuration (file plus environment) for settings
/// that will make commands fail at runtime.
pub fn validate_effective(config: &Config) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let key_len = config.auth.fixed_key.len();
    if key_len == 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "auth.fixed_key",
            "Not set (config, OPSDECK_AUTH_FIXED_KEY or FIXED_KEY); login will fail",
        ));
    } else if !(MIN_KEY_LEN..=MAX_KEY_LEN).contains(&key_len) {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "auth.fixed_key",
            format!(
                "Key is {} bytes; must be {}-{} bytes",
                key_len, MIN_KEY_LEN, MAX_KEY_LEN
            ),
        ));
    }

    let reference = config.auth.reference_path();
    if !reference.exists() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "auth.reference_file",
            format!(
                "{} does not exist; run `opsdeck auth enroll`",
                reference.display()
            ),
        ));
    }

    for (field, path) in [
        ("servers.start_script", config.servers.start_script_path()),
        ("servers.stop_script", config.servers.stop_script_path()),
    ] {
        match path {
            None => diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Warn,
                field,
                "Not configured",
            )),
            Some(path) if !path.is_file() => diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Warn,
                field,
                format!("{} does not exist", path.display()),
            )),
            Some(_) => {}
        }
    }

    if config.probe.timeout_secs == 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "probe.timeout_secs",
            "Must be greater than zero",
        ));
    }

    diagnostics
}
