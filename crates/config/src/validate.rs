//! Configuration validation engine.
//!
//! Parses a config file in any supported format, detects unknown or
//! misspelled fields, and reports settings that would make the monitor loop
//! misbehave (zero interval, empty continue text, unreachable target).

use std::{collections::HashMap, path::Path};

use crate::{
    env_subst::substitute_env,
    loader::parse_config_value,
    schema::{AutocontinueConfig, BackoffKind},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "value", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "monitor.poll_interval_ms"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// Scalar or list of scalars; stop recursion.
    Leaf,
}

/// Build the schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let target = Struct(HashMap::from([("url", Leaf), ("login_timeout_secs", Leaf)]));

    let backoff = Struct(HashMap::from([("kind", Leaf), ("max_ms", Leaf)]));

    let monitor = Struct(HashMap::from([
        ("poll_interval_ms", Leaf),
        ("input_timeout_ms", Leaf),
        ("continue_text", Leaf),
        ("submit_key", Leaf),
        ("stop_selector", Leaf),
        ("input_selector", Leaf),
        ("on_probe_error", Leaf),
        ("max_continues", Leaf),
        ("backoff", backoff),
    ]));

    let browser = Struct(HashMap::from([
        ("chrome_path", Leaf),
        ("headless", Leaf),
        ("user_data_dir", Leaf),
        ("connect_url", Leaf),
        ("viewport_width", Leaf),
        ("viewport_height", Leaf),
        ("request_timeout_ms", Leaf),
        ("user_agent", Leaf),
        ("chrome_args", Leaf),
    ]));

    Struct(HashMap::from([
        ("target", target),
        ("monitor", monitor),
        ("browser", browser),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(c, d)| (d, c))
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered config file
/// if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults",
        )];
        check_semantics(&AutocontinueConfig::default(), &mut diagnostics);
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let raw = match std::fs::read_to_string(actual_path) {
        Ok(raw) => substitute_env(&raw),
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "file-ref",
                    "",
                    format!("failed to read config file: {e}"),
                )],
                config_path,
            };
        },
    };

    let mut diagnostics = Vec::new();
    match parse_config_value(&raw, actual_path) {
        Ok(value) => validate_value(&value, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "syntax",
            "",
            format!("syntax error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path,
    }
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let parsed = toml::from_str::<toml::Value>(toml_str)
        .map_err(|e| e.to_string())
        .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string()));

    match parsed {
        Ok(value) => validate_value(&value, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "syntax",
            "",
            format!("TOML syntax error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn validate_value(value: &serde_json::Value, diagnostics: &mut Vec<Diagnostic>) {
    check_unknown_fields(value, &build_schema_map(), "", diagnostics);

    match serde_json::from_value::<AutocontinueConfig>(value.clone()) {
        Ok(config) => check_semantics(&config, diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }
}

/// Walk the value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (serde_json::Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => {
                check_unknown_fields(child_value, child_schema, &path, diagnostics)
            },
            None => {
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    path,
                    message,
                ));
            },
        }
    }
}

fn check_semantics(config: &AutocontinueConfig, diagnostics: &mut Vec<Diagnostic>) {
    let mut error = |path: &str, message: String| {
        diagnostics.push(Diagnostic::new(Severity::Error, "value", path, message));
    };

    match url::Url::parse(&config.target.url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {},
        Ok(u) => error(
            "target.url",
            format!("unsupported scheme '{}', only http/https allowed", u.scheme()),
        ),
        Err(e) => error("target.url", format!("invalid URL: {e}")),
    }

    let monitor = &config.monitor;
    if monitor.poll_interval_ms == 0 {
        error(
            "monitor.poll_interval_ms",
            "must be greater than 0; a zero interval busy-loops the browser".into(),
        );
    }
    if monitor.continue_text.trim().is_empty() {
        error("monitor.continue_text", "must not be empty".into());
    }
    if monitor.submit_key.trim().is_empty() {
        error("monitor.submit_key", "must not be empty".into());
    }
    if monitor.stop_selector.trim().is_empty() {
        error("monitor.stop_selector", "must not be empty".into());
    }
    if monitor.input_selector.trim().is_empty() {
        error("monitor.input_selector", "must not be empty".into());
    }

    if let Some(ref connect) = config.browser.connect_url {
        match url::Url::parse(connect) {
            Ok(u) if matches!(u.scheme(), "ws" | "wss" | "http" | "https") => {},
            Ok(u) => error(
                "browser.connect_url",
                format!("unsupported scheme '{}', expected ws(s):// or http(s)://", u.scheme()),
            ),
            Err(e) => error("browser.connect_url", format!("invalid URL: {e}")),
        }
    }

    let mut warn = |path: &str, message: &str| {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "value",
            path,
            message.to_string(),
        ));
    };

    if monitor.poll_interval_ms > 0 && monitor.poll_interval_ms < 250 {
        warn(
            "monitor.poll_interval_ms",
            "polling faster than every 250ms mostly adds load on the page",
        );
    }
    if monitor.input_timeout_ms == 0 {
        warn(
            "monitor.input_timeout_ms",
            "0 checks for the input box once; sends fail whenever it is not already rendered",
        );
    }
    if monitor.backoff.kind == BackoffKind::Exponential
        && monitor.backoff.max_ms <= monitor.poll_interval_ms
    {
        warn(
            "monitor.backoff.max_ms",
            "not above poll_interval_ms, so the delay never grows",
        );
    }

    let browser = &config.browser;
    if browser.headless && browser.user_data_dir.is_none() && browser.connect_url.is_none() {
        warn(
            "browser.headless",
            "headless with a fresh profile leaves no way to log in; set user_data_dir to a logged-in profile or use connect_url",
        );
    }
    if (browser.viewport_width == 0) != (browser.viewport_height == 0) {
        warn(
            "browser.viewport_width",
            "set both viewport_width and viewport_height, or neither",
        );
    }

    if browser.connect_url.is_some()
        && (browser.chrome_path.is_some() || browser.user_data_dir.is_some())
    {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "value",
            "browser.connect_url",
            "chrome_path and user_data_dir are ignored when attaching to a running browser",
        ));
    }
}
