//! `autocontinue check`: config validation, selector parsing and browser audit.
//!
//! Prints one section per area with `[ok]`, `[warn]`, `[fail]` or `[info]`
//! per item, and exits non-zero when anything failed.

use std::path::Path;

use {
    anyhow::Result,
    autocontinue_browser::{Locator, detect_browser},
    autocontinue_config::{AutocontinueConfig, Severity, ValidationResult},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct Section {
    title: String,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|(s, _)| *s == status).count()
    }
}

fn print_report(sections: &[Section]) {
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for (status, message) in &section.items {
            eprintln!("  [{}{}{RESET}]  {message}", status.color(), status.label());
        }
        eprintln!();
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub fn handle_check(config_path: Option<&Path>, verbose: bool) -> Result<()> {
    let discovered = config_path
        .map(Path::to_path_buf)
        .or_else(autocontinue_config::find_config_file);
    let result = autocontinue_config::validate::validate(discovered.as_deref());

    let mut sections = vec![check_config(&result, verbose)];

    match autocontinue_config::load_from(discovered.as_deref()) {
        Ok((mut config, _)) => {
            autocontinue_config::apply_env_overrides(&mut config);
            sections.push(check_selectors(&config));
            sections.push(check_browser(&config));
        },
        Err(e) => {
            let mut section = Section::new("Selectors and browser");
            section.push(Status::Info, format!("skipped, config does not load: {e}"));
            sections.push(section);
        },
    }

    finish(&sections)
}

fn finish(sections: &[Section]) -> Result<()> {
    print_report(sections);

    let errors: usize = sections.iter().map(|s| s.count(Status::Fail)).sum();
    let warnings: usize = sections.iter().map(|s| s.count(Status::Warn)).sum();
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── Config ──────────────────────────────────────────────────────────────────

fn check_config(result: &ValidationResult, verbose: bool) -> Section {
    let label = result
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    let mut section = Section::new(format!("Config ({label})"));

    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }
        let message = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        section.push(d.severity.into(), message);
    }

    if !result.has_errors() {
        section.push(Status::Ok, "Config is usable");
    }
    section
}

// ── Selectors ───────────────────────────────────────────────────────────────

fn check_selectors(config: &AutocontinueConfig) -> Section {
    let mut section = Section::new("Selectors");
    for (name, raw) in [
        ("monitor.stop_selector", &config.monitor.stop_selector),
        ("monitor.input_selector", &config.monitor.input_selector),
    ] {
        match Locator::parse(raw) {
            Ok(Locator::Css(css)) => section.push(Status::Ok, format!("{name}: CSS {css}")),
            Ok(Locator::Text { scope, text }) => section.push(
                Status::Ok,
                format!("{name}: text match {text:?} within {scope}"),
            ),
            Err(e) => section.push(Status::Fail, format!("{name}: {e}")),
        }
    }
    section
}

// ── Browser ─────────────────────────────────────────────────────────────────

fn check_browser(config: &AutocontinueConfig) -> Section {
    let mut section = Section::new("Browser");
    let browser = &config.browser;

    if let Some(url) = browser.connect_url.as_deref().filter(|u| !u.trim().is_empty()) {
        section.push(Status::Info, format!("Will attach to {url}"));
        return section;
    }

    let detection = detect_browser(browser.chrome_path.as_deref());
    match detection.found {
        Some((path, source)) => {
            section.push(
                Status::Ok,
                format!("Found {} (from {source})", path.display()),
            );
        },
        None => {
            section.push(Status::Fail, "No Chromium-based browser found");
            for line in detection.install_hint.lines().filter(|l| !l.trim().is_empty()) {
                section.push(Status::Info, line.trim().to_string());
            }
        },
    }

    if let Some(ref path) = browser.chrome_path
        && !Path::new(path).exists()
    {
        section.push(
            Status::Warn,
            format!("browser.chrome_path {path} does not exist, fell back to auto-detection"),
        );
    }

    match browser.user_data_dir {
        Some(ref dir) => section.push(
            Status::Ok,
            format!(
                "Profile {} (login is kept between runs)",
                autocontinue_config::expand_home(dir).display()
            ),
        ),
        None => section.push(
            Status::Warn,
            "No user_data_dir: you will have to log in on every run",
        ),
    }

    section
}
