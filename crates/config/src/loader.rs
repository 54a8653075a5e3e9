use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::AutocontinueConfig};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &[
    "autocontinue.toml",
    "autocontinue.yaml",
    "autocontinue.yml",
    "autocontinue.json",
];

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "autocontinue")
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<AutocontinueConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./autocontinue.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/autocontinue/autocontinue.{toml,yaml,yml,json}` (user-global)
///
/// Returns `AutocontinueConfig::default()` if no config file is found or the
/// one found does not parse.
pub fn discover_and_load() -> AutocontinueConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    AutocontinueConfig::default()
}

/// Load from an explicit path when given, otherwise discover.
///
/// Unlike [`discover_and_load`], an explicit path that cannot be read or
/// parsed is an error: the user asked for that file.
pub fn load_from(explicit: Option<&Path>) -> anyhow::Result<(AutocontinueConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => {
            let cfg = load_config(path)?;
            debug!(path = %path.display(), "loaded config");
            Ok((cfg, Some(path.to_path_buf())))
        },
        None => Ok((discover_and_load(), find_config_file())),
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/autocontinue/`).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Returns the user data directory, home of the default browser profile.
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.data_dir().to_path_buf())
}

/// Default location of the persistent browser profile.
pub fn default_profile_dir() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from(".autocontinue"))
        .join("profile")
}

/// Write `contents` to `path`, creating parent directories.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_config_file(path: &Path, contents: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    debug!(path = %path.display(), "wrote config");
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(base) => base.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

/// Apply `AUTOCONTINUE_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut AutocontinueConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

pub(crate) fn apply_env_overrides_with(
    config: &mut AutocontinueConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(url) = lookup("AUTOCONTINUE_URL").filter(|v| !v.is_empty()) {
        config.target.url = url;
    }
    if let Some(raw) = lookup("AUTOCONTINUE_POLL_INTERVAL_MS") {
        match raw.parse() {
            Ok(ms) => config.monitor.poll_interval_ms = ms,
            Err(e) => warn!(value = %raw, error = %e, "ignoring AUTOCONTINUE_POLL_INTERVAL_MS"),
        }
    }
    if let Some(raw) = lookup("AUTOCONTINUE_HEADLESS") {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => config.browser.headless = true,
            "0" | "false" | "no" | "off" => config.browser.headless = false,
            _ => warn!(value = %raw, "ignoring AUTOCONTINUE_HEADLESS"),
        }
    }
    if let Some(url) = lookup("AUTOCONTINUE_CONNECT_URL").filter(|v| !v.is_empty()) {
        config.browser.connect_url = Some(url);
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<AutocontinueConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

pub(crate) fn parse_config_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, crate::schema::ProbeErrorPolicy};

    #[test]
    fn loads_each_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("autocontinue.toml");
        std::fs::write(&toml_path, "[monitor]\npoll_interval_ms = 750\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().monitor.poll_interval_ms, 750);

        let yaml_path = dir.path().join("autocontinue.yaml");
        std::fs::write(&yaml_path, "monitor:\n  continue_text: keep going\n").unwrap();
        assert_eq!(
            load_config(&yaml_path).unwrap().monitor.continue_text,
            "keep going"
        );

        let json_path = dir.path().join("autocontinue.json");
        std::fs::write(
            &json_path,
            r#"{"monitor": {"on_probe_error": "skip_tick"}}"#,
        )
        .unwrap();
        assert_eq!(
            load_config(&json_path).unwrap().monitor.on_probe_error,
            ProbeErrorPolicy::SkipTick
        );
    }

    #[test]
    fn unsupported_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autocontinue.ini");
        std::fs::write(&path, "x=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(load_from(Some(&path)).is_err());
    }

    #[test]
    fn explicit_path_is_reported_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[target]\nurl = \"https://chat.example.com\"\n").unwrap();
        let (cfg, found) = load_from(Some(&path)).unwrap();
        assert_eq!(cfg.target.url, "https://chat.example.com");
        assert_eq!(found.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn write_config_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("autocontinue.toml");
        write_config_file(&path, "a = 1\n", false).unwrap();
        assert!(write_config_file(&path, "a = 2\n", false).is_err());
        write_config_file(&path, "a = 3\n", true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a = 3\n");
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home(Path::new("/var/lib/profile")),
            PathBuf::from("/var/lib/profile")
        );
        let expanded = expand_home(Path::new("~/profile"));
        assert!(expanded.ends_with("profile"));
        if directories::BaseDirs::new().is_some() {
            assert!(!expanded.starts_with("~"));
        }
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let mut cfg = AutocontinueConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            "AUTOCONTINUE_URL" => Some("https://chat.example.com".into()),
            "AUTOCONTINUE_POLL_INTERVAL_MS" => Some("not-a-number".into()),
            "AUTOCONTINUE_HEADLESS" => Some("Yes".into()),
            _ => None,
        });
        assert_eq!(cfg.target.url, "https://chat.example.com");
        assert_eq!(cfg.monitor.poll_interval_ms, 2000);
        assert!(cfg.browser.headless);
        assert!(cfg.browser.connect_url.is_none());
    }
}
