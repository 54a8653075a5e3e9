//! Default configuration template with all options documented.
//!
//! Written by `autocontinue config init`. Every option is listed with its
//! default so users can see what is tunable without reading the source.

use std::path::Path;

/// Generate the default config template pointing at a persistent profile.
pub fn default_config_template(profile_dir: &Path) -> String {
    // Quoted and escaped by the TOML encoder, so any path survives.
    let profile = toml::Value::String(profile_dir.display().to_string());
    format!(
        r##"# autocontinue configuration
# ==========================
# Changes take effect on the next run.
#
# Environment variable substitution is supported: ${{ENV_VAR}} or
# ${{ENV_VAR:-fallback}}. Example: url = "${{CHAT_URL:-https://claude.ai/chat}}"

# ══════════════════════════════════════════════════════════════════════════════
# TARGET
# ══════════════════════════════════════════════════════════════════════════════

[target]
url = "https://claude.ai/chat"    # Chat page opened at startup
login_timeout_secs = 300          # Wait this long for the input box (time to log in by hand), 0 = don't wait

# ══════════════════════════════════════════════════════════════════════════════
# MONITOR LOOP
# ══════════════════════════════════════════════════════════════════════════════

[monitor]
poll_interval_ms = 2000           # Delay between checks
input_timeout_ms = 30000          # How long to wait for the input box when sending
continue_text = "Continue"        # Message sent when generation has stopped
submit_key = "Enter"              # Key pressed after typing
stop_selector = 'button:has-text("Stop generating")'       # Present only while generating
input_selector = 'textarea[placeholder="Message Claude..."]' # Message box
on_probe_error = "treat_as_idle"  # "treat_as_idle" (send anyway) or "skip_tick"
max_continues = 0                 # Stop after N sends, 0 = run until interrupted

[monitor.backoff]
kind = "fixed"                    # "fixed" or "exponential" (grows while ticks keep failing)
max_ms = 30000                    # Upper bound for the exponential delay

# ══════════════════════════════════════════════════════════════════════════════
# BROWSER
# ══════════════════════════════════════════════════════════════════════════════

[browser]
headless = false                  # Keep the window visible so you can log in
user_data_dir = {profile}         # Persistent profile, keeps the login between runs
request_timeout_ms = 30000        # Timeout for a single DevTools request
viewport_width = 0                # 0 = use the real window size
viewport_height = 0
chrome_args = []                  # Extra Chrome arguments
# chrome_path = "/usr/bin/chromium"          # Auto-detected when unset (or set CHROME)
# connect_url = "http://127.0.0.1:9222"      # Attach to a running browser instead of launching
# user_agent = "Mozilla/5.0 ..."
"##
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::{schema::AutocontinueConfig, validate::validate_toml_str},
    };

    #[test]
    fn template_parses_to_defaults_plus_profile() {
        let text = default_config_template(Path::new("/home/me/.local/share/autocontinue/profile"));
        let cfg: AutocontinueConfig = toml::from_str(&text).unwrap();

        let mut expected = AutocontinueConfig::default();
        expected.browser.user_data_dir =
            Some("/home/me/.local/share/autocontinue/profile".into());
        assert_eq!(cfg, expected);
    }

    #[test]
    fn profile_path_with_quotes_survives() {
        let dir = r#"/home/o'brien/a "quoted" \dir"#;
        let text = default_config_template(Path::new(dir));
        let cfg: AutocontinueConfig = toml::from_str(&text).unwrap();
        assert_eq!(cfg.browser.user_data_dir, Some(dir.into()));
    }

    #[test]
    fn template_validates_cleanly() {
        let text = default_config_template(Path::new("/tmp/profile"));
        let result = validate_toml_str(&text);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
    }
}
