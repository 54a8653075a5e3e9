//! Browser detection and install guidance.

use std::{fmt, path::PathBuf};

/// Known Chromium-based browser executable names to search for in `PATH`.
/// All of these speak the Chrome DevTools Protocol.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "chrome",
    "chrome-browser",
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "msedge",
    "microsoft-edge",
    "microsoft-edge-stable",
    "brave",
    "brave-browser",
    "vivaldi",
    "vivaldi-stable",
];

/// macOS app bundle paths for Chromium-based browsers.
#[cfg(target_os = "macos")]
const PLATFORM_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
    "/Applications/Vivaldi.app/Contents/MacOS/Vivaldi",
];

/// Windows installation paths for Chromium-based browsers.
#[cfg(target_os = "windows")]
const PLATFORM_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
    r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_PATHS: &[&str] = &[];

/// Where a browser executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// `browser.chrome_path` in the config file.
    Config,
    /// The `CHROME` environment variable.
    Env,
    /// A well-known installation path for this platform.
    Platform,
    /// An executable name resolved through `PATH`.
    SearchPath,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Env => "CHROME env var",
            Self::Platform => "install location",
            Self::SearchPath => "PATH",
        };
        f.write_str(label)
    }
}

/// Result of browser detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Path to the browser executable, with where it came from.
    pub found: Option<(PathBuf, DetectionSource)>,
    /// Platform-specific install instructions (empty when found).
    pub install_hint: String,
}

impl DetectionResult {
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.found.is_some()
    }

    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        self.found.as_ref().map(|(path, _)| path)
    }
}

/// Detect a Chromium-based browser.
///
/// Checks (in order):
/// 1. Custom path from config (if provided)
/// 2. `CHROME` environment variable
/// 3. Platform install paths (macOS app bundles, Windows program files).
///    These come before `PATH`, which can hold broken wrapper scripts.
/// 4. Known executable names in `PATH`
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    detect_browser_with(custom_path, std::env::var("CHROME").ok().as_deref())
}

fn detect_browser_with(custom_path: Option<&str>, env_path: Option<&str>) -> DetectionResult {
    let existing = |raw: Option<&str>, source: DetectionSource| {
        raw.map(PathBuf::from)
            .filter(|p| p.exists())
            .map(|p| (p, source))
    };

    let found = existing(custom_path, DetectionSource::Config)
        .or_else(|| existing(env_path, DetectionSource::Env))
        .or_else(|| {
            PLATFORM_PATHS
                .iter()
                .find_map(|p| existing(Some(*p), DetectionSource::Platform))
        })
        .or_else(|| {
            CHROMIUM_EXECUTABLES
                .iter()
                .find_map(|name| which::which(name).ok())
                .map(|p| (p, DetectionSource::SearchPath))
        });

    let install_hint = if found.is_some() {
        String::new()
    } else {
        install_instructions()
    };

    DetectionResult {
        found,
        install_hint,
    }
}

/// Get platform-specific install instructions.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome\n  \
         # Alternatives: chromium, brave-browser, microsoft-edge"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium-browser\n  \
         Fedora:         sudo dnf install chromium\n  \
         Arch:           sudo pacman -S chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome\n  \
         # Alternatives: Microsoft.Edge, Brave.Brave"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Or set the path manually:\n  \
         [browser]\n  \
         chrome_path = \"/path/to/browser\"\n\n\
         Or set the CHROME environment variable, or attach to a running\n\
         browser with `connect_url = \"http://127.0.0.1:9222\"`."
    )
}
