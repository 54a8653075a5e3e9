//! CLI subcommands for browser detection and settings.

use std::path::Path;

use {
    anyhow::Result,
    autocontinue_browser::{BrowserConfig, LaunchMode, detect_browser},
    clap::Subcommand,
};

#[derive(Subcommand)]
pub enum BrowserAction {
    /// Show the browser settings and which executable would be used.
    Status,
}

pub fn handle_browser(config_path: Option<&Path>, action: BrowserAction) -> Result<()> {
    match action {
        BrowserAction::Status => status(config_path),
    }
}

fn status(config_path: Option<&Path>) -> Result<()> {
    let (mut config, _) = autocontinue_config::load_from(config_path)?;
    autocontinue_config::apply_env_overrides(&mut config);
    let browser = BrowserConfig::from(&config.browser);

    println!("Browser configuration:");
    match browser.mode {
        LaunchMode::Launch => println!("  mode:           launch"),
        LaunchMode::Attach(ref url) => println!("  mode:           attach ({url})"),
    }
    println!("  headless:       {}", browser.headless);
    match browser.viewport {
        Some(vp) => println!("  viewport:       {}x{}", vp.width, vp.height),
        None => println!("  viewport:       (window size)"),
    }
    match browser.user_data_dir {
        Some(ref dir) => println!("  user_data_dir:  {}", dir.display()),
        None => println!("  user_data_dir:  (temporary profile, login is not kept)"),
    }
    println!(
        "  request_timeout: {}ms",
        browser.request_timeout.as_millis()
    );
    if !browser.chrome_args.is_empty() {
        println!("  chrome_args:    {:?}", browser.chrome_args);
    }

    if matches!(browser.mode, LaunchMode::Attach(_)) {
        println!("\nAttaching to a running browser; no local executable needed.");
        return Ok(());
    }

    let detection = detect_browser(browser.chrome_path.as_deref());
    match detection.found {
        Some((path, source)) => println!("  executable:     {} (from {source})", path.display()),
        None => {
            println!("  executable:     not found\n");
            println!("{}", detection.install_hint);
        },
    }

    Ok(())
}
