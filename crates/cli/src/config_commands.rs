use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    clap::Subcommand,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file, env overrides and defaults).
    Show,
    /// Write a commented config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path in use.
    Path,
}

pub fn handle_config(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show(config_path),
        ConfigAction::Init { force } => {
            let target = init_target(config_path);
            init(&target, &autocontinue_config::default_profile_dir(), force)?;
            println!("Wrote {}", target.display());
            Ok(())
        },
        ConfigAction::Path => {
            match config_path
                .map(Path::to_path_buf)
                .or_else(autocontinue_config::find_config_file)
            {
                Some(path) => println!("{}", path.display()),
                None => println!(
                    "{} (not created yet, run `autocontinue config init`)",
                    init_target(None).display()
                ),
            }
            Ok(())
        },
    }
}

fn show(config_path: Option<&Path>) -> Result<()> {
    let (mut config, found) = autocontinue_config::load_from(config_path)?;
    autocontinue_config::apply_env_overrides(&mut config);

    match found {
        Some(path) => eprintln!("# from {}", path.display()),
        None => eprintln!("# no config file found, showing defaults"),
    }
    let rendered = toml::to_string_pretty(&config).context("failed to render config")?;
    println!("{rendered}");
    Ok(())
}

/// `--config` if given, else the user config directory. Never the working directory.
fn init_target(config_path: Option<&Path>) -> PathBuf {
    match config_path {
        Some(path) => path.to_path_buf(),
        None => autocontinue_config::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("autocontinue.toml"),
    }
}

fn init(target: &Path, profile_dir: &Path, force: bool) -> Result<()> {
    let contents = autocontinue_config::template::default_config_template(profile_dir);
    autocontinue_config::write_config_file(target, &contents, force)
}
