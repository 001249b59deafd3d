use crate::cli::InitArgs;
use crate::config::Config;
use crate::utils::output::{OutputStyle, print_success, print_warning};
use anyhow::{Context, Result};
use std::path::Path;

/// Write the default configuration. Credentials stay in the environment.
pub fn handle_init_command(config_path: &Path, args: &InitArgs) -> Result<()> {
    if config_path.exists() && !args.force {
        print_warning(&format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
        return Ok(());
    }

    let config = Config::default();
    config
        .save_to(config_path)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    print_success(&format!("Wrote configuration to {}", config_path.display()));
    OutputStyle::print_field("Database", &config.database.url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("concertdb-init-{}-{}", name, std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_init_writes_defaults_only() {
        let path = scratch_path("defaults");

        handle_init_command(&path, &InitArgs { force: false }).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("auth_token"));
        assert!(!written.contains("auth_uid"));
        assert_eq!(Config::load_file(&path).unwrap(), Config::default());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let path = scratch_path("keep");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not [valid toml").unwrap();

        handle_init_command(&path, &InitArgs { force: false }).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not [valid toml");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_init_force_replaces_broken_file() {
        let path = scratch_path("force");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not [valid toml").unwrap();

        handle_init_command(&path, &InitArgs { force: true }).unwrap();
        assert_eq!(Config::load_file(&path).unwrap(), Config::default());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
