// Configuration management module
// TOML settings for the Ollama collaborators, index construction and chunking

pub mod settings;

pub use settings::{BASE_DIR_ENV, Config, ConfigError, IndexConfig, OllamaConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}

/// Print the effective configuration
#[inline]
pub fn show_config(config: &Config) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    println!("# {}", config.config_file_path().display());
    println!("{}", content);
    Ok(())
}
