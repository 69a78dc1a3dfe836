//! Command handlers -- one module per subcommand

pub mod config;
pub mod export;
pub mod promote;
pub mod route;

use std::fmt;
use std::path::{Path, PathBuf};

use fieldlift_core::config::FieldliftConfig;
use fieldlift_core::error::FieldliftError;
use tokio::io::{AsyncBufRead, BufReader};

use crate::cli::{Commands, DEFAULT_CONFIG_PATH, PromotionOverrides};
use crate::error::CliError;

/// Where the effective configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A TOML file.
    File(PathBuf),
    /// Built-in defaults plus environment overrides.
    Defaults,
}

impl ConfigSource {
    /// Resolve the `--config` flag.
    ///
    /// An explicit path is always used (and must exist). Without the flag,
    /// `fieldlift.toml` in the working directory is used when present.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        match explicit {
            Some(path) => Self::File(path.to_path_buf()),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::File(PathBuf::from(DEFAULT_CONFIG_PATH))
            }
            None => Self::Defaults,
        }
    }

    /// Load and validate the configuration (file, env overrides, validation).
    pub async fn load(&self) -> Result<FieldliftConfig, FieldliftError> {
        match self {
            Self::File(path) => FieldliftConfig::load(path).await,
            Self::Defaults => FieldliftConfig::from_env(),
        }
    }

    /// Load the file and apply env overrides without validating.
    ///
    /// Callers apply CLI flags and then validate once.
    pub async fn load_unvalidated(&self) -> Result<FieldliftConfig, FieldliftError> {
        match self {
            Self::File(path) => FieldliftConfig::load_unvalidated(path).await,
            Self::Defaults => {
                let mut config = FieldliftConfig::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("(built-in defaults)"),
        }
    }
}

/// Apply the command's flags on top of the loaded configuration, then validate.
///
/// This is the only validation of a command's configuration, so a flag can
/// fix an invalid file or env value.
pub fn prepare_config(
    command: &Commands,
    log_level: Option<&str>,
    config: &mut FieldliftConfig,
) -> Result<(), CliError> {
    if let Some(level) = log_level {
        config.general.log_level = level.to_owned();
    }
    match command {
        Commands::Promote(args) => {
            apply_overrides(config, &args.overrides);
            if args.fail_on_error {
                config.processor.on_parse_error = "fail".to_owned();
            }
        }
        Commands::Route(args) => {
            config.routing.enabled = true;
            apply_overrides(config, &args.overrides);
        }
        Commands::Export(args) => apply_overrides(config, &args.overrides),
        Commands::Config(_) => {}
    }
    config.validate()?;
    Ok(())
}

/// Apply promotion flags on top of the loaded configuration.
pub fn apply_overrides(config: &mut FieldliftConfig, overrides: &PromotionOverrides) {
    if let Some(source) = &overrides.source {
        config.promoter.source = source.clone();
    }
    if let Some(target) = &overrides.target {
        // 라우팅 키는 기본적으로 승격 대상 필드를 따라감
        if config.routing.topic_key == config.promoter.target_key {
            config.routing.topic_key = target.clone();
        }
        config.promoter.target_key = target.clone();
    }
    if let Some(fallback) = &overrides.fallback {
        config.promoter.fallback = fallback.clone();
    }
    if overrides.keep_empty {
        config.promoter.empty_values = "keep".to_owned();
    }
    if let Some(format) = overrides.format {
        config.processor.format = fieldlift_promoter::RecordFormat::from(format)
            .as_str()
            .to_owned();
    }
}

/// Open the input file, or stdin when no path is given.
pub async fn open_input(
    input: Option<&Path>,
) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, CliError> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Display name for an optional file argument.
pub fn describe_path(path: Option<&Path>, fallback: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_owned())
}
