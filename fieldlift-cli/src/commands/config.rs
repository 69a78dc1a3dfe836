//! `fieldlift config` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use fieldlift_core::config::FieldliftConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::ConfigSource;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Section names accepted by `config show --section`.
const SECTIONS: &[&str] = &["general", "promoter", "routing", "processor"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    source: &ConfigSource,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(source, writer).await,
        ConfigAction::Show { section } => execute_show(source, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// Loads the configuration, then checks that the promotion rule and
/// routing settings can actually be built.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (parse errors, invalid values,
/// unparseable source path, invalid topic names).
async fn execute_validate(source: &ConfigSource, writer: &OutputWriter) -> Result<(), CliError> {
    info!(source = %source, "validating configuration");

    let (errors, warnings) = match source.load().await {
        Ok(config) => (check_buildable(&config), config.warnings()),
        Err(e) => (vec![e.to_string()], Vec::new()),
    };

    let report = ConfigValidationReport {
        source: source.to_string(),
        valid: errors.is_empty(),
        errors,
        warnings,
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Checks that pass TOML validation but fail when the components are built.
fn check_buildable(config: &FieldliftConfig) -> Vec<String> {
    match fieldlift_promoter::RecordProcessor::from_config(config) {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    }
}

/// Execute the config show subcommand.
///
/// Loads and displays the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if section name is invalid.
async fn execute_show(
    source: &ConfigSource,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(source = %source, "loading configuration");

    let config = source.load().await?;
    let report = build_show_report(&config, source, section)?;
    writer.render(&report)?;

    Ok(())
}

fn build_show_report(
    config: &FieldliftConfig,
    source: &ConfigSource,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section.as_deref() {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("promoter") => toml::to_string_pretty(&config.promoter),
        Some("routing") => toml::to_string_pretty(&config.routing),
        Some("processor") => toml::to_string_pretty(&config.processor),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    }
    .map_err(|e| CliError::Command(format!("failed to serialize configuration: {e}")))?;

    let config_json = match section.as_deref() {
        None => serde_json::to_value(config)?,
        Some("general") => serde_json::to_value(&config.general)?,
        Some("promoter") => serde_json::to_value(&config.promoter)?,
        Some("routing") => serde_json::to_value(&config.routing)?,
        Some(_) => serde_json::to_value(&config.processor)?,
    };

    Ok(ConfigReport {
        source: source.to_string(),
        section,
        config: config_json,
        config_toml,
    })
}

/// Configuration display report.
///
/// Text output prints the TOML form; JSON output carries the same values as an object.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration source
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Effective configuration values
    pub config: serde_json::Value,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
///
/// Contains validation result and any error messages encountered.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration source
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
    /// Settings that are valid but likely unintended
    pub warnings: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        for warning in &self.warnings {
            writeln!(w, "  Warning: {}", warning.yellow())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_full_config() {
        let report = build_show_report(&FieldliftConfig::default(), &ConfigSource::Defaults, None)
            .expect("report should build");
        assert!(report.config_toml.contains("[promoter]"));
        assert!(report.config_toml.contains("kubernetes.pod_name"));
        assert_eq!(report.config["routing"]["topic_key"], "topic_name");
    }

    #[test]
    fn test_show_single_section() {
        let report = build_show_report(
            &FieldliftConfig::default(),
            &ConfigSource::Defaults,
            Some("routing".to_owned()),
        )
        .expect("report should build");
        assert!(report.config_toml.contains("dynamic_topic = true"));
        assert!(!report.config_toml.contains("fallback"));
        assert_eq!(report.config["topics"][0], "default-topic");
    }

    #[test]
    fn test_show_unknown_section() {
        let err = build_show_report(
            &FieldliftConfig::default(),
            &ConfigSource::Defaults,
            Some("ebpf".to_owned()),
        )
        .err()
        .expect("should fail");
        assert!(err.to_string().contains("unknown section: ebpf"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_report_render_text_specific_section() {
        let report = ConfigReport {
            source: "/etc/fieldlift.toml".to_owned(),
            section: Some("promoter".to_owned()),
            config: serde_json::Value::Null,
            config_toml: "fallback = \"default-topic\"".to_owned(),
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("[promoter]"), "should show section name");
        assert!(output.contains("fallback"), "should show config content");
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = build_show_report(&FieldliftConfig::default(), &ConfigSource::Defaults, None)
            .expect("report should build");
        let json = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert!(json.get("config_toml").is_none(), "config_toml should be skipped");
        assert!(json.get("section").is_none());
        assert_eq!(json["source"], "(built-in defaults)");
    }

    #[test]
    fn test_check_buildable_reports_bad_source_path() {
        let mut config = FieldliftConfig::default();
        config.promoter.source = "kubernetes".to_owned();
        let errors = check_buildable(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("kubernetes"));
    }

    #[test]
    fn test_check_buildable_reports_bad_topic() {
        let mut config = FieldliftConfig::default();
        config.routing.topics = vec!["bad topic".to_owned()];
        assert_eq!(check_buildable(&config).len(), 1);
    }

    #[test]
    fn test_config_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            errors: vec!["promoter.fallback: must not be empty".to_owned()],
            warnings: Vec::new(),
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("INVALID"), "should show invalid status");
        assert!(output.contains("must not be empty"), "should show error message");
    }

    #[test]
    fn test_config_validation_report_shows_warnings() {
        let mut config = FieldliftConfig::default();
        config.promoter.target_key = "route".to_owned();
        let report = ConfigValidationReport {
            source: "fieldlift.toml".to_owned(),
            valid: true,
            errors: check_buildable(&config),
            warnings: config.warnings(),
        };
        assert!(report.errors.is_empty());

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("VALID"));
        assert!(output.contains("Warning:"));
        assert!(output.contains("routing.topic_key"));
    }
}
