//! `fieldlift export` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use fieldlift_core::config::FieldliftConfig;
use fieldlift_promoter::fluentbit::{
    render_filter_section, render_kafka_output, render_lua_script,
};
use fieldlift_promoter::{FieldPromoter, TopicRouter};

use crate::cli::{ExportArgs, ExportTarget};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `export` command.
pub fn execute(
    args: ExportArgs,
    config: FieldliftConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = build_export(&args, &config)?;
    info!(export = ?args.what, "rendered collector configuration");
    writer.render(&report)?;
    Ok(())
}

/// Render the requested collector fragments from the effective configuration.
pub fn build_export(args: &ExportArgs, config: &FieldliftConfig) -> Result<ExportReport, CliError> {
    let promoter = FieldPromoter::from_config(&config.promoter)?;
    let match_pattern = args
        .match_pattern
        .clone()
        .unwrap_or_else(|| config.processor.tag.clone());
    let wants = |t: ExportTarget| args.what == t || args.what == ExportTarget::All;

    let lua = if wants(ExportTarget::Lua) {
        Some(render_lua_script(&promoter, &args.function)?)
    } else {
        None
    };
    let filter = if wants(ExportTarget::Filter) {
        Some(render_filter_section(
            &match_pattern,
            &args.script_path,
            &args.function,
        ))
    } else {
        None
    };
    let output = if wants(ExportTarget::Output) {
        let router = TopicRouter::from_config(&config.routing)?;
        Some(render_kafka_output(&match_pattern, &args.brokers, &router))
    } else {
        None
    };

    Ok(ExportReport {
        lua,
        filter,
        output,
    })
}

/// Rendered collector configuration.
#[derive(Serialize)]
pub struct ExportReport {
    /// Lua filter script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lua: Option<String>,
    /// `[FILTER]` section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// `[OUTPUT]` section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Render for ExportReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let parts: Vec<&str> = [&self.lua, &self.filter, &self.output]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        // 섹션 사이 빈 줄 하나
        write!(w, "{}", parts.join("\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PromotionOverrides;
    use fieldlift_promoter::fluentbit::{DEFAULT_FUNCTION_NAME, DEFAULT_SCRIPT_PATH};

    fn args(what: ExportTarget) -> ExportArgs {
        ExportArgs {
            what,
            script_path: DEFAULT_SCRIPT_PATH.to_owned(),
            function: DEFAULT_FUNCTION_NAME.to_owned(),
            brokers: "kafka:9092".to_owned(),
            match_pattern: None,
            overrides: PromotionOverrides::default(),
        }
    }

    #[test]
    fn test_export_lua_only() {
        let report = build_export(&args(ExportTarget::Lua), &FieldliftConfig::default())
            .expect("export should succeed");
        assert!(report.lua.is_some());
        assert!(report.filter.is_none());
        assert!(report.output.is_none());
    }

    #[test]
    fn test_export_all_uses_processor_tag() {
        let report = build_export(&args(ExportTarget::All), &FieldliftConfig::default())
            .expect("export should succeed");
        let filter = report.filter.as_deref().expect("filter rendered");
        assert!(filter.contains("kube.*"));
        let output = report.output.as_deref().expect("output rendered");
        assert!(output.contains("kafka:9092"));

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        let text = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(text.contains("function promote_topic"));
        assert!(text.contains("\n[FILTER]\n"));
        assert!(text.contains("\n[OUTPUT]\n"));
    }

    #[test]
    fn test_export_match_override() {
        let mut a = args(ExportTarget::Filter);
        a.match_pattern = Some("app.*".to_owned());
        let report = build_export(&a, &FieldliftConfig::default()).expect("export should succeed");
        assert!(report.filter.unwrap().contains("app.*"));
    }

    #[test]
    fn test_export_invalid_function_is_config_error() {
        let mut a = args(ExportTarget::Lua);
        a.function = "promote-topic".to_owned();
        let err = build_export(&a, &FieldliftConfig::default()).err().expect("should fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_export_json_skips_missing_parts() {
        let report = build_export(&args(ExportTarget::Output), &FieldliftConfig::default())
            .expect("export should succeed");
        let json = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert!(json.get("lua").is_none());
        assert!(json.get("output").is_some());
    }
}
