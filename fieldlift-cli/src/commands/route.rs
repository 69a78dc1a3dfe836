//! `fieldlift route` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use fieldlift_core::config::FieldliftConfig;
use fieldlift_promoter::{RecordProcessor, TopicSummary};

use crate::cli::RouteArgs;
use crate::commands::{describe_path, open_input};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `route` command.
///
/// Records are promoted and routed but not written; only the per-topic
/// summary is printed. [`prepare_config`](crate::commands::prepare_config)
/// forces `[routing] enabled` for this command.
pub async fn execute(
    args: RouteArgs,
    config: FieldliftConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let processor = RecordProcessor::from_config(&config)?;
    let input_name = describe_path(args.input.as_deref(), "stdin");
    info!(input = %input_name, topic_key = %config.routing.topic_key, "routing records");

    let reader = open_input(args.input.as_deref()).await?;
    let stats = processor.run(reader, tokio::io::sink()).await?;

    let report = RouteReport {
        input: input_name,
        default_topic: config.routing.topics.first().cloned().unwrap_or_default(),
        records: stats.records_emitted,
        parse_errors: stats.parse_errors,
        topics: stats.topics.unwrap_or_default(),
    };
    writer.render(&report)?;
    Ok(())
}

/// Per-topic routing report.
#[derive(Serialize)]
pub struct RouteReport {
    /// Input name (file path or stdin)
    pub input: String,
    /// Topic used when a record carries no usable routing key
    pub default_topic: String,
    /// Routed record count
    pub records: u64,
    /// Lines skipped because they could not be decoded
    pub parse_errors: u64,
    /// Per-topic counts
    pub topics: TopicSummary,
}

impl Render for RouteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Routing summary: {}", self.input.bold())?;
        writeln!(w, "{:<50} {:>10}", "TOPIC", "RECORDS")?;
        writeln!(w, "{}", "-".repeat(61))?;
        for (topic, count) in self.topics.iter() {
            if topic == self.default_topic {
                writeln!(w, "{:<50} {:>10}", topic.yellow(), count)?;
            } else {
                writeln!(w, "{topic:<50} {count:>10}")?;
            }
        }
        writeln!(w, "{}", "-".repeat(61))?;
        writeln!(
            w,
            "{} records, {} topics ({} default, {} sanitized)",
            self.records,
            self.topics.topic_count(),
            self.topics.defaulted(),
            self.topics.sanitized()
        )?;
        if self.parse_errors > 0 {
            writeln!(w, "{} undecodable lines skipped", self.parse_errors.to_string().red())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldlift_core::record::Record;
    use fieldlift_promoter::TopicRouter;
    use serde_json::json;

    fn report() -> RouteReport {
        let router = TopicRouter::new(vec!["default-topic".to_owned()], "topic_name").unwrap();
        let mut topics = TopicSummary::new();
        for value in [json!("web-1"), json!("web-1"), json!(null)] {
            let mut record = Record::new();
            record.insert("topic_name".to_owned(), value);
            topics.record(&router.route(&record));
        }
        RouteReport {
            input: "stdin".to_owned(),
            default_topic: "default-topic".to_owned(),
            records: 3,
            parse_errors: 0,
            topics,
        }
    }

    #[test]
    fn test_route_report_render_text() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report()
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Routing summary: stdin"));
        assert!(output.contains("web-1"));
        assert!(output.contains("default-topic"));
        assert!(output.contains("3 records, 2 topics (1 default, 0 sanitized)"));
    }

    #[test]
    fn test_route_report_json() {
        let json = serde_json::to_value(report()).expect("JSON serialization should succeed");
        assert_eq!(json["records"], 3);
        assert_eq!(json["topics"]["counts"]["web-1"], 2);
        assert_eq!(json["topics"]["defaulted"], 1);
    }
}
