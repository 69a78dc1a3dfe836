//! `fieldlift promote` command handler

use std::io::Write;

use serde::Serialize;
use tokio::io::{AsyncWrite, BufWriter};
use tracing::info;

use fieldlift_core::config::FieldliftConfig;
use fieldlift_promoter::{ProcessStats, RecordProcessor};

use crate::cli::PromoteArgs;
use crate::commands::{describe_path, open_input};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `promote` command.
///
/// Promoted records go to the output file or stdout; the statistics
/// report goes to stderr.
pub async fn execute(
    args: PromoteArgs,
    config: FieldliftConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let processor = RecordProcessor::from_config(&config)?;
    let input_name = describe_path(args.input.as_deref(), "stdin");
    let output_name = describe_path(args.output_file.as_deref(), "stdout");
    info!(
        input = %input_name,
        output = %output_name,
        source = %processor.promoter().source(),
        target_key = processor.promoter().target_key(),
        "promoting records"
    );

    let reader = open_input(args.input.as_deref()).await?;
    let sink: Box<dyn AsyncWrite + Unpin + Send> = match &args.output_file {
        Some(path) => Box::new(tokio::fs::File::create(path).await.map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))
        })?),
        None => Box::new(tokio::io::stdout()),
    };

    let stats = processor.run(reader, BufWriter::new(sink)).await?;

    let report = PromoteReport {
        input: input_name,
        output: output_name,
        stats,
    };
    writer.render_stderr(&report)?;
    Ok(())
}

/// Promotion run report.
#[derive(Serialize)]
pub struct PromoteReport {
    /// Input name (file path or stdin)
    pub input: String,
    /// Output name (file path or stdout)
    pub output: String,
    /// Stream statistics
    pub stats: ProcessStats,
}

impl Render for PromoteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Promoted {} -> {}", self.input.bold(), self.output.bold())?;
        writeln!(w, "  Lines read:      {}", self.stats.lines_read)?;
        writeln!(w, "  Records emitted: {}", self.stats.records_emitted)?;
        if self.stats.records_dropped > 0 {
            writeln!(w, "  Records dropped: {}", self.stats.records_dropped)?;
        }
        writeln!(w, "  Resolved:        {}", self.stats.resolved.to_string().green())?;
        writeln!(
            w,
            "  Fallbacks:       {}",
            self.stats.fallback_total().to_string().yellow()
        )?;
        for (reason, count) in &self.stats.fallbacks {
            writeln!(w, "    {reason:<18}{count}")?;
        }
        if self.stats.parse_errors > 0 {
            writeln!(
                w,
                "  Parse errors:    {}",
                self.stats.parse_errors.to_string().red()
            )?;
        }
        if let Some(topics) = &self.stats.topics {
            writeln!(w, "  Topics:          {}", topics.topic_count())?;
        }
        Ok(())
    }
}
