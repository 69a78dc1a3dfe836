//! fieldlift CLI entry point
//!
//! Loads the configuration, initializes logging and dispatches to the
//! subcommand handlers. Errors are printed to stderr and mapped to exit codes
//! via [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use fieldlift_core::config::{FieldliftConfig, GeneralConfig};

use crate::cli::{Cli, Commands};
use crate::commands::ConfigSource;
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let source = ConfigSource::resolve(cli.config.as_deref());
    let writer = OutputWriter::new(cli.output);

    // config 명령은 설정 로딩 실패도 리포트로 출력해야 하므로 기본 로깅 설정 사용
    let command = match cli.command {
        Commands::Config(args) => {
            init_logging(GeneralConfig::default(), cli.log_level.as_deref())?;
            return commands::config::execute(args, &source, &writer).await;
        }
        other => other,
    };

    // 파일 -> 환경변수 -> CLI 인자 순으로 적용한 뒤 한 번만 검증
    let mut config = source.load_unvalidated().await?;
    commands::prepare_config(&command, cli.log_level.as_deref(), &mut config)?;
    init_logging(config.general.clone(), None)?;
    fieldlift_core::metrics::describe_all();
    tracing::debug!(source = %source, "configuration loaded");
    for warning in config.warnings() {
        tracing::warn!(warning = %warning, "suspicious configuration");
    }

    dispatch(command, config, &writer).await
}

async fn dispatch(
    command: Commands,
    config: FieldliftConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match command {
        Commands::Promote(args) => commands::promote::execute(args, config, writer).await,
        Commands::Route(args) => commands::route::execute(args, config, writer).await,
        Commands::Export(args) => commands::export::execute(args, config, writer),
        Commands::Config(_) => Err(CliError::Command(
            "config command must be handled before configuration is loaded".to_owned(),
        )),
    }
}

fn init_logging(mut general: GeneralConfig, log_level: Option<&str>) -> Result<(), CliError> {
    if let Some(level) = log_level {
        general.log_level = level.to_owned();
    }
    logging::init_tracing(&general).map_err(|e| CliError::Command(e.to_string()))
}
