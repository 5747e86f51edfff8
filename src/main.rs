use std::fs;
use std::io::{self, Read};

use clap::{Args, Parser, Subcommand};
use ifc_viewer_host::config::{ConfigError, ViewerConfig, parse_topic_id};
use ifc_viewer_host::sync::{HttpViewpointPublisher, TopicRef, ViewpointPublisher};
use ifc_viewer_host::viewpoint::{Viewpoint, wire_body};
use ifc_viewer_host::{ErrorCode, ViewerError};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("missing topic id; pass --topic-id or set BCF_TOPIC_ID")]
    MissingTopic,
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("invalid viewpoint JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    Viewer(#[from] ViewerError),
}

#[derive(Parser, Debug)]
#[command(name = "bcf-viewpoint", about = "Strip and publish BCF viewpoints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the wire body for a viewpoint (bitmaps removed).
    Strip(InputArgs),
    /// Post a viewpoint to a BCF topic.
    Publish(PublishArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,

    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct PublishArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long, help = "Overrides BCF_PROJECT_ID")]
    project_id: Option<String>,

    #[arg(long, help = "Overrides BCF_TOPIC_ID")]
    topic_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Strip(args) => run_strip(&args),
        Command::Publish(args) => run_publish(args).await,
    };
    if let Err(CliError::Viewer(e)) = &result {
        tracing::error!(code = e.error_code(), retryable = e.retryable(), "command failed");
    }
    result
}

fn run_strip(args: &InputArgs) -> Result<(), CliError> {
    let viewpoint = read_viewpoint(&args.input)?;
    print_json(&wire_body(&viewpoint)?, args.pretty)
}

async fn run_publish(args: PublishArgs) -> Result<(), CliError> {
    let config = ViewerConfig::from_env()?;
    let project_id = args.project_id.unwrap_or_else(|| config.project_id.clone());
    let topic_id = match args.topic_id.as_deref() {
        Some(raw) => parse_topic_id(raw)?,
        None => config.topic_id.ok_or(CliError::MissingTopic)?,
    };
    let topic = TopicRef::new(project_id, topic_id);

    let mut viewpoint = read_viewpoint(&args.input.input)?;
    let stripped = viewpoint.strip_bitmaps();
    tracing::info!(stripped, endpoint = %topic.viewpoints_path(), "publishing viewpoint");

    let publisher = HttpViewpointPublisher::from_config(&config)?;
    let response = publisher.publish(&viewpoint, &topic).await?;
    print_json(&response, args.input.pretty)
}

fn read_viewpoint(input: &str) -> Result<Viewpoint, CliError> {
    let raw = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &Value, pretty: bool) -> Result<(), CliError> {
    let text = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{text}");
    Ok(())
}
