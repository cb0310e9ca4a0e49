use clap::{Parser, Subcommand};
use lgmon::compiler::loader;
use lgmon::runtime::config::MonitorConfig;
use lgmon::runtime::engine::Engine;
use lgmon::runtime::envelope::{end_stream_request, start_stream_request};
use lgmon::runtime::layout::LayoutDirection;
use lgmon::runtime::pipeline::Pipeline;
use lgmon::runtime::source::ReplaySource;
use std::fs;
use std::path::PathBuf;
use anyhow::{Context as AnyhowContext, Result};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Monitor config file (YAML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one batch fixture to positioned graph elements
    Render {
        /// Path to a batch or stream message (JSON or YAML)
        file: PathBuf,

        /// vertical or horizontal
        #[arg(long, short)]
        direction: Option<LayoutDirection>,

        /// Print the whole snapshot instead of just the elements
        #[arg(long)]
        snapshot: bool,
    },

    /// Replay recorded stream messages, one JSON message per line
    Replay {
        file: PathBuf,
    },

    /// Print the start and end stream control requests
    Requests,
}

fn load_config(path: Option<&PathBuf>) -> Result<MonitorConfig> {
    match path {
        Some(p) => loader::load_config_from_file(&p.to_string_lossy()),
        None => Ok(MonitorConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match &cli.command {
        Commands::Render { file, direction, snapshot } => {
            info!("Loading batch from: {:?}", file);
            let raw = loader::load_batch_from_file(&file.to_string_lossy(), &config)?;

            let pipeline = Pipeline::from_config(&config);
            let output = pipeline.run(&raw, direction.unwrap_or(config.direction), None)?;
            for missing in &output.missing {
                warn!("{}", missing);
            }
            if let Some(e) = &output.layout_error {
                warn!("Layout failed: {}", e);
            }

            let json = if *snapshot {
                serde_json::to_string_pretty(&output.snapshot)?
            } else {
                serde_json::to_string_pretty(&output.snapshot.elements)?
            };
            println!("{}", json);
        }
        Commands::Replay { file } => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read messages from {:?}", file))?;
            let mut source = ReplaySource::from_lines(&text);

            let engine = Engine::new(config);
            let session = engine.open_session();
            engine.connect(session)?;
            engine.on_open(session)?;

            let updates = engine.pump(session, &mut source).await?;
            info!("Applied {} updates", updates);

            engine.disconnect(session)?;
            engine.on_close(session)?;

            if let Some(snapshot) = engine.snapshot(session) {
                println!("{}", serde_json::to_string_pretty(&snapshot.elements)?);
            } else if let Some(notice) = engine.notice(session) {
                warn!("{}", notice);
            }
        }
        Commands::Requests => {
            println!("{}", serde_json::to_string_pretty(&start_stream_request(&config, 1))?);
            println!("{}", serde_json::to_string_pretty(&end_stream_request(&config, 2))?);
        }
    }

    Ok(())
}
