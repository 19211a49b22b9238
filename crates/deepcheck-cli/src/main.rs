mod render;
mod scan;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use deepcheck_client::AnalyzeClient;

const DEFAULT_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "deepcheck", about = "Deepfake analysis server and client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the analysis HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },
    /// Upload one image, video or audio file and print its trust score
    Analyze {
        /// Media file to analyze
        file: PathBuf,

        /// Server base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },
    /// Live scan: submit a frame every interval until Ctrl-C
    Scan {
        /// JPEG that another process keeps refreshing
        #[arg(long, conflicts_with = "device", required_unless_present = "device")]
        file: Option<PathBuf>,

        /// Capture device read through ffmpeg (e.g. /dev/video0)
        #[arg(long)]
        device: Option<String>,

        /// ffmpeg input format for the device (v4l2, avfoundation, dshow)
        #[arg(long, requires = "device")]
        format: Option<String>,

        /// ffmpeg binary used for device capture
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: String,

        /// Server base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,

        /// Seconds between frames
        #[arg(long, default_value_t = 3)]
        interval_secs: u64,

        /// Abort outstanding requests on stop instead of waiting for them
        #[arg(long)]
        cancel_in_flight: bool,
    },
    /// Check that a server is up
    Health {
        /// Server base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            let config = deepcheck_config::load_config().context("failed to load config")?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(deepcheck_gateway::start_server(config, port, host))?;
        }
        Commands::Analyze { file, url } => {
            let rt = tokio::runtime::Runtime::new()?;
            let result = rt.block_on(async {
                let client = AnalyzeClient::new(&url)?;
                client.analyze_file(&file).await
            })?;
            println!("{}", render::render_result(&result));
        }
        Commands::Scan {
            file,
            device,
            format,
            ffmpeg,
            url,
            interval_secs,
            cancel_in_flight,
        } => {
            if interval_secs == 0 {
                anyhow::bail!("--interval-secs must be at least 1");
            }
            let source = match (file, device) {
                (Some(path), _) => scan::Source::File(path),
                (None, Some(device)) => scan::Source::Device {
                    device,
                    format,
                    ffmpeg,
                },
                (None, None) => anyhow::bail!("either --file or --device is required"),
            };
            let args = scan::ScanArgs {
                source,
                url,
                interval: Duration::from_secs(interval_secs),
                cancel_in_flight,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan::run_scan(args, scan::ctrl_c()))?;
        }
        Commands::Health { url } => {
            let rt = tokio::runtime::Runtime::new()?;
            let health = rt.block_on(async {
                let client = AnalyzeClient::new(&url)?;
                client.health().await
            })?;
            println!("{}", render::render_health(&url, &health));
        }
    }

    Ok(())
}
