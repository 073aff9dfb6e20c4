use clap::{Parser, Subcommand};
use rayon::prelude::*;
use retouch::bundle::BUNDLE_FILENAME;
use retouch::imaging::RustBackend;
use retouch::output::{self, EnhanceReport};
use retouch::service::ProcessingService;
use retouch::{config, server};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Upload, upscale, sharpen and hand-correct images from the browser")]
#[command(long_about = "\
Upload, upscale, sharpen and hand-correct images from the browser

Uploaded images are upscaled (2x, at most 4000px wide) with Lanczos3 and
sharpened. The editor paints an overlay on top of a result, which the server
composites back into the file in place.

Layout on disk:

  public/
  ├── uploads/   # Originals as uploaded (files-<ms>-<id>.<ext>)
  └── results/   # Enhanced images (enhanced_<name>_<ms>.<ext>)

Configuration precedence: stock defaults < retouch.toml < flags < PORT env.
Run 'retouch gen-config' to generate a documented retouch.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./retouch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Enhance image files straight into the results directory
    Enhance {
        /// Images to enhance
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write the zip of all results to disk
    Bundle {
        /// Archive path
        #[arg(long, default_value = BUNDLE_FILENAME)]
        output: PathBuf,
    },
    /// Print a stock retouch.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.apply_env(|key| std::env::var(key).ok())?;
            config.validate()?;

            output::print_serve_banner(&config);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(&config))?;
        }
        Command::Enhance { files } => {
            let config = load_config(cli.config.as_deref())?;
            init_thread_pool(&config.processing);
            let service = ProcessingService::new(RustBackend::new(), &config)?;
            let reports = enhance_files(&service, &files);
            output::print_enhance_report(&reports, &config.storage.results_dir);

            if reports.iter().all(|r| r.result.is_err()) {
                return Err("no image could be enhanced".into());
            }
        }
        Command::Bundle { output: destination } => {
            let config = load_config(cli.config.as_deref())?;
            let service = ProcessingService::new(RustBackend::new(), &config)?;
            let files = service.list_results()?.len();
            let bytes = service.bundle_all()?;
            std::fs::write(&destination, &bytes)?;
            output::print_bundle_summary(files, bytes.len(), &destination);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<config::ServerConfig, Box<dyn std::error::Error>> {
    Ok(config::load_config(explicit, &std::env::current_dir()?)?)
}

fn enhance_files(service: &ProcessingService<RustBackend>, files: &[PathBuf]) -> Vec<EnhanceReport> {
    files
        .par_iter()
        .map(|source| EnhanceReport {
            source: source.clone(),
            result: service.enhance_path(source).map_err(|e| e.to_string()),
        })
        .collect()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retouch=info,tower_http=info".into()),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
