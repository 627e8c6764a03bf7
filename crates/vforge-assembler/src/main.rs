//! Assembler binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vforge_assembler::{Assembler, AssemblerConfig, BackendKind, RunOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Local,
    Cloud,
}

#[derive(Debug, Parser)]
#[command(name = "vforge-assembler", about = "Assemble a marketing video from a project directory")]
struct Args {
    /// Project directory holding project-config.json and assets.
    project_dir: PathBuf,

    /// Output file (video, or plan JSON with --emit-plan).
    #[arg(short, long)]
    output: PathBuf,

    /// Render backend.
    #[arg(long, value_enum, default_value = "local")]
    backend: BackendArg,

    /// Write the render plan JSON instead of rendering.
    #[arg(long)]
    emit_plan: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON when LOG_FORMAT=json.
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vforge=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let args = Args::parse();
    let config = AssemblerConfig::from_env();
    info!("starting vforge-assembler");

    let options = RunOptions {
        project_dir: args.project_dir,
        output: args.output,
        backend: match args.backend {
            BackendArg::Local => BackendKind::Local,
            BackendArg::Cloud => BackendKind::Cloud,
        },
        emit_plan: args.emit_plan,
    };

    let assembler = Assembler::new(config);
    if let Err(e) = assembler.run(&options).await {
        error!("assembly failed: {e}");
        std::process::exit(1);
    }
}
