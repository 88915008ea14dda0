mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cognisync_graph::snapshot::{GraphSnapshot, load_layout_config};
use cognisync_graph::LayoutConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph snapshot JSON. The built-in sample graph is used when omitted.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Layout constants JSON; missing fields keep their defaults.
    #[arg(long)]
    layout_config: Option<PathBuf>,

    /// Where the Evidence tab writes its export.
    #[arg(long, default_value = "cognisync_research_export.json")]
    export_path: PathBuf,

    #[arg(long, default_value_t = 1440.0)]
    width: f32,

    #[arg(long, default_value_t = 920.0)]
    height: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let snapshot = match &args.graph {
        Some(path) => GraphSnapshot::load(path)
            .with_context(|| format!("failed to load graph snapshot {}", path.display()))?,
        None => GraphSnapshot::sample(),
    };
    let layout_config = match &args.layout_config {
        Some(path) => load_layout_config(path)
            .with_context(|| format!("failed to load layout config {}", path.display()))?,
        None => LayoutConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([args.width.max(640.0), args.height.max(480.0)]),
        ..Default::default()
    };

    let export_path = args.export_path;
    eframe::run_native(
        "CogniSync",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::KnowledgeGraphApp::new(
                cc,
                snapshot,
                layout_config,
                export_path,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}
