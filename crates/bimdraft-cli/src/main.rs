mod input;

use anyhow::{bail, Context, Result};
use bimdraft_core::bounds::{compute_bounds, scene_bounds};
use bimdraft_core::geom::{BBox2, BBox3};
use bimdraft_core::visibility::SectionPlane;
use bimdraft_exchange::{FormatService, HttpFormatService, LocalFormatService, ServiceConfig};
use bimdraft_export::{Deliverable, ExportFormat, ExportInput, ExportOptions, ExportScope, Exporter};
use clap::{Parser, Subcommand};
use input::InputFile;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bimdraft")]
#[command(about = "Export BIM scenes and 2D canvases as SVG, DXF or IFC drawings.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export a canvas or scene to a drawing file.
    Export(ExportArgs),
    /// Print the extents of the canvas and scene in an input file.
    Bounds { input: PathBuf },
}

#[derive(Debug, clap::Args)]
struct ExportArgs {
    input: PathBuf,
    /// svg, dxf or ifc.
    #[arg(long, default_value = "svg")]
    format: String,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    report: Option<PathBuf>,
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    #[arg(long, default_value_t = 600.0)]
    height: f64,
    #[arg(long, default_value_t = 20.0)]
    padding: f64,
    #[arg(long)]
    show_hidden: bool,
    /// Horizontal section plane height.
    #[arg(long)]
    section_z: Option<f64>,
    #[arg(long)]
    no_metadata: bool,
    #[arg(long)]
    background: Option<String>,
    #[arg(long)]
    project_name: Option<String>,
    #[arg(long, env = "BIMDRAFT_EXPORT_URL")]
    service_url: Option<String>,
    #[arg(long, env = "BIMDRAFT_EXPORT_TIMEOUT_SECS")]
    service_timeout: Option<u64>,
    /// Produce DXF/IFC in-process instead of calling the export service.
    /// Takes precedence over `--service-url`.
    #[arg(long)]
    local: bool,
    /// Only export elements/objects with these ids.
    #[arg(long, num_args = 1..)]
    select: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => export(args).await,
        Command::Bounds { input } => bounds(&input),
    }
}

async fn export(args: ExportArgs) -> Result<()> {
    ensure_input_file(&args.input)?;
    let format: ExportFormat = args.format.parse()?;
    let input = InputFile::load(&args.input)?;

    let options = ExportOptions {
        project_name: args
            .project_name
            .clone()
            .or_else(|| input.project_name.clone()),
        scale: args.scale,
        width: args.width,
        height: args.height,
        padding: args.padding,
        show_hidden_lines: args.show_hidden,
        section: args.section_z.map(SectionPlane::new),
        include_metadata: !args.no_metadata,
        background: args.background.clone(),
        ..ExportOptions::default()
    };
    let scope = if args.select.is_empty() {
        ExportScope::All
    } else {
        ExportScope::Selection(args.select.clone())
    };

    let mut deliverable = if args.local || !format.is_delegated() {
        run(LocalFormatService, &scope, format, &input, &options).await?
    } else {
        let mut config = match &args.service_url {
            Some(url) => ServiceConfig::new(url),
            None => ServiceConfig::from_env(),
        };
        if let Some(secs) = args.service_timeout {
            config.timeout = Duration::from_secs(secs);
        }
        let service = HttpFormatService::new(config).context("create export service client")?;
        run(service, &scope, format, &input, &options).await?
    };
    let mut warnings = input.warnings.clone();
    warnings.append(&mut deliverable.report.warnings);
    deliverable.report.warnings = warnings;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&deliverable.filename));
    write_file(&output, &deliverable.bytes)
        .with_context(|| format!("write output: {output:?}"))?;
    tracing::info!(path = ?output, mime = %deliverable.mime_type, "wrote drawing");

    let json = serde_json::to_string_pretty(&deliverable.report).context("serialize report")?;
    if let Some(path) = &args.report {
        write_file(path, json.as_bytes()).with_context(|| format!("write report: {path:?}"))?;
    } else {
        println!("{json}");
    }
    Ok(())
}

async fn run<S: FormatService>(
    service: S,
    scope: &ExportScope,
    format: ExportFormat,
    input: &InputFile,
    options: &ExportOptions,
) -> Result<Deliverable> {
    let export_input = if input.is_scene() {
        ExportInput::Scene {
            objects: &input.objects,
            camera: input.camera.as_ref(),
        }
    } else {
        ExportInput::Canvas(&input.canvas)
    };
    let deliverable = Exporter::new(service)
        .export(scope, format, export_input, options)
        .await
        .with_context(|| format!("{format} export failed"))?;
    Ok(deliverable)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundsReport {
    canvas: Option<BBox2>,
    scene: Option<BBox3>,
}

fn bounds(input: &Path) -> Result<()> {
    ensure_input_file(input)?;
    let file = InputFile::load(input)?;
    for warning in &file.warnings {
        tracing::warn!(code = %warning.code, "{}", warning.message);
    }
    let report = BoundsReport {
        canvas: compute_bounds(&file.canvas),
        scene: scene_bounds(&file.objects),
    };
    let json = serde_json::to_string_pretty(&report).context("serialize bounds")?;
    println!("{json}");
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) => {
            if meta.is_file() {
                Ok(())
            } else {
                bail!("input is not a file: {input:?}");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}
