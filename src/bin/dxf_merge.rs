//! Merge the model space of several DXF files into one new drawing.
//!
//! ```text
//! dxf-merge a.dxf b.dxf -o merged.dxf --mode block:PART
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dxfdoc::config::DocumentOptions;
use dxfdoc::naming::unique_name;
use dxfdoc::{Document, DxfVersion, MergeMode, MergeSummary};

#[derive(Parser)]
#[command(name = "dxf-merge", about = "Merge DXF drawings into one document")]
struct Cli {
    /// Source drawings, merged in the given order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output file; a free name `stem_N.dxf` is picked if it exists.
    #[arg(short, long, default_value = "merged.dxf")]
    output: PathBuf,
    /// "flat", "layer:NAME" or "block:NAME"; block and layer names get
    /// the source file stem appended.
    #[arg(long, default_value = "flat")]
    mode: MergeMode,
    /// Revision of the new document, e.g. R2000 or AC1024.
    #[arg(long = "dxf-version", default_value = "R2000")]
    dxf_version: DxfVersion,
    /// Options file; `$DXFDOC_CONFIG` or `./dxfdoc.toml` otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = load_options(cli.config.as_deref());
    init_logging(&options);

    let mut target = Document::new_with_options(cli.dxf_version, options.clone())
        .with_context(|| format!("cannot create a {} document", cli.dxf_version))?;

    let mut merged = 0;
    for input in &cli.inputs {
        let source = match Document::readfile_with_options(input, options.clone()) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(file = %input.display(), error = %err, "skipping unreadable input");
                continue;
            }
        };
        let mode = mode_for(&cli.mode, input);
        let summary = match target.merge(&source, &mode) {
            Ok(summary) => summary,
            Err(err) => {
                warn!(file = %input.display(), error = %err, "skipping input");
                continue;
            }
        };
        report(input, &summary);
        merged += 1;
    }
    if merged == 0 {
        bail!("none of the {} inputs could be merged", cli.inputs.len());
    }

    let output = free_output_path(&cli.output)?;
    target
        .saveas(&output, None)
        .with_context(|| format!("cannot write {}", output.display()))?;
    for notification in target.notifications.iter() {
        warn!("{}", notification);
    }
    info!(output = %output.display(), inputs = merged, "merged drawing written");
    Ok(())
}

fn load_options(path: Option<&Path>) -> DocumentOptions {
    let loaded = match path {
        Some(path) => DocumentOptions::from_file(path),
        None => DocumentOptions::discover(),
    };
    loaded.unwrap_or_else(|err| {
        eprintln!("dxf-merge: {}, using default options", err);
        DocumentOptions::default()
    })
}

fn init_logging(options: &DocumentOptions) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // A global subscriber may already be installed
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Named modes get one layer or block per input file.
fn mode_for(mode: &MergeMode, input: &Path) -> MergeMode {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match mode {
        MergeMode::Flat => MergeMode::Flat,
        MergeMode::Layer(name) => MergeMode::Layer(format!("{}_{}", name, stem)),
        MergeMode::Block(name) => MergeMode::Block(format!("{}_{}", name, stem)),
    }
}

fn report(input: &Path, summary: &MergeSummary) {
    info!(
        file = %input.display(),
        entities = summary.entities,
        layers = summary.layers,
        blocks = summary.blocks,
        definitions = summary.definitions,
        skipped = summary.skipped,
        "merged"
    );
}

fn free_output_path(output: &Path) -> Result<PathBuf> {
    let dir = output.parent().unwrap_or_else(|| Path::new(""));
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .context("output path has no file name")?;
    let extension = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dxf".to_string());
    let stem = unique_name(&stem, |candidate| {
        dir.join(format!("{}.{}", candidate, extension)).exists()
    })?;
    Ok(dir.join(format!("{}.{}", stem, extension)))
}
