//! rfrender - render an HTML file with the RFox core and print the result
//!
//! ```text
//! rfrender page.html                      # indented DOM tree
//! rfrender page.html --format geometry    # tree with rectangles
//! rfrender page.html --format json        # frame as JSON
//! rfrender page.html --css extra.css --width 800 --scroll 200
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::debug;
use rfrender::rendering::digest::{frame_digest, geometry_digest};
use rfrender::{Engine, EngineConfig, RenderEngine, StylesheetSource, Viewport};

/// Render an HTML file and print its tree, geometry, display list or text
#[derive(Parser, Debug)]
#[command(name = "rfrender")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTML file to render
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Extra stylesheet cascaded after the document's own (repeatable)
    #[arg(long, value_name = "FILE")]
    css: Vec<PathBuf>,

    /// Viewport width (overrides the config file)
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height (overrides the config file)
    #[arg(long)]
    height: Option<u32>,

    /// Vertical scroll offset in pixels
    #[arg(long, default_value_t = 0)]
    scroll: i32,

    /// JSON engine configuration
    #[arg(long, value_name = "FILE.json")]
    config: Option<PathBuf>,

    /// What to print
    #[arg(long, value_enum, default_value_t = Format::Tree)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Indented DOM tree
    Tree,
    /// DOM tree with laid-out rectangles
    Geometry,
    /// Frame (display list and scroll metrics) as JSON
    Json,
    /// Title and body text
    Text,
    /// SHA-256 digests of geometry and frame
    Digest,
}

/// Resolves `<link>` hrefs as paths relative to the document's directory.
struct DirectorySource {
    base: PathBuf,
}

impl StylesheetSource for DirectorySource {
    fn stylesheet(&self, href: &str) -> Option<String> {
        let path = self.base.join(href);
        match fs::read_to_string(&path) {
            Ok(css) => Some(css),
            Err(e) => {
                debug!("cannot read {}: {e}", path.display());
                None
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.viewport = Viewport {
        width: cli.width.unwrap_or(config.viewport.width),
        height: cli.height.unwrap_or(config.viewport.height),
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let html = fs::read(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let base = cli
        .file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut engine = RenderEngine::with_source(config, Box::new(DirectorySource { base }))?;
    engine.load_html(&html)?;
    for path in &cli.css {
        let css = fs::read_to_string(path)
            .with_context(|| format!("reading stylesheet {}", path.display()))?;
        engine.add_stylesheet(&css)?;
    }

    if cli.format == Format::Text {
        let snapshot = engine.render_text_snapshot()?;
        println!("Title: {}", snapshot.title);
        println!("{}", snapshot.text);
        engine.close()?;
        return Ok(());
    }

    let frame = engine
        .render(cli.scroll)
        .with_context(|| format!("rendering {}", cli.file.display()))?;
    let doc = engine
        .document()
        .context("engine lost its document after rendering")?;

    match cli.format {
        Format::Tree => print!("{doc}"),
        Format::Geometry => print!("{}", doc.dump_geometry()),
        Format::Json => println!("{}", serde_json::to_string_pretty(&frame)?),
        Format::Digest => {
            println!("geometry {}", geometry_digest(doc));
            println!("frame    {}", frame_digest(&frame));
        }
        Format::Text => {}
    }
    engine.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}
