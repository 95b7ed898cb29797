//! Wren CLI
//!
//! Headless renderer: load a document from a file or URL, run the
//! pipeline, and write the frame as a PNG — or dump the pipeline state as
//! JSON for inspection.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use wren_engine::css::Viewport;
use wren_engine::{Pipeline, Surface};

/// Render an HTML document headlessly.
#[derive(Debug, Parser)]
#[command(name = "wren", version, about)]
struct Args {
    /// File path or http(s) URL of the document.
    input: String,

    /// Output image path.
    #[arg(short, long, default_value = "wren.png")]
    output: PathBuf,

    /// Viewport width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Vertical scroll offset in pixels.
    #[arg(long, default_value_t = 0.0)]
    scroll: f32,

    /// How long to wait for subresources (images, stylesheets, scripts).
    #[arg(long, default_value_t = 5000)]
    resource_timeout_ms: u64,

    /// Print the display list and damage as JSON instead of rendering.
    #[arg(long)]
    dump: bool,
}

#[allow(clippy::cast_precision_loss)]
fn main() -> Result<()> {
    let args = Args::parse();
    let viewport = Viewport::new(args.width as f32, args.height as f32);

    let mut pipeline = Pipeline::new(viewport);
    pipeline.load(&args.input)?;
    if args.scroll != 0.0 {
        pipeline.set_scroll(0.0, args.scroll);
    }
    let damage = pipeline.flush();

    // Let subresources trickle in, flushing a coalesced pass per batch.
    let mut damage = damage;
    let deadline = Instant::now() + Duration::from_millis(args.resource_timeout_ms);
    while pipeline.pending_resources() > 0 && Instant::now() < deadline {
        if pipeline.pump() > 0 {
            let update = pipeline.flush();
            for rect in update.rects {
                damage.add(rect);
            }
        } else {
            thread::sleep(Duration::from_millis(20));
        }
    }

    if args.dump {
        let dump = serde_json::json!({
            "display_list": pipeline.display_list(),
            "damage": damage,
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    let mut surface = Surface::new(args.width, args.height);
    pipeline.present(&mut surface, None);
    surface.save(&args.output)?;

    println!(
        "{} {} ({} display items, {} passes)",
        "rendered".green().bold(),
        args.output.display(),
        pipeline.display_list().len(),
        pipeline.frames(),
    );
    Ok(())
}
