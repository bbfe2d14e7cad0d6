//! CLI binary for edgequake-img2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the resulting PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_img2pdf::{
    convert, inspect_pdf, write_atomic, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, PageLayout, Placement, ProgressCallback, DEFAULT_FILENAME,
    PDF_MIME_TYPE,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar plus one log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the image currently being processed.
    image_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            image_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.image_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_images: usize) {
        self.bar.set_length(total_images as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_images} image(s)…"))
        ));
    }

    fn on_image_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.image_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("image {page_num}"));
    }

    fn on_image_complete(&self, page_num: usize, total: usize, placement: &Placement) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:.0}×{:.0} pt", placement.width, placement.height)),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, page_num: usize, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, _total_images: usize, pages_written: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} page(s) written",
            green("✔"),
            bold(&pages_written.to_string())
        );
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert images into converted_images.pdf
  img2pdf scan1.png scan2.jpg scan3.jpeg

  # Choose the output file and set a document title
  img2pdf -o receipts.pdf --title "March receipts" receipts/*.jpg

  # Mix local files and URLs
  img2pdf cover.png https://example.com/photo.jpg -o album.pdf

  # Write the PDF to stdout
  img2pdf --stdout a.png b.png > out.pdf

  # Show where each image was placed in an existing PDF
  img2pdf --inspect-only converted_images.pdf

LAYOUT:
  Every page is US Letter (612 × 792 pt). Each image is drawn 500 pt wide,
  50 pt from the left and top edges; its height follows the aspect ratio and
  may run past the bottom of the page for very tall images.

SUPPORTED FORMATS:
  PNG, JPEG (.png, .jpg, .jpeg). The format is detected from the file
  contents. Any unreadable image aborts the whole conversion.

ENVIRONMENT VARIABLES:
  RUST_LOG   Override the log filter (e.g. RUST_LOG=edgequake_img2pdf=debug)
"#;

/// Convert PNG and JPEG images into a single multi-page PDF.
#[derive(Parser, Debug)]
#[command(
    name = "img2pdf",
    version,
    about = "Convert PNG and JPEG images into a single multi-page PDF",
    long_about = "Convert PNG and JPEG images (local files or URLs) into one PDF document, \
one image per US Letter page, each scaled to 500 pt wide with its aspect ratio preserved.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files or HTTP/HTTPS URLs, in page order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write the PDF to this file.
    #[arg(short, long, env = "IMG2PDF_OUTPUT", default_value = DEFAULT_FILENAME)]
    output: PathBuf,

    /// Write the PDF to stdout instead of a file.
    #[arg(long, conflicts_with_all = ["json", "inspect_only"])]
    stdout: bool,

    /// Document title stored in the PDF metadata.
    #[arg(long, env = "IMG2PDF_TITLE")]
    title: Option<String>,

    /// Print a JSON summary (pages, placements, stats) to stdout.
    #[arg(long, env = "IMG2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMG2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Treat inputs as PDFs and print the placement of each page's image.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2PDF_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "IMG2PDF_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

/// JSON summary printed by `--json`.
#[derive(Serialize)]
struct JsonSummary<'a> {
    output: String,
    mime_type: &'static str,
    #[serde(flatten)]
    result: &'a ConversionOutput,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters; keep INFO
    // logs out of its way unless the user asked for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return inspect_files(&cli).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.inputs, &config)
        .await
        .context("Conversion failed")?;

    if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&output.pdf)
            .and_then(|_| handle.flush())
            .context("Failed to write PDF to stdout")?;
        return Ok(());
    }

    write_atomic(&cli.output, &output.pdf)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if cli.json {
        let summary = JsonSummary {
            output: cli.output.display().to_string(),
            mime_type: PDF_MIME_TYPE,
            result: &output,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}  {}ms  →  {}",
            green("✔"),
            output.stats.page_count,
            dim(&format!("{} bytes", output.stats.output_bytes)),
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder().download_timeout_secs(cli.download_timeout);
    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

/// `--inspect-only`: print the page layout of each input PDF.
async fn inspect_files(cli: &Cli) -> Result<()> {
    let mut all: Vec<(String, Vec<PageLayout>)> = Vec::new();
    for input in &cli.inputs {
        let bytes = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {input}"))?;
        let pages = inspect_pdf(&bytes).with_context(|| format!("Failed to inspect {input}"))?;
        all.push((input.clone(), pages));
    }

    if cli.json {
        let map: serde_json::Map<String, serde_json::Value> = all
            .into_iter()
            .map(|(name, pages)| serde_json::to_value(pages).map(|v| (name, v)))
            .collect::<Result<_, serde_json::Error>>()
            .context("Failed to serialise layout")?;
        println!("{}", serde_json::to_string_pretty(&map).context("Failed to serialise layout")?);
        return Ok(());
    }

    for (name, pages) in all {
        println!("File:   {}", name);
        println!("Pages:  {}", pages.len());
        for page in pages {
            let (w, h) = page.media_box;
            match page.image {
                Some(img) => println!(
                    "  {:>3}  {:.0}×{:.0} pt page  image {}×{} px  at ({:.2}, {:.2})  size {:.2}×{:.2} pt  {}",
                    page.page_num,
                    w,
                    h,
                    img.pixel_width,
                    img.pixel_height,
                    img.placement.x,
                    img.placement.y,
                    img.placement.width,
                    img.placement.height,
                    img.filter.as_deref().unwrap_or("-"),
                ),
                None => println!("  {:>3}  {:.0}×{:.0} pt page  (no image)", page.page_num, w, h),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_output_name() {
        let cli = Cli::try_parse_from(["img2pdf", "a.png"]).unwrap();
        assert_eq!(cli.output, PathBuf::from(DEFAULT_FILENAME));
        assert_eq!(cli.download_timeout, 120);
        assert_eq!(cli.inputs, vec!["a.png".to_string()]);
    }

    #[test]
    fn cli_keeps_input_order() {
        let cli = Cli::try_parse_from(["img2pdf", "b.jpg", "a.png", "-o", "x.pdf"]).unwrap();
        assert_eq!(cli.inputs, vec!["b.jpg".to_string(), "a.png".to_string()]);
        assert_eq!(cli.output, PathBuf::from("x.pdf"));
    }

    #[test]
    fn stdout_conflicts_with_json() {
        assert!(Cli::try_parse_from(["img2pdf", "--stdout", "--json", "a.png"]).is_err());
    }

    #[test]
    fn build_config_maps_title() {
        let cli = Cli::try_parse_from(["img2pdf", "--title", "Scans", "a.png"]).unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.title.as_deref(), Some("Scans"));
    }
}
