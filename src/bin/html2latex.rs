//! CLI binary for html2latex.
//!
//! A thin shim over the library crate: reads HTML from files or stdin, runs
//! the rewrite pipeline or the table rasteriser, and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use html2latex::{
    clean_paragraph_ending, latexify, BrowserCommand, JsonFileCache, RasterConfig, TableRasterizer,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rewrite a text fragment for LaTeX
  echo 'Pi:3.14 "roughly."' | html2latex format

  # Clean paragraph endings in an editor export
  html2latex clean answer.html > answer.clean.html

  # Render a table to PNG and print the \includegraphics command
  html2latex table --static-root ./static table.html

  # Render several tables, reusing earlier renders
  html2latex table --cache-file ~/.cache/html2latex.json --json t1.html t2.html

ENVIRONMENT VARIABLES:
  HTML2LATEX_STATIC_ROOT   Directory holding css/table.css
  HTML2LATEX_MATHJAX_ROOT  Directory holding MathJax.js
  HTML2LATEX_BROWSER       Browser command line with {url} {output} {wait_ms} {width} {height}
  HTML2LATEX_WORK_DIR      Where rendered PNGs are written
  RUST_LOG                 tracing filter, overrides -v
"#;

/// Convert editor HTML fragments to LaTeX-ready text and images.
#[derive(Parser, Debug)]
#[command(
    name = "html2latex",
    version,
    about = "Convert editor HTML fragments to LaTeX-ready text and table images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HTML2LATEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "HTML2LATEX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Protect numbers, fix spacing, escape angle brackets, convert quotes.
    Format {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Strip padding before </p> and line breaks inside <u>.
    Clean {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Render HTML tables to PNG through a headless browser.
    Table(TableArgs),
}

#[derive(Args, Debug)]
struct TableArgs {
    /// One HTML table per file.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Run the spell checker before rendering.
    #[arg(long)]
    spellcheck: bool,

    /// Print each result as JSON instead of a LaTeX command.
    #[arg(long)]
    json: bool,

    /// Directory holding css/table.css.
    #[arg(long, env = "HTML2LATEX_STATIC_ROOT")]
    static_root: Option<PathBuf>,

    /// Directory holding MathJax.js.
    #[arg(long, env = "HTML2LATEX_MATHJAX_ROOT")]
    mathjax_root: Option<PathBuf>,

    /// Browser command line; placeholders {url} {output} {wait_ms} {width} {height}.
    #[arg(long, env = "HTML2LATEX_BROWSER")]
    browser: Option<String>,

    /// Where rendered PNGs are written.
    #[arg(long, env = "HTML2LATEX_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Persist the render cache in this JSON file.
    #[arg(long, env = "HTML2LATEX_CACHE_FILE")]
    cache_file: Option<PathBuf>,

    /// Seconds to let MathJax typeset before the screenshot.
    #[arg(long, default_value_t = 5)]
    math_wait: u64,

    /// Number of tables rendered at once.
    #[arg(short, long, env = "HTML2LATEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Browser viewport height; tables taller than this are cut off.
    #[arg(long, env = "HTML2LATEX_PAGE_HEIGHT", default_value_t = 4096)]
    page_height: u32,

    /// Keep the full screenshot instead of cropping it to the table.
    #[arg(long)]
    no_trim: bool,

    /// Images wider than this are emitted with \scalegraphics.
    #[arg(long, default_value_t = 600)]
    max_inline_width: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Format { file } => {
            let input = read_input(file.as_deref())?;
            let output = latexify(&input).context("Formatting failed")?;
            write_stdout(&output)
        }
        Command::Clean { file } => {
            let input = read_input(file.as_deref())?;
            let output = clean_paragraph_ending(&input).context("Paragraph cleanup failed")?;
            write_stdout(&output)
        }
        Command::Table(args) => run_tables(args, cli.quiet).await,
    }
}

async fn run_tables(args: TableArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args)?;
    let max_inline_width = config.max_inline_width_px;

    let mut rasterizer = TableRasterizer::new(config);
    if let Some(ref path) = args.cache_file {
        let cache = JsonFileCache::open(path)
            .with_context(|| format!("Failed to open render cache {:?}", path))?;
        rasterizer = rasterizer.with_cache(Arc::new(cache));
    }

    let mut tables = Vec::with_capacity(args.files.len());
    for path in &args.files {
        tables.push(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path))?,
        );
    }

    let results = rasterizer.rasterize_all(&tables, args.spellcheck).await;

    let mut failed = 0usize;
    for (path, result) in args.files.iter().zip(results) {
        match result {
            Ok(image) if args.json => {
                println!(
                    "{}",
                    serde_json::to_string(&image).context("Failed to serialise result")?
                );
            }
            Ok(image) => {
                println!("{}", image.latex_command(max_inline_width));
                if !quiet {
                    eprintln!(
                        "  {} {}  {}",
                        green("✓"),
                        path.display(),
                        dim(&format!(
                            "{}x{}{}",
                            image.width,
                            image.height,
                            if image.from_cache { " (cached)" } else { "" }
                        )),
                    );
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}  {}", red("✗"), path.display(), red(&e.to_string()));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} tables failed to render", args.files.len());
    }
    Ok(())
}

/// Map CLI args to `RasterConfig`.
fn build_config(args: &TableArgs) -> Result<RasterConfig> {
    let mut builder = RasterConfig::builder()
        .math_wait_secs(args.math_wait)
        .concurrency(args.concurrency)
        .page_height_px(args.page_height)
        .trim_whitespace(!args.no_trim)
        .max_inline_width_px(args.max_inline_width);

    if let Some(ref root) = args.static_root {
        builder = builder.static_root(root);
    }
    if let Some(ref root) = args.mathjax_root {
        builder = builder.mathjax_root(root);
    }
    if let Some(ref dir) = args.work_dir {
        builder = builder.work_dir(dir);
    }
    if let Some(ref line) = args.browser {
        let command = BrowserCommand::parse(line)
            .with_context(|| format!("Invalid browser command: {line:?}"))?;
        builder = builder.browser(command);
    }

    builder.build().context("Invalid configuration")
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn write_stdout(text: &str) -> Result<()> {
    write_text(&mut io::stdout().lock(), text).context("Failed to write to stdout")
}

/// Write `text`, adding a trailing newline when it lacks one.
fn write_text(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}
