//! Configuration for the table rasteriser.
//!
//! The rewrite pipeline needs no configuration; only the rasteriser does,
//! because it has to know where the page assets live and how to drive the
//! headless browser. Everything is set through [`RasterConfig::builder()`].

use crate::error::Html2LatexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for rendering HTML tables to PNG.
///
/// # Example
/// ```rust
/// use html2latex::RasterConfig;
///
/// let config = RasterConfig::builder()
///     .static_root("/srv/static")
///     .mathjax_root("/srv/mathjax")
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Directory holding `css/table.css`, linked from every rendered page.
    pub static_root: Option<PathBuf>,

    /// MathJax installation root; `MathJax.js` is loaded from here when a
    /// table contains math markup.
    pub mathjax_root: Option<PathBuf>,

    /// Where rendered PNGs (and the throwaway HTML pages) are written.
    /// Default: the OS temp directory.
    pub work_dir: PathBuf,

    /// Browser invocation.
    pub browser: BrowserCommand,

    /// Seconds to let MathJax typeset before the screenshot. Default: 5.
    pub math_wait_secs: u64,

    /// Render wait for tables without math, in milliseconds. Default: 0.
    pub base_wait_ms: u64,

    /// Tables rendered at once by [`crate::TableRasterizer::rasterize_all`]. Default: 4.
    pub concurrency: usize,

    /// Browser viewport width in pixels. Default: 1024.
    pub page_width_px: u32,

    /// Browser viewport height in pixels. A screenshot never shows more than
    /// this, so it must exceed the tallest expected table. Default: 4096.
    pub page_height_px: u32,

    /// Crop each rendered PNG to the bounding box of its non-background
    /// pixels, so the image size is the table's size. Default: true.
    pub trim_whitespace: bool,

    /// Images wider than this are emitted with `\scalegraphics`. Default: 600.
    pub max_inline_width_px: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            static_root: None,
            mathjax_root: None,
            work_dir: std::env::temp_dir(),
            browser: BrowserCommand::default(),
            math_wait_secs: 5,
            base_wait_ms: 0,
            concurrency: 4,
            page_width_px: 1024,
            page_height_px: 4096,
            trim_whitespace: true,
            max_inline_width_px: 600,
        }
    }
}

impl RasterConfig {
    /// Create a new builder for `RasterConfig`.
    pub fn builder() -> RasterConfigBuilder {
        RasterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterConfig`].
#[derive(Debug)]
pub struct RasterConfigBuilder {
    config: RasterConfig,
}

impl RasterConfigBuilder {
    pub fn static_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.static_root = Some(path.into());
        self
    }

    pub fn mathjax_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.mathjax_root = Some(path.into());
        self
    }

    pub fn work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.work_dir = path.into();
        self
    }

    pub fn browser(mut self, command: BrowserCommand) -> Self {
        self.config.browser = command;
        self
    }

    pub fn math_wait_secs(mut self, secs: u64) -> Self {
        self.config.math_wait_secs = secs;
        self
    }

    pub fn base_wait_ms(mut self, ms: u64) -> Self {
        self.config.base_wait_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn page_width_px(mut self, px: u32) -> Self {
        self.config.page_width_px = px.max(100);
        self
    }

    pub fn page_height_px(mut self, px: u32) -> Self {
        self.config.page_height_px = px.max(100);
        self
    }

    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.config.trim_whitespace = trim;
        self
    }

    pub fn max_inline_width_px(mut self, px: u32) -> Self {
        self.config.max_inline_width_px = px;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterConfig, Html2LatexError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Html2LatexError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.browser.program.trim().is_empty() {
            return Err(Html2LatexError::InvalidConfig(
                "Browser program must not be empty".into(),
            ));
        }
        if c.work_dir.as_os_str().is_empty() {
            return Err(Html2LatexError::InvalidConfig(
                "Work directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Browser command ──────────────────────────────────────────────────────

/// A headless-browser command line with placeholders.
///
/// `{url}`, `{output}`, `{wait_ms}`, `{width}` and `{height}` are
/// substituted in every argument before the program is run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BrowserCommand {
    fn default() -> Self {
        Self {
            program: "chromium".to_string(),
            args: [
                "--headless",
                "--disable-gpu",
                "--hide-scrollbars",
                "--window-size={width},{height}",
                "--virtual-time-budget={wait_ms}",
                "--screenshot={output}",
                "{url}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl BrowserCommand {
    /// Parse a whitespace-separated command line; the first word is the
    /// program. Returns `None` for a blank string.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// Arguments with placeholders filled in.
    pub fn expand(
        &self,
        url: &str,
        output: &Path,
        wait_ms: u64,
        (width, height): (u32, u32),
    ) -> Vec<String> {
        let output = output.display().to_string();
        let wait_ms = wait_ms.to_string();
        let width = width.to_string();
        let height = height.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{url}", url)
                    .replace("{output}", &output)
                    .replace("{wait_ms}", &wait_ms)
                    .replace("{width}", &width)
                    .replace("{height}", &height)
            })
            .collect()
    }
}
