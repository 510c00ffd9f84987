//! Table rasterisation: render HTML tables LaTeX cannot typeset natively
//! into cached PNG images.
//!
//! ## Flow
//!
//! ```text
//! html ─▶ spellcheck? ─▶ prepare ─▶ cache lookup ──hit──▶ TableImage
//!                       (SN fix,        │miss
//!                        math, hash)    ▼
//!                                page file ─▶ browser + trim (spawn_blocking) ─▶ cache set ─▶ TableImage
//! ```
//!
//! The text rewrite pipeline does not depend on anything here.

pub mod cache;
pub mod prepare;
pub mod render;
pub mod spellcheck;

use crate::config::RasterConfig;
use crate::error::Html2LatexError;
use crate::output::{trim_to_content, TableImage};
use cache::{CacheStore, MemoryCache};
use futures::stream::{self, StreamExt};
use render::{HeadlessBrowser, TableRenderer};
use spellcheck::{NoSpellCheck, SpellChecker};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Renders table fragments to PNG, reusing earlier renders of identical HTML.
#[derive(Clone)]
pub struct TableRasterizer {
    config: RasterConfig,
    cache: Arc<dyn CacheStore>,
    renderer: Arc<dyn TableRenderer>,
    spellchecker: Arc<dyn SpellChecker>,
}

impl std::fmt::Debug for TableRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRasterizer")
            .field("config", &self.config)
            .field("cache", &"<dyn CacheStore>")
            .field("renderer", &"<dyn TableRenderer>")
            .field("spellchecker", &"<dyn SpellChecker>")
            .finish()
    }
}

impl TableRasterizer {
    /// Headless-browser renderer, in-memory cache, no spell-checking.
    pub fn new(config: RasterConfig) -> Self {
        let renderer = Arc::new(HeadlessBrowser::from_config(&config));
        Self {
            config,
            cache: Arc::new(MemoryCache::new()),
            renderer,
            spellchecker: Arc::new(NoSpellCheck),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TableRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_spellchecker(mut self, spellchecker: Arc<dyn SpellChecker>) -> Self {
        self.spellchecker = spellchecker;
        self
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Render one table fragment, or return the cached image for identical
    /// content.
    ///
    /// # Errors
    /// Parse errors from preparation, cache and I/O errors, and whatever the
    /// renderer reports (browser crash, non-zero exit, no image written).
    pub async fn rasterize(
        &self,
        html: &str,
        spellcheck: bool,
    ) -> Result<TableImage, Html2LatexError> {
        let start = Instant::now();
        let html = html.trim();
        let html = if spellcheck {
            self.spellchecker.check_html(html)?
        } else {
            html.to_string()
        };

        let table = prepare::prepare_table_html(&html)?;

        if let Some(cached) = self.cache.get(&table.cache_key)? {
            if cached.is_file() {
                info!("Cache hit for table → {}", cached.display());
                return TableImage::from_file(cached, true);
            }
            warn!(
                "Cached image {} no longer exists; rendering again",
                cached.display()
            );
        }

        let work_dir = &self.config.work_dir;
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|e| Html2LatexError::io(work_dir, e))?;

        let mut page = tempfile::Builder::new()
            .prefix("html2latex-")
            .suffix(".html")
            .tempfile_in(work_dir)
            .map_err(|e| Html2LatexError::io(work_dir, e))?;
        page.write_all(prepare::render_page(&table, &self.config).as_bytes())
            .map_err(|e| Html2LatexError::io(page.path(), e))?;

        let output = work_dir.join(format!("{}.png", Uuid::new_v4()));
        let wait = if table.has_math {
            Duration::from_secs(self.config.math_wait_secs)
        } else {
            Duration::from_millis(self.config.base_wait_ms)
        };
        debug!(has_math = table.has_math, ?wait, "rendering {}", output.display());

        let renderer = Arc::clone(&self.renderer);
        let page_path = page.path().to_path_buf();
        let png_path = output.clone();
        let trim = self.config.trim_whitespace;
        tokio::task::spawn_blocking(move || {
            renderer.render(&page_path, &png_path, wait)?;
            if trim {
                trim_to_content(&png_path)?;
            }
            Ok::<_, Html2LatexError>(())
        })
        .await
        .map_err(|e| Html2LatexError::Internal(format!("Render task panicked: {}", e)))??;
        // `page` is deleted here, after the browser is done with it.
        drop(page);

        self.cache.set(&table.cache_key, &output)?;
        info!(
            "Rendered table in {}ms → {}",
            start.elapsed().as_millis(),
            output.display()
        );
        TableImage::from_file(output, false)
    }

    /// Render many tables, up to `config.concurrency` at a time. Results come
    /// back in input order; one failed table does not stop the others.
    pub async fn rasterize_all(
        &self,
        tables: &[String],
        spellcheck: bool,
    ) -> Vec<Result<TableImage, Html2LatexError>> {
        let mut results: Vec<(usize, Result<TableImage, Html2LatexError>)> =
            stream::iter(tables.iter().enumerate().map(|(idx, html)| async move {
                (idx, self.rasterize(html, spellcheck).await)
            }))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Synchronous wrapper around [`rasterize`](Self::rasterize).
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn rasterize_sync(
        &self,
        html: &str,
        spellcheck: bool,
    ) -> Result<TableImage, Html2LatexError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| Html2LatexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.rasterize(html, spellcheck))
    }
}
