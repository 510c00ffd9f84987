//! # html2latex
//!
//! Turn HTML fragments produced by rich-text editors into LaTeX-ready text,
//! and render the tables LaTeX cannot typeset natively into cached images.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text / HTML
//!  │
//!  ├─ 1. Numeric guard   keep 3.14 and 1,000 intact; space clause punctuation
//!  ├─ 2. Formatting      `: ; ?` spacing, ( ) padding, \textless/\textgreater,
//!  │                     A) → a), LaTeX quotes (recursive), graphics cleanup
//!  ├─ 3. Paragraphs      strip &nbsp;/<br> before </p>, <br> in <u> → space
//!  └─ 4. Tables          HTML → headless browser → PNG, keyed by SHA-512
//! ```
//!
//! Stages 1–3 are pure functions with no I/O and no shared mutable state.
//! Stage 4 is an async collaborator ([`TableRasterizer`]) the text stages
//! never depend on.
//!
//! ## Quick Start
//!
//! ```rust
//! use html2latex::{clean_paragraph_ending, latexify};
//!
//! let text = latexify(r#"Pi:3.14 "roughly.""#).unwrap();
//! assert!(text.starts_with("Pi: 3.14"));
//! assert!(text.contains("``roughly.\""));
//!
//! let html = clean_paragraph_ending("<p><u>one<br/>two</u>&nbsp;</p>").unwrap();
//! assert_eq!(html, "<p><u>one two</u></p>");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2latex` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod raster;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BrowserCommand, RasterConfig, RasterConfigBuilder};
pub use convert::{clean_paragraph_ending, fix_formatting, fix_text, latexify};
pub use error::Html2LatexError;
pub use output::{image_size, trim_to_content, TableImage};
pub use pipeline::formatting::LatexFormatter;
pub use pipeline::rules::{QuoteRule, QuoteStyle, Replacement, RewriteRule, RuleSet, RuleTable};
pub use raster::cache::{CacheStore, JsonFileCache, MemoryCache};
pub use raster::render::{HeadlessBrowser, TableRenderer};
pub use raster::spellcheck::{NoSpellCheck, SpellChecker};
pub use raster::TableRasterizer;
