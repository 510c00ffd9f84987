//! Error types for the html2latex library.
//!
//! The text rewrite pipeline is almost total: a rule that finds no match is a
//! no-op, never an error. Only three things can fail there:
//!
//! * the paragraph cleaner is handed markup it cannot walk ([`Html2LatexError::Parse`]),
//! * quotation nesting exceeds the formatter's depth cap
//!   ([`Html2LatexError::RecursionLimit`]),
//! * a caller-supplied rewrite pattern does not compile
//!   ([`Html2LatexError::InvalidPattern`]).
//!
//! Everything else belongs to the table rasteriser, which shells out to a
//! headless browser and touches the file system and cache.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the html2latex library.
#[derive(Debug, Error)]
pub enum Html2LatexError {
    // ── Rewrite pipeline ──────────────────────────────────────────────────
    /// The fragment handed to the paragraph cleaner is not well-formed.
    #[error("Malformed markup at byte {position}: {detail}")]
    Parse { position: usize, detail: String },

    /// Quoted spans nested deeper than the formatter allows.
    #[error("Quotation nesting exceeds the maximum depth of {depth}")]
    RecursionLimit { depth: usize },

    /// A rewrite rule pattern failed to compile.
    #[error("Invalid pattern for rule '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// The headless browser ran but exited unsuccessfully.
    #[error("Headless browser '{program}' exited with {status}: {stderr}")]
    BrowserFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The browser could not be started or produced no image.
    #[error("Table rendering failed: {detail}")]
    RenderFailed { detail: String },

    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The render cache could not be read or updated.
    #[error("Render cache error: {0}")]
    Cache(String),

    /// The rendered image could not be decoded.
    #[error("Could not read image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Html2LatexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Html2LatexError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let e = Html2LatexError::Parse {
            position: 12,
            detail: "unexpected </p>".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("byte 12"), "got: {msg}");
        assert!(msg.contains("</p>"));
    }

    #[test]
    fn recursion_limit_display() {
        let e = Html2LatexError::RecursionLimit { depth: 32 };
        assert!(e.to_string().contains("32"));
    }

    #[test]
    fn browser_failed_display() {
        let e = Html2LatexError::BrowserFailed {
            program: "chromium".into(),
            status: "exit status: 1".into(),
            stderr: "no display".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("chromium"));
        assert!(msg.contains("no display"));
    }

    #[test]
    fn io_error_keeps_path() {
        let e = Html2LatexError::io(
            "/tmp/missing.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(e.to_string().contains("/tmp/missing.png"));
    }
}
