//! Table preparation: normalise the fragment, detect math, derive the cache
//! key and wrap the table in a standalone page for the browser.

use crate::config::RasterConfig;
use crate::error::Html2LatexError;
use crate::pipeline::markup::{self, ElementSpan};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha512};
use std::path::Path;
use tracing::debug;

/// "S.No", "S. No.", "Sno", "S.N." … as a serial-number column label.
static RE_SERIAL_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(s\s*\.*\s*no\.*|s\s*\.*\s*n\.*)\s*").unwrap());

const CACHE_KEY_PREFIX: &str = "webkit2png-";

/// A table fragment ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTable {
    /// Fragment after trimming and header relabelling.
    pub html: String,
    /// Whether MathJax markup is present (rendering must wait for it).
    pub has_math: bool,
    /// Content-hash key for the render cache.
    pub cache_key: String,
}

fn is_math(span: &ElementSpan) -> bool {
    span.name == "span" && span.has_class("math-tex")
}

/// Trim `html`, detect math markup, and relabel a serial-number header in
/// the first cell to ` SN ` unless that cell holds math.
///
/// # Errors
/// [`Html2LatexError::Parse`] if the fragment does not nest properly.
pub fn prepare_table_html(html: &str) -> Result<PreparedTable, Html2LatexError> {
    let html = html.trim();
    let spans = markup::scan_elements(html)?;
    let has_math = spans.iter().any(is_math);

    let first_cell = spans.iter().find(|span| span.name == "td");
    let html = match first_cell {
        Some(td) if !spans.iter().any(|s| is_math(s) && td.contains(s)) => {
            relabel_serial_number(html, td)
        }
        _ => html.to_string(),
    };

    let cache_key = cache_key(&html);
    debug!(has_math, %cache_key, "prepared table ({} bytes)", html.len());
    Ok(PreparedTable {
        html,
        has_math,
        cache_key,
    })
}

/// Only the cell's content is searched; its attributes are left alone.
fn relabel_serial_number(html: &str, td: &ElementSpan) -> String {
    let cell = td.source(html);
    let content_start = cell.find('>').map_or(0, |i| i + 1);
    let (open_tag, content) = cell.split_at(content_start);
    let relabelled = RE_SERIAL_NUMBER.replace(content, " SN ");
    format!(
        "{}{}{}{}",
        &html[..td.start],
        open_tag,
        relabelled,
        &html[td.end..]
    )
}

/// `webkit2png-` followed by the hex SHA-512 of `html`.
pub fn cache_key(html: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{:x}", Sha512::digest(html.as_bytes()))
}

/// Wrap the table in the page the browser screenshots.
pub fn render_page(table: &PreparedTable, config: &RasterConfig) -> String {
    let stylesheet = config
        .static_root
        .as_deref()
        .map(|root| {
            format!(
                "<link rel=\"stylesheet\" href=\"{}\">\n",
                file_url(&root.join("css").join("table.css"))
            )
        })
        .unwrap_or_default();

    let mathjax = match (&config.mathjax_root, table.has_math) {
        (Some(root), true) => format!(
            "<script type=\"text/x-mathjax-config\">\
             MathJax.Hub.Config({{tex2jax: {{inlineMath: [['\\\\(','\\\\)']]}}, \
             messageStyle: \"none\"}});</script>\n\
             <script src=\"{}?config=TeX-AMS_HTML\"></script>\n",
            file_url(&root.join("MathJax.js"))
        ),
        _ => String::new(),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         {stylesheet}{mathjax}</head>\n\
         <body style=\"margin:0;padding:4px;background:#fff\">\n\
         <div class=\"table-wrapper\" style=\"display:inline-block\">\n{}\n</div>\n\
         </body>\n</html>\n",
        table.html
    )
}

pub(crate) fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
