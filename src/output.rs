//! Result types returned by the table rasteriser.

use crate::error::Html2LatexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rendered table image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableImage {
    /// PNG on disk.
    pub path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `true` when the image came from the render cache.
    pub from_cache: bool,
}

impl TableImage {
    /// Read the dimensions of the image at `path`.
    pub fn from_file(path: impl Into<PathBuf>, from_cache: bool) -> Result<Self, Html2LatexError> {
        let path = path.into();
        let (width, height) = image_size(&path)?;
        Ok(Self {
            path,
            width,
            height,
            from_cache,
        })
    }

    /// LaTeX command embedding this image. Images wider than
    /// `max_inline_width_px` go through `\scalegraphics` so the document
    /// class can shrink them to the text width.
    pub fn latex_command(&self, max_inline_width_px: u32) -> String {
        let path = self.path.display();
        if self.width > max_inline_width_px {
            format!("\\scalegraphics{{{path}}}")
        } else {
            format!("\\includegraphics{{{path}}}")
        }
    }
}

/// `(width, height)` of an image file, read from its header.
pub fn image_size(path: &Path) -> Result<(u32, u32), Html2LatexError> {
    image::image_dimensions(path).map_err(|source| Html2LatexError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Crop the image at `path` in place to the bounding box of the pixels that
/// differ from its top-left pixel, and return the resulting size. An image
/// that is all background is left untouched.
pub fn trim_to_content(path: &Path) -> Result<(u32, u32), Html2LatexError> {
    let image_error = |source| Html2LatexError::Image {
        path: path.to_path_buf(),
        source,
    };
    let img = image::open(path).map_err(image_error)?.to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Ok(img.dimensions());
    }
    let background = *img.get_pixel(0, 0);

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if *pixel == background {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return Ok(img.dimensions());
    };
    let size = (x1 - x0 + 1, y1 - y0 + 1);
    if size == img.dimensions() {
        return Ok(size);
    }
    image::imageops::crop_imm(&img, x0, y0, size.0, size.1)
        .to_image()
        .save(path)
        .map_err(image_error)?;
    debug!(
        "trimmed {} from {}x{} to {}x{}",
        path.display(),
        img.width(),
        img.height(),
        size.0,
        size.1
    );
    Ok(size)
}
