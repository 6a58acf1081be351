//! Apple iconset generation
//!
//! Resizes one source image into the ten bitmaps an `.iconset` directory
//! must contain (16 to 512 points, each at 1x and 2x).

mod resize;
mod svg;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{debug, info, warn};

pub use resize::{ResizeFilter, resize_square};

/// Source size that covers the largest icon without upscaling
pub const RECOMMENDED_SOURCE_SIZE: u32 = 1024;

/// One entry of the iconset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconSpec {
    /// Size in points
    pub points: u32,
    /// Pixel density (1 or 2)
    pub scale: u32,
}

impl IconSpec {
    const fn new(points: u32, scale: u32) -> Self {
        Self { points, scale }
    }

    #[must_use]
    pub const fn pixels(&self) -> u32 {
        self.points * self.scale
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        let p = self.points;
        if self.scale == 1 {
            format!("icon_{p}x{p}.png")
        } else {
            format!("icon_{p}x{p}@{}x.png", self.scale)
        }
    }
}

/// The sizes an iconset must contain
pub const ICONSET: [IconSpec; 10] = [
    IconSpec::new(16, 1),
    IconSpec::new(16, 2),
    IconSpec::new(32, 1),
    IconSpec::new(32, 2),
    IconSpec::new(128, 1),
    IconSpec::new(128, 2),
    IconSpec::new(256, 1),
    IconSpec::new(256, 2),
    IconSpec::new(512, 1),
    IconSpec::new(512, 2),
];

#[derive(Debug, thiserror::Error)]
pub enum IconsetError {
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to render {}: {detail}", path.display())]
    Svg { path: PathBuf, detail: String },

    #[error("resize to {size}px: {detail}")]
    Resize { size: u32, detail: String },

    #[error("failed to write {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, Default)]
pub struct IconsetOptions {
    /// Output directory; defaults to `<source stem>.iconset` next to the source
    pub out_dir: Option<PathBuf>,
    pub filter: ResizeFilter,
}

/// Where the iconset for `source` goes unless overridden
#[must_use]
pub fn default_out_dir(source: &Path) -> PathBuf {
    source.with_extension("iconset")
}

/// Resize `source` into every [`ICONSET`] size. Returns the written files in
/// table order.
pub fn generate_iconset(
    source: &Path,
    options: &IconsetOptions,
) -> Result<Vec<PathBuf>, IconsetError> {
    let img = load_source(source)?;

    let out_dir = options
        .out_dir
        .clone()
        .unwrap_or_else(|| default_out_dir(source));
    info!(
        "Generating iconset from {} ({}x{}) into {} using {}",
        source.display(),
        img.width(),
        img.height(),
        out_dir.display(),
        options.filter.as_str()
    );

    write_iconset(&img, &out_dir, options.filter)
}

fn load_source(source: &Path) -> Result<RgbaImage, IconsetError> {
    if svg::is_svg(source) {
        let data = fs::read(source).map_err(|e| IconsetError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        return svg::rasterize(source, &data);
    }

    image::open(source)
        .map(|img| img.to_rgba8())
        .map_err(|e| IconsetError::Decode {
            path: source.to_path_buf(),
            source: e,
        })
}

/// Write every [`ICONSET`] size of `img` into `out_dir`
pub fn write_iconset(
    img: &RgbaImage,
    out_dir: &Path,
    filter: ResizeFilter,
) -> Result<Vec<PathBuf>, IconsetError> {
    let (width, height) = img.dimensions();
    if width != height {
        warn!("Source is {width}x{height}, icons will be stretched to squares");
    }
    if width.min(height) < RECOMMENDED_SOURCE_SIZE {
        warn!(
            "Source is smaller than {RECOMMENDED_SOURCE_SIZE}px, large icons will be upscaled"
        );
    }

    fs::create_dir_all(out_dir).map_err(|e| IconsetError::Io {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    // 32, 256 and 512 px each appear twice in the table
    let mut rendered: HashMap<u32, RgbaImage> = HashMap::new();
    let mut written = Vec::with_capacity(ICONSET.len());

    for spec in ICONSET {
        let px = spec.pixels();
        if !rendered.contains_key(&px) {
            let resized = if (width, height) == (px, px) {
                img.clone()
            } else {
                resize_square(img, px, filter)?
            };
            rendered.insert(px, resized);
        }

        let path = out_dir.join(spec.file_name());
        if let Some(icon) = rendered.get(&px) {
            icon.save_with_format(&path, ImageFormat::Png)
                .map_err(|e| IconsetError::Encode {
                    path: path.clone(),
                    source: e,
                })?;
        }
        debug!("Wrote {} ({px}x{px})", path.display());
        written.push(path);
    }

    info!("Wrote {} icons to {}", written.len(), out_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_iconset_convention() {
        let names: Vec<_> = ICONSET.iter().map(IconSpec::file_name).collect();
        assert_eq!(
            names,
            vec![
                "icon_16x16.png",
                "icon_16x16@2x.png",
                "icon_32x32.png",
                "icon_32x32@2x.png",
                "icon_128x128.png",
                "icon_128x128@2x.png",
                "icon_256x256.png",
                "icon_256x256@2x.png",
                "icon_512x512.png",
                "icon_512x512@2x.png",
            ]
        );
    }

    #[test]
    fn pixel_sizes() {
        let px: Vec<_> = ICONSET.iter().map(IconSpec::pixels).collect();
        assert_eq!(px, vec![16, 32, 32, 64, 128, 256, 256, 512, 512, 1024]);
    }

    #[test]
    fn default_out_dir_sits_beside_source() {
        assert_eq!(
            default_out_dir(Path::new("assets/logo.png")),
            PathBuf::from("assets/logo.iconset")
        );
    }

    #[test]
    fn missing_source_is_decode_error() {
        let err = generate_iconset(
            Path::new("/nonexistent/logo.png"),
            &IconsetOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IconsetError::Decode { .. }));
    }
}
