//! Vector sources: rasterise an SVG once at full iconset resolution

use std::path::Path;

use image::RgbaImage;
#[cfg(feature = "svg")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "svg")]
use resvg::usvg;

use super::IconsetError;

pub(super) fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Render `svg_data` centred in a transparent square, keeping its aspect ratio
#[cfg(feature = "svg")]
pub(super) fn rasterize(path: &Path, svg_data: &[u8]) -> Result<RgbaImage, IconsetError> {
    let fail = |detail: String| IconsetError::Svg {
        path: path.to_path_buf(),
        detail,
    };

    let mut options = usvg::Options::default();
    options.resources_dir = path.parent().map(Path::to_path_buf);
    if svg_needs_fonts(svg_data) {
        options.fontdb_mut().load_system_fonts();
    }
    let tree = usvg::Tree::from_data(svg_data, &options).map_err(|e| fail(e.to_string()))?;

    let size = super::RECOMMENDED_SOURCE_SIZE;
    let svg_size = tree.size();
    if svg_size.width() <= 0.0 || svg_size.height() <= 0.0 {
        return Err(fail("empty view box".into()));
    }

    let scale = (size as f32 / svg_size.width()).min(size as f32 / svg_size.height());
    let offset_x = (size as f32 - svg_size.width() * scale) / 2.0;
    let offset_y = (size as f32 - svg_size.height() * scale) / 2.0;

    let mut pixmap = Pixmap::new(size, size).ok_or_else(|| fail("pixmap allocation".into()))?;
    let transform = Transform::from_scale(scale, scale).post_translate(offset_x, offset_y);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut rgba = pixmap.data().to_vec();
    unpremultiply_rgba(&mut rgba);
    RgbaImage::from_raw(size, size, rgba).ok_or_else(|| fail("invalid pixel buffer".into()))
}

#[cfg(not(feature = "svg"))]
pub(super) fn rasterize(path: &Path, _svg_data: &[u8]) -> Result<RgbaImage, IconsetError> {
    Err(IconsetError::Svg {
        path: path.to_path_buf(),
        detail: "SVG support disabled; enable feature \"svg\"".into(),
    })
}

#[cfg(feature = "svg")]
fn svg_needs_fonts(svg_data: &[u8]) -> bool {
    let svg_text = String::from_utf8_lossy(svg_data);
    svg_text.contains("<text") || svg_text.contains("font-family")
}

#[cfg(feature = "svg")]
fn unpremultiply_rgba(data: &mut [u8]) {
    for pixel in data.chunks_mut(4) {
        let alpha = pixel[3];
        if alpha == 0 || alpha == 255 {
            continue;
        }
        let a = alpha as u32;
        pixel[0] = ((pixel[0] as u32 * 255 + a / 2) / a).min(255) as u8;
        pixel[1] = ((pixel[1] as u32 * 255 + a / 2) / a).min(255) as u8;
        pixel[2] = ((pixel[2] as u32 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(all(test, feature = "svg"))]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32">
        <rect x="0" y="0" width="64" height="32" fill="#ff0000"/>
    </svg>"##;

    #[test]
    fn detects_svg_extension() {
        assert!(is_svg(Path::new("logo.SVG")));
        assert!(!is_svg(Path::new("logo.png")));
        assert!(!is_svg(Path::new("svg")));
    }

    #[test]
    fn wide_svg_is_letterboxed() {
        let img = rasterize(Path::new("logo.svg"), SQUARE.as_bytes()).unwrap();
        assert_eq!(img.dimensions(), (1024, 1024));
        // 2:1 art fills the middle half vertically
        assert_eq!(img.get_pixel(512, 512).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(512, 10).0[3], 0);
    }

    #[test]
    fn garbage_is_an_svg_error() {
        assert!(matches!(
            rasterize(Path::new("bad.svg"), b"not svg"),
            Err(IconsetError::Svg { .. })
        ));
    }

    #[test]
    fn unpremultiply_restores_channels() {
        let mut px = [64, 32, 0, 128];
        unpremultiply_rgba(&mut px);
        assert_eq!(px, [128, 64, 0, 128]);
    }
}
