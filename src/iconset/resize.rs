//! Square resizing on top of fast_image_resize

use std::num::NonZeroU32;

use fast_image_resize as fr;
use image::{ImageBuffer, RgbaImage};
use serde::{Deserialize, Serialize};

use super::IconsetError;

/// Resampling filter used for icon downscaling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    #[default]
    Lanczos3,
    CatmullRom,
    Bilinear,
    Nearest,
}

impl ResizeFilter {
    fn algorithm(self) -> fr::ResizeAlg {
        match self {
            Self::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
            Self::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            Self::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            Self::Nearest => fr::ResizeAlg::Nearest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lanczos3 => "lanczos3",
            Self::CatmullRom => "catmull-rom",
            Self::Bilinear => "bilinear",
            Self::Nearest => "nearest",
        }
    }
}

/// Resize `src` to a `size` x `size` square.
///
/// Colour channels are premultiplied by alpha while filtering so transparent
/// edges do not bleed dark fringes into the result.
pub fn resize_square(
    src: &RgbaImage,
    size: u32,
    filter: ResizeFilter,
) -> Result<RgbaImage, IconsetError> {
    let fail = |detail: String| IconsetError::Resize { size, detail };

    let (src_width, src_height) = src.dimensions();
    let src_nz_width = NonZeroU32::new(src_width).ok_or_else(|| fail("empty source".into()))?;
    let src_nz_height = NonZeroU32::new(src_height).ok_or_else(|| fail("empty source".into()))?;
    let dst_nz_size = NonZeroU32::new(size).ok_or_else(|| fail("zero target size".into()))?;

    let mut src_image = fr::Image::from_vec_u8(
        src_nz_width,
        src_nz_height,
        src.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| fail(format!("source buffer: {e}")))?;
    let mut dst_image = fr::Image::new(dst_nz_size, dst_nz_size, fr::PixelType::U8x4);

    let mul_div = fr::MulDiv::default();
    mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| fail(format!("premultiply: {e}")))?;

    let mut resizer = fr::Resizer::new(filter.algorithm());
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| fail(e.to_string()))?;

    mul_div
        .divide_alpha_inplace(&mut dst_image.view_mut())
        .map_err(|e| fail(format!("unpremultiply: {e}")))?;

    ImageBuffer::from_raw(size, size, dst_image.into_vec())
        .ok_or_else(|| fail("resize produced invalid buffer".into()))
}
