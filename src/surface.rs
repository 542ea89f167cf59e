use std::path::Path;

use fast_image_resize as fir;
use image::RgbaImage;

use crate::error::{Error, Result};
use crate::events::DecodedFrame;

/// Something the render loop can paint frames onto.
///
/// The pixel buffer size is independent of how large the host displays the
/// surface; the host scales it.
pub trait DrawSurface: Send + 'static {
    fn dimensions(&self) -> (u32, u32);

    fn set_dimensions(&mut self, width: u32, height: u32);

    /// Clear the surface and draw `frame` stretched over all of it.
    fn draw_frame(&mut self, frame: &DecodedFrame) -> Result<()>;
}

/// CPU RGBA8 surface.
///
/// Resampling goes through `scratch`, which always matches `pixels` in size,
/// so a steady stream of mismatched frames does not allocate per draw.
pub struct Canvas {
    pixels: RgbaImage,
    scratch: fir::images::Image<'static>,
    resizer: fir::Resizer,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            pixels: RgbaImage::new(width, height),
            scratch: fir::images::Image::new(width, height, fir::PixelType::U8x4),
            resizer: fir::Resizer::new(),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| Error::Encode {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl DrawSurface for Canvas {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        if self.dimensions() != (width, height) {
            *self = Self::new(width, height);
        }
    }

    fn draw_frame(&mut self, frame: &DecodedFrame) -> Result<()> {
        let (target_w, target_h) = self.dimensions();
        let source = &frame.image;
        if source.dimensions() == (target_w, target_h) {
            self.pixels.copy_from_slice(source.as_raw());
            return Ok(());
        }

        let src_view = fir::images::ImageRef::new(
            source.width(),
            source.height(),
            source.as_raw(),
            fir::PixelType::U8x4,
        )
        .map_err(|err| Error::Render(format!("invalid source frame: {err}")))?;
        let options = fir::ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
        self.resizer
            .resize(&src_view, &mut self.scratch, Some(&options))
            .map_err(|err| Error::Render(format!("frame resize failed: {err}")))?;
        self.pixels.copy_from_slice(self.scratch.buffer());
        Ok(())
    }
}
