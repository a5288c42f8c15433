use anyhow::{anyhow, Context, Result};
use arboard::Clipboard;
use image::{DynamicImage, RgbaImage};

use crate::compositor;
use crate::mapper::RegionRect;

/// Acquisition collaborator. The annotation engine treats whatever raster
/// it receives as an opaque image of known pixel dimensions; a failed
/// capture is non-fatal and the report proceeds without a screenshot.
pub trait ViewCapture {
    fn capture_view(&mut self) -> Result<DynamicImage>;

    /// Region capture: the result has exactly the requested width/height
    /// even when the request had to be clamped at a raster edge.
    fn capture_view_region(&mut self, region: RegionRect) -> Result<DynamicImage> {
        let full = self.capture_view()?;
        compositor::crop_region(&full, region)
    }
}

/// Default capture source: the most recent screenshot on the system
/// clipboard. Platform screenshot tools land there, and it needs no
/// display-server permissions of its own.
pub struct ClipboardCapture;

impl ViewCapture for ClipboardCapture {
    fn capture_view(&mut self) -> Result<DynamicImage> {
        let mut clipboard = Clipboard::new().context("cannot initialize clipboard")?;
        let data = clipboard
            .get_image()
            .map_err(|err| anyhow!("no screenshot on the clipboard: {err}"))?;

        let width = data.width as u32;
        let height = data.height as u32;
        let bytes = data.bytes.into_owned();

        let rgba = RgbaImage::from_raw(width, height, bytes)
            .ok_or_else(|| anyhow!("clipboard image has invalid shape"))?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgba, RgbaImage};

    use super::ViewCapture;
    use crate::mapper::RegionRect;

    struct FixedCapture(DynamicImage);

    impl ViewCapture for FixedCapture {
        fn capture_view(&mut self) -> anyhow::Result<DynamicImage> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn region_capture_crops_the_full_view() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            100,
            Rgba([9, 9, 9, 255]),
        ));
        let mut capture = FixedCapture(base);

        let region = capture
            .capture_view_region(RegionRect {
                x: 150,
                y: 50,
                width: 80,
                height: 80,
            })
            .expect("region capture");

        // Requested size survives the clamp at the right/bottom edges.
        assert_eq!(region.width(), 80);
        assert_eq!(region.height(), 80);
    }
}
