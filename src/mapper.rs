use crate::annotation::Point;

/// Region request in image-space pixels, as handed to region capture. May
/// extend past the raster edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A region request mapped into raster bounds: the clamped source rectangle
/// plus the offset at which it lands inside the (unchanged) destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappedRegion {
    pub src_x: u32,
    pub src_y: u32,
    pub src_width: u32,
    pub src_height: u32,
    pub dst_x: u32,
    pub dst_y: u32,
}

/// Converts between display space (the on-screen preview container) and
/// image space (pixels of the captured raster).
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    display_width: f32,
    display_height: f32,
    raster_width: u32,
    raster_height: u32,
}

impl CoordinateMapper {
    pub fn new(display: (f32, f32), raster: (u32, u32)) -> Self {
        Self {
            display_width: display.0.max(f32::EPSILON),
            display_height: display.1.max(f32::EPSILON),
            raster_width: raster.0,
            raster_height: raster.1,
        }
    }

    /// (sx, sy): how many raster pixels one display unit covers.
    pub fn scale_factors(&self) -> (f32, f32) {
        (
            self.raster_width as f32 / self.display_width,
            self.raster_height as f32 / self.display_height,
        )
    }

    /// Isotropic scale for stroke widths, arrowheads and font sizes, so
    /// strokes don't distort when the two axes disagree.
    pub fn min_scale(&self) -> f32 {
        let (sx, sy) = self.scale_factors();
        sx.min(sy)
    }

    pub fn to_image_space(&self, point: Point) -> Point {
        let (sx, sy) = self.scale_factors();
        Point::new(point.x * sx, point.y * sy)
    }

    pub fn to_display_space(&self, point: Point) -> Point {
        let (sx, sy) = self.scale_factors();
        Point::new(point.x / sx, point.y / sy)
    }

    /// Clamps a region request to the raster bounds. The destination keeps
    /// the originally requested width/height; only the sampled source area
    /// and its landing offset shrink when the request hangs over an edge.
    /// Returns `None` when the request misses the raster entirely.
    pub fn map_region(&self, region: RegionRect) -> Option<MappedRegion> {
        let raster_w = self.raster_width as i64;
        let raster_h = self.raster_height as i64;

        let left = (region.x as i64).clamp(0, raster_w);
        let top = (region.y as i64).clamp(0, raster_h);
        let right = (region.x as i64 + region.width as i64).clamp(0, raster_w);
        let bottom = (region.y as i64 + region.height as i64).clamp(0, raster_h);

        if right <= left || bottom <= top {
            return None;
        }

        Some(MappedRegion {
            src_x: left as u32,
            src_y: top as u32,
            src_width: (right - left) as u32,
            src_height: (bottom - top) as u32,
            dst_x: (left - region.x as i64) as u32,
            dst_y: (top - region.y as i64) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateMapper, MappedRegion, RegionRect};
    use crate::annotation::Point;

    #[test]
    fn maps_display_to_image_space() {
        let mapper = CoordinateMapper::new((200.0, 100.0), (400, 200));
        let mapped = mapper.to_image_space(Point::new(10.0, 10.0));

        assert_eq!(mapped, Point::new(20.0, 20.0));
        assert_eq!(mapper.min_scale(), 2.0);
    }

    #[test]
    fn round_trip_recovers_original_point() {
        let mapper = CoordinateMapper::new((317.0, 173.0), (1280, 823));
        let original = Point::new(41.5, 99.25);
        let back = mapper.to_display_space(mapper.to_image_space(original));

        assert!((back.x - original.x).abs() < 1e-3);
        assert!((back.y - original.y).abs() < 1e-3);
    }

    #[test]
    fn anisotropic_scale_uses_smaller_axis() {
        let mapper = CoordinateMapper::new((100.0, 100.0), (300, 200));
        assert_eq!(mapper.scale_factors(), (3.0, 2.0));
        assert_eq!(mapper.min_scale(), 2.0);
    }

    #[test]
    fn region_inside_raster_is_untouched() {
        let mapper = CoordinateMapper::new((100.0, 100.0), (400, 300));
        let mapped = mapper
            .map_region(RegionRect {
                x: 10,
                y: 20,
                width: 50,
                height: 60,
            })
            .expect("region overlaps");

        assert_eq!(
            mapped,
            MappedRegion {
                src_x: 10,
                src_y: 20,
                src_width: 50,
                src_height: 60,
                dst_x: 0,
                dst_y: 0,
            }
        );
    }

    #[test]
    fn region_clamped_at_edges_keeps_destination_offset() {
        let mapper = CoordinateMapper::new((100.0, 100.0), (400, 300));
        let mapped = mapper
            .map_region(RegionRect {
                x: -20,
                y: 280,
                width: 60,
                height: 60,
            })
            .expect("region overlaps");

        // 20px clipped off the left, 40px off the bottom.
        assert_eq!(mapped.src_x, 0);
        assert_eq!(mapped.src_width, 40);
        assert_eq!(mapped.dst_x, 20);
        assert_eq!(mapped.src_y, 280);
        assert_eq!(mapped.src_height, 20);
        assert_eq!(mapped.dst_y, 0);
    }

    #[test]
    fn region_fully_outside_maps_to_none() {
        let mapper = CoordinateMapper::new((100.0, 100.0), (400, 300));
        assert!(mapper
            .map_region(RegionRect {
                x: 500,
                y: 0,
                width: 10,
                height: 10,
            })
            .is_none());
    }
}
