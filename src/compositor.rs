use ab_glyph::FontArc;
use anyhow::{anyhow, Context, Result};
use image::{imageops, DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::annotation::{Arrow, FreehandStroke, TextLabel};
use crate::mapper::{CoordinateMapper, RegionRect};
use crate::overlay::{arrow_head_points, HEAD_HALF_WIDTH, HEAD_LEN, STROKE_WIDTH};
use crate::store::Snapshot;

const FONT_SIZE: f32 = 16.0;
const TEXT_PADDING: f32 = 3.0;
const TEXT_BG: [u8; 4] = [0, 0, 0, 160];

/// Flattens the base raster plus every annotation into one output raster of
/// exactly the base raster's pixel dimensions. Annotations are scaled from
/// display space into image space through the mapper; stroke widths and
/// arrowheads use the isotropic `min_scale` so they don't distort.
pub fn composite(
    base: &DynamicImage,
    snapshot: &Snapshot,
    mapper: &CoordinateMapper,
) -> Result<DynamicImage> {
    let mut pixmap = Pixmap::new(base.width(), base.height())
        .ok_or_else(|| anyhow!("cannot allocate pixmap"))?;

    copy_image_to_pixmap(base, &mut pixmap)?;

    let font = load_system_font();
    if font.is_none() && !snapshot.texts.is_empty() {
        log::warn!("no usable system font found, text labels are skipped in the export");
    }

    let scale = mapper.min_scale();

    // Store order is z-order: strokes, then arrows, then labels on top.
    for stroke in &snapshot.strokes {
        draw_freehand(&mut pixmap, stroke, mapper, scale)?;
    }
    for arrow in &snapshot.arrows {
        draw_arrow(&mut pixmap, arrow, mapper, scale)?;
    }

    let mut output = RgbaImage::from_raw(base.width(), base.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("cannot construct output image"))?;

    // Each label paints its background then its text, so a later label's
    // background covers an earlier label's text where they overlap.
    if let Some(font) = &font {
        for label in &snapshot.texts {
            draw_label(&mut output, label, font, mapper, scale);
        }
    }

    Ok(DynamicImage::ImageRgba8(output))
}

/// Serialization failure here is terminal for the export only; the rest of
/// the report is unaffected.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("cannot encode PNG")?;
    Ok(buffer.into_inner())
}

/// Crops a region out of the base raster. The output always has exactly the
/// requested width/height; when the request hangs over an edge, the sampled
/// area shrinks and lands at the matching offset inside the output.
pub fn crop_region(base: &DynamicImage, region: RegionRect) -> Result<DynamicImage> {
    if region.width == 0 || region.height == 0 {
        return Err(anyhow!("empty capture region"));
    }

    let mapper = CoordinateMapper::new(
        (base.width() as f32, base.height() as f32),
        (base.width(), base.height()),
    );

    let mut output = RgbaImage::new(region.width, region.height);
    if let Some(mapped) = mapper.map_region(region) {
        let sampled = imageops::crop_imm(
            base,
            mapped.src_x,
            mapped.src_y,
            mapped.src_width,
            mapped.src_height,
        )
        .to_image();
        imageops::replace(
            &mut output,
            &sampled,
            i64::from(mapped.dst_x),
            i64::from(mapped.dst_y),
        );
    }

    Ok(DynamicImage::ImageRgba8(output))
}

fn copy_image_to_pixmap(image: &DynamicImage, pixmap: &mut Pixmap) -> Result<()> {
    let rgba = image.to_rgba8();
    let data = pixmap.data_mut();
    if data.len() != rgba.len() {
        return Err(anyhow!("source image and pixmap size mismatch"));
    }
    data.copy_from_slice(rgba.as_raw());
    Ok(())
}

fn color_paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    paint
}

fn draw_freehand(
    pixmap: &mut Pixmap,
    stroke: &FreehandStroke,
    mapper: &CoordinateMapper,
    scale: f32,
) -> Result<()> {
    let mut points = stroke.points.iter().map(|point| mapper.to_image_space(*point));
    let Some(first) = points.next() else {
        return Ok(());
    };

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for point in points {
        pb.line_to(point.x, point.y);
    }
    let path = pb.finish().ok_or_else(|| anyhow!("cannot build stroke path"))?;

    let paint = color_paint(stroke.color.rgba8());
    let stroke = Stroke {
        width: STROKE_WIDTH * scale,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    Ok(())
}

fn draw_arrow(
    pixmap: &mut Pixmap,
    arrow: &Arrow,
    mapper: &CoordinateMapper,
    scale: f32,
) -> Result<()> {
    let tail = mapper.to_image_space(arrow.tail);
    let head = mapper.to_image_space(arrow.head);
    let paint = color_paint(arrow.color.rgba8());

    let mut pb = PathBuilder::new();
    pb.move_to(tail.x, tail.y);
    pb.line_to(head.x, head.y);
    let shaft = pb.finish().ok_or_else(|| anyhow!("cannot build arrow shaft"))?;
    let stroke = Stroke {
        width: STROKE_WIDTH * scale,
        line_cap: LineCap::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&shaft, &paint, &stroke, Transform::identity(), None);

    let [tip, left, right] = arrow_head_points(tail, head, HEAD_LEN * scale, HEAD_HALF_WIDTH * scale);
    let mut pb = PathBuilder::new();
    pb.move_to(tip.x, tip.y);
    pb.line_to(left.x, left.y);
    pb.line_to(right.x, right.y);
    pb.close();
    let path = pb.finish().ok_or_else(|| anyhow!("cannot build arrow head"))?;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    Ok(())
}

fn draw_label(
    image: &mut RgbaImage,
    label: &TextLabel,
    font: &FontArc,
    mapper: &CoordinateMapper,
    scale: f32,
) {
    let pos = mapper.to_image_space(label.pos);
    let (text_w, text_h) = text_size(FONT_SIZE * scale, font, &label.text);
    let pad = TEXT_PADDING * scale;

    blend_rect(
        image,
        pos.x - pad,
        pos.y - pad,
        text_w as f32 + pad * 2.0,
        text_h as f32 + pad * 2.0,
        Rgba(TEXT_BG),
    );

    draw_text_mut(
        image,
        Rgba(label.color.rgba8()),
        pos.x as i32,
        pos.y as i32,
        FONT_SIZE * scale,
        font,
        &label.text,
    );
}

fn blend_rect(image: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
    let x0 = x.floor().max(0.0) as u32;
    let y0 = y.floor().max(0.0) as u32;
    let x1 = ((x + w).ceil().max(0.0) as u32).min(image.width());
    let y1 = ((y + h).ceil().max(0.0) as u32).min(image.height());

    for py in y0..y1 {
        for px in x0..x1 {
            image.get_pixel_mut(px, py).blend(&color);
        }
    }
}

fn load_system_font() -> Option<FontArc> {
    // Bold faces preferred; plain faces are close enough when the bold
    // variant is not installed.
    let candidates = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Helvetica.ttf",
        "C:\\Windows\\Fonts\\arialbd.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    for path in candidates {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }

    None
}
