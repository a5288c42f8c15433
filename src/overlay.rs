use crate::annotation::{AnnotationId, Color, Point};
use crate::store::Snapshot;

/// Display-space stroke width for live editing feedback; the compositor
/// scales the same base width into image space.
pub const STROKE_WIDTH: f32 = 3.0;
pub const HEAD_LEN: f32 = 15.0;
pub const HEAD_HALF_WIDTH: f32 = 10.0;
pub const HANDLE_RADIUS: f32 = 4.5;

/// One element of the live overlay scene, in display space. The backend
/// (an egui painter here) decides how to realize each command; labels are
/// delegated so they can stay editable in place.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
    Polyline {
        points: Vec<Point>,
        width: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    /// Filled triangle (arrowhead).
    Polygon {
        points: [Point; 3],
        color: Color,
    },
    /// Draggable endpoint handle.
    Handle {
        center: Point,
    },
    Label {
        id: AnnotationId,
        pos: Point,
        text: String,
        color: Color,
    },
}

/// Builds the overlay scene for one settled-or-in-progress snapshot.
/// Returns `None` while the container has no measured size yet; the caller
/// retries on the next frame instead of rendering at zero scale. The scene
/// is a live-editing aid only and is never part of the exported image.
pub fn build(snapshot: &Snapshot, display: (f32, f32)) -> Option<Vec<DrawCmd>> {
    let (width, height) = display;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let mut scene = Vec::new();

    for stroke in &snapshot.strokes {
        scene.push(DrawCmd::Polyline {
            points: stroke.points.clone(),
            width: STROKE_WIDTH,
            color: stroke.color,
        });
    }

    for arrow in &snapshot.arrows {
        scene.push(DrawCmd::Line {
            from: arrow.tail,
            to: arrow.head,
            width: STROKE_WIDTH,
            color: arrow.color,
        });
        scene.push(DrawCmd::Polygon {
            points: arrow_head_points(arrow.tail, arrow.head, HEAD_LEN, HEAD_HALF_WIDTH),
            color: arrow.color,
        });
        scene.push(DrawCmd::Handle { center: arrow.tail });
        scene.push(DrawCmd::Handle { center: arrow.head });
    }

    for label in &snapshot.texts {
        scene.push(DrawCmd::Label {
            id: label.id,
            pos: label.pos,
            text: label.text.clone(),
            color: label.color,
        });
    }

    Some(scene)
}

/// Triangle for an arrowhead: tip at `head`, base perpendicular to the
/// shaft. Shared by the overlay and the compositor (which feeds scaled
/// lengths).
pub fn arrow_head_points(tail: Point, head: Point, len: f32, half_width: f32) -> [Point; 3] {
    let direction = tail.delta(head);
    let shaft_len = direction.length().max(1.0);
    let unit = direction / shaft_len;

    let base = Point::new(head.x - unit.x * len, head.y - unit.y * len);
    let normal = egui::vec2(-unit.y, unit.x);
    let left = base.translated(normal * half_width);
    let right = base.translated(-normal * half_width);

    [head, left, right]
}
