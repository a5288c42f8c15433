use egui::{Color32, Pos2, Rect, Vec2};
use serde::{de::Visitor, Deserialize, Deserializer, Serialize};

pub type AnnotationId = u64;

/// Length below which a released arrow is treated as an accidental click.
pub const MIN_ARROW_LEN: f32 = 10.0;
/// A freehand stroke needs at least this many recorded points to survive.
pub const MIN_STROKE_POINTS: usize = 3;

pub const DEFAULT_TEXT: &str = "Text";

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
    White,
    Black,
}

// Unknown or missing color names resolve to red rather than failing the
// whole report payload.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ColorVisitor;

        impl<'de> Visitor<'de> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a color name: red/blue/green/yellow/white/black")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(match value {
                    "blue" => Color::Blue,
                    "green" => Color::Green,
                    "yellow" => Color::Yellow,
                    "white" => Color::White,
                    "black" => Color::Black,
                    _ => Color::Red,
                })
            }
        }

        deserializer.deserialize_str(ColorVisitor)
    }
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::White,
        Color::Black,
    ];

    pub fn rgba8(self) -> [u8; 4] {
        match self {
            Self::Red => [0xEF, 0x44, 0x44, 0xFF],
            Self::Blue => [0x3B, 0x82, 0xF6, 0xFF],
            Self::Green => [0x10, 0xB9, 0x81, 0xFF],
            Self::Yellow => [0xF5, 0x9E, 0x0B, 0xFF],
            Self::White => [0xFF, 0xFF, 0xFF, 0xFF],
            Self::Black => [0x00, 0x00, 0x00, 0xFF],
        }
    }

    pub fn color32(self) -> Color32 {
        let [r, g, b, a] = self.rgba8();
        Color32::from_rgba_unmultiplied(r, g, b, a)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pos2(self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    pub fn delta(self, other: Point) -> Vec2 {
        Vec2::new(other.x - self.x, other.y - self.y)
    }

    pub fn translated(self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    pub fn clamped(self, width: f32, height: f32) -> Self {
        Self::new(self.x.clamp(0.0, width), self.y.clamp(0.0, height))
    }
}

/// Which end of an arrow a resize gesture grabs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorEnd {
    Tail,
    Head,
}

/// Display-space arrow. `tail` is the fixed visual anchor, `head` is where
/// the arrowhead is drawn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Arrow {
    pub id: AnnotationId,
    pub tail: Point,
    pub head: Point,
    pub color: Color,
}

impl Arrow {
    pub fn set_end(&mut self, end: AnchorEnd, to: Point) {
        match end {
            AnchorEnd::Tail => self.tail = to,
            AnchorEnd::Head => self.head = to,
        }
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.tail = self.tail.translated(delta);
        self.head = self.head.translated(delta);
    }

    /// Hit-test against the shaft, padded by `tolerance`.
    pub fn contains(&self, point: Point, tolerance: f32) -> bool {
        distance_to_segment(point.to_pos2(), self.tail.to_pos2(), self.head.to_pos2()) <= tolerance
    }

    /// The endpoint anchor under `point`, if any. Head wins when both are in
    /// range so a degenerate arrow stays resizable.
    pub fn anchor_at(&self, point: Point, tolerance: f32) -> Option<AnchorEnd> {
        if self.head.delta(point).length() <= tolerance {
            Some(AnchorEnd::Head)
        } else if self.tail.delta(point).length() <= tolerance {
            Some(AnchorEnd::Tail)
        } else {
            None
        }
    }
}

/// Display-space text label anchored at its top-left corner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextLabel {
    pub id: AnnotationId,
    pub pos: Point,
    pub text: String,
    pub color: Color,
}

impl TextLabel {
    pub const FONT_SIZE: f32 = 16.0;

    /// Conservative estimate for hit-testing; on-screen rendering measures
    /// the real glyphs.
    pub fn bounds(&self) -> Rect {
        let width = (self.text.chars().count().max(1) as f32 * Self::FONT_SIZE * 0.6).max(24.0);
        let height = Self::FONT_SIZE * 1.4;
        Rect::from_min_size(self.pos.to_pos2(), Vec2::new(width, height))
    }

    pub fn contains(&self, point: Point, tolerance: f32) -> bool {
        self.bounds().expand(tolerance).contains(point.to_pos2())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FreehandStroke {
    pub id: AnnotationId,
    pub points: Vec<Point>,
    pub color: Color,
}

pub fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.length_sq();
    if ab_len_sq <= f32::EPSILON {
        return ap.length();
    }
    let t = (ap.dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    let projection = a + ab * t;
    (point - projection).length()
}

#[cfg(test)]
mod tests {
    use super::{AnchorEnd, Arrow, Color, Point, TextLabel};

    #[test]
    fn arrow_hit_test_follows_shaft() {
        let arrow = Arrow {
            id: 1,
            tail: Point::new(0.0, 0.0),
            head: Point::new(100.0, 0.0),
            color: Color::Red,
        };

        assert!(arrow.contains(Point::new(50.0, 2.0), 4.0));
        assert!(!arrow.contains(Point::new(50.0, 20.0), 4.0));
    }

    #[test]
    fn anchor_at_prefers_head() {
        let arrow = Arrow {
            id: 1,
            tail: Point::new(10.0, 10.0),
            head: Point::new(12.0, 10.0),
            color: Color::Blue,
        };

        assert_eq!(
            arrow.anchor_at(Point::new(11.0, 10.0), 8.0),
            Some(AnchorEnd::Head)
        );
        assert_eq!(arrow.anchor_at(Point::new(40.0, 10.0), 8.0), None);
    }

    #[test]
    fn unknown_color_falls_back_to_red() {
        let parsed: Color = serde_json::from_str("\"magenta\"").expect("color");
        assert_eq!(parsed, Color::Red);

        let known: Color = serde_json::from_str("\"yellow\"").expect("color");
        assert_eq!(known, Color::Yellow);
    }

    #[test]
    fn text_bounds_grow_with_content() {
        let short = TextLabel {
            id: 1,
            pos: Point::new(0.0, 0.0),
            text: "hi".into(),
            color: Color::Black,
        };
        let long = TextLabel {
            text: "a considerably longer label".into(),
            ..short.clone()
        };

        assert!(long.bounds().width() > short.bounds().width());
        assert!(short.contains(Point::new(4.0, 4.0), 0.0));
    }
}
