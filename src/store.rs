use crate::annotation::{
    AnnotationId, Arrow, Color, FreehandStroke, Point, TextLabel, DEFAULT_TEXT,
};

/// Immutable deep copy of all three annotation collections at one instant.
/// The unit stored in undo history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub arrows: Vec<Arrow>,
    pub texts: Vec<TextLabel>,
    pub strokes: Vec<FreehandStroke>,
}

/// The three ordered annotation collections. Insertion order is z-order,
/// later entries draw on top. No entity references another.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    arrows: Vec<Arrow>,
    texts: Vec<TextLabel>,
    strokes: Vec<FreehandStroke>,
    next_id: AnnotationId,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            arrows: Vec::new(),
            texts: Vec::new(),
            strokes: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> AnnotationId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn texts(&self) -> &[TextLabel] {
        &self.texts
    }

    pub fn strokes(&self) -> &[FreehandStroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() && self.texts.is_empty() && self.strokes.is_empty()
    }

    pub fn add_arrow(&mut self, tail: Point, head: Point, color: Color) -> AnnotationId {
        let id = self.next_id();
        self.arrows.push(Arrow {
            id,
            tail,
            head,
            color,
        });
        id
    }

    /// New label with the placeholder content, ready for in-place editing.
    pub fn add_text(&mut self, pos: Point, color: Color) -> AnnotationId {
        let id = self.next_id();
        self.texts.push(TextLabel {
            id,
            pos,
            text: DEFAULT_TEXT.to_string(),
            color,
        });
        id
    }

    pub fn add_stroke(&mut self, points: Vec<Point>, color: Color) -> AnnotationId {
        let id = self.next_id();
        self.strokes.push(FreehandStroke { id, points, color });
        id
    }

    pub fn arrow(&self, id: AnnotationId) -> Option<&Arrow> {
        self.arrows.iter().find(|arrow| arrow.id == id)
    }

    pub fn text(&self, id: AnnotationId) -> Option<&TextLabel> {
        self.texts.iter().find(|label| label.id == id)
    }

    /// In-place update of one arrow; stale ids are absorbed as a no-op.
    pub fn mutate_arrow(&mut self, id: AnnotationId, mutate: impl FnOnce(&mut Arrow)) {
        if let Some(arrow) = self.arrows.iter_mut().find(|arrow| arrow.id == id) {
            mutate(arrow);
        }
    }

    pub fn mutate_text(&mut self, id: AnnotationId, mutate: impl FnOnce(&mut TextLabel)) {
        if let Some(label) = self.texts.iter_mut().find(|label| label.id == id) {
            mutate(label);
        }
    }

    pub fn remove_arrow(&mut self, id: AnnotationId) {
        self.arrows.retain(|arrow| arrow.id != id);
    }

    pub fn remove_text(&mut self, id: AnnotationId) {
        self.texts.retain(|label| label.id != id);
    }

    pub fn remove_stroke(&mut self, id: AnnotationId) {
        self.strokes.retain(|stroke| stroke.id != id);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            arrows: self.arrows.clone(),
            texts: self.texts.clone(),
            strokes: self.strokes.clone(),
        }
    }

    /// Replaces all three collections. Id allocation keeps counting upward
    /// so ids never repeat within a session.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.arrows = snapshot.arrows.clone();
        self.texts = snapshot.texts.clone();
        self.strokes = snapshot.strokes.clone();
    }

    pub fn clear_all(&mut self) {
        self.arrows.clear();
        self.texts.clear();
        self.strokes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::AnnotationStore;
    use crate::annotation::{Color, Point, DEFAULT_TEXT};

    #[test]
    fn add_and_remove_round_trip() {
        let mut store = AnnotationStore::new();
        let arrow = store.add_arrow(Point::new(0.0, 0.0), Point::new(40.0, 0.0), Color::Red);
        let text = store.add_text(Point::new(5.0, 5.0), Color::Blue);

        assert_eq!(store.arrows().len(), 1);
        assert_eq!(store.text(text).map(|label| label.text.as_str()), Some(DEFAULT_TEXT));

        store.remove_arrow(arrow);
        store.remove_text(text);
        assert!(store.is_empty());
    }

    #[test]
    fn mutate_missing_id_is_noop() {
        let mut store = AnnotationStore::new();
        store.add_arrow(Point::new(0.0, 0.0), Point::new(40.0, 0.0), Color::Red);

        store.mutate_arrow(999, |arrow| arrow.tail = Point::new(1.0, 1.0));
        store.remove_text(999);

        assert_eq!(store.arrows()[0].tail, Point::new(0.0, 0.0));
        assert_eq!(store.arrows().len(), 1);
    }

    #[test]
    fn snapshots_are_independent() {
        let mut store = AnnotationStore::new();
        let id = store.add_arrow(Point::new(0.0, 0.0), Point::new(40.0, 0.0), Color::Red);
        let before = store.snapshot();

        store.mutate_arrow(id, |arrow| arrow.head = Point::new(80.0, 0.0));
        assert_eq!(before.arrows[0].head, Point::new(40.0, 0.0));

        store.restore(&before);
        assert_eq!(store.arrows()[0].head, Point::new(40.0, 0.0));
    }

    #[test]
    fn clear_all_empties_every_collection() {
        let mut store = AnnotationStore::new();
        store.add_arrow(Point::new(0.0, 0.0), Point::new(40.0, 0.0), Color::Red);
        store.add_text(Point::new(5.0, 5.0), Color::Blue);
        store.add_stroke(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            Color::Green,
        );

        store.clear_all();
        assert!(store.is_empty());
    }
}
