use crate::annotation::{
    AnchorEnd, AnnotationId, Arrow, Color, Point, DEFAULT_TEXT, MIN_ARROW_LEN, MIN_STROKE_POINTS,
};
use crate::history::UndoHistory;
use crate::store::{AnnotationStore, Snapshot};

/// Distance within which a press grabs an arrow endpoint anchor.
const ANCHOR_TOLERANCE: f32 = 8.0;
/// Hit padding for arrow shafts and text label bodies.
const BODY_TOLERANCE: f32 = 6.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Select,
    Arrow,
    Text,
    Freehand,
}

/// The single in-flight press-move-release interaction. At most one is
/// active at a time; a press while one is active is ignored.
#[derive(Clone, Debug)]
enum Gesture {
    DrawArrow {
        tail: Point,
        head: Point,
    },
    DrawStroke {
        points: Vec<Point>,
    },
    MoveArrow {
        id: AnnotationId,
        origin: Arrow,
        grab: Point,
    },
    ResizeArrow {
        id: AnnotationId,
        end: AnchorEnd,
        origin: Arrow,
    },
    MoveText {
        id: AnnotationId,
        origin: Point,
        grab: Point,
    },
}

/// Display-space preview of the annotation currently being drawn, for the
/// live overlay. Draw gestures live outside the store until they settle.
#[derive(Clone, Debug, PartialEq)]
pub enum GesturePreview {
    Arrow { tail: Point, head: Point },
    Stroke { points: Vec<Point> },
}

#[derive(Clone, Debug)]
pub struct TextEdit {
    pub id: AnnotationId,
    pub buffer: String,
    original: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeOutcome {
    /// Escape was absorbed by an edit, gesture or active tool.
    Consumed,
    /// Nothing left to unwind; the surrounding modal may close.
    CloseSession,
}

/// Turns pointer input into store mutations. Owns the store and its history
/// for one modal session; both are discarded with the session.
pub struct InteractionController {
    store: AnnotationStore,
    history: UndoHistory<Snapshot>,
    tool: Tool,
    gesture: Option<Gesture>,
    text_edit: Option<TextEdit>,
    color: Color,
    bounds: (f32, f32),
}

impl InteractionController {
    pub fn new(color: Color) -> Self {
        Self {
            store: AnnotationStore::new(),
            history: UndoHistory::new(Snapshot::default()),
            tool: Tool::Select,
            gesture: None,
            text_edit: None,
            color,
            bounds: (0.0, 0.0),
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Display-space size of the preview container, used to clamp in-flight
    /// arrow heads. Updated by the canvas every frame.
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.bounds = (width, height);
    }

    /// Entering a tool applies any pending text edit and abandons the
    /// previous tool's in-flight gesture.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        self.apply_text_edit();
        self.abandon_gesture();
        self.tool = tool;
    }

    /// Toolbar semantics: clicking the active tool returns to Select.
    pub fn toggle_tool(&mut self, tool: Tool) {
        if self.tool == tool {
            self.set_tool(Tool::Select);
        } else {
            self.set_tool(tool);
        }
    }

    pub fn has_active_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn gesture_preview(&self) -> Option<GesturePreview> {
        match self.gesture.as_ref()? {
            Gesture::DrawArrow { tail, head } => Some(GesturePreview::Arrow {
                tail: *tail,
                head: *head,
            }),
            Gesture::DrawStroke { points } => Some(GesturePreview::Stroke {
                points: points.clone(),
            }),
            _ => None,
        }
    }

    pub fn pointer_pressed(&mut self, pos: Point) {
        if self.gesture.is_some() {
            return;
        }
        if self.text_edit.is_some() {
            // Pressing the canvas blurs the in-place editor.
            self.apply_text_edit();
        }

        // Existing handles take precedence over starting a new annotation
        // of the current tool type.
        if matches!(self.tool, Tool::Select | Tool::Arrow) {
            if let Some((id, end)) = self.anchor_hit(pos) {
                let origin = *self.store.arrow(id).expect("anchor hit implies arrow");
                self.gesture = Some(Gesture::ResizeArrow { id, end, origin });
                return;
            }
        }

        match self.tool {
            Tool::Select => {
                if let Some(id) = self.arrow_body_hit(pos) {
                    let origin = *self.store.arrow(id).expect("body hit implies arrow");
                    self.gesture = Some(Gesture::MoveArrow {
                        id,
                        origin,
                        grab: pos,
                    });
                } else if let Some(id) = self.text_body_hit(pos) {
                    let origin = self.store.text(id).expect("body hit implies text").pos;
                    self.gesture = Some(Gesture::MoveText {
                        id,
                        origin,
                        grab: pos,
                    });
                }
            }
            Tool::Arrow => {
                self.gesture = Some(Gesture::DrawArrow {
                    tail: pos,
                    head: pos,
                });
            }
            Tool::Text => {
                if let Some(id) = self.text_body_hit(pos) {
                    self.begin_text_edit(id);
                } else {
                    let id = self.store.add_text(pos, self.color);
                    self.commit();
                    self.text_edit = Some(TextEdit {
                        id,
                        buffer: DEFAULT_TEXT.to_string(),
                        original: DEFAULT_TEXT.to_string(),
                    });
                }
            }
            Tool::Freehand => {
                self.gesture = Some(Gesture::DrawStroke { points: vec![pos] });
            }
        }
    }

    pub fn pointer_moved(&mut self, pos: Point) {
        let (width, height) = self.bounds;
        match &mut self.gesture {
            Some(Gesture::DrawArrow { head, .. }) => {
                *head = pos.clamped(width, height);
            }
            Some(Gesture::DrawStroke { points }) => {
                points.push(pos);
            }
            Some(Gesture::MoveArrow { id, origin, grab }) => {
                let (id, origin, delta) = (*id, *origin, grab.delta(pos));
                self.store.mutate_arrow(id, |arrow| {
                    *arrow = origin;
                    arrow.move_by(delta);
                });
            }
            Some(Gesture::ResizeArrow { id, end, .. }) => {
                let (id, end) = (*id, *end);
                self.store.mutate_arrow(id, |arrow| arrow.set_end(end, pos));
            }
            Some(Gesture::MoveText { id, origin, grab }) => {
                let (id, moved) = (*id, origin.translated(grab.delta(pos)));
                self.store.mutate_text(id, |label| label.pos = moved);
            }
            None => {}
        }
    }

    pub fn pointer_released(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };

        match gesture {
            Gesture::DrawArrow { tail, head } => {
                // Sub-threshold arrows are accidental clicks, not edits.
                if tail.delta(head).length() >= MIN_ARROW_LEN {
                    self.store.add_arrow(tail, head, self.color);
                    self.commit();
                }
            }
            Gesture::DrawStroke { points } => {
                if points.len() >= MIN_STROKE_POINTS {
                    self.store.add_stroke(points, self.color);
                    self.commit();
                }
            }
            Gesture::MoveArrow { id, origin, .. } | Gesture::ResizeArrow { id, origin, .. } => {
                if self.store.arrow(id).is_some_and(|arrow| *arrow != origin) {
                    self.commit();
                }
            }
            Gesture::MoveText { id, origin, .. } => {
                if self.store.text(id).is_some_and(|label| label.pos != origin) {
                    self.commit();
                }
            }
        }
    }

    fn abandon_gesture(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };

        // A gesture that mutated the store live is rolled back; nothing is
        // committed for an abandoned interaction.
        match gesture {
            Gesture::MoveArrow { id, origin, .. } | Gesture::ResizeArrow { id, origin, .. } => {
                self.store.mutate_arrow(id, |arrow| *arrow = origin);
            }
            Gesture::MoveText { id, origin, .. } => {
                self.store.mutate_text(id, |label| label.pos = origin);
            }
            Gesture::DrawArrow { .. } | Gesture::DrawStroke { .. } => {}
        }
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    pub fn begin_text_edit(&mut self, id: AnnotationId) {
        let Some(label) = self.store.text(id) else {
            return;
        };
        let text = label.text.clone();
        self.text_edit = Some(TextEdit {
            id,
            buffer: text.clone(),
            original: text,
        });
    }

    /// Keystroke path: the stored label mirrors the buffer on every change.
    pub fn update_text_buffer(&mut self, buffer: String) {
        let Some(edit) = self.text_edit.as_mut() else {
            return;
        };
        edit.buffer = buffer.clone();
        let id = edit.id;
        self.store.mutate_text(id, |label| label.text = buffer);
    }

    /// Focus loss: an emptied label is deleted; changed content is settled
    /// into history as one commit.
    pub fn apply_text_edit(&mut self) {
        let Some(edit) = self.text_edit.take() else {
            return;
        };

        let trimmed = edit.buffer.trim().to_string();
        if trimmed.is_empty() {
            self.store.remove_text(edit.id);
            self.commit();
            return;
        }

        if trimmed != edit.original {
            let id = edit.id;
            self.store.mutate_text(id, |label| label.text = trimmed);
            self.commit();
        } else {
            // Buffer may hold untrimmed whitespace; settle it back.
            let id = edit.id;
            let original = edit.original;
            self.store.mutate_text(id, |label| label.text = original);
        }
    }

    /// Escape unwinds one layer at a time: text edit, then in-flight
    /// gesture, then the active tool. Only with nothing left does it ask
    /// the surrounding modal to close.
    pub fn escape(&mut self) -> EscapeOutcome {
        if self.text_edit.is_some() {
            self.apply_text_edit();
            return EscapeOutcome::Consumed;
        }
        if self.gesture.is_some() {
            self.abandon_gesture();
            return EscapeOutcome::Consumed;
        }
        if self.tool != Tool::Select {
            self.tool = Tool::Select;
            return EscapeOutcome::Consumed;
        }
        EscapeOutcome::CloseSession
    }

    /// Clears all three collections with exactly one commit. Confirmation
    /// is the caller's job; an empty store is a no-op.
    pub fn clear_all(&mut self) -> bool {
        if self.store.is_empty() {
            return false;
        }
        self.abandon_gesture();
        self.text_edit = None;
        self.store.clear_all();
        self.commit();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.abandon_gesture();
        self.text_edit = None;
        if let Some(snapshot) = self.history.undo() {
            self.store.restore(&snapshot);
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        self.abandon_gesture();
        self.text_edit = None;
        if let Some(snapshot) = self.history.redo() {
            self.store.restore(&snapshot);
            true
        } else {
            false
        }
    }

    fn commit(&mut self) {
        self.history.commit(self.store.snapshot());
    }

    fn anchor_hit(&self, pos: Point) -> Option<(AnnotationId, AnchorEnd)> {
        // Topmost (latest) annotation wins.
        self.store.arrows().iter().rev().find_map(|arrow| {
            arrow
                .anchor_at(pos, ANCHOR_TOLERANCE)
                .map(|end| (arrow.id, end))
        })
    }

    fn arrow_body_hit(&self, pos: Point) -> Option<AnnotationId> {
        self.store
            .arrows()
            .iter()
            .rev()
            .find(|arrow| arrow.contains(pos, BODY_TOLERANCE))
            .map(|arrow| arrow.id)
    }

    fn text_body_hit(&self, pos: Point) -> Option<AnnotationId> {
        self.store
            .texts()
            .iter()
            .rev()
            .find(|label| label.contains(pos, BODY_TOLERANCE))
            .map(|label| label.id)
    }

}

#[cfg(test)]
mod tests {
    use super::{EscapeOutcome, InteractionController, Tool};
    use crate::annotation::{Color, Point};

    fn controller() -> InteractionController {
        let mut controller = InteractionController::new(Color::Red);
        controller.set_bounds(800.0, 600.0);
        controller
    }

    fn draw_arrow(controller: &mut InteractionController, tail: Point, head: Point) {
        controller.set_tool(Tool::Arrow);
        controller.pointer_pressed(tail);
        controller.pointer_moved(head);
        controller.pointer_released();
    }

    #[test]
    fn short_arrow_is_discarded() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(14.0, 12.0));

        assert!(controller.store().arrows().is_empty());
        assert!(!controller.can_undo());
    }

    #[test]
    fn committed_arrow_keeps_tail_and_head() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));

        let arrows = controller.store().arrows();
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows[0].tail, Point::new(10.0, 10.0));
        assert_eq!(arrows[0].head, Point::new(100.0, 10.0));
        assert!(controller.can_undo());
    }

    #[test]
    fn in_flight_arrow_head_is_clamped_to_bounds() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(900.0, -50.0));

        let arrow = controller.store().arrows()[0];
        assert_eq!(arrow.head, Point::new(800.0, 0.0));
    }

    #[test]
    fn short_stroke_is_discarded() {
        let mut controller = controller();
        controller.set_tool(Tool::Freehand);
        controller.pointer_pressed(Point::new(5.0, 5.0));
        controller.pointer_moved(Point::new(6.0, 6.0));
        controller.pointer_released();

        assert!(controller.store().strokes().is_empty());
    }

    #[test]
    fn stroke_records_every_move() {
        let mut controller = controller();
        controller.set_tool(Tool::Freehand);
        controller.pointer_pressed(Point::new(5.0, 5.0));
        for i in 1..=5 {
            controller.pointer_moved(Point::new(5.0 + i as f32, 5.0));
        }
        controller.pointer_released();

        assert_eq!(controller.store().strokes().len(), 1);
        assert_eq!(controller.store().strokes()[0].points.len(), 6);
    }

    #[test]
    fn anchor_press_resizes_instead_of_starting_new_arrow() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));

        // Still in arrow mode; pressing the head anchor must grab it.
        controller.pointer_pressed(Point::new(100.0, 10.0));
        controller.pointer_moved(Point::new(150.0, 40.0));
        controller.pointer_released();

        let arrows = controller.store().arrows();
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows[0].head, Point::new(150.0, 40.0));
        assert_eq!(arrows[0].tail, Point::new(10.0, 10.0));
    }

    #[test]
    fn body_drag_translates_both_endpoints() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        controller.set_tool(Tool::Select);

        controller.pointer_pressed(Point::new(50.0, 10.0));
        controller.pointer_moved(Point::new(60.0, 30.0));
        controller.pointer_released();

        let arrow = controller.store().arrows()[0];
        assert_eq!(arrow.tail, Point::new(20.0, 30.0));
        assert_eq!(arrow.head, Point::new(110.0, 30.0));
    }

    #[test]
    fn undo_after_drag_restores_pre_drag_state_in_one_step() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        controller.set_tool(Tool::Select);

        controller.pointer_pressed(Point::new(50.0, 10.0));
        controller.pointer_moved(Point::new(70.0, 10.0));
        controller.pointer_released();

        assert!(controller.undo());
        let arrow = controller.store().arrows()[0];
        assert_eq!(arrow.tail, Point::new(10.0, 10.0));
    }

    #[test]
    fn zero_movement_drag_commits_nothing() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        controller.set_tool(Tool::Select);

        controller.pointer_pressed(Point::new(50.0, 10.0));
        controller.pointer_released();

        // One commit total: the arrow itself. Undo empties the store.
        assert!(controller.undo());
        assert!(controller.store().is_empty());
        assert!(!controller.can_undo());
    }

    #[test]
    fn text_press_creates_label_in_edit_focus() {
        let mut controller = controller();
        controller.set_tool(Tool::Text);
        controller.pointer_pressed(Point::new(40.0, 40.0));

        assert_eq!(controller.store().texts().len(), 1);
        assert_eq!(controller.store().texts()[0].text, "Text");
        assert!(controller.text_edit().is_some());
        assert!(controller.can_undo());
    }

    #[test]
    fn emptied_label_is_removed_on_blur() {
        let mut controller = controller();
        controller.set_tool(Tool::Text);
        controller.pointer_pressed(Point::new(40.0, 40.0));

        controller.update_text_buffer(String::new());
        controller.apply_text_edit();

        assert!(controller.store().texts().is_empty());
    }

    #[test]
    fn edited_label_settles_final_text() {
        let mut controller = controller();
        controller.set_tool(Tool::Text);
        controller.pointer_pressed(Point::new(40.0, 40.0));

        controller.update_text_buffer("needs a fix  ".to_string());
        controller.apply_text_edit();

        assert_eq!(controller.store().texts()[0].text, "needs a fix");
        // Creation commit + edit commit.
        assert!(controller.undo());
        assert_eq!(controller.store().texts()[0].text, "Text");
    }

    #[test]
    fn escape_exits_tool_before_closing() {
        let mut controller = controller();
        controller.set_tool(Tool::Arrow);

        assert_eq!(controller.escape(), EscapeOutcome::Consumed);
        assert_eq!(controller.tool(), Tool::Select);
        assert_eq!(controller.escape(), EscapeOutcome::CloseSession);
    }

    #[test]
    fn escape_abandons_in_flight_resize_without_commit() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));

        controller.pointer_pressed(Point::new(100.0, 10.0));
        controller.pointer_moved(Point::new(180.0, 80.0));
        assert_eq!(controller.escape(), EscapeOutcome::Consumed);

        let arrow = controller.store().arrows()[0];
        assert_eq!(arrow.head, Point::new(100.0, 10.0));
    }

    #[test]
    fn commit_after_undo_truncates_redo() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        draw_arrow(&mut controller, Point::new(10.0, 30.0), Point::new(100.0, 30.0));

        assert!(controller.undo());
        assert!(controller.can_redo());

        draw_arrow(&mut controller, Point::new(10.0, 50.0), Point::new(100.0, 50.0));
        assert!(!controller.can_redo());
        assert_eq!(controller.store().arrows().len(), 2);
    }

    #[test]
    fn clear_all_commits_once_and_noops_when_empty() {
        let mut controller = controller();
        assert!(!controller.clear_all());

        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        draw_arrow(&mut controller, Point::new(10.0, 30.0), Point::new(100.0, 30.0));
        draw_arrow(&mut controller, Point::new(10.0, 50.0), Point::new(100.0, 50.0));
        controller.set_tool(Tool::Text);
        controller.pointer_pressed(Point::new(40.0, 100.0));
        controller.apply_text_edit();
        controller.pointer_pressed(Point::new(40.0, 140.0));
        controller.apply_text_edit();
        controller.set_tool(Tool::Freehand);
        controller.pointer_pressed(Point::new(5.0, 5.0));
        controller.pointer_moved(Point::new(6.0, 6.0));
        controller.pointer_moved(Point::new(7.0, 7.0));
        controller.pointer_released();

        assert!(controller.clear_all());
        assert!(controller.store().is_empty());

        // Exactly one commit: a single undo restores everything.
        assert!(controller.undo());
        assert_eq!(controller.store().arrows().len(), 3);
        assert_eq!(controller.store().texts().len(), 2);
        assert_eq!(controller.store().strokes().len(), 1);
    }

    #[test]
    fn undo_redo_round_trip_restores_exact_snapshot() {
        let mut controller = controller();
        draw_arrow(&mut controller, Point::new(10.0, 10.0), Point::new(100.0, 10.0));
        let before = controller.snapshot();

        assert!(controller.undo());
        assert!(controller.redo());
        assert_eq!(controller.snapshot(), before);
    }

    #[test]
    fn switching_tools_applies_pending_text_edit() {
        let mut controller = controller();
        controller.set_tool(Tool::Text);
        controller.pointer_pressed(Point::new(40.0, 40.0));
        controller.update_text_buffer(String::new());

        controller.set_tool(Tool::Arrow);
        assert!(controller.store().texts().is_empty());
        assert!(controller.text_edit().is_none());
    }
}
