use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureOptions, Vec2};
use image::DynamicImage;

use crate::annotation::Color;
use crate::controller::InteractionController;

/// Base raster for one session plus its lazily created GPU texture. The
/// raster is read-only once acquired.
pub struct CapturedImage {
    pub dynamic: DynamicImage,
    texture: Option<TextureHandle>,
}

impl CapturedImage {
    pub fn new(dynamic: DynamicImage) -> Self {
        Self {
            dynamic,
            texture: None,
        }
    }

    pub fn size_vec2(&self) -> Vec2 {
        Vec2::new(self.dynamic.width() as f32, self.dynamic.height() as f32)
    }

    pub fn ensure_texture(&mut self, ctx: &EguiContext) -> &TextureHandle {
        if self.texture.is_none() {
            let rgba = self.dynamic.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            self.texture = Some(ctx.load_texture("bugmark_capture", color, TextureOptions::LINEAR));
        }
        self.texture.as_ref().expect("texture was just created")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// One open modal cycle: the captured raster, the annotation state and the
/// report form. Constructed fresh on open, discarded whole on close; no
/// state survives between sessions.
pub struct ReportSession {
    pub image: Option<CapturedImage>,
    pub controller: InteractionController,
    pub description: String,
    pub message: Option<(MessageKind, String)>,
    pub confirm_clear: bool,
    /// Preview container size from the latest laid-out frame; the export
    /// mapper is built from it.
    pub display_size: Option<(f32, f32)>,
}

impl ReportSession {
    pub fn new(image: Option<DynamicImage>, color: Color) -> Self {
        Self {
            image: image.map(CapturedImage::new),
            controller: InteractionController::new(color),
            description: String::new(),
            message: None,
            confirm_clear: false,
            display_size: None,
        }
    }

    pub fn show_message(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.message = Some((kind, text.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageKind, ReportSession};
    use crate::annotation::Color;

    #[test]
    fn fresh_session_is_empty() {
        let session = ReportSession::new(None, Color::Red);
        assert!(session.image.is_none());
        assert!(session.controller.store().is_empty());
        assert!(!session.controller.can_undo());
        assert!(session.description.is_empty());
    }

    #[test]
    fn messages_replace_each_other() {
        let mut session = ReportSession::new(None, Color::Red);
        session.show_message(MessageKind::Info, "Capturing screenshot...");
        session.show_message(MessageKind::Error, "capture failed");

        let (kind, text) = session.message.clone().expect("message");
        assert_eq!(kind, MessageKind::Error);
        assert_eq!(text, "capture failed");
    }
}
