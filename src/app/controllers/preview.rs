use std::rc::Rc;

use crate::app::controllers::lifecycle::Surfaces;
use crate::app::error::Result;
use crate::app::infrastructure::dom::Document;
use crate::app::services::markdown::{ExportFormat, Renderer, convert};

/// Keeps the editable surface and the preview surface in step.
///
/// Writes go one way, into the editable body; the preview is always derived
/// from whatever the editable body holds.
pub struct ContentBridge {
    editor: Rc<Document>,
    previewer: Rc<Document>,
    renderer: Rc<dyn Renderer>,
}

impl ContentBridge {
    pub fn new(surfaces: &Surfaces, renderer: Rc<dyn Renderer>) -> Self {
        Self {
            editor: surfaces.editor.clone(),
            previewer: surfaces.previewer.clone(),
            renderer,
        }
    }

    /// Replace the editable body with `text`, untransformed.
    pub fn push_to_editor(&self, text: &str) {
        self.editor.body().set_inner_html(text);
    }

    pub fn editor_text(&self) -> String {
        self.editor.body().inner_html()
    }

    pub fn preview_html(&self) -> String {
        self.previewer.body().inner_html()
    }

    /// Re-render the preview from the editable body. On failure the previous
    /// preview stays in place and the error is returned to the caller.
    pub fn refresh_preview(&self) -> Result<()> {
        let html = self.renderer.render(&self.editor_text())?;
        self.previewer.body().set_inner_html(&html);
        Ok(())
    }

    /// Convert the current editable text. Never touches either surface.
    pub fn export_as(&self, format: ExportFormat) -> Result<String> {
        convert(&self.editor_text(), format, self.renderer.as_ref())
    }
}
