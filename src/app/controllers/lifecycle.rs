use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::app::domain::settings::Settings;
use crate::app::error::EditorError;
use crate::app::infrastructure::dom::{Document, Element, Tag};

pub const WRAPPER_ID: &str = "epiceditor-wrapper";
pub const EDITOR_FRAME_ID: &str = "epiceditor-editor-frame";
pub const PREVIEWER_FRAME_ID: &str = "epiceditor-previewer-frame";
pub const UTILBAR_CLASS: &str = "epiceditor-utilbar";
pub const PREVIEW_BUTTON_CLASS: &str = "epiceditor-toggle-preview-btn";
pub const EDIT_BUTTON_CLASS: &str = "epiceditor-toggle-edit-btn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unloaded,
    Loading,
    Loaded,
    Unloading,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Unloaded => "unloaded",
            LifecycleState::Loading => "loading",
            LifecycleState::Loaded => "loaded",
            LifecycleState::Unloading => "unloading",
        })
    }
}

/// Names accepted by `get_element`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKey {
    Container,
    Wrapper,
    WrapperIframe,
    Editor,
    EditorIframe,
    Previewer,
    PreviewerIframe,
}

impl FromStr for ElementKey {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "container" => Ok(ElementKey::Container),
            "wrapper" => Ok(ElementKey::Wrapper),
            "wrapperIframe" => Ok(ElementKey::WrapperIframe),
            "editor" => Ok(ElementKey::Editor),
            "editorIframe" => Ok(ElementKey::EditorIframe),
            "previewer" => Ok(ElementKey::Previewer),
            "previewerIframe" => Ok(ElementKey::PreviewerIframe),
            other => Err(EditorError::Config(format!("unknown element key: {other}"))),
        }
    }
}

/// A resolved `get_element` target.
#[derive(Debug, Clone)]
pub enum Handle {
    Element(Rc<Element>),
    Document(Rc<Document>),
}

impl Handle {
    pub fn as_element(&self) -> Option<&Rc<Element>> {
        match self {
            Handle::Element(el) => Some(el),
            Handle::Document(_) => None,
        }
    }

    pub fn as_document(&self) -> Option<&Rc<Document>> {
        match self {
            Handle::Document(doc) => Some(doc),
            Handle::Element(_) => None,
        }
    }
}

/// The wrapper frame and the two inner surfaces it hosts.
#[derive(Debug)]
pub struct Surfaces {
    pub wrapper_iframe: Rc<Element>,
    pub wrapper_document: Rc<Document>,
    pub wrapper: Rc<Element>,
    pub utilbar: Rc<Element>,
    pub editor_iframe: Rc<Element>,
    pub editor: Rc<Document>,
    pub previewer_iframe: Rc<Element>,
    pub previewer: Rc<Document>,
}

impl Surfaces {
    /// Build the full structure, detached from any container.
    pub fn build(settings: &Settings) -> Self {
        let editor = Document::new();
        editor.link_stylesheet(settings.resolve_asset(&settings.theme.editor));
        let previewer = Document::new();
        previewer.link_stylesheet(settings.resolve_asset(&settings.theme.preview));

        let editor_iframe = Element::frame(editor.clone())
            .with_id(EDITOR_FRAME_ID)
            .into_rc();
        let previewer_iframe = Element::frame(previewer.clone())
            .with_id(PREVIEWER_FRAME_ID)
            .into_rc();

        let utilbar = Element::new(Tag::Div).with_class(UTILBAR_CLASS).into_rc();
        utilbar.append_child(
            Element::new(Tag::Button)
                .with_class(PREVIEW_BUTTON_CLASS)
                .with_title("Preview")
                .into_rc(),
        );
        utilbar.append_child(
            Element::new(Tag::Button)
                .with_class(EDIT_BUTTON_CLASS)
                .with_title("Edit")
                .into_rc(),
        );

        let wrapper = Element::new(Tag::Div).with_id(WRAPPER_ID).into_rc();
        wrapper.append_child(editor_iframe.clone());
        wrapper.append_child(previewer_iframe.clone());
        wrapper.append_child(utilbar.clone());

        let wrapper_document = Document::new();
        wrapper_document.link_stylesheet(settings.resolve_asset(&settings.theme.base));
        wrapper_document.body().append_child(wrapper.clone());

        let wrapper_iframe = Element::frame(wrapper_document.clone()).into_rc();

        Self {
            wrapper_iframe,
            wrapper_document,
            wrapper,
            utilbar,
            editor_iframe,
            editor,
            previewer_iframe,
            previewer,
        }
    }

    pub fn attach(&self, container: &Element) {
        container.append_child(self.wrapper_iframe.clone());
    }

    pub fn detach(&self, container: &Element) -> bool {
        container.remove_child(&self.wrapper_iframe)
    }

    /// True when both inner frames are reachable by id inside the wrapper.
    pub fn is_complete(&self) -> bool {
        let find = |id| self.wrapper_document.get_element_by_id(id);
        matches!(find(EDITOR_FRAME_ID), Some(el) if Rc::ptr_eq(&el, &self.editor_iframe))
            && matches!(find(PREVIEWER_FRAME_ID), Some(el) if Rc::ptr_eq(&el, &self.previewer_iframe))
    }

    /// Show exactly one of the two panes.
    pub fn show_previewer(&self, previewing: bool) {
        self.editor_iframe.set_hidden(previewing);
        self.previewer_iframe.set_hidden(!previewing);
    }

    pub fn lookup(&self, key: ElementKey) -> Option<Handle> {
        let handle = match key {
            ElementKey::Container => return None,
            ElementKey::Wrapper => Handle::Element(self.wrapper.clone()),
            ElementKey::WrapperIframe => Handle::Element(self.wrapper_iframe.clone()),
            ElementKey::Editor => Handle::Document(self.editor.clone()),
            ElementKey::EditorIframe => Handle::Element(self.editor_iframe.clone()),
            ElementKey::Previewer => Handle::Document(self.previewer.clone()),
            ElementKey::PreviewerIframe => Handle::Element(self.previewer_iframe.clone()),
        };
        Some(handle)
    }
}

/// The load/unload state machine and the surfaces it owns while loaded.
pub struct Lifecycle {
    state: Cell<LifecycleState>,
    surfaces: RefCell<Option<Rc<Surfaces>>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Cell::new(LifecycleState::Unloaded),
            surfaces: RefCell::new(None),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.get() == LifecycleState::Loaded
    }

    /// Enter `Loading`. False (and no change) unless currently unloaded.
    pub fn begin_load(&self) -> bool {
        if self.state.get() != LifecycleState::Unloaded {
            return false;
        }
        self.state.set(LifecycleState::Loading);
        true
    }

    pub fn finish_load(&self, surfaces: Rc<Surfaces>) {
        debug_assert_eq!(self.state.get(), LifecycleState::Loading);
        *self.surfaces.borrow_mut() = Some(surfaces);
        self.state.set(LifecycleState::Loaded);
    }

    /// Abandon a load that could not complete.
    pub fn abort_load(&self) {
        self.surfaces.borrow_mut().take();
        self.state.set(LifecycleState::Unloaded);
    }

    /// Enter `Unloading` and hand back the surfaces to tear down. None
    /// (and no change) unless currently loaded.
    pub fn begin_unload(&self) -> Option<Rc<Surfaces>> {
        if self.state.get() != LifecycleState::Loaded {
            return None;
        }
        self.state.set(LifecycleState::Unloading);
        self.surfaces.borrow_mut().take()
    }

    pub fn finish_unload(&self) {
        debug_assert_eq!(self.state.get(), LifecycleState::Unloading);
        self.state.set(LifecycleState::Unloaded);
    }

    /// The surfaces, only while fully loaded.
    pub fn surfaces(&self) -> Option<Rc<Surfaces>> {
        if !self.is_loaded() {
            return None;
        }
        self.surfaces.borrow().clone()
    }
}
