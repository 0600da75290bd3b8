use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::controllers::events::{EventBus, ListenerId, ListenerResult};
use super::controllers::files::{FileImport, FileStore, ImportOutcome};
use super::controllers::lifecycle::{ElementKey, Handle, Lifecycle, LifecycleState, Surfaces};
use super::controllers::preview::ContentBridge;
use super::domain::{Event, EventKind, FileRecord, Settings};
use super::error::{EditorError, Result};
use super::infrastructure::dom::{Container, Element};
use super::infrastructure::storage::{MemoryStorage, Storage};
use super::services::markdown::{ExportFormat, MarkdownRenderer, Renderer, convert};

const UNTITLED_FILE: &str = "__epiceditor-untitled-file";

/// Builder for [`EpicEditor`].
pub struct EpicEditorBuilder {
    container: Container,
    settings: Settings,
    storage: Option<Box<dyn Storage>>,
    renderer: Option<Rc<dyn Renderer>>,
}

impl EpicEditorBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Persistence backend. Defaults to a private [`MemoryStorage`]; ignored
    /// when `client_side_storage` is off.
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Markdown renderer. Defaults to [`MarkdownRenderer`].
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Rc::new(renderer));
        self
    }

    pub fn build(self) -> Result<EpicEditor> {
        self.settings.validate()?;
        let container = self.container.resolve()?;

        let default_content = self.settings.file.default_content.clone();
        let store = if self.settings.client_side_storage {
            let backend = self
                .storage
                .unwrap_or_else(|| Box::new(MemoryStorage::new()));
            FileStore::with_storage(default_content, backend, &self.settings.local_storage_name)
        } else {
            FileStore::new(default_content)
        };

        Ok(EpicEditor {
            inner: Rc::new(Inner {
                settings: self.settings,
                container,
                renderer: self.renderer.unwrap_or_else(|| Rc::new(MarkdownRenderer)),
                lifecycle: Lifecycle::new(),
                store: RefCell::new(store),
                bridge: RefCell::new(None),
                previewing: Cell::new(false),
                events: EventBus::new(),
            }),
        })
    }
}

struct Inner {
    settings: Settings,
    container: Rc<Element>,
    renderer: Rc<dyn Renderer>,
    lifecycle: Lifecycle,
    store: RefCell<FileStore>,
    bridge: RefCell<Option<ContentBridge>>,
    previewing: Cell<bool>,
    events: EventBus<EpicEditor>,
}

/// An embeddable markdown editor: a file store mirrored into an editable
/// surface, with a live-rendered preview surface beside it.
///
/// Cloning yields another handle to the same widget. No internal borrow is
/// held while event handlers run, so handlers may call back into it.
#[derive(Clone)]
pub struct EpicEditor {
    inner: Rc<Inner>,
}

impl EpicEditor {
    pub fn builder(container: impl Into<Container>) -> EpicEditorBuilder {
        EpicEditorBuilder {
            container: container.into(),
            settings: Settings::default(),
            storage: None,
            renderer: None,
        }
    }

    pub fn new(container: impl Into<Container>, settings: Settings) -> Result<Self> {
        Self::builder(container).settings(settings).build()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lifecycle.is_loaded()
    }

    pub fn is_previewing(&self) -> bool {
        self.is_loaded() && self.inner.previewing.get()
    }

    pub fn is_editing(&self) -> bool {
        self.is_loaded() && !self.inner.previewing.get()
    }

    // --- lifecycle ---

    /// Build the surfaces, open the current or default file, emit `load`.
    /// A no-op unless unloaded.
    pub fn load(&self) -> &Self {
        let inner = &self.inner;
        if !inner.lifecycle.begin_load() {
            log::debug!("load() ignored while {}", inner.lifecycle.state());
            return self;
        }

        let surfaces = Rc::new(Surfaces::build(&inner.settings));
        if !surfaces.is_complete() {
            log::warn!("Surface construction incomplete, aborting load");
            inner.lifecycle.abort_load();
            return self;
        }
        surfaces.show_previewer(false);
        surfaces.attach(&inner.container);
        *inner.bridge.borrow_mut() = Some(ContentBridge::new(&surfaces, inner.renderer.clone()));
        inner.previewing.set(false);
        inner.lifecycle.finish_load(surfaces);

        let name = self
            .active_file()
            .unwrap_or_else(|| self.default_file_name());
        let created = inner.store.borrow_mut().ensure(&name);
        match created {
            Ok(created) => {
                if created {
                    self.persist_best_effort();
                    self.emit(Event::Create { name: name.clone() });
                }
                if let Err(e) = self.open(&name) {
                    self.report(&e);
                }
            }
            Err(e) => {
                self.report(&e);
                self.sync_surfaces();
            }
        }

        log::info!("Editor loaded into #{}", inner.container.id().unwrap_or("?"));
        self.emit(Event::Load);
        self
    }

    /// Tear down the surfaces and emit `unload`. A no-op unless loaded.
    pub fn unload(&self) -> &Self {
        let inner = &self.inner;
        let Some(surfaces) = inner.lifecycle.begin_unload() else {
            log::debug!("unload() ignored while {}", inner.lifecycle.state());
            return self;
        };

        inner.bridge.borrow_mut().take();
        surfaces.detach(&inner.container);
        inner.previewing.set(false);
        inner.lifecycle.finish_unload();

        log::info!("Editor unloaded");
        self.emit(Event::Unload);
        self
    }

    /// Look up one of the live structures. None for unknown keys and
    /// whenever the editor is not loaded.
    pub fn get_element(&self, key: ElementKey) -> Option<Handle> {
        let surfaces = self.inner.lifecycle.surfaces()?;
        match key {
            ElementKey::Container => Some(Handle::Element(self.inner.container.clone())),
            other => surfaces.lookup(other),
        }
    }

    pub fn get_element_by_name(&self, key: &str) -> Option<Handle> {
        self.get_element(key.parse().ok()?)
    }

    // --- events ---

    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&EpicEditor, &Event) -> ListenerResult + 'static,
    {
        self.inner.events.on(kind, handler)
    }

    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> &Self {
        self.inner.events.remove_listener(kind, id);
        self
    }

    pub fn remove_all_listeners(&self, kind: EventKind) -> &Self {
        self.inner.events.remove_all_listeners(kind);
        self
    }

    pub fn emit(&self, event: Event) -> &Self {
        log::debug!("emit {}", event.kind());
        self.inner.events.dispatch(self, &event);
        self
    }

    // --- files ---

    /// Import `content` as `name` and make it the active file.
    pub fn import_file(&self, name: &str, content: &str) -> Result<&Self> {
        self.import(FileImport::named(name).content(content))
    }

    /// Create or overwrite a file, then make it the active file. Without a
    /// name the active file is targeted.
    pub fn import(&self, import: FileImport) -> Result<&Self> {
        let name = match import.name.clone() {
            Some(name) => name,
            None => self
                .active_file()
                .ok_or_else(|| EditorError::NotFound("no active file".to_string()))?,
        };

        let outcome = self.inner.store.borrow_mut().import(&name, import)?;
        self.persist_best_effort();

        if outcome == ImportOutcome::Created {
            self.emit(Event::Create { name: name.clone() });
        }
        self.open(&name)?;
        if outcome != ImportOutcome::Unchanged {
            self.emit(Event::Update { name });
        }
        Ok(self)
    }

    /// Export a file, the active one when `name` is None. Ok(None) when the
    /// file does not exist.
    pub fn export_file(&self, name: Option<&str>, format: ExportFormat) -> Result<Option<String>> {
        let inner = &self.inner;
        let content = {
            let store = inner.store.borrow();
            match name {
                Some(name) => match store.get(name) {
                    Some(record) => Some(record.content.clone()),
                    None => return Ok(None),
                },
                None => store.active_record().map(|record| record.content.clone()),
            }
        };
        match content {
            Some(content) => convert(&content, format, inner.renderer.as_ref()).map(Some),
            None => self.export_surface(format).map(Some),
        }
    }

    fn export_surface(&self, format: ExportFormat) -> Result<String> {
        match self.inner.bridge.borrow().as_ref() {
            Some(bridge) => bridge.export_as(format),
            None => Ok(String::new()),
        }
    }

    /// Make `name` the active file and mirror it into the surfaces.
    pub fn open(&self, name: &str) -> Result<&Self> {
        self.inner.store.borrow_mut().open(name)?;
        self.sync_surfaces();
        self.emit(Event::Open {
            name: name.to_string(),
        });
        Ok(self)
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<&Self> {
        self.inner.store.borrow_mut().rename(old_name, new_name)?;
        if old_name == new_name {
            return Ok(self);
        }
        self.persist_best_effort();
        if self.active_file().as_deref() == Some(new_name) {
            self.sync_surfaces();
        }
        self.emit(Event::Rename {
            from: old_name.to_string(),
            to: new_name.to_string(),
        });
        Ok(self)
    }

    /// Delete a file. Removing the active file leaves no file active and
    /// empties both surfaces.
    pub fn remove(&self, name: &str) -> Result<&Self> {
        let was_active = self.inner.store.borrow_mut().remove(name)?;
        self.persist_best_effort();
        if was_active {
            self.sync_surfaces();
        }
        self.emit(Event::Remove {
            name: name.to_string(),
        });
        Ok(self)
    }

    pub fn active_file(&self) -> Option<String> {
        self.inner.store.borrow().active_name().map(str::to_string)
    }

    pub fn get_file(&self, name: &str) -> Option<FileRecord> {
        self.inner.store.borrow().get(name).cloned()
    }

    pub fn get_files(&self) -> BTreeMap<String, FileRecord> {
        self.inner
            .store
            .borrow()
            .files()
            .map(|record| (record.name.clone(), record.clone()))
            .collect()
    }

    // --- editing ---

    /// Apply an edit of the editable surface: the text replaces the surface
    /// body and the active file, then the preview is refreshed. Ignored
    /// unless loaded.
    pub fn input_text(&self, text: &str) -> Result<&Self> {
        if !self.is_loaded() {
            log::debug!("input ignored while {}", self.state());
            return Ok(self);
        }
        if self.active_file().is_none() {
            let name = self.default_file_name();
            if self.inner.store.borrow_mut().ensure(&name)? {
                self.emit(Event::Create { name: name.clone() });
            }
            self.inner.store.borrow_mut().open(&name)?;
        }

        if let Some(bridge) = self.inner.bridge.borrow().as_ref() {
            bridge.push_to_editor(text);
        }
        let written = self.inner.store.borrow_mut().write_active(text);
        self.refresh_preview();

        if let Some((name, changed)) = written {
            if changed {
                self.emit(Event::Update { name: name.clone() });
            }
            if self.inner.settings.file.auto_save {
                self.persist_best_effort();
                self.emit(Event::Autosave { name });
            }
        }
        Ok(self)
    }

    /// Write the editable text into the active file and persist the store.
    pub fn save(&self) -> Result<&Self> {
        let surface_text = self
            .inner
            .bridge
            .borrow()
            .as_ref()
            .map(|bridge| bridge.editor_text());

        let written = match surface_text {
            Some(text) => self.inner.store.borrow_mut().write_active(&text),
            None => self.active_file().map(|name| (name, false)),
        };
        self.inner.store.borrow_mut().persist()?;

        if let Some((name, changed)) = written {
            if changed {
                self.emit(Event::Update { name: name.clone() });
            }
            log::debug!("Saved '{}'", name);
            self.emit(Event::Save { name });
        }
        Ok(self)
    }

    /// Show the rendered preview instead of the editable surface.
    pub fn preview(&self) -> &Self {
        let Some(surfaces) = self.inner.lifecycle.surfaces() else {
            return self;
        };
        self.refresh_preview();
        surfaces.show_previewer(true);
        self.inner.previewing.set(true);
        self.emit(Event::Preview);
        self
    }

    /// Show the editable surface instead of the preview.
    pub fn edit(&self) -> &Self {
        let Some(surfaces) = self.inner.lifecycle.surfaces() else {
            return self;
        };
        surfaces.show_previewer(false);
        self.inner.previewing.set(false);
        self.emit(Event::Edit);
        self
    }

    // --- internals ---

    fn default_file_name(&self) -> String {
        self.inner
            .settings
            .file
            .name
            .clone()
            .or_else(|| self.inner.container.id().map(str::to_string))
            .unwrap_or_else(|| UNTITLED_FILE.to_string())
    }

    /// Push the active file (or nothing) into the editable surface and
    /// re-render the preview.
    fn sync_surfaces(&self) {
        let text = self
            .inner
            .store
            .borrow()
            .active_record()
            .map(|record| record.content.clone())
            .unwrap_or_default();
        if let Some(bridge) = self.inner.bridge.borrow().as_ref() {
            bridge.push_to_editor(&text);
        }
        self.refresh_preview();
    }

    fn refresh_preview(&self) {
        let result = match self.inner.bridge.borrow().as_ref() {
            Some(bridge) => bridge.refresh_preview(),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.report(&e);
        }
    }

    fn persist_best_effort(&self) {
        let result = self.inner.store.borrow_mut().persist();
        if let Err(e) = result {
            self.report(&e);
        }
    }

    fn report(&self, err: &EditorError) {
        log::warn!("{}", err);
        self.emit(Event::error(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::infrastructure::dom::Tag;

    fn container(id: &str) -> Rc<Element> {
        Element::new(Tag::Div).with_id(id).into_rc()
    }

    fn loaded(id: &str) -> EpicEditor {
        let editor = EpicEditor::new(container(id), Settings::default()).unwrap();
        editor.load();
        editor
    }

    fn editor_body(editor: &EpicEditor) -> String {
        editor
            .get_element(ElementKey::Editor)
            .and_then(|h| h.as_document().cloned())
            .map(|doc| doc.body().inner_html())
            .unwrap_or_default()
    }

    fn preview_body(editor: &EpicEditor) -> String {
        editor
            .get_element(ElementKey::Previewer)
            .and_then(|h| h.as_document().cloned())
            .map(|doc| doc.body().inner_html())
            .unwrap_or_default()
    }

    fn record_events(editor: &EpicEditor) -> Rc<RefCell<Vec<Event>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in EventKind::ALL {
            let log = log.clone();
            editor.on(kind, move |_, event| {
                log.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        log
    }

    #[test]
    fn test_load_opens_default_file_named_after_container() {
        let editor = loaded("host-1");
        assert_eq!(editor.active_file().as_deref(), Some("host-1"));
        assert_eq!(editor.export_file(None, ExportFormat::Raw).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_load_reopens_previously_active_file() {
        let editor = EpicEditor::new(container("c"), Settings::default()).unwrap();
        editor.import_file("draft", "kept").unwrap();
        editor.load();
        assert_eq!(editor.active_file().as_deref(), Some("draft"));
        assert_eq!(editor_body(&editor), "kept");
        assert!(editor.get_file("c").is_none());
    }

    #[test]
    fn test_untitled_fallback_name() {
        let editor = EpicEditor::new(Element::new(Tag::Div).into_rc(), Settings::default()).unwrap();
        editor.load();
        assert_eq!(editor.active_file().as_deref(), Some(UNTITLED_FILE));
    }

    #[test]
    fn test_configured_file_name_wins() {
        let settings = Settings::default().with_file_name("readme");
        let editor = EpicEditor::new(container("c"), settings).unwrap();
        editor.load();
        assert_eq!(editor.active_file().as_deref(), Some("readme"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings::default().with_base_path("");
        assert!(matches!(
            EpicEditor::new(container("c"), settings),
            Err(EditorError::Config(_))
        ));
    }

    #[test]
    fn test_edit_updates_store_and_preview() {
        let editor = loaded("c");
        let events = record_events(&editor);
        editor.input_text("# Title").unwrap();

        assert_eq!(editor_body(&editor), "# Title");
        assert_eq!(preview_body(&editor), "<h1>Title</h1>\n");
        assert_eq!(editor.get_file("c").unwrap().content, "# Title");
        assert_eq!(*events.borrow(), vec![Event::Update { name: "c".to_string() }]);
    }

    #[test]
    fn test_input_ignored_when_unloaded() {
        let editor = EpicEditor::new(container("c"), Settings::default()).unwrap();
        editor.input_text("lost").unwrap();
        assert!(editor.get_files().is_empty());
    }

    #[test]
    fn test_autosave_persists_each_edit() {
        let storage = MemoryStorage::new();
        let mut settings = Settings::default();
        settings.file.auto_save = true;
        let editor = EpicEditor::builder(container("c"))
            .settings(settings)
            .storage(storage.clone())
            .build()
            .unwrap();
        editor.load();
        let events = record_events(&editor);

        editor.input_text("typed").unwrap();
        assert!(storage.get("epiceditor").unwrap().contains("typed"));
        assert!(events.borrow().contains(&Event::Autosave { name: "c".to_string() }));
    }

    #[test]
    fn test_save_emits_and_persists() {
        let storage = MemoryStorage::new();
        let editor = EpicEditor::builder(container("c"))
            .storage(storage.clone())
            .build()
            .unwrap();
        editor.load();
        editor.input_text("draft").unwrap();
        assert!(!storage.get("epiceditor").unwrap_or_default().contains("draft"));

        let events = record_events(&editor);
        editor.save().unwrap();
        assert!(storage.get("epiceditor").unwrap().contains("draft"));
        assert_eq!(*events.borrow(), vec![Event::Save { name: "c".to_string() }]);
    }

    #[test]
    fn test_client_side_storage_off_skips_backend() {
        let storage = MemoryStorage::new();
        let mut settings = Settings::default();
        settings.client_side_storage = false;
        let editor = EpicEditor::builder(container("c"))
            .settings(settings)
            .storage(storage.clone())
            .build()
            .unwrap();
        editor.load();
        editor.import_file("a", "b").unwrap();
        editor.save().unwrap();
        assert!(storage.get("epiceditor").is_none());
    }

    #[test]
    fn test_preview_and_edit_modes() {
        let editor = loaded("c");
        assert!(editor.is_editing());
        editor.input_text("*hi*").unwrap();

        let events = record_events(&editor);
        editor.preview();
        assert!(editor.is_previewing());
        let previewer_frame = editor.get_element(ElementKey::PreviewerIframe).unwrap();
        assert!(!previewer_frame.as_element().unwrap().is_hidden());
        let editor_frame = editor.get_element(ElementKey::EditorIframe).unwrap();
        assert!(editor_frame.as_element().unwrap().is_hidden());
        assert_eq!(preview_body(&editor), "<p><em>hi</em></p>\n");

        editor.edit();
        assert!(editor.is_editing());
        assert_eq!(*events.borrow(), vec![Event::Preview, Event::Edit]);
    }

    #[test]
    fn test_modes_ignored_when_unloaded() {
        let editor = EpicEditor::new(container("c"), Settings::default()).unwrap();
        let events = record_events(&editor);
        editor.preview().edit();
        assert!(!editor.is_previewing());
        assert!(!editor.is_editing());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_render_failure_surfaces_error_event() {
        let editor = EpicEditor::builder(container("c"))
            .renderer(|md: &str| -> Result<String> {
                if md.contains("<<") {
                    Err(EditorError::RenderFailure("unbalanced".to_string()))
                } else {
                    Ok(format!("<p>{md}</p>"))
                }
            })
            .build()
            .unwrap();
        editor.load();
        editor.input_text("fine").unwrap();
        let events = record_events(&editor);

        editor.input_text("<< broken").unwrap();
        assert_eq!(editor_body(&editor), "<< broken");
        assert_eq!(preview_body(&editor), "<p>fine</p>");
        assert!(events
            .borrow()
            .iter()
            .any(|e| e.kind() == EventKind::Error));
        // Export of html reports the failure, raw still works.
        assert!(editor.export_file(None, ExportFormat::Html).is_err());
        assert_eq!(
            editor.export_file(None, ExportFormat::Raw).unwrap().as_deref(),
            Some("<< broken")
        );
    }

    #[test]
    fn test_import_event_sequence() {
        let editor = loaded("c");
        let events = record_events(&editor);
        editor.import_file("a", "1").unwrap();
        editor.import_file("a", "1").unwrap();
        assert_eq!(
            *events.borrow(),
            vec![
                Event::Create { name: "a".to_string() },
                Event::Open { name: "a".to_string() },
                Event::Update { name: "a".to_string() },
                Event::Open { name: "a".to_string() },
            ]
        );
    }

    #[test]
    fn test_import_without_name_targets_active() {
        let editor = loaded("c");
        editor.import(FileImport::active().content("#bar")).unwrap();
        assert_eq!(editor.get_file("c").unwrap().content, "#bar");

        editor.remove("c").unwrap();
        assert!(matches!(
            editor.import(FileImport::active().content("x")),
            Err(EditorError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_active_empties_surfaces() {
        let editor = loaded("c");
        editor.import_file("a", "# gone").unwrap();
        assert_eq!(preview_body(&editor), "<h1>gone</h1>\n");

        editor.remove("a").unwrap();
        assert_eq!(editor.active_file(), None);
        assert_eq!(editor_body(&editor), "");
        assert_eq!(preview_body(&editor), "");
        assert_eq!(editor.export_file(None, ExportFormat::Raw).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_input_after_remove_recreates_default_file() {
        let editor = loaded("c");
        editor.remove("c").unwrap();
        editor.input_text("again").unwrap();
        assert_eq!(editor.active_file().as_deref(), Some("c"));
        assert_eq!(editor.get_file("c").unwrap().content, "again");
    }

    #[test]
    fn test_rename_active_keeps_surfaces() {
        let editor = loaded("c");
        editor.import_file("foo", "testing...").unwrap();
        editor.rename("foo", "bar").unwrap();
        assert_eq!(editor.active_file().as_deref(), Some("bar"));
        assert_eq!(editor_body(&editor), "testing...");
        assert!(matches!(editor.rename("foo", "baz"), Err(EditorError::NotFound(_))));
        assert!(matches!(editor.rename("bar", "c"), Err(EditorError::Conflict(_))));
    }

    #[test]
    fn test_handlers_can_reenter_widget() {
        let editor = loaded("c");
        let exported = Rc::new(RefCell::new(None));
        let e = exported.clone();
        editor.on(EventKind::Open, move |widget, _| {
            *e.borrow_mut() = widget.export_file(None, ExportFormat::Html)?;
            Ok(())
        });
        editor.import_file("a", "#x").unwrap();
        assert_eq!(exported.borrow().as_deref(), Some("<h1>x</h1>\n"));
    }

    #[test]
    fn test_get_files_snapshot() {
        let editor = loaded("c");
        editor.import_file("b", "2").unwrap();
        let files = editor.get_files();
        assert_eq!(files.keys().cloned().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(files["b"].content, "2");
    }
}
