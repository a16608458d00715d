//! In-process host: keeps registered slots, dialogs and pending event
//! handlers in memory and writes note metadata to a [`NoteStore`].

use super::{
    CardFooter, EditorFooter, EventHandler, Host, HostError, HostEvent, Metadata, Note, NoteStore,
    ToolbarEntry,
};
use crate::location::PlaceInfo;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MemoryHost {
    locale: String,
    /// Note currently open in the editor, if any.
    editing: Option<String>,
    store: Mutex<NoteStore>,
    editor_metadata: Mutex<Option<PlaceInfo>>,
    toolbar: Mutex<Vec<ToolbarEntry>>,
    editor_footers: Mutex<HashMap<String, EditorFooter>>,
    card_footers: Mutex<HashMap<String, CardFooter>>,
    closed_panels: Mutex<Vec<String>>,
    dialogs: Mutex<Vec<String>>,
    pending: Mutex<HashMap<HostEvent, Vec<EventHandler>>>,
    reject_metadata: AtomicBool,
}

impl MemoryHost {
    pub fn new(locale: impl Into<String>) -> Self {
        Self::with_store(locale, NoteStore::in_memory(), None)
    }

    pub fn with_store(locale: impl Into<String>, store: NoteStore, editing: Option<String>) -> Self {
        Self {
            locale: locale.into(),
            editing,
            store: Mutex::new(store),
            editor_metadata: Mutex::new(None),
            toolbar: Mutex::default(),
            editor_footers: Mutex::default(),
            card_footers: Mutex::default(),
            closed_panels: Mutex::default(),
            dialogs: Mutex::default(),
            pending: Mutex::default(),
            reject_metadata: AtomicBool::new(false),
        }
    }

    /// Fire `event`, running and dropping every handler waiting on it.
    pub fn emit(&self, event: HostEvent) -> usize {
        let handlers = lock(&self.pending).remove(&event).unwrap_or_default();
        let count = handlers.len();
        for handler in handlers {
            handler();
        }
        count
    }

    /// Make metadata writes fail, as a host would for a malformed object.
    pub fn set_reject_metadata(&self, reject: bool) {
        self.reject_metadata.store(reject, Ordering::SeqCst);
    }

    pub fn editor_metadata(&self) -> Option<PlaceInfo> {
        lock(&self.editor_metadata).clone()
    }

    /// Render the editor footer slot `name`. Outer `None`: no such slot.
    pub fn render_editor_footer(&self, name: &str) -> Option<Option<String>> {
        let footer = lock(&self.editor_footers).get(name).cloned()?;
        Some(footer())
    }

    pub fn render_card_footer(&self, name: &str, note: &Note) -> Option<Option<String>> {
        let footer = lock(&self.card_footers).get(name).cloned()?;
        Some(footer(note))
    }

    pub fn toolbar_entries(&self) -> Vec<ToolbarEntry> {
        lock(&self.toolbar).clone()
    }

    pub fn closed_panels(&self) -> Vec<String> {
        lock(&self.closed_panels).clone()
    }

    pub fn open_dialogs(&self) -> Vec<String> {
        lock(&self.dialogs).clone()
    }

    pub fn pending_handlers(&self, event: HostEvent) -> usize {
        lock(&self.pending).get(&event).map_or(0, Vec::len)
    }

    pub fn note(&self, note_id: &str) -> Note {
        Note {
            id: note_id.to_string(),
            metadata: self.note_metadata(note_id).unwrap_or_default(),
        }
    }

    pub fn location(&self, note_id: &str) -> Option<PlaceInfo> {
        lock(&self.store).location(note_id)
    }
}

impl Host for MemoryHost {
    fn locale(&self) -> String {
        self.locale.clone()
    }

    fn add_toolbar_icon(&self, entry: ToolbarEntry) {
        let mut toolbar = lock(&self.toolbar);
        toolbar.retain(|e| e.name != entry.name);
        toolbar.push(entry);
    }

    fn add_editor_footer(&self, name: &str, footer: EditorFooter) {
        lock(&self.editor_footers).insert(name.to_string(), footer);
    }

    fn add_card_footer(&self, name: &str, footer: CardFooter) {
        lock(&self.card_footers).insert(name.to_string(), footer);
    }

    fn close_toolbar_content(&self, name: &str) {
        lock(&self.closed_panels).push(name.to_string());
    }

    fn set_editor_metadata(&self, place: &PlaceInfo) -> Result<(), HostError> {
        if self.reject_metadata.load(Ordering::SeqCst) {
            return Err(HostError::Metadata("editor metadata is read-only".into()));
        }
        *lock(&self.editor_metadata) = Some(place.clone());
        if let Some(note_id) = &self.editing {
            lock(&self.store).set_location(note_id, place)?;
        }
        Ok(())
    }

    fn once(&self, event: HostEvent, handler: EventHandler) {
        lock(&self.pending).entry(event).or_default().push(handler);
    }

    fn show_dialog(&self, title: &str) {
        lock(&self.dialogs).push(title.to_string());
    }

    fn close_dialog(&self) {
        lock(&self.dialogs).pop();
    }

    fn note_metadata(&self, note_id: &str) -> Option<Metadata> {
        lock(&self.store).metadata(note_id)
    }

    fn upsert_note_metadata(&self, note_id: &str, metadata: Metadata) -> Result<(), HostError> {
        if self.reject_metadata.load(Ordering::SeqCst) {
            return Err(HostError::Metadata(format!("note '{}' metadata is read-only", note_id)));
        }
        lock(&self.store).upsert(note_id, metadata)
    }
}
