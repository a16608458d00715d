//! Host application capabilities the picker depends on.
//!
//! The note application is reached only through [`Host`]: extension slots
//! (toolbar, editor footer, card footer), dialogs, note metadata and a
//! one-shot event subscription. Anything implementing it can drive the
//! picker; [`memory::MemoryHost`] is the in-process implementation.

pub mod memory;
pub mod plugin;
pub mod render;
pub mod store;

use crate::i18n::Catalog;
use crate::location::PlaceInfo;
use serde_json::{Map, Value};
use std::sync::Arc;

pub use memory::MemoryHost;
pub use plugin::LocationPlugin;
pub use store::NoteStore;

pub type Metadata = Map<String, Value>;

/// A note as seen by card renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub id: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// A note finished saving.
    UpsertNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Top,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarEntry {
    pub name: String,
    pub icon: String,
    pub placement: Placement,
    pub tooltip: String,
}

/// Renders the editor footer; `None` renders nothing.
pub type EditorFooter = Arc<dyn Fn() -> Option<String> + Send + Sync>;
/// Renders a note card footer.
pub type CardFooter = Arc<dyn Fn(&Note) -> Option<String> + Send + Sync>;
pub type EventHandler = Box<dyn FnOnce() + Send>;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("metadata write rejected: {0}")]
    Metadata(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub trait Host: Send + Sync {
    /// UI locale, e.g. `zh-CN`.
    fn locale(&self) -> String;

    fn translate(&self, key: &str, args: &[(&str, &str)]) -> String {
        Catalog::builtin().translate(&self.locale(), key, args)
    }

    fn add_toolbar_icon(&self, entry: ToolbarEntry);
    /// Install (or replace) the editor footer slot called `name`.
    fn add_editor_footer(&self, name: &str, footer: EditorFooter);
    fn add_card_footer(&self, name: &str, footer: CardFooter);
    fn close_toolbar_content(&self, name: &str);

    /// Metadata attached to the note currently being edited.
    fn set_editor_metadata(&self, place: &PlaceInfo) -> Result<(), HostError>;

    /// Run `handler` the next time `event` fires, then forget it.
    fn once(&self, event: HostEvent, handler: EventHandler);

    fn show_dialog(&self, title: &str);
    fn close_dialog(&self);

    fn note_metadata(&self, note_id: &str) -> Option<Metadata>;
    fn upsert_note_metadata(&self, note_id: &str, metadata: Metadata) -> Result<(), HostError>;
}
