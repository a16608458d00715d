//! Plugin wiring: what gets registered with the host and where a committed
//! place ends up when no callback is injected.

use super::render::{card_footer, location_footer};
use super::{Host, HostEvent, Placement, ToolbarEntry};
use crate::location::PlaceInfo;
use crate::picker::map::MapSurface;
use crate::picker::workflow::{DisplayStyle, LocationPicker, PickerOptions, PickerServices};
use std::sync::Arc;

/// Name shared by the toolbar entry and both footer slots.
pub const SLOT: &str = "location";
const ICON: &str = "mynaui:location";

pub struct LocationPlugin {
    host: Arc<dyn Host>,
    services: PickerServices,
}

impl LocationPlugin {
    pub fn new(host: Arc<dyn Host>, services: PickerServices) -> Self {
        Self { host, services }
    }

    /// Register the toolbar entry and the card footer.
    pub fn init(&self) {
        self.host.add_toolbar_icon(ToolbarEntry {
            name: SLOT.to_string(),
            icon: ICON.to_string(),
            placement: Placement::Top,
            tooltip: self.host.translate("location", &[]),
        });
        self.host.add_card_footer(SLOT, Arc::new(card_footer));
        log::debug!("Location plugin registered");
    }

    /// The picker shown from the toolbar; commits go to the editor metadata.
    pub fn open_toolbar_picker<M: MapSurface>(&self, map: M) -> LocationPicker<M> {
        let mut picker = LocationPicker::new(self.host.clone(), map, self.services.clone(), PickerOptions::default());
        picker.mount();
        picker
    }

    /// The picker shown when a card's location is clicked; commits rewrite
    /// that note's metadata and close the dialog.
    pub fn open_card_dialog<M: MapSurface>(&self, note_id: &str, map: M) -> LocationPicker<M> {
        self.host.show_dialog(&self.host.translate("location", &[]));

        let host = self.host.clone();
        let note_id = note_id.to_string();
        let options = PickerOptions {
            on_commit: Some(Box::new(move |place| commit_to_note(&host, &note_id, place))),
            style: DisplayStyle::dialog(),
        };
        let mut picker = LocationPicker::new(self.host.clone(), map, self.services.clone(), options);
        picker.mount();
        picker
    }
}

fn install_editor_footer(host: &dyn Host, place: Option<PlaceInfo>) {
    host.add_editor_footer(SLOT, Arc::new(move || location_footer(place.as_ref())));
}

/// Default commit: editor metadata plus a footer that resets once the note saves.
pub fn commit_to_editor(host: &Arc<dyn Host>, place: &PlaceInfo) {
    log::info!("{}: {} ({}, {})", host.translate("map.saveLocation", &[]), place.name, place.lat, place.lng);
    host.close_toolbar_content(SLOT);
    if let Err(e) = host.set_editor_metadata(place) {
        log::error!("Failed to write location metadata: {}", e);
    }

    install_editor_footer(host.as_ref(), Some(place.clone()));

    let after_save = host.clone();
    host.once(
        HostEvent::UpsertNote,
        Box::new(move || install_editor_footer(after_save.as_ref(), None)),
    );
}

/// Default clear: empty footer, close the toolbar panel.
pub fn clear_editor(host: &Arc<dyn Host>) {
    install_editor_footer(host.as_ref(), None);
    host.close_toolbar_content(SLOT);
}

/// Write `place` (or the empty marker) into a note's metadata and save it.
pub fn commit_to_note(host: &Arc<dyn Host>, note_id: &str, place: Option<PlaceInfo>) {
    log::info!("Location updated for note {}: {:?}", note_id, place);
    let mut metadata = host.note_metadata(note_id).unwrap_or_default();
    place.unwrap_or_else(PlaceInfo::empty).write_into(&mut metadata);
    if let Err(e) = host.upsert_note_metadata(note_id, metadata) {
        log::error!("Failed to save location for note {}: {}", note_id, e);
    }
    host.close_dialog();
}
