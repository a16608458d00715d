//! Read-only location footers.

use super::Note;
use crate::location::PlaceInfo;

const PIN: &str = "\u{1F4CD}";

/// Editor footer text for a saved place. Nothing without a name.
pub fn location_footer(place: Option<&PlaceInfo>) -> Option<String> {
    let place = place?;
    if place.name.is_empty() {
        return None;
    }
    Some(format!("{} {}", PIN, place.name))
}

/// Card footer text from the note's own metadata.
pub fn card_footer(note: &Note) -> Option<String> {
    location_footer(PlaceInfo::from_metadata(&note.metadata).as_ref())
}
