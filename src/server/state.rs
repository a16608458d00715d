use crate::host::NoteStore;
use crate::location::ReverseGeocoder;
use std::sync::{Arc, Mutex};

pub struct AppState {
    pub store: Mutex<NoteStore>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    /// Used when a request names no locale.
    pub locale: String,
}
