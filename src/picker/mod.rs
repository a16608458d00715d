//! The location picker: selection state, map capability and the workflow
//! that drives them.

pub mod map;
pub mod state;
pub mod workflow;

pub use map::{HeadlessMap, MapSurface, TileSource};
pub use state::{Phase, ResolveTicket, SelectionState};
pub use workflow::{
    CommitCallback, DisplayStyle, LocationPicker, PickerOptions, PickerServices, PickerSettings, PickerView,
};
