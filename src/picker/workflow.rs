//! The location picker workflow.
//!
//! One picker per rendered widget. Geolocation, geocoding and map clicks all
//! report back through a single event channel; [`LocationPicker::process_next`]
//! applies them one at a time, so state is only touched from the owner's task.
//! Name resolutions carry a [`ResolveTicket`] and are dropped when superseded.
//!
//! `mount` and `select` spawn tokio tasks and must run inside a runtime.

use super::map::{MapSurface, DEFAULT_ZOOM};
use super::state::{Phase, ResolveTicket, SelectionState};
use crate::config::Config;
use crate::host::{plugin, Host};
use crate::location::{
    acquire_current_coordinate, resolve_or_fallback, Coordinate, Geolocator, LocationError, PlaceInfo,
    ReverseGeocoder, DEFAULT_COORDINATE, GEOLOCATION_TIMEOUT,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Receives the committed place, or `None` when the selection is cleared.
pub type CommitCallback = Box<dyn FnMut(Option<PlaceInfo>) + Send>;

#[derive(Debug, Clone, Copy)]
pub struct PickerSettings {
    pub geolocation_timeout: Duration,
    pub default_coordinate: Coordinate,
    pub zoom: u8,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            geolocation_timeout: GEOLOCATION_TIMEOUT,
            default_coordinate: DEFAULT_COORDINATE,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl PickerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            geolocation_timeout: Duration::from_millis(config.geolocation_timeout_ms),
            default_coordinate: config.default_coordinate(),
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// External services a picker needs. Cheap to clone.
#[derive(Clone)]
pub struct PickerServices {
    /// `None` when the platform cannot geolocate.
    pub geolocator: Option<Arc<dyn Geolocator>>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub settings: PickerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayStyle {
    pub width: String,
    pub height: String,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            width: "300px".into(),
            height: "250px".into(),
        }
    }
}

impl DisplayStyle {
    /// Full-width layout used inside dialogs.
    pub fn dialog() -> Self {
        Self {
            width: "100%".into(),
            height: "400px".into(),
        }
    }
}

#[derive(Default)]
pub struct PickerOptions {
    /// When set, commit and clear go here instead of the editor metadata.
    pub on_commit: Option<CommitCallback>,
    pub style: DisplayStyle,
}

/// What the widget would show right now.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerView {
    pub loading: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub name: String,
    pub resolving_hint: Option<String>,
    pub clear_label: String,
    pub confirm_label: String,
    pub style: DisplayStyle,
}

enum PickerEvent {
    Located(Result<Coordinate, LocationError>),
    Resolved { ticket: ResolveTicket, name: String },
    Clicked(Coordinate),
}

pub struct LocationPicker<M: MapSurface> {
    host: Arc<dyn Host>,
    map: M,
    services: PickerServices,
    state: SelectionState,
    on_commit: Option<CommitCallback>,
    style: DisplayStyle,
    locale: String,
    events_tx: mpsc::UnboundedSender<PickerEvent>,
    events_rx: mpsc::UnboundedReceiver<PickerEvent>,
    disposed: bool,
}

impl<M: MapSurface> LocationPicker<M> {
    pub fn new(host: Arc<dyn Host>, map: M, services: PickerServices, options: PickerOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let locale = host.locale();
        Self {
            host,
            map,
            services,
            state: SelectionState::new(),
            on_commit: options.on_commit,
            style: options.style,
            locale,
            events_tx,
            events_rx,
            disposed: false,
        }
    }

    /// Centre the map on the default coordinate, listen for clicks and start
    /// the single geolocation attempt. Only the first call has an effect.
    pub fn mount(&mut self) {
        if self.disposed || self.state.phase() != Phase::Uninitialized {
            return;
        }
        self.state.begin_initializing();

        let settings = self.services.settings;
        self.map.set_center(settings.default_coordinate, settings.zoom);

        let tx = self.events_tx.clone();
        self.map.on_click(Box::new(move |coordinate| {
            let _ = tx.send(PickerEvent::Clicked(coordinate));
        }));

        let tx = self.events_tx.clone();
        let geolocator = self.services.geolocator.clone();
        tokio::spawn(async move {
            let result = acquire_current_coordinate(geolocator, settings.geolocation_timeout).await;
            let _ = tx.send(PickerEvent::Located(result));
        });
    }

    /// Select `coordinate`, move the marker and start resolving its name.
    pub fn select(&mut self, coordinate: Coordinate) {
        if self.disposed {
            return;
        }
        let ticket = self.state.select(coordinate);
        self.map.set_marker(Some(coordinate));
        log::info!("Selected location: {}", coordinate);

        let geocoder = self.services.geocoder.clone();
        let locale = self.locale.clone();
        let tx = self.events_tx.clone();
        tokio::task::spawn_blocking(move || {
            let name = resolve_or_fallback(geocoder.as_ref(), ticket.coordinate(), &locale);
            let _ = tx.send(PickerEvent::Resolved { ticket, name });
        });
    }

    /// Drop the selection and the marker, then notify the embedder.
    pub fn clear(&mut self) {
        if self.disposed {
            return;
        }
        self.state.clear();
        self.map.set_marker(None);
        match self.on_commit.as_mut() {
            Some(callback) => callback(None),
            None => plugin::clear_editor(&self.host),
        }
    }

    /// Hand the current place to the embedder. No-op without a selection.
    pub fn commit(&mut self) -> Option<PlaceInfo> {
        if self.disposed {
            return None;
        }
        let unnamed = self.host.translate("map.unnamed", &[]);
        let place = self.state.place_info(&unnamed)?;
        match self.on_commit.as_mut() {
            Some(callback) => callback(Some(place.clone())),
            None => plugin::commit_to_editor(&self.host, &place),
        }
        Some(place)
    }

    /// Wait for one event and apply it. `false` once the picker is torn down.
    pub async fn process_next(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Apply every event already delivered, without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while !self.disposed {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    applied += 1;
                }
                Err(_) => break,
            }
        }
        applied
    }

    /// Process events until neither geolocation nor a name lookup is pending.
    pub async fn settle(&mut self) {
        while self.is_busy() {
            if !self.process_next().await {
                break;
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.disposed && (self.state.is_initializing() || self.state.is_resolving_name())
    }

    fn apply(&mut self, event: PickerEvent) {
        match event {
            PickerEvent::Located(result) => self.on_located(result),
            PickerEvent::Clicked(coordinate) => self.select(coordinate),
            PickerEvent::Resolved { ticket, name } => {
                let coordinate = ticket.coordinate();
                if self.state.complete(ticket, name) {
                    log::debug!("Resolved ({}) as '{}'", coordinate, self.state.display_name());
                } else {
                    log::debug!("Discarding superseded name for ({})", coordinate);
                }
            }
        }
    }

    fn on_located(&mut self, result: Result<Coordinate, LocationError>) {
        // A click or clear during geolocation wins over the device position.
        if self.state.phase() != Phase::Initializing {
            log::debug!("Ignoring geolocation result, selection already made");
            self.state.finish_initializing();
            return;
        }

        let coordinate = match result {
            Ok(coordinate) => {
                log::info!("Current location: {}", coordinate);
                coordinate
            }
            Err(LocationError::UnsupportedPlatform) => {
                log::warn!("{}", self.host.translate("map.browserNotSupport", &[]));
                self.services.settings.default_coordinate
            }
            Err(e) => {
                log::warn!("{}: {}", self.host.translate("map.cannotGetLocation", &[]), e);
                self.services.settings.default_coordinate
            }
        };
        self.map.set_center(coordinate, self.services.settings.zoom);
        self.select(coordinate);
        self.state.finish_initializing();
    }

    /// Release the map and neutralise every outstanding completion.
    pub fn unmount(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.state.invalidate();
        self.map.dispose();
        self.events_rx.close();
    }

    pub fn view(&self) -> PickerView {
        let t = |key: &str| self.host.translate(key, &[]);
        PickerView {
            loading: self.state.is_initializing().then(|| t("map.loading")),
            coordinate: self.state.coordinate(),
            name: self.state.display_name().to_string(),
            resolving_hint: self.state.is_resolving_name().then(|| t("map.gettingLocation")),
            clear_label: t("map.clear"),
            confirm_label: t("map.confirm"),
            style: self.style.clone(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl<M: MapSurface> Drop for LocationPicker<M> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEvent, MemoryHost, NoteStore};
    use crate::location::{FixedGeolocator, NoGeolocation};
    use crate::picker::map::HeadlessMap;
    use std::sync::Mutex;

    /// Names places by latitude; anything south of 15° answers slowly.
    struct SlowSouth;

    impl ReverseGeocoder for SlowSouth {
        fn resolve_place_name(&self, c: Coordinate, _: &str) -> Result<String, LocationError> {
            let delay = if c.latitude < 15.0 { 250 } else { 10 };
            std::thread::sleep(Duration::from_millis(delay));
            Ok(format!("place {}", c.latitude))
        }
    }

    struct Down;

    impl ReverseGeocoder for Down {
        fn resolve_place_name(&self, _: Coordinate, _: &str) -> Result<String, LocationError> {
            Err(LocationError::GeocodeUnavailable("HTTP 500".into()))
        }
    }

    struct SlowGps(Coordinate);

    impl Geolocator for SlowGps {
        fn current_position(&self, _: bool) -> Result<Coordinate, LocationError> {
            std::thread::sleep(Duration::from_millis(150));
            Ok(self.0)
        }
    }

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn services(geolocator: Option<Arc<dyn Geolocator>>, geocoder: Arc<dyn ReverseGeocoder>) -> PickerServices {
        PickerServices {
            geolocator,
            geocoder,
            settings: PickerSettings::default(),
        }
    }

    type Commits = Arc<Mutex<Vec<Option<PlaceInfo>>>>;

    fn recording() -> (PickerOptions, Commits) {
        let commits: Commits = Arc::default();
        let sink = commits.clone();
        let options = PickerOptions {
            on_commit: Some(Box::new(move |p| sink.lock().unwrap().push(p))),
            style: DisplayStyle::default(),
        };
        (options, commits)
    }

    #[tokio::test]
    async fn test_geolocation_success() {
        let host = Arc::new(MemoryHost::new("en"));
        let map = HeadlessMap::default();
        let here = c(59.3293, 18.0686);
        let mut picker = LocationPicker::new(
            host,
            map.clone(),
            services(Some(Arc::new(FixedGeolocator(here))), Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        assert!(picker.view().loading.is_some());
        picker.settle().await;

        assert_eq!(picker.state().phase(), Phase::Ready);
        assert_eq!(picker.state().coordinate(), Some(here));
        assert_eq!(picker.state().display_name(), "place 59.3293");
        assert_eq!(map.center(), Some(here));
        assert_eq!(map.marker(), Some(here));
        assert_eq!(map.zoom(), DEFAULT_ZOOM);
        assert!(picker.view().loading.is_none());
    }

    #[tokio::test]
    async fn test_geolocation_failure_uses_default() {
        let host = Arc::new(MemoryHost::new("en"));
        let map = HeadlessMap::default();
        let mut picker = LocationPicker::new(
            host,
            map.clone(),
            services(Some(Arc::new(NoGeolocation)), Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        picker.settle().await;

        assert_eq!(picker.state().coordinate(), Some(DEFAULT_COORDINATE));
        assert_eq!(picker.state().display_name(), "place 39.9042");
        assert_eq!(map.marker(), Some(DEFAULT_COORDINATE));
    }

    #[tokio::test]
    async fn test_geocode_failure_uses_coordinate_name() {
        let host = Arc::new(MemoryHost::new("en"));
        let mut picker = LocationPicker::new(
            host,
            HeadlessMap::default(),
            services(None, Arc::new(Down)),
            PickerOptions::default(),
        );

        picker.mount();
        picker.settle().await;

        assert_eq!(picker.state().phase(), Phase::Ready);
        assert_eq!(picker.state().display_name(), "coordinate (39.9042, 116.4074)");
    }

    #[tokio::test]
    async fn test_latest_wins_over_slower_answer() {
        let host = Arc::new(MemoryHost::new("en"));
        let map = HeadlessMap::default();
        let slow = c(10.0, 10.0);
        let fast = c(20.0, 20.0);
        let mut picker = LocationPicker::new(
            host,
            map.clone(),
            services(Some(Arc::new(FixedGeolocator(slow))), Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        assert!(picker.process_next().await); // located → resolving `slow`
        assert_eq!(picker.state().coordinate(), Some(slow));

        assert!(map.click(fast));
        picker.settle().await;
        assert_eq!(picker.state().display_name(), "place 20");

        // Let the superseded lookup finish and be delivered.
        tokio::time::sleep(Duration::from_millis(400)).await;
        picker.process_pending();
        assert_eq!(picker.state().display_name(), "place 20");
        assert_eq!(picker.state().coordinate(), Some(fast));
        assert_eq!(map.marker(), Some(fast));
    }

    #[tokio::test]
    async fn test_click_during_geolocation_wins() {
        let host = Arc::new(MemoryHost::new("en"));
        let map = HeadlessMap::default();
        let clicked = c(30.0, 30.0);
        let mut picker = LocationPicker::new(
            host,
            map.clone(),
            services(Some(Arc::new(SlowGps(c(50.0, 50.0)))), Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        map.click(clicked);
        picker.settle().await;

        tokio::time::sleep(Duration::from_millis(300)).await;
        picker.process_pending();
        assert_eq!(picker.state().coordinate(), Some(clicked));
        assert_eq!(picker.state().display_name(), "place 30");
        assert!(!picker.state().is_initializing());
    }

    #[tokio::test]
    async fn test_clear_then_commit_is_noop() {
        let host = Arc::new(MemoryHost::new("en"));
        let map = HeadlessMap::default();
        let (options, commits) = recording();
        let mut picker = LocationPicker::new(host, map.clone(), services(None, Arc::new(SlowSouth)), options);

        picker.mount();
        picker.settle().await;
        picker.clear();

        assert!(picker.state().coordinate().is_none());
        assert_eq!(picker.state().display_name(), "");
        assert!(map.marker().is_none());
        assert!(picker.commit().is_none());
        assert_eq!(*commits.lock().unwrap(), vec![None]);

        assert!(map.click(c(25.0, 25.0)));
        assert!(picker.process_next().await);
        picker.settle().await;
        let place = picker.commit().unwrap();
        assert_eq!(place.name, "place 25");
        assert_eq!(commits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_commit_goes_to_callback_only() {
        let host = Arc::new(MemoryHost::new("en"));
        let (options, commits) = recording();
        let mut picker = LocationPicker::new(
            host.clone(),
            HeadlessMap::default(),
            services(None, Arc::new(SlowSouth)),
            options,
        );

        picker.mount();
        picker.settle().await;
        picker.commit();

        let commits = commits.lock().unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].as_ref().unwrap().name, "place 39.9042");
        assert!(host.editor_metadata().is_none());
        assert!(host.render_editor_footer("location").is_none());
    }

    #[tokio::test]
    async fn test_commit_while_resolving_uses_unnamed_label() {
        let host = Arc::new(MemoryHost::new("en"));
        let (options, commits) = recording();
        let mut picker = LocationPicker::new(
            host,
            HeadlessMap::default(),
            services(None, Arc::new(SlowSouth)),
            options,
        );

        picker.mount();
        picker.select(c(5.0, 5.0));
        let place = picker.commit().unwrap();
        assert_eq!(place.name, "Unnamed location");
        assert_eq!(commits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_default_commit_writes_editor_metadata() {
        let host = Arc::new(MemoryHost::with_store("en", NoteStore::in_memory(), Some("n1".into())));
        let mut picker = LocationPicker::new(
            host.clone(),
            HeadlessMap::default(),
            services(None, Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        picker.settle().await;
        let place = picker.commit().unwrap();

        assert_eq!(host.editor_metadata().unwrap(), place);
        assert_eq!(host.location("n1").unwrap(), place);
        assert_eq!(host.closed_panels(), vec!["location".to_string()]);
        assert_eq!(
            host.render_editor_footer("location"),
            Some(Some("\u{1F4CD} place 39.9042".to_string()))
        );

        assert_eq!(host.emit(HostEvent::UpsertNote), 1);
        assert_eq!(host.render_editor_footer("location"), Some(None));
    }

    #[tokio::test]
    async fn test_metadata_failure_does_not_abort_commit() {
        let host = Arc::new(MemoryHost::new("en"));
        host.set_reject_metadata(true);
        let mut picker = LocationPicker::new(
            host.clone(),
            HeadlessMap::default(),
            services(None, Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        picker.settle().await;
        assert!(picker.commit().is_some());
        assert!(host.editor_metadata().is_none());
        assert!(host.render_editor_footer("location").unwrap().is_some());
        assert_eq!(host.pending_handlers(HostEvent::UpsertNote), 1);
    }

    #[tokio::test]
    async fn test_default_clear_resets_footer() {
        let host = Arc::new(MemoryHost::new("en"));
        let mut picker = LocationPicker::new(
            host.clone(),
            HeadlessMap::default(),
            services(None, Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        picker.settle().await;
        picker.clear();

        assert_eq!(host.render_editor_footer("location"), Some(None));
        assert_eq!(host.closed_panels(), vec!["location".to_string()]);
    }

    #[tokio::test]
    async fn test_unmount_neutralises_pending_work() {
        let host = Arc::new(MemoryHost::new("en"));
        let map = HeadlessMap::default();
        let mut picker = LocationPicker::new(
            host,
            map.clone(),
            services(None, Arc::new(SlowSouth)),
            PickerOptions::default(),
        );

        picker.mount();
        picker.select(c(1.0, 1.0));
        picker.unmount();

        assert!(map.is_disposed());
        assert!(!map.click(c(2.0, 2.0)));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(picker.process_pending(), 0);
        assert!(!picker.process_next().await);
        assert_eq!(picker.state().display_name(), "");
        assert!(!picker.is_busy());
        assert!(picker.commit().is_none());
    }

    #[tokio::test]
    async fn test_view_labels_follow_locale() {
        let host = Arc::new(MemoryHost::new("zh-CN"));
        let mut picker = LocationPicker::new(
            host,
            HeadlessMap::default(),
            services(None, Arc::new(SlowSouth)),
            PickerOptions {
                on_commit: None,
                style: DisplayStyle::dialog(),
            },
        );
        picker.mount();
        picker.select(c(5.0, 5.0));

        let view = picker.view();
        assert_eq!(view.resolving_hint.as_deref(), Some("正在获取位置..."));
        assert_eq!(view.confirm_label, "确认");
        assert_eq!(view.style.width, "100%");
        assert_eq!(picker.locale(), "zh-CN");
    }
}
