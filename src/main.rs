use clap::{Parser, Subcommand};
use location_picker::config::Config;
use location_picker::host::{Host, LocationPlugin, MemoryHost, NoteStore};
use location_picker::location::{
    resolve_or_fallback, Coordinate, FixedGeolocator, Geolocator, IpGeolocator, NominatimGeocoder, ReverseGeocoder,
};
use location_picker::picker::{HeadlessMap, LocationPicker, PickerOptions, PickerServices, PickerSettings, TileSource};
use std::sync::Arc;

/// locpick: pick a location for a note and name it.
///
/// Examples:
///   locpick pick
///   locpick pick --lat 59.3293 --lon 18.0686 --note journal-42
///   locpick reverse --lat 39.9042 --lon 116.4074 --locale zh-CN
///   locpick show journal-42
///   locpick serve --port 3000
#[derive(Parser)]
#[command(name = "locpick", version, about, long_about = None)]
struct Cli {
    /// UI / address locale (e.g. en, zh-CN). Defaults to config, then $LANG.
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Acquire a position, resolve its name and commit it.
    Pick {
        /// Latitude (-90 to 90). Skips geolocation.
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude (-180 to 180).
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Note to attach the location to.
        #[arg(long)]
        note: Option<String>,

        /// No IP geolocation; use the configured default coordinate.
        #[arg(long)]
        offline: bool,

        /// Print the committed place as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Reverse-geocode a coordinate.
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Show the location saved on a note.
    Show { note: String },
    /// Remove the location from a note.
    Clear { note: String },
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn parse_coordinate(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap_or_else(|e| fail(e))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("{}; using defaults", e);
        Config::default()
    });
    let locale = cli.locale.clone().unwrap_or_else(|| config.locale());
    let geocoder: Arc<dyn ReverseGeocoder> = Arc::new(NominatimGeocoder::from_config(&config));

    match cli.command {
        Command::Pick {
            lat,
            lon,
            note,
            offline,
            json,
        } => {
            let geolocator: Option<Arc<dyn Geolocator>> = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Arc::new(FixedGeolocator(parse_coordinate(lat, lon)))),
                _ if offline => None,
                _ => Some(Arc::new(IpGeolocator::from_config(&config))),
            };
            run_pick(&config, locale, geolocator, geocoder, note, json).await;
        }
        Command::Reverse { lat, lon } => {
            let coordinate = parse_coordinate(lat, lon);
            let name = tokio::task::spawn_blocking(move || resolve_or_fallback(geocoder.as_ref(), coordinate, &locale))
                .await
                .unwrap_or_else(|e| fail(e));
            println!("{}", name);
        }
        Command::Show { note } => {
            let store = NoteStore::load_from(config.store_path());
            match store.location(&note) {
                Some(place) => {
                    eprintln!("  \u{1F4CD} {}  ({:.4}, {:.4})", place.name, place.lat, place.lng);
                    println!("{}", serde_json::to_string_pretty(&place).unwrap_or_else(|e| fail(e)));
                }
                None => fail(format!("Note '{}' has no location", note)),
            }
        }
        Command::Clear { note } => {
            let mut store = NoteStore::load_from(config.store_path());
            store.clear_location(&note).unwrap_or_else(|e| fail(e));
            eprintln!("  Location removed from '{}'", note);
        }
        Command::Serve { host, port } => {
            let store = NoteStore::load_from(config.store_path());
            let router = location_picker::server::build_router(store, geocoder, locale);
            if let Err(e) = location_picker::server::start(router, &host, port).await {
                fail(format!("Cannot serve on {}:{}: {}", host, port, e));
            }
        }
    }
}

async fn run_pick(
    config: &Config,
    locale: String,
    geolocator: Option<Arc<dyn Geolocator>>,
    geocoder: Arc<dyn ReverseGeocoder>,
    note: Option<String>,
    json: bool,
) {
    let store = match note {
        Some(_) => NoteStore::load_from(config.store_path()),
        None => NoteStore::in_memory(),
    };
    let host = Arc::new(MemoryHost::with_store(locale, store, note.clone()));
    let services = PickerServices {
        geolocator,
        geocoder,
        settings: PickerSettings::from_config(config),
    };

    let plugin = LocationPlugin::new(host.clone(), services.clone());
    plugin.init();

    let map = HeadlessMap::new(TileSource::new(config.tile_url.clone()));
    let mut picker: LocationPicker<HeadlessMap> = match &note {
        Some(_) => plugin.open_toolbar_picker(map.clone()),
        None => {
            let mut picker = LocationPicker::new(host.clone(), map.clone(), services, PickerOptions::default());
            picker.mount();
            picker
        }
    };
    eprintln!("  {}", host.translate("map.loading", &[]));
    picker.settle().await;

    let Some(place) = picker.commit() else {
        fail(host.translate("map.cannotGetLocation", &[]));
    };
    let preview = map.preview_url();
    picker.unmount();

    eprintln!("  \u{1F4CD} {}", place.name);
    eprintln!("  \u{1F4D0} {:.4}, {:.4}", place.lat, place.lng);
    if let Some(url) = preview {
        eprintln!("  \u{1F5FA}  {}", url);
    }
    if let Some(note) = &note {
        eprintln!("  {} \u{2192} {}", host.translate("map.saveLocation", &[]), note);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&place).unwrap_or_else(|e| fail(e)));
    }
}
