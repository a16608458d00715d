//! Built-in message catalog (English and Chinese).
//!
//! Lookup picks the bundle by language prefix (`zh-CN` → `zh`), falls back
//! to English, then to the key itself. `{{name}}` placeholders are
//! substituted from the argument list.

use std::collections::HashMap;
use std::sync::OnceLock;

const EN: &[(&str, &str)] = &[
    ("location", "Location"),
    ("map.browserNotSupport", "Geolocation is not supported on this device"),
    ("map.cannotGetLocation", "Unable to get location information"),
    ("map.locationPoint", "coordinate ({{lat}}, {{lng}})"),
    ("map.unnamed", "Unnamed location"),
    ("map.saveLocation", "Save location"),
    ("map.loading", "Loading map..."),
    ("map.gettingLocation", "Getting location..."),
    ("map.clear", "Clear"),
    ("map.confirm", "Confirm"),
];

const ZH: &[(&str, &str)] = &[
    ("location", "位置"),
    ("map.browserNotSupport", "当前设备不支持地理定位"),
    ("map.cannotGetLocation", "无法获取位置信息"),
    ("map.locationPoint", "坐标 ({{lat}}, {{lng}})"),
    ("map.unnamed", "未命名地点"),
    ("map.saveLocation", "保存位置"),
    ("map.loading", "地图加载中..."),
    ("map.gettingLocation", "正在获取位置..."),
    ("map.clear", "清除"),
    ("map.confirm", "确认"),
];

pub struct Catalog {
    bundles: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Catalog {
    /// The shared built-in catalog.
    pub fn builtin() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let mut bundles = HashMap::new();
            bundles.insert("en", EN.iter().copied().collect());
            bundles.insert("zh", ZH.iter().copied().collect());
            Catalog { bundles }
        })
    }

    pub fn translate(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        let template = self
            .bundle_for(locale)
            .and_then(|b| b.get(key))
            .or_else(|| self.bundles.get("en").and_then(|b| b.get(key)))
            .copied()
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{{{}}}}}", name), value)
        })
    }

    fn bundle_for(&self, locale: &str) -> Option<&HashMap<&'static str, &'static str>> {
        let lang = language_of(locale);
        self.bundles.get(lang.as_str())
    }
}

/// Primary language subtag, lowercased: `zh-CN` → `zh`, `en_US` → `en`.
pub fn language_of(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Shorthand for a lookup in the built-in catalog.
pub fn t(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    Catalog::builtin().translate(locale, key, args)
}
