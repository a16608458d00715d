//! Locale-aware display names built from structured address fields.

use super::types::{AddressComponents, Coordinate};
use crate::i18n;

/// Locales whose addresses run largest-to-smallest without commas.
fn is_cjk(locale: &str) -> bool {
    locale.starts_with("zh") || locale.starts_with("ja") || locale.starts_with("ko")
}

/// `Accept-Language` value: caller locale first, English as fallback.
pub fn accept_language(locale: &str) -> String {
    let primary = if locale.is_empty() { "en" } else { locale };
    format!("{},en-US;q=0.8,en;q=0.5", primary)
}

fn format_road(road: &str, house_number: Option<&str>, locale: &str) -> String {
    match house_number {
        Some(n) if locale.starts_with("zh") => format!("{}{}号", road, n),
        Some(n) if locale.starts_with("ja") || locale.starts_with("ko") => format!("{}{}", road, n),
        Some(n) => format!("{} {}", n, road),
        None => road.to_string(),
    }
}

/// Assemble a display name from address parts.
///
/// Region, city (unless equal to region), district (unless equal to city),
/// then the road with its house number in locale order. Returns `None` if
/// no part is present.
pub fn format_address(addr: &AddressComponents, locale: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    if let Some(province) = &addr.province {
        parts.push(province.clone());
    }
    if let Some(city) = &addr.city {
        if addr.province.as_ref() != Some(city) {
            parts.push(city.clone());
        }
    }
    if let Some(district) = &addr.district {
        if addr.city.as_ref() != Some(district) {
            parts.push(district.clone());
        }
    }
    if let Some(road) = &addr.road {
        parts.push(format_road(road, addr.house_number.as_deref(), locale));
    }

    if parts.is_empty() {
        return None;
    }
    let separator = if is_cjk(locale) { " " } else { ", " };
    Some(parts.join(separator))
}

/// First comma-delimited segment of a provider display name.
pub fn first_segment(display_name: &str) -> String {
    display_name.split(',').next().unwrap_or("").trim().to_string()
}

/// Name used when nothing better is known: `coordinate (lat, lng)`.
pub fn coordinate_name(coordinate: Coordinate, locale: &str) -> String {
    let (lat, lng) = coordinate.rounded();
    i18n::t(locale, "map.locationPoint", &[("lat", &lat), ("lng", &lng)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(
        province: Option<&str>,
        city: Option<&str>,
        district: Option<&str>,
        road: Option<&str>,
        house_number: Option<&str>,
    ) -> AddressComponents {
        AddressComponents {
            province: province.map(String::from),
            city: city.map(String::from),
            district: district.map(String::from),
            road: road.map(String::from),
            house_number: house_number.map(String::from),
        }
    }

    #[test]
    fn test_western_house_number() {
        let a = addr(None, None, None, Some("Main St"), Some("12"));
        assert_eq!(format_address(&a, "en").unwrap(), "12 Main St");
        assert_eq!(format_address(&a, "fr-FR").unwrap(), "12 Main St");
    }

    #[test]
    fn test_chinese_house_number() {
        let a = addr(None, None, None, Some("Main St"), Some("12"));
        assert_eq!(format_address(&a, "zh").unwrap(), "Main St12号");
        assert_eq!(format_address(&a, "zh-CN").unwrap(), "Main St12号");
    }

    #[test]
    fn test_japanese_korean_house_number() {
        let a = addr(None, None, None, Some("Ginza"), Some("4"));
        assert_eq!(format_address(&a, "ja").unwrap(), "Ginza4");
        assert_eq!(format_address(&a, "ko-KR").unwrap(), "Ginza4");
    }

    #[test]
    fn test_road_without_number() {
        let a = addr(None, Some("Berlin"), None, Some("Unter den Linden"), None);
        assert_eq!(format_address(&a, "de").unwrap(), "Berlin, Unter den Linden");
    }

    #[test]
    fn test_join_separator() {
        let a = addr(Some("Beijing"), None, Some("Chaoyang"), None, None);
        assert_eq!(format_address(&a, "zh").unwrap(), "Beijing Chaoyang");
        assert_eq!(format_address(&a, "en").unwrap(), "Beijing, Chaoyang");
    }

    #[test]
    fn test_duplicates_skipped() {
        // Municipalities report the same name as state and city.
        let a = addr(Some("Beijing"), Some("Beijing"), Some("Dongcheng"), None, None);
        assert_eq!(format_address(&a, "en").unwrap(), "Beijing, Dongcheng");

        let b = addr(None, Some("Oslo"), Some("Oslo"), None, None);
        assert_eq!(format_address(&b, "en").unwrap(), "Oslo");
    }

    #[test]
    fn test_district_compared_to_city_not_region() {
        let a = addr(Some("Hesse"), None, Some("Hesse"), None, None);
        assert_eq!(format_address(&a, "en").unwrap(), "Hesse, Hesse");
    }

    #[test]
    fn test_empty_parts() {
        assert!(format_address(&AddressComponents::default(), "en").is_none());
        let only_number = addr(None, None, None, None, Some("7"));
        assert!(format_address(&only_number, "en").is_none());
    }

    #[test]
    fn test_idempotent() {
        let a = addr(Some("Tokyo"), Some("Chuo"), None, Some("Ginza"), Some("4"));
        let first = format_address(&a, "ja");
        assert_eq!(first, format_address(&a, "ja"));
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("Tiananmen, Dongcheng, Beijing, China"), "Tiananmen");
        assert_eq!(first_segment("Nowhere"), "Nowhere");
        assert_eq!(first_segment(""), "");
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(accept_language("zh-CN"), "zh-CN,en-US;q=0.8,en;q=0.5");
        assert_eq!(accept_language(""), "en,en-US;q=0.8,en;q=0.5");
    }

    #[test]
    fn test_coordinate_name() {
        let c = Coordinate::new(39.90423, 116.40739).unwrap();
        assert_eq!(coordinate_name(c, "en"), "coordinate (39.9042, 116.4074)");
        assert_eq!(coordinate_name(c, "zh"), "坐标 (39.9042, 116.4074)");
    }
}
