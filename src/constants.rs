//! This module contains global constants shared by the fetch and accessor modules.

/// Current personal-weather-station observations endpoint. The station id is
/// appended as the first query parameter when the URL is built.
pub const RESOURCE_CURRENT: &str = "https://api.weather.com/v2/pws/observations/current?stationId=";
/// 5-day daily forecast endpoint, keyed by geocode "{lat},{lon}".
pub const RESOURCE_FORECAST: &str = "https://api.weather.com/v3/wx/forecast/daily/5day?geocode=";

/// Number of calendar days covered by the forecast endpoint.
pub const MAX_FORECAST_DAYS: usize = 5;
/// Half-day periods per forecast: day and night for each calendar day.
pub const MAX_FORECAST_PERIODS: usize = MAX_FORECAST_DAYS * 2;

/// Minimum time between update cycles; calls arriving earlier reuse the
/// cached snapshot.
pub const MIN_TIME_BETWEEN_UPDATES_SECS: u64 = 5 * 60;

/// Per-request timeout for the two API calls in a cycle.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LANG: &str = "en-US";
pub const DEFAULT_TRANSLATIONS_DIR: &str = "translations";

/// Language tags accepted by the TWC forecast API. Translation of narrative
/// phrases happens provider-side; a valid tag must still be sent on the URL.
pub const LANG_CODES: &[&str] = &[
    "am-ET", "ar-AE", "az-AZ", "bg-BG", "bn-BD", "bn-IN", "bs-BA", "ca-ES", "cs-CZ", "da-DK",
    "de-DE", "el-GR", "en-GB", "en-IN", "en-US", "es-AR", "es-ES", "es-LA", "es-MX", "es-UN",
    "es-US", "et-EE", "fa-IR", "fi-FI", "fr-CA", "fr-FR", "gu-IN", "he-IL", "hi-IN", "hr-HR",
    "hu-HU", "in-ID", "is-IS", "it-IT", "iw-IL", "ja-JP", "jv-ID", "ka-GE", "kk-KZ", "km-KH",
    "kn-IN", "ko-KR", "lo-LA", "lt-LT", "lv-LV", "mk-MK", "mn-MN", "mr-IN", "ms-MY", "my-MM",
    "ne-IN", "ne-NP", "nl-NL", "no-NO", "om-ET", "pa-IN", "pa-PK", "pl-PL", "pt-BR", "pt-PT",
    "ro-RO", "ru-RU", "si-LK", "sk-SK", "sl-SI", "sq-AL", "sr-BA", "sr-ME", "sr-RS", "sv-SE",
    "sw-KE", "ta-IN", "ta-LK", "te-IN", "ti-ER", "ti-ET", "tg-TJ", "th-TH", "tk-TM", "tl-PH",
    "tr-TR", "uk-UA", "ur-PK", "uz-UZ", "vi-VN", "zh-CN", "zh-HK", "zh-TW",
];
