/*
 *  conditions.rs
 *
 *  wupws - backyard weather, worth the wait
 *	(c) 2020-26 Stuart Hunter
 *
 *	TODO:
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use std::fmt::{self, Display};

use log::warn;

/// Abstract weather condition the provider's icon codes collapse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCondition {
    ClearNight,
    Cloudy,
    Exceptional,
    Fog,
    Hail,
    Lightning,
    LightningRainy,
    PartlyCloudy,
    Pouring,
    Rainy,
    Snowy,
    SnowyRainy,
    Sunny,
    Windy,
    WindyVariant,
}

impl WeatherCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::ClearNight => "clear-night",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Exceptional => "exceptional",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Hail => "hail",
            WeatherCondition::Lightning => "lightning",
            WeatherCondition::LightningRainy => "lightning-rainy",
            WeatherCondition::PartlyCloudy => "partlycloudy",
            WeatherCondition::Pouring => "pouring",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Snowy => "snowy",
            WeatherCondition::SnowyRainy => "snowy-rainy",
            WeatherCondition::Sunny => "sunny",
            WeatherCondition::Windy => "windy",
            WeatherCondition::WindyVariant => "windy-variant",
        }
    }
}

impl Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TWC icon codes (0-47) per condition. Icon map supporting document
/// TWC_Icon_Map.ods. Code 44 is Not Available (N/A) and maps to nothing.
pub const ICON_CONDITION_MAP: &[(WeatherCondition, &[i64])] = &[
    (WeatherCondition::ClearNight, &[31, 33]),
    (WeatherCondition::Cloudy, &[26, 27, 28]),
    (WeatherCondition::Exceptional, &[0, 1, 2, 19, 21, 22, 36, 43]),
    (WeatherCondition::Fog, &[20]),
    (WeatherCondition::Hail, &[17]),
    (WeatherCondition::Lightning, &[]),
    (WeatherCondition::LightningRainy, &[3, 4, 37, 38, 47]),
    (WeatherCondition::PartlyCloudy, &[29, 30]),
    (WeatherCondition::Pouring, &[40]),
    (WeatherCondition::Rainy, &[9, 11, 12, 39, 45]),
    (WeatherCondition::Snowy, &[13, 14, 15, 16, 41, 42, 46]),
    (WeatherCondition::SnowyRainy, &[5, 6, 7, 8, 10, 18, 25, 35]),
    (WeatherCondition::Sunny, &[32, 34]),
    (WeatherCondition::Windy, &[23, 24]),
    (WeatherCondition::WindyVariant, &[]),
];

/// Map a provider icon code to a condition. Unknown codes are expected as the
/// provider adds icons; they warn and yield None so consumers can render
/// "unknown" instead of failing.
pub fn icon_code_to_condition(icon_code: i64) -> Option<WeatherCondition> {
    for (condition, icon_codes) in ICON_CONDITION_MAP {
        if icon_codes.contains(&icon_code) {
            return Some(*condition);
        }
    }
    warn!("Unmapped iconCode from TWC Api. (44 is Not Available (N/A)) \"{icon_code}\".");
    None
}

/// Qualifier substrings the provider prefixes onto short phrases. Ordered
/// longest-first so stripping one never leaves a corrupted remnant of
/// another.
const PHRASE_MODIFIERS: &[&str] = &["Early ", "Late ", "Sct ", "Iso ", "Few ", "AM ", "PM "];

/// Legacy phrase table for API variants that surface wxPhraseShort text
/// instead of icon codes. Deprecated: prefer icon_code_to_condition.
const PHRASE_CONDITION_MAP: &[(WeatherCondition, &[&str])] = &[
    (WeatherCondition::ClearNight, &["Clear", "M Clear", "Mostly Clear"]),
    (WeatherCondition::Cloudy, &["Cloudy", "M Cloudy", "Mostly Cloudy", "Overcast"]),
    (WeatherCondition::Exceptional, &["Tornado", "Hurricane", "Tropical Storm"]),
    (WeatherCondition::Fog, &["Fog", "Haze", "Mist", "Smoke"]),
    (WeatherCondition::Hail, &["Hail"]),
    (WeatherCondition::Lightning, &["Dry Thunder"]),
    (
        WeatherCondition::LightningRainy,
        &["T-Storms", "Thunderstorms", "Thunderstorm", "T-Showers"],
    ),
    (WeatherCondition::PartlyCloudy, &["P Cloudy", "Partly Cloudy"]),
    (WeatherCondition::Pouring, &["Heavy Rain"]),
    (
        WeatherCondition::Rainy,
        &["Showers", "Shower", "Rain", "Light Rain", "Drizzle"],
    ),
    (
        WeatherCondition::Snowy,
        &["Snow", "Light Snow", "Heavy Snow", "Snow Showers", "Flurries"],
    ),
    (
        WeatherCondition::SnowyRainy,
        &["Rain/Snow", "Wintry Mix", "Freezing Rain", "Freezing Drizzle", "Sleet", "Rain/Sleet", "Snow/Sleet"],
    ),
    (WeatherCondition::Sunny, &["Sunny", "M Sunny", "Mostly Sunny", "Fair"]),
    (WeatherCondition::Windy, &["Windy", "Breezy"]),
    (WeatherCondition::WindyVariant, &[]),
];

/// Map a short forecast phrase to a condition after stripping qualifier
/// modifiers ("AM Showers" -> "Showers"). Unmatched phrases warn and yield
/// None, matching the icon-code behavior.
#[allow(dead_code)]
pub fn phrase_to_condition(phrase: &str) -> Option<WeatherCondition> {
    let mut stripped = phrase.to_string();
    for modifier in PHRASE_MODIFIERS {
        stripped = stripped.replace(modifier, "");
    }
    let stripped = stripped.trim();
    if stripped.is_empty() {
        warn!("Empty wx phrase from TWC Api after stripping \"{phrase}\".");
        return None;
    }
    for (condition, phrases) in PHRASE_CONDITION_MAP {
        if phrases.contains(&stripped) {
            return Some(*condition);
        }
    }
    warn!("Unmapped wx phrase from TWC Api \"{phrase}\".");
    None
}
