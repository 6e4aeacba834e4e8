/*
 *  snapshot.rs
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
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;

use crate::constants::{MAX_FORECAST_DAYS, MAX_FORECAST_PERIODS};
use crate::units::UnitSystem;

/// Per-unit-system observation values, nested under "metric" or "imperial"
/// in the current-observations response. Every field is optional: a station
/// with a dead sensor reports null, not absence of the key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationUnits {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub heat_index: Option<f64>,
    #[serde(default)]
    pub dewpt: Option<f64>,
    #[serde(default)]
    pub wind_chill: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub precip_rate: Option<f64>,
    #[serde(default)]
    pub precip_total: Option<f64>,
    #[serde(default)]
    pub elev: Option<f64>,
}

/// One station entry from the current-observations response.
#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(rename = "stationID", default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub obs_time_utc: Option<String>,
    #[serde(default)]
    pub obs_time_local: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub software_type: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub solar_radiation: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub epoch: Option<i64>,
    #[serde(default)]
    pub uv: Option<f64>,
    #[serde(default)]
    pub winddir: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub qc_status: Option<i64>,
    #[serde(default)]
    pub metric: Option<ObservationUnits>,
    #[serde(default)]
    pub imperial: Option<ObservationUnits>,
}

impl Observation {
    /// Values nested under the active unit system.
    pub fn units(&self, unit_system: UnitSystem) -> Option<&ObservationUnits> {
        match unit_system {
            UnitSystem::Metric => self.metric.as_ref(),
            UnitSystem::Imperial => self.imperial.as_ref(),
        }
    }

    /// Station-local observation time ("2022-12-05 11:28:46").
    pub fn obs_time(&self) -> Option<NaiveDateTime> {
        let raw = self.obs_time_local.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()
    }
}

/// Half-day forecast arrays, indexed by period 0-9 ordered day-then-night
/// per calendar day. The provider nulls today's slots after roughly
/// mid-afternoon local time, hence every element is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Daypart {
    #[serde(default)]
    pub cloud_cover: Vec<Option<f64>>,
    #[serde(default)]
    pub day_or_night: Vec<Option<String>>,
    #[serde(default)]
    pub daypart_name: Vec<Option<String>>,
    #[serde(default)]
    pub icon_code: Vec<Option<i64>>,
    #[serde(default)]
    pub icon_code_extend: Vec<Option<i64>>,
    #[serde(default)]
    pub narrative: Vec<Option<String>>,
    #[serde(default)]
    pub precip_chance: Vec<Option<f64>>,
    #[serde(default)]
    pub precip_type: Vec<Option<String>>,
    #[serde(default)]
    pub qpf: Vec<Option<f64>>,
    #[serde(default)]
    pub qpf_snow: Vec<Option<f64>>,
    #[serde(default)]
    pub qualifier_phrase: Vec<Option<String>>,
    #[serde(default)]
    pub relative_humidity: Vec<Option<f64>>,
    #[serde(default)]
    pub snow_range: Vec<Option<String>>,
    #[serde(default)]
    pub temperature: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_heat_index: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_wind_chill: Vec<Option<f64>>,
    #[serde(default)]
    pub thunder_category: Vec<Option<String>>,
    #[serde(default)]
    pub thunder_index: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_description: Vec<Option<String>>,
    #[serde(default)]
    pub uv_index: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_cardinal: Vec<Option<String>>,
    #[serde(default)]
    pub wind_phrase: Vec<Option<String>>,
    #[serde(default)]
    pub wind_speed: Vec<Option<f64>>,
    #[serde(default)]
    pub wx_phrase_long: Vec<Option<String>>,
    #[serde(default)]
    pub wx_phrase_short: Vec<Option<String>>,
}

/// Daily forecast arrays, indexed by day 0-4, plus the nested daypart block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    #[serde(default)]
    pub calendar_day_temperature_max: Vec<Option<f64>>,
    #[serde(default)]
    pub calendar_day_temperature_min: Vec<Option<f64>>,
    #[serde(default)]
    pub day_of_week: Vec<Option<String>>,
    #[serde(default)]
    pub expiration_time_utc: Vec<Option<i64>>,
    #[serde(default)]
    pub moon_phase: Vec<Option<String>>,
    #[serde(default)]
    pub moon_phase_code: Vec<Option<String>>,
    #[serde(default)]
    pub moon_phase_day: Vec<Option<i64>>,
    #[serde(default)]
    pub moonrise_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub moonset_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub narrative: Vec<Option<String>>,
    #[serde(default)]
    pub qpf: Vec<Option<f64>>,
    #[serde(default)]
    pub qpf_snow: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub sunset_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub temperature_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_min: Vec<Option<f64>>,
    #[serde(default)]
    pub valid_time_local: Vec<Option<String>>,
    #[serde(default)]
    pub valid_time_utc: Vec<Option<i64>>,
    #[serde(default)]
    pub daypart: Vec<Daypart>,
}

impl DailyForecast {
    /// Clamp the parallel arrays to the advertised 5-day / 10-period window.
    /// The live API pads a sixth day onto every array; accessors index by
    /// the documented lengths, so the extra tail is dropped at the boundary.
    pub fn normalize(&mut self) {
        self.calendar_day_temperature_max.truncate(MAX_FORECAST_DAYS);
        self.calendar_day_temperature_min.truncate(MAX_FORECAST_DAYS);
        self.day_of_week.truncate(MAX_FORECAST_DAYS);
        self.expiration_time_utc.truncate(MAX_FORECAST_DAYS);
        self.moon_phase.truncate(MAX_FORECAST_DAYS);
        self.moon_phase_code.truncate(MAX_FORECAST_DAYS);
        self.moon_phase_day.truncate(MAX_FORECAST_DAYS);
        self.moonrise_time_local.truncate(MAX_FORECAST_DAYS);
        self.moonset_time_local.truncate(MAX_FORECAST_DAYS);
        self.narrative.truncate(MAX_FORECAST_DAYS);
        self.qpf.truncate(MAX_FORECAST_DAYS);
        self.qpf_snow.truncate(MAX_FORECAST_DAYS);
        self.sunrise_time_local.truncate(MAX_FORECAST_DAYS);
        self.sunset_time_local.truncate(MAX_FORECAST_DAYS);
        self.temperature_max.truncate(MAX_FORECAST_DAYS);
        self.temperature_min.truncate(MAX_FORECAST_DAYS);
        self.valid_time_local.truncate(MAX_FORECAST_DAYS);
        self.valid_time_utc.truncate(MAX_FORECAST_DAYS);
        for daypart in &mut self.daypart {
            daypart.cloud_cover.truncate(MAX_FORECAST_PERIODS);
            daypart.day_or_night.truncate(MAX_FORECAST_PERIODS);
            daypart.daypart_name.truncate(MAX_FORECAST_PERIODS);
            daypart.icon_code.truncate(MAX_FORECAST_PERIODS);
            daypart.icon_code_extend.truncate(MAX_FORECAST_PERIODS);
            daypart.narrative.truncate(MAX_FORECAST_PERIODS);
            daypart.precip_chance.truncate(MAX_FORECAST_PERIODS);
            daypart.precip_type.truncate(MAX_FORECAST_PERIODS);
            daypart.qpf.truncate(MAX_FORECAST_PERIODS);
            daypart.qpf_snow.truncate(MAX_FORECAST_PERIODS);
            daypart.qualifier_phrase.truncate(MAX_FORECAST_PERIODS);
            daypart.relative_humidity.truncate(MAX_FORECAST_PERIODS);
            daypart.snow_range.truncate(MAX_FORECAST_PERIODS);
            daypart.temperature.truncate(MAX_FORECAST_PERIODS);
            daypart.temperature_heat_index.truncate(MAX_FORECAST_PERIODS);
            daypart.temperature_wind_chill.truncate(MAX_FORECAST_PERIODS);
            daypart.thunder_category.truncate(MAX_FORECAST_PERIODS);
            daypart.thunder_index.truncate(MAX_FORECAST_PERIODS);
            daypart.uv_description.truncate(MAX_FORECAST_PERIODS);
            daypart.uv_index.truncate(MAX_FORECAST_PERIODS);
            daypart.wind_direction.truncate(MAX_FORECAST_PERIODS);
            daypart.wind_direction_cardinal.truncate(MAX_FORECAST_PERIODS);
            daypart.wind_phrase.truncate(MAX_FORECAST_PERIODS);
            daypart.wind_speed.truncate(MAX_FORECAST_PERIODS);
            daypart.wx_phrase_long.truncate(MAX_FORECAST_PERIODS);
            daypart.wx_phrase_short.truncate(MAX_FORECAST_PERIODS);
        }
    }

    /// Local start of a forecast day ("2022-12-05T07:00:00-0700").
    pub fn valid_time(&self, day: usize) -> Option<DateTime<FixedOffset>> {
        let raw = self.valid_time_local.get(day)?.as_deref()?;
        DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z").ok()
    }
}

/// Current observation field names resolvable through get_condition.
/// Humidity and WindDir are unit-less; everything else lives in the nested
/// unit-system object.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionField {
    Humidity,
    WindDir,
    Temp,
    HeatIndex,
    DewPoint,
    WindChill,
    WindSpeed,
    WindGust,
    Pressure,
    PrecipRate,
    PrecipTotal,
    Elevation,
}

/// Forecast field names resolvable through get_forecast.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastField {
    // per-day aggregates; the period is halved when indexing these
    TemperatureMax,
    TemperatureMin,
    CalendarDayTemperatureMax,
    CalendarDayTemperatureMin,
    ValidTimeUtc,
    // per-daypart fields
    CloudCover,
    DayOrNight,
    DaypartName,
    IconCode,
    IconCodeExtend,
    Narrative,
    PrecipChance,
    PrecipType,
    Qpf,
    QpfSnow,
    RelativeHumidity,
    Temperature,
    TemperatureHeatIndex,
    TemperatureWindChill,
    UvDescription,
    UvIndex,
    WindDirection,
    WindDirectionCardinal,
    WindPhrase,
    WindSpeed,
    WxPhraseLong,
    WxPhraseShort,
}

/// A forecast value: numeric fields surface as Num, phrases and names as
/// Text. Epoch timestamps surface as Num seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastValue {
    Num(f64),
    Text(String),
}

impl ForecastValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ForecastValue::Num(n) => Some(*n),
            ForecastValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }

    #[allow(dead_code)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForecastValue::Num(_) => None,
            ForecastValue::Text(t) => Some(t),
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ForecastValue::Num(_) => None,
            ForecastValue::Text(t) => Some(t),
        }
    }
}

fn num_at(values: &[Option<f64>], index: usize) -> Option<ForecastValue> {
    values.get(index).copied().flatten().map(ForecastValue::Num)
}

fn int_at(values: &[Option<i64>], index: usize) -> Option<ForecastValue> {
    values
        .get(index)
        .copied()
        .flatten()
        .map(|v| ForecastValue::Num(v as f64))
}

fn text_at(values: &[Option<String>], index: usize) -> Option<ForecastValue> {
    values.get(index)?.clone().map(ForecastValue::Text)
}

/// The merged result of one polling cycle: the station observation plus,
/// when forecasting is enabled, the 5-day forecast. Replaced wholesale on
/// every successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub observation: Observation,
    pub forecast: Option<DailyForecast>,
}

impl WeatherSnapshot {
    /// Resolve a current-conditions field. Unit-less fields default to 0
    /// when the station reports null; unit-keyed fields resolve through the
    /// active unit system and stay None when the provider nulled them.
    pub fn get_condition(&self, unit_system: UnitSystem, field: ConditionField) -> Option<f64> {
        let obs = &self.observation;
        match field {
            ConditionField::Humidity => Some(obs.humidity.unwrap_or(0.0)),
            ConditionField::WindDir => Some(obs.winddir.unwrap_or(0.0)),
            _ => {
                let units = obs.units(unit_system)?;
                match field {
                    ConditionField::Temp => units.temp,
                    ConditionField::HeatIndex => units.heat_index,
                    ConditionField::DewPoint => units.dewpt,
                    ConditionField::WindChill => units.wind_chill,
                    ConditionField::WindSpeed => units.wind_speed,
                    ConditionField::WindGust => units.wind_gust,
                    ConditionField::Pressure => units.pressure,
                    ConditionField::PrecipRate => units.precip_rate,
                    ConditionField::PrecipTotal => units.precip_total,
                    ConditionField::Elevation => units.elev,
                    ConditionField::Humidity | ConditionField::WindDir => unreachable!(),
                }
            }
        }
    }

    /// Resolve a forecast field for a half-day period 0-9. The per-day
    /// aggregate fields exist per calendar day rather than per daypart, so
    /// the period is halved: periods 0,1 read day 0, periods 8,9 read day 4.
    /// Out-of-range periods and provider-nulled slots yield None; today's
    /// daypart slots expire after roughly 3pm local, so None is steady-state
    /// there, not an error.
    pub fn get_forecast(&self, field: ForecastField, period: usize) -> Option<ForecastValue> {
        let forecast = self.forecast.as_ref()?;
        let day = period / 2;
        match field {
            ForecastField::TemperatureMax => num_at(&forecast.temperature_max, day),
            ForecastField::TemperatureMin => num_at(&forecast.temperature_min, day),
            ForecastField::CalendarDayTemperatureMax => {
                num_at(&forecast.calendar_day_temperature_max, day)
            }
            ForecastField::CalendarDayTemperatureMin => {
                num_at(&forecast.calendar_day_temperature_min, day)
            }
            ForecastField::ValidTimeUtc => int_at(&forecast.valid_time_utc, day),
            _ => {
                let daypart = forecast.daypart.first()?;
                match field {
                    ForecastField::CloudCover => num_at(&daypart.cloud_cover, period),
                    ForecastField::DayOrNight => text_at(&daypart.day_or_night, period),
                    ForecastField::DaypartName => text_at(&daypart.daypart_name, period),
                    ForecastField::IconCode => int_at(&daypart.icon_code, period),
                    ForecastField::IconCodeExtend => int_at(&daypart.icon_code_extend, period),
                    ForecastField::Narrative => text_at(&daypart.narrative, period),
                    ForecastField::PrecipChance => num_at(&daypart.precip_chance, period),
                    ForecastField::PrecipType => text_at(&daypart.precip_type, period),
                    ForecastField::Qpf => num_at(&daypart.qpf, period),
                    ForecastField::QpfSnow => num_at(&daypart.qpf_snow, period),
                    ForecastField::RelativeHumidity => num_at(&daypart.relative_humidity, period),
                    ForecastField::Temperature => num_at(&daypart.temperature, period),
                    ForecastField::TemperatureHeatIndex => {
                        num_at(&daypart.temperature_heat_index, period)
                    }
                    ForecastField::TemperatureWindChill => {
                        num_at(&daypart.temperature_wind_chill, period)
                    }
                    ForecastField::UvDescription => text_at(&daypart.uv_description, period),
                    ForecastField::UvIndex => num_at(&daypart.uv_index, period),
                    ForecastField::WindDirection => num_at(&daypart.wind_direction, period),
                    ForecastField::WindDirectionCardinal => {
                        text_at(&daypart.wind_direction_cardinal, period)
                    }
                    ForecastField::WindPhrase => text_at(&daypart.wind_phrase, period),
                    ForecastField::WindSpeed => num_at(&daypart.wind_speed, period),
                    ForecastField::WxPhraseLong => text_at(&daypart.wx_phrase_long, period),
                    ForecastField::WxPhraseShort => text_at(&daypart.wx_phrase_short, period),
                    ForecastField::TemperatureMax
                    | ForecastField::TemperatureMin
                    | ForecastField::CalendarDayTemperatureMax
                    | ForecastField::CalendarDayTemperatureMin
                    | ForecastField::ValidTimeUtc => unreachable!(),
                }
            }
        }
    }
}

/// Compass point for a wind bearing in degrees.
pub fn degrees_to_cardinal(degrees: f64) -> &'static str {
    const COMPASS_POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let mut d16 = ((degrees / 22.5) + 0.5) as usize;
    d16 %= 16;
    COMPASS_POINTS[d16]
}
