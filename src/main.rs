/*
 *  main.rs
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
use env_logger::Env;
use log::{error, info, warn};

mod conditions;
mod config;
mod constants;
mod snapshot;
mod throttle;
mod translate;
mod units;
mod weather;

use conditions::icon_code_to_condition;
use config::StationConfig;
use snapshot::{ConditionField, ForecastField, WeatherSnapshot, degrees_to_cardinal};
use translate::TranslationTable;
use weather::{HttpTransport, RefreshOutcome, WeatherStation};

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).ok();
        let mut sighup = signal(SignalKind::hangup()).ok();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("SIGINT received."),
            _ = async {
                match sigterm.as_mut() {
                    Some(s) => { s.recv().await; }
                    None => std::future::pending::<()>().await,
                }
            } => info!("SIGTERM received."),
            _ = async {
                match sighup.as_mut() {
                    Some(s) => { s.recv().await; }
                    None => std::future::pending::<()>().await,
                }
            } => info!("SIGHUP received."),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "--".to_string(),
    }
}

/// Log the current conditions and the 5-day outlook through the accessor
/// layer, the same surface a sensor/weather-entity consumer would read.
fn log_snapshot(config: &StationConfig, tranfile: &TranslationTable, snapshot: &WeatherSnapshot) {
    let units = config.unit_system.units_of_measurement();
    let obs = &snapshot.observation;

    let when = obs
        .obs_time()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    let station_id = obs.station_id.as_deref().unwrap_or(&config.pws_id);
    let station_name = obs.neighborhood.as_deref().unwrap_or(station_id);

    let temp = snapshot.get_condition(config.unit_system, ConditionField::Temp);
    let humidity = snapshot.get_condition(config.unit_system, ConditionField::Humidity);
    let pressure = snapshot.get_condition(config.unit_system, ConditionField::Pressure);
    let wind_speed = snapshot.get_condition(config.unit_system, ConditionField::WindSpeed);
    let winddir = snapshot
        .get_condition(config.unit_system, ConditionField::WindDir)
        .unwrap_or(0.0);

    info!(
        "{} [{}] {}: {}{} | {} {}{} | wind {} {}{} | pressure {}{}",
        station_name,
        when,
        tranfile.label("temp").unwrap_or("Temperature"),
        fmt_value(temp),
        units.temperature,
        tranfile.label("humidity").unwrap_or("Relative Humidity"),
        fmt_value(humidity),
        units.percentage,
        degrees_to_cardinal(winddir),
        fmt_value(wind_speed),
        units.speed,
        fmt_value(pressure),
        units.pressure,
    );
    info!(
        "{}: {} {}  {} {} W/m²",
        station_id,
        tranfile.label("uv").unwrap_or("UV Index"),
        fmt_value(obs.uv),
        tranfile.label("solarRadiation").unwrap_or("Solar Radiation"),
        fmt_value(obs.solar_radiation),
    );

    // current condition comes from today's daypart icon; after mid-afternoon
    // the day half is expired and tonight's icon stands in
    let day = snapshot.get_forecast(ForecastField::IconCode, 0);
    let night = snapshot.get_forecast(ForecastField::IconCode, 1);
    if let Some(code) = day.or(night).and_then(|v| v.as_i64()) {
        match icon_code_to_condition(code) {
            Some(condition) => info!("conditions: {condition}"),
            None => info!("conditions: unknown"),
        }
    }

    let Some(forecast) = snapshot.forecast.as_ref() else {
        return;
    };

    let (max_field, min_field) = if config.calendarday_temp {
        (
            ForecastField::CalendarDayTemperatureMax,
            ForecastField::CalendarDayTemperatureMin,
        )
    } else {
        (ForecastField::TemperatureMax, ForecastField::TemperatureMin)
    };

    let mut periods = [0usize, 2, 4, 6, 8];
    if snapshot.get_forecast(ForecastField::Temperature, 0).is_none() {
        periods[0] += 1;
    }
    for period in periods {
        let day_name = forecast
            .day_of_week
            .get(period / 2)
            .cloned()
            .flatten()
            .unwrap_or_else(|| tranfile.expired_label().to_string());
        let condition = snapshot
            .get_forecast(ForecastField::IconCode, period)
            .and_then(|v| v.as_i64())
            .and_then(icon_code_to_condition)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let hi = snapshot.get_forecast(max_field, period).and_then(|v| v.as_f64());
        // take the min from the next period; the current one reads too close
        // to the max to be useful
        let lo = snapshot
            .get_forecast(min_field, period + 1)
            .and_then(|v| v.as_f64());
        let pop = snapshot
            .get_forecast(ForecastField::PrecipChance, period)
            .and_then(|v| v.as_f64());
        let wind_dir = snapshot
            .get_forecast(ForecastField::WindDirectionCardinal, period)
            .and_then(|v| v.into_text())
            .unwrap_or_else(|| "--".to_string());
        let wind = snapshot
            .get_forecast(ForecastField::WindSpeed, period)
            .and_then(|v| v.as_f64());
        info!(
            "  {day_name}: {condition}, {}/{}{}  precip {}{}  wind {wind_dir} {}{}",
            fmt_value(hi),
            fmt_value(lo),
            units.temperature,
            fmt_value(pop),
            units.percentage,
            fmt_value(wind),
            units.speed,
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;

    env_logger::Builder::from_env(
        Env::default().default_filter_or(config.log_level.as_deref().unwrap_or("info")),
    )
    .init();

    info!(
        "{} v{} starting for station {} ({} units, lang {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.pws_id,
        config.unit_system,
        config.lang,
    );

    let transport = HttpTransport::new(config.request_timeout)?;
    let mut station = WeatherStation::new(config.clone(), transport)?;

    match station.refresh().await {
        RefreshOutcome::Updated => {}
        RefreshOutcome::Failed(e) => {
            warn!("Initial weather fetch failed, continuing to poll: {e}");
        }
        RefreshOutcome::Throttled => {}
    }
    if station.available() {
        info!(
            "{} online: {} {}",
            station.pws_id(),
            fmt_value(station.get_condition(ConditionField::Temp)),
            station.units_of_measurement().temperature,
        );
    }
    if let Some(snapshot) = station.snapshot() {
        log_snapshot(&config, station.translations(), snapshot);
    }

    let tranfile = station.translations().clone();
    let (poller, mut snapshot_rx) = station.start_polling_with_watch()?;
    info!(
        "Polling every {}s; readers share one snapshot per cycle.",
        config.update_interval.as_secs()
    );

    let shutdown = wait_for_shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    error!("Weather polling task went away.");
                    break;
                }
                let snapshot = snapshot_rx.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    log_snapshot(&config, &tranfile, &snapshot);
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}
