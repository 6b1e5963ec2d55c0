//! Location and weather filters.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{default_path, number, options, read_f64};
use crate::condition::Params;
use crate::error::{ExecutionError, ExecutionResult};
use crate::params::FieldPath;

// =============================================================================
// geohash
// =============================================================================

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

default_path!(default_lat, "lat");
default_path!(default_lon, "lon");
default_path!(default_geohash, "geohash");

fn default_precision() -> usize {
    9
}

#[derive(Debug, Deserialize)]
struct GeohashOptions {
    #[serde(default = "default_lat")]
    lat: FieldPath,
    #[serde(default = "default_lon")]
    lon: FieldPath,
    #[serde(default = "default_precision")]
    precision: usize,
    #[serde(default = "default_geohash")]
    target: FieldPath,
}

pub fn geohash(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: GeohashOptions = options(params)?;
    let lat = read_f64(&data, &opts.lat)?;
    let lon = read_f64(&data, &opts.lon)?;

    let hash = encode_geohash(lat, lon, opts.precision)?;
    opts.target.set(&mut data, Value::String(hash));
    Ok(data)
}

/// Encode a coordinate as a base-32 geohash of `precision` characters.
pub fn encode_geohash(lat: f64, lon: f64, precision: usize) -> ExecutionResult<String> {
    if !(1..=12).contains(&precision) {
        return Err(ExecutionError::InvalidParams(format!(
            "precision must be between 1 and 12, got {}",
            precision
        )));
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ExecutionError::InvalidParams(format!(
            "coordinate out of range: {}, {}",
            lat, lon
        )));
    }

    let (mut lat_range, mut lon_range) = ((-90.0, 90.0), (-180.0, 180.0));
    let mut hash = String::with_capacity(precision);
    let mut even = true;
    let (mut bits, mut ch) = (0, 0usize);

    while hash.len() < precision {
        let (range, value): (&mut (f64, f64), f64) = if even {
            (&mut lon_range, lon)
        } else {
            (&mut lat_range, lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        ch <<= 1;
        if value >= mid {
            ch |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        even = !even;

        bits += 1;
        if bits == 5 {
            hash.push(BASE32[ch] as char);
            bits = 0;
            ch = 0;
        }
    }

    Ok(hash)
}

// =============================================================================
// weather
// =============================================================================

/// Lower bounds (km/h) of Beaufort forces 1 to 12.
const BEAUFORT_KMH: [f64; 12] = [1.0, 6.0, 12.0, 20.0, 29.0, 39.0, 50.0, 62.0, 75.0, 89.0, 103.0, 118.0];

const BEAUFORT_NAMES: [&str; 13] = [
    "Calm",
    "Light air",
    "Light breeze",
    "Gentle breeze",
    "Moderate breeze",
    "Fresh breeze",
    "Strong breeze",
    "Near gale",
    "Gale",
    "Strong gale",
    "Storm",
    "Violent storm",
    "Hurricane",
];

default_path!(default_temperature, "temperature");
default_path!(default_wind_speed, "wind_speed");
default_path!(default_humidity, "humidity");
default_path!(default_weather, "weather");

#[derive(Debug, Deserialize)]
struct WeatherOptions {
    #[serde(default = "default_temperature")]
    temperature: FieldPath,
    #[serde(default = "default_wind_speed")]
    wind_speed: FieldPath,
    #[serde(default = "default_humidity")]
    humidity: FieldPath,
    #[serde(default = "default_weather")]
    target: FieldPath,
}

/// Derive indicators from temperature (°C), wind speed (km/h) and optional
/// relative humidity (%).
///
/// Output at `target`:
///
/// ```text
/// { "celsius", "fahrenheit", "feels_like", "beaufort", "wind" }
/// ```
///
/// `feels_like` is the heat index at 27 °C and above when humidity is known,
/// the wind chill at 10 °C and below with wind over 4.8 km/h, and the air
/// temperature otherwise.
pub fn weather(params: &Params, mut data: Value) -> ExecutionResult<Value> {
    let opts: WeatherOptions = options(params)?;
    let celsius = read_f64(&data, &opts.temperature)?;
    let wind = read_f64(&data, &opts.wind_speed)?;
    let humidity = match opts.humidity.get(&data) {
        Some(Value::Null) | None => None,
        Some(_) => Some(read_f64(&data, &opts.humidity)?),
    };

    if wind < 0.0 {
        return Err(ExecutionError::InvalidParams(format!(
            "wind speed must not be negative, got {}",
            wind
        )));
    }

    let force = beaufort(wind);
    let report = json!({
        "celsius": number(round1(celsius)),
        "fahrenheit": number(round1(to_fahrenheit(celsius))),
        "feels_like": number(round1(feels_like(celsius, wind, humidity))),
        "beaufort": force,
        "wind": BEAUFORT_NAMES[force],
    });

    opts.target.set(&mut data, report);
    Ok(data)
}

fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

fn to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

fn feels_like(celsius: f64, wind_kmh: f64, humidity: Option<f64>) -> f64 {
    match humidity {
        Some(rh) if celsius >= 27.0 => heat_index(celsius, rh),
        _ if celsius <= 10.0 && wind_kmh > 4.8 => wind_chill(celsius, wind_kmh),
        _ => celsius,
    }
}

/// Rothfusz regression, computed in °F.
fn heat_index(celsius: f64, rh: f64) -> f64 {
    let t = to_fahrenheit(celsius);
    let hi = -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 0.006_837_83 * t * t
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * t * t * rh
        + 0.000_852_82 * t * rh * rh
        - 0.000_001_99 * t * t * rh * rh;
    to_celsius(hi)
}

fn wind_chill(celsius: f64, wind_kmh: f64) -> f64 {
    let v = wind_kmh.powf(0.16);
    13.12 + 0.6215 * celsius - 11.37 * v + 0.3965 * celsius * v
}

fn beaufort(wind_kmh: f64) -> usize {
    BEAUFORT_KMH.iter().filter(|bound| wind_kmh >= **bound).count()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
