// src/services/geocode.rs
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeocoderConfig;
use crate::error::{Error, GeocodingError, Result};

pub const NO_LOCATION: &str = "No location information found for these coordinates.";

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Resolves a coordinate to a human readable place name.
pub trait PlaceNamer: Send + Sync {
    fn place_name(&self, lat: f64, lon: f64) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Online reverse geocoding against a Nominatim endpoint.
pub struct NominatimNamer {
    config: GeocoderConfig,
    client: Client,
}

impl NominatimNamer {
    pub fn new(config: GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { config, client })
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        GeocodingError::Timeout.into()
    } else {
        GeocodingError::Service(err.to_string()).into()
    }
}

impl PlaceNamer for NominatimNamer {
    fn place_name(&self, lat: f64, lon: f64) -> Result<String> {
        let response: ReverseResponse = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("format", "jsonv2"),
                ("lat", lat.to_string().as_str()),
                ("lon", lon.to_string().as_str()),
                ("accept-language", self.config.language.as_str()),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(classify)?
            .json()
            .map_err(classify)?;

        match (response.display_name, response.error) {
            (Some(name), _) => Ok(name),
            (None, Some(err)) => {
                debug!(error = %err, "reverse geocoder has no match");
                Ok(NO_LOCATION.to_string())
            }
            (None, None) => Ok(NO_LOCATION.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub admin1: String,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

/// Nearest populated place from a local table; formats the coordinate when
/// no table is loaded.
#[derive(Debug, Default)]
pub struct OfflineNamer {
    places: Vec<Place>,
}

impl OfflineNamer {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// CSV rows of `name,admin1,cc,lat,lon`. A header row and malformed rows are skipped.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let places = content.lines().filter_map(parse_place).collect::<Vec<_>>();
        debug!(path = %path.display(), places = places.len(), "loaded offline places");
        Ok(Self { places })
    }

    pub fn nearest(&self, lat: f64, lon: f64) -> Option<&Place> {
        self.places.iter().min_by(|a, b| {
            haversine_km(lat, lon, a.lat, a.lon).total_cmp(&haversine_km(lat, lon, b.lat, b.lon))
        })
    }
}

fn parse_place(line: &str) -> Option<Place> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, admin1, cc, lat, lon] = fields.as_slice() else {
        return None;
    };
    Some(Place {
        name: name.to_string(),
        admin1: admin1.to_string(),
        country_code: cc.to_string(),
        lat: lat.parse().ok()?,
        lon: lon.parse().ok()?,
    })
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
    let dp = (lat2 - lat1).to_radians();
    let dl = (lon2 - lon1).to_radians();
    let a = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

impl PlaceNamer for OfflineNamer {
    fn place_name(&self, lat: f64, lon: f64) -> Result<String> {
        Ok(match self.nearest(lat, lon) {
            Some(place) => format!("{} {} {}", place.name, place.admin1, place.country_code),
            None => format!("{lat:.4}, {lon:.4}"),
        })
    }
}

/// Primary namer with a bounded retry on timeouts, then the fallback.
/// Never fails: the worst case is [`NO_LOCATION`].
pub struct PlaceResolver {
    primary: Box<dyn PlaceNamer>,
    fallback: Box<dyn PlaceNamer>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl PlaceResolver {
    pub fn new(
        primary: Box<dyn PlaceNamer>,
        fallback: Box<dyn PlaceNamer>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Nominatim first, the configured offline table second.
    pub fn from_config(config: &GeocoderConfig, places_path: Option<&Path>) -> Result<Self> {
        let fallback = match places_path {
            Some(path) => OfflineNamer::from_csv(path)?,
            None => OfflineNamer::default(),
        };
        Ok(Self::new(
            Box::new(NominatimNamer::new(config.clone())?),
            Box::new(fallback),
            config.max_attempts,
            config.retry_delay(),
        ))
    }

    pub fn resolve(&self, lat: f64, lon: f64) -> String {
        for attempt in 1..=self.max_attempts {
            match self.primary.place_name(lat, lon) {
                Ok(name) => return name,
                Err(Error::Geocoding(GeocodingError::Timeout)) if attempt < self.max_attempts => {
                    warn!(attempt, delay = ?self.retry_delay, "place naming timed out, retrying");
                    thread::sleep(self.retry_delay);
                }
                Err(err) => {
                    warn!(error = %err, kind = %err.kind(), "place naming failed, using fallback");
                    break;
                }
            }
        }

        self.fallback.place_name(lat, lon).unwrap_or_else(|err| {
            warn!(error = %err, "fallback place naming failed");
            NO_LOCATION.to_string()
        })
    }
}
