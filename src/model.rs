// src/model.rs
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Spectral band centre wavelengths in nanometres, one per cube band.
pub type WavelengthTable = Vec<f32>;

/// One band sliced out of the cube, shape (across-track, along-track).
pub type BandPlane<'a> = ArrayView2<'a, f32>;

/// Surface reflectance cube, axes (across-track, along-track, band).
#[derive(Debug, Clone)]
pub struct ReflectanceCube {
    data: Array3<f32>,
    wavelengths: WavelengthTable,
}

impl ReflectanceCube {
    pub fn new(data: Array3<f32>, wavelengths: WavelengthTable) -> Result<Self> {
        let bands = data.len_of(Axis(2));
        if wavelengths.len() != bands {
            return Err(Error::data_format(format!(
                "wavelength table has {} entries but cube has {} bands",
                wavelengths.len(),
                bands
            )));
        }
        Ok(Self { data, wavelengths })
    }

    pub fn wavelengths(&self) -> &[f32] {
        &self.wavelengths
    }

    pub fn bands(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn band(&self, index: usize) -> Result<BandPlane<'_>> {
        if index >= self.bands() {
            return Err(Error::invalid_input(format!(
                "band index {} out of range (cube has {} bands)",
                index,
                self.bands()
            )));
        }
        Ok(self.data.index_axis(Axis(2), index))
    }
}

/// Co-registered band depth and mineral id rasters for one classification group.
#[derive(Debug, Clone)]
pub struct ClassificationPair {
    pub band_depth: Array2<f32>,
    pub mineral_id: Array2<i32>,
}

impl ClassificationPair {
    pub fn new(band_depth: Array2<f32>, mineral_id: Array2<i32>) -> Result<Self> {
        if band_depth.dim() != mineral_id.dim() {
            return Err(Error::data_format(format!(
                "band depth shape {:?} differs from mineral id shape {:?}",
                band_depth.dim(),
                mineral_id.dim()
            )));
        }
        Ok(Self {
            band_depth,
            mineral_id,
        })
    }
}

/// Area of interest. The front end only ever submits a single point, so
/// both corners are usually identical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

impl BoundingBox {
    pub fn point(lat: f64, lon: f64) -> Result<Self> {
        check_coordinate(lat, lon)?;
        Ok(Self {
            lat1: lat,
            lon1: lon,
            lat2: lat,
            lon2: lon,
        })
    }

    pub fn is_point(&self) -> bool {
        self.lat1 == self.lat2 && self.lon1 == self.lon2
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.lat1 + self.lat2) / 2.0, (self.lon1 + self.lon2) / 2.0)
    }

    /// CMR ordering: west,south,east,north.
    pub fn to_cmr(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lon1.min(self.lon2),
            self.lat1.min(self.lat2),
            self.lon1.max(self.lon2),
            self.lat1.max(self.lat2)
        )
    }
}

fn check_coordinate(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::invalid_input(format!(
            "coordinate out of range: lat {lat}, lon {lon}"
        )));
    }
    Ok(())
}

impl FromStr for BoundingBox {
    type Err = Error;

    /// Accepts `lat,lon` or `lat1,lon1,lat2,lon2`, optionally wrapped in quotes.
    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s.chars().filter(|c| *c != '"' && *c != '\'').collect();
        let values = cleaned
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| Error::invalid_input(format!("bad coordinate '{}'", part.trim())))
            })
            .collect::<Result<Vec<_>>>()?;

        match values.as_slice() {
            [lat, lon] => Self::point(*lat, *lon),
            [lat1, lon1, lat2, lon2] => {
                check_coordinate(*lat1, *lon1)?;
                check_coordinate(*lat2, *lon2)?;
                Ok(Self {
                    lat1: *lat1,
                    lon1: *lon1,
                    lat2: *lat2,
                    lon2: *lon2,
                })
            }
            _ => Err(Error::invalid_input(format!(
                "bounding box needs 2 or 4 coordinates, got {}",
                values.len()
            ))),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.lat1, self.lon1, self.lat2, self.lon2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::invalid_input(format!(
                "date range starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// CMR temporal filter.
    pub fn to_cmr(&self) -> String {
        format!("{}T00:00:00Z,{}T23:59:59Z", self.start, self.end)
    }

    /// Same range with the start moved back by one calendar month. The day
    /// is clamped to the length of the target month.
    pub fn previous_month(&self) -> Self {
        let (year, month) = if self.start.month() == 1 {
            (self.start.year() - 1, 12)
        } else {
            (self.start.year(), self.start.month() - 1)
        };
        let mut day = self.start.day();
        let start = loop {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                break date;
            }
            day -= 1;
        };
        Self {
            start,
            end: self.end,
        }
    }
}

impl FromStr for DateRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(',')
            .ok_or_else(|| Error::invalid_input(format!("date range '{s}' must be START,END")))?;
        let parse = |v: &str| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|_| Error::invalid_input(format!("bad date '{}', expected YYYY-MM-DD", v.trim())))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

/// Explicit credentials for the data provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    /// L2A surface reflectance
    Reflectance,
    /// L2B mineral identification
    Mineral,
}

impl ProductType {
    pub fn short_name(&self) -> &'static str {
        match self {
            ProductType::Reflectance => "EMITL2ARFL",
            ProductType::Mineral => "EMITL2BMIN",
        }
    }
}

/// Everything printed on the report cover besides the image itself.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub image_name: String,
    pub acquisition_date: String,
    pub bbox: BoundingBox,
    pub place_name: String,
}
