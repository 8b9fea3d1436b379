//! Common types used across the directory service

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// WGS-84 point stored on a shop.
///
/// On the wire a point is the string `"longitude latitude"`, the same form
/// clients pass to the discovery `coordinate` parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// Reasons a coordinate string is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoPointError {
    #[error("coordinate must be longitude and latitude separated by a space")]
    Format,

    #[error("longitude must be between -180 and 180")]
    LongitudeOutOfRange,

    #[error("latitude must be between -90 and 90")]
    LatitudeOutOfRange,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoPointError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::LongitudeOutOfRange);
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::LatitudeOutOfRange);
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Extended WKT understood by `ST_GeogFromText`
    pub fn to_ewkt(&self) -> String {
        format!("SRID=4326;POINT({} {})", self.longitude, self.latitude)
    }

    /// Parse the `POINT(lon lat)` text produced by `ST_AsText`
    pub fn from_wkt(wkt: &str) -> Result<Self, GeoPointError> {
        let inner = wkt
            .trim()
            .strip_prefix("POINT(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or(GeoPointError::Format)?;
        inner.parse()
    }
}

impl FromStr for GeoPoint {
    type Err = GeoPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GeoPointError::Format);
        };
        let longitude = lon.parse::<f64>().map_err(|_| GeoPointError::Format)?;
        let latitude = lat.parse::<f64>().map_err(|_| GeoPointError::Format)?;
        Self::new(longitude, latitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.longitude, self.latitude)
    }
}

impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Pagination metadata returned with every listing page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub page_size: u32,
    pub last_page: u32,
    pub total_records: u64,
}

/// A page of results plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub metadata: PaginationMeta,
    pub shops: Vec<T>,
}
