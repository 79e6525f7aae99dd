//! Client for NASA's Fire Information for Resource Management System (FIRMS).
//!
//! Only the two endpoints Firewatch needs are covered: the area CSV download
//! (`/api/area/csv/...`) and the map key status (`/mapserver/mapkey_status/`).
//! API reference: https://firms.modaps.eosdis.nasa.gov/api/area/

use crate::error::{Result, UpstreamError};
use crate::http::{build_client, check_status, DEFAULT_USER_AGENT};
use crate::record::{parse_detections, AreaBounds, RawDetection};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_FIRMS_URL: &str = "https://firms.modaps.eosdis.nasa.gov";

/// FIRMS only serves full day ranges between these bounds.
pub const MIN_DAY_RANGE: u8 = 1;
pub const MAX_DAY_RANGE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirmsSource {
    #[serde(rename = "MODIS_NRT")]
    ModisNrt,
    #[serde(rename = "VIIRS_SNPP_NRT")]
    ViirsSnppNrt,
    #[serde(rename = "VIIRS_NOAA20_NRT")]
    ViirsNoaa20Nrt,
    #[serde(rename = "VIIRS_NOAA21_NRT")]
    ViirsNoaa21Nrt,
}

impl FirmsSource {
    pub const ALL: [FirmsSource; 4] = [
        FirmsSource::ModisNrt,
        FirmsSource::ViirsSnppNrt,
        FirmsSource::ViirsNoaa20Nrt,
        FirmsSource::ViirsNoaa21Nrt,
    ];

    pub const DEFAULTS: [FirmsSource; 3] = [
        FirmsSource::ModisNrt,
        FirmsSource::ViirsNoaa20Nrt,
        FirmsSource::ViirsSnppNrt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FirmsSource::ModisNrt => "MODIS_NRT",
            FirmsSource::ViirsSnppNrt => "VIIRS_SNPP_NRT",
            FirmsSource::ViirsNoaa20Nrt => "VIIRS_NOAA20_NRT",
            FirmsSource::ViirsNoaa21Nrt => "VIIRS_NOAA21_NRT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MODIS_NRT" => Some(FirmsSource::ModisNrt),
            "VIIRS_SNPP_NRT" => Some(FirmsSource::ViirsSnppNrt),
            "VIIRS_NOAA20_NRT" => Some(FirmsSource::ViirsNoaa20Nrt),
            "VIIRS_NOAA21_NRT" => Some(FirmsSource::ViirsNoaa21Nrt),
            _ => None,
        }
    }
}

impl fmt::Display for FirmsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A FIRMS map key: 32 hexadecimal characters.
///
/// `Debug` and `redacted()` only show the first four characters, the key is rate
/// limited per owner and must not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct MapKey(String);

impl MapKey {
    pub const LENGTH: usize = 32;

    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim().trim_matches('"').trim_matches('\'');
        if key.is_empty() {
            return Err(UpstreamError::InvalidMapKey(
                "FIRMS key is required and cannot be empty".to_string(),
            ));
        }
        if key.len() != Self::LENGTH || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(UpstreamError::InvalidMapKey(
                "key should be a 32-character hexadecimal string".to_string(),
            ));
        }
        Ok(MapKey(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        format!("{}****", &self.0[..4])
    }
}

impl fmt::Debug for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapKey({})", self.redacted())
    }
}

/// Area selector of the FIRMS area API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirmsArea {
    World,
    Bounds(AreaBounds),
}

impl FirmsArea {
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("world") {
            Some(FirmsArea::World)
        } else {
            AreaBounds::parse(s).map(FirmsArea::Bounds)
        }
    }

    pub fn as_path_segment(&self) -> String {
        match self {
            FirmsArea::World => "world".to_string(),
            FirmsArea::Bounds(bounds) => bounds.to_firms_area(),
        }
    }
}

/// Answer of `/mapserver/mapkey_status/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyStatus {
    #[serde(default)]
    pub transaction_limit: Option<u64>,
    #[serde(default)]
    pub current_transactions: Option<u64>,
    #[serde(default)]
    pub transaction_interval: Option<String>,
}

pub struct FirmsClient {
    client: Client,
    base_url: Url,
    map_key: MapKey,
}

impl FirmsClient {
    pub fn new(base_url: &str, map_key: MapKey) -> Result<Self> {
        Self::with_timeout(base_url, map_key, 30)
    }

    pub fn with_timeout(base_url: &str, map_key: MapKey, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = build_client(DEFAULT_USER_AGENT, timeout_secs)?;
        Ok(Self {
            client,
            base_url,
            map_key,
        })
    }

    pub fn map_key(&self) -> &MapKey {
        &self.map_key
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `[BASE_URL]/api/area/csv/[MAP_KEY]/[SOURCE]/[AREA]/[DAY_RANGE]/[DATE]`
    pub fn area_csv_url(
        base_url: &Url,
        map_key: &MapKey,
        source: FirmsSource,
        area: &FirmsArea,
        days: u8,
        date: Option<NaiveDate>,
    ) -> Result<Url> {
        let mut url = base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl(base_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["api", "area", "csv", map_key.as_str(), source.as_str()])
                .push(&area.as_path_segment())
                .push(&days.to_string());
            if let Some(date) = date {
                segments.push(&date.format("%Y-%m-%d").to_string());
            }
        }
        Ok(url)
    }

    pub fn key_status_url(base_url: &Url, map_key: &MapKey) -> Result<Url> {
        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(base_url.to_string()))?
            .pop_if_empty()
            .extend(["mapserver", "mapkey_status", ""]);
        url.query_pairs_mut().append_pair("MAP_KEY", map_key.as_str());
        Ok(url)
    }

    pub fn url_for(
        &self,
        source: FirmsSource,
        area: &FirmsArea,
        days: u8,
        date: Option<NaiveDate>,
    ) -> Result<Url> {
        Self::area_csv_url(&self.base_url, &self.map_key, source, area, days, date)
    }

    /// Download and parse the detections of one source over an area.
    pub async fn fetch_area(
        &self,
        source: FirmsSource,
        area: &FirmsArea,
        days: u8,
        date: Option<NaiveDate>,
    ) -> Result<Vec<RawDetection>> {
        let url = self.url_for(source, area, days, date)?;
        debug!(
            "Fetching {} detections for {} over {} day(s) (key {})",
            source,
            area.as_path_segment(),
            days,
            self.map_key.redacted()
        );

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::FORBIDDEN {
            return Err(UpstreamError::AccessLimitReached);
        }
        let response = check_status("FIRMS", response).await?;
        let body = response.text().await?;
        let detections = parse_detections(&body)?;

        info!("FIRMS {} returned {} detections", source, detections.len());
        Ok(detections)
    }

    pub async fn key_status(&self) -> Result<KeyStatus> {
        let url = Self::key_status_url(&self.base_url, &self.map_key)?;
        let response = self.client.get(url).send().await?;
        let response = check_status("FIRMS", response).await?;
        let body = response.text().await?;
        let status: KeyStatus = serde_json::from_str(&body)?;
        Ok(status)
    }
}
