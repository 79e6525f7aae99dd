use crate::error::{Result, UpstreamError};
use serde::{Deserialize, Serialize};

/// One row of a FIRMS area CSV, as the server sends it.
///
/// MODIS and VIIRS products name their brightness columns differently
/// (`brightness`/`bright_t31` versus `bright_ti4`/`bright_ti5`), both land in the
/// same two fields here. Confidence is kept as text because MODIS reports a
/// percentage while VIIRS reports a letter.
/// Field descriptions: https://www.earthdata.nasa.gov/data/tools/firms/faq
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "bright_ti4")]
    pub brightness: Option<f64>,
    #[serde(default, alias = "bright_ti5")]
    pub bright_t31: Option<f64>,
    #[serde(default)]
    pub scan: Option<f64>,
    #[serde(default)]
    pub track: Option<f64>,
    pub acq_date: String,
    pub acq_time: String,
    #[serde(default)]
    pub satellite: Option<String>,
    #[serde(default)]
    pub instrument: Option<String>,
    pub confidence: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub frp: Option<f64>,
    #[serde(default)]
    pub daynight: Option<String>,
}

/// Columns every FIRMS area CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["latitude", "longitude", "acq_date", "acq_time", "confidence"];

/// Parse a FIRMS CSV body into raw detections.
///
/// FIRMS answers some request problems (bad key, bad source) with a one-line
/// plain text message and a 200, so a body without a `latitude` header is
/// reported as a parse error carrying that line. An empty body or a header
/// missing a required column is a parse error too.
pub fn parse_detections(body: &str) -> Result<Vec<RawDetection>> {
    let first_line = body.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return Err(UpstreamError::ParseError(
            "FIRMS returned an empty body".to_string(),
        ));
    }
    if !first_line.split(',').any(|h| h.trim() == "latitude") {
        return Err(UpstreamError::ParseError(format!(
            "FIRMS did not return CSV data: {}",
            first_line
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(UpstreamError::ParseError(format!(
            "FIRMS CSV is missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut detections = Vec::new();
    for row in reader.deserialize() {
        let detection: RawDetection = row?;
        detections.push(detection);
    }
    Ok(detections)
}

/// A lon/lat rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl AreaBounds {
    /// Build bounds, clamped to the valid longitude/latitude ranges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west: west.clamp(-180.0, 180.0),
            south: south.clamp(-90.0, 90.0),
            east: east.clamp(-180.0, 180.0),
            north: north.clamp(-90.0, 90.0),
        }
    }

    /// From a GeoJSON `bbox` member (`[min_lon, min_lat, max_lon, max_lat]`).
    pub fn from_geojson_bbox(bbox: &[f64]) -> Option<Self> {
        match bbox {
            [w, s, e, n] => Some(Self::new(*w, *s, *e, *n)),
            _ => None,
        }
    }

    /// Parse the `west,south,east,north` form FIRMS uses in its URLs.
    pub fn parse(s: &str) -> Option<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        Self::from_geojson_bbox(&values)
    }

    pub fn to_firms_area(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.west, self.south, self.east, self.north
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// Center as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}
