use chrono::{DateTime, Utc};
use firewatch_upstream::{AreaBounds, FirmsSource};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::{Deserialize, Serialize};

/// FIRMS confidence classes.
/// MODIS reports 0-100 (low < 30, nominal < 80, high above), VIIRS reports l/n/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Nominal,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Nominal => "nominal",
            ConfidenceLevel::High => "high",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(percent) = raw.parse::<f64>() {
            return Some(if percent < 30.0 {
                ConfidenceLevel::Low
            } else if percent < 80.0 {
                ConfidenceLevel::Nominal
            } else {
                ConfidenceLevel::High
            });
        }
        match raw.to_lowercase().as_str() {
            "l" | "low" => Some(ConfidenceLevel::Low),
            "n" | "nominal" => Some(ConfidenceLevel::Nominal),
            "h" | "high" => Some(ConfidenceLevel::High),
            _ => None,
        }
    }
}

/// A single active fire detection, normalized across MODIS and VIIRS products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireDetection {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
    /// confidence as FIRMS reported it (percentage or letter)
    pub confidence: String,
    pub confidence_level: ConfidenceLevel,
    pub high_confidence: bool,
    /// brightness temperature in Kelvin (MODIS channel 21/22, VIIRS I-4)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    /// brightness temperature in Kelvin (MODIS channel 31, VIIRS I-5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_secondary: Option<f64>,
    /// fire radiative power in MW
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satellite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daynight: Option<String>,
    pub source: FirmsSource,
    pub days_ago: u32,
}

impl FireDetection {
    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert(
            "acq_datetime".to_string(),
            JsonValue::from(self.timestamp.format("%Y-%m-%d_%H:%M:%S").to_string()),
        );
        properties.insert("confidence".to_string(), JsonValue::from(self.confidence.clone()));
        properties.insert(
            "confidence_level".to_string(),
            JsonValue::from(self.confidence_level.as_str()),
        );
        properties.insert("days_ago".to_string(), JsonValue::from(self.days_ago));
        properties.insert("source".to_string(), JsonValue::from(self.source.as_str()));
        if let Some(ref satellite) = self.satellite {
            properties.insert("satellite".to_string(), JsonValue::from(satellite.clone()));
        }
        if let Some(frp) = self.frp {
            properties.insert("frp".to_string(), JsonValue::from(frp));
        }

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![self.lon, self.lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// What Nominatim told us about the selected country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub query: String,
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// map center as [lat, lon]
    pub center: [f64; 2],
    pub bbox: AreaBounds,
}

/// The merged map payload: one country boundary and the fires inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveFires {
    pub country: CountryInfo,
    pub boundary: Geometry,
    pub fires: Vec<FireDetection>,
    pub days: u8,
    pub sources: Vec<FirmsSource>,
    pub include_low_confidence: bool,
    pub generated_at: DateTime<Utc>,
}

impl ActiveFires {
    pub fn high_confidence_count(&self) -> usize {
        self.fires.iter().filter(|f| f.high_confidence).count()
    }

    /// Boundary feature first, then one point feature per fire.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut boundary_properties = JsonObject::new();
        boundary_properties.insert(
            "display_name".to_string(),
            JsonValue::from(self.country.display_name.clone()),
        );
        boundary_properties.insert("kind".to_string(), JsonValue::from("boundary"));

        let mut features = Vec::with_capacity(self.fires.len() + 1);
        features.push(Feature {
            bbox: None,
            geometry: Some(self.boundary.clone()),
            id: None,
            properties: Some(boundary_properties),
            foreign_members: None,
        });
        features.extend(self.fires.iter().map(FireDetection::to_feature));

        let bbox = &self.country.bbox;
        FeatureCollection {
            bbox: Some(vec![bbox.west, bbox.south, bbox.east, bbox.north]),
            features,
            foreign_members: None,
        }
    }
}
