use crate::error::{GatewayError, Result};
use crate::model::{CountryInfo, FireDetection};
use firewatch_upstream::AreaBounds;
use geo::{BoundingRect, Centroid, Intersects, MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, JsonValue, Value};

/// A country outline as used for filtering and rendering.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub info: CountryInfo,
    pub polygons: MultiPolygon<f64>,
    /// the outline exactly as Nominatim returned it
    pub geojson: geojson::Geometry,
}

impl Boundary {
    pub fn ring_count(&self) -> usize {
        ring_count(&self.polygons)
    }

    /// Points on the outline count as inside.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.info.bbox.contains(lat, lon) && self.polygons.intersects(&Point::new(lon, lat))
    }
}

/// Exterior plus interior rings over all polygons.
pub fn ring_count(polygons: &MultiPolygon<f64>) -> usize {
    polygons
        .iter()
        .map(|p| 1 + p.interiors().len())
        .sum()
}

fn to_multipolygon(value: &Value) -> Result<Option<MultiPolygon<f64>>> {
    if !matches!(value, Value::Polygon(_) | Value::MultiPolygon(_)) {
        return Ok(None);
    }
    let geometry = geo::Geometry::<f64>::try_from(value.clone())
        .map_err(|e| GatewayError::malformed("Nominatim", format!("bad boundary geometry: {}", e)))?;

    Ok(match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        _ => None,
    })
}

fn property_str(feature: &Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

fn preferred_name(feature: &Feature) -> Option<String> {
    let details = feature.property("namedetails")?;
    details
        .get("name:en")
        .or_else(|| details.get("name"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

fn country_code(feature: &Feature) -> Option<String> {
    feature
        .property("address")
        .and_then(|a| a.get("country_code"))
        .and_then(JsonValue::as_str)
        .map(str::to_uppercase)
}

/// Pick the first polygonal feature of a Nominatim search answer.
/// `Ok(None)` means Nominatim knows no country outline for `query`.
pub fn boundary_from_collection(query: &str, collection: &FeatureCollection) -> Result<Option<Boundary>> {
    for feature in &collection.features {
        let Some(ref geometry) = feature.geometry else {
            continue;
        };
        let Some(polygons) = to_multipolygon(&geometry.value)? else {
            continue;
        };
        if polygons.0.is_empty() {
            continue;
        }

        let computed_bbox = polygons.bounding_rect().map(|r| {
            AreaBounds::new(r.min().x, r.min().y, r.max().x, r.max().y)
        });
        let bbox = feature
            .bbox
            .as_deref()
            .and_then(AreaBounds::from_geojson_bbox)
            .or(computed_bbox)
            .ok_or_else(|| GatewayError::malformed("Nominatim", "boundary without extent"))?;

        let center = polygons
            .centroid()
            .map(|c| [c.y(), c.x()])
            .unwrap_or_else(|| {
                let (lat, lon) = bbox.center();
                [lat, lon]
            });

        let display_name = property_str(feature, "display_name").unwrap_or_else(|| query.to_string());
        let name = preferred_name(feature)
            .or_else(|| property_str(feature, "name"))
            .unwrap_or_else(|| display_name.clone());

        return Ok(Some(Boundary {
            info: CountryInfo {
                query: query.to_string(),
                name,
                display_name,
                country_code: country_code(feature),
                center,
                bbox,
            },
            polygons,
            geojson: geometry.clone(),
        }));
    }

    Ok(None)
}

/// Keep only detections inside the boundary outline.
pub fn filter_within(detections: Vec<FireDetection>, boundary: &Boundary) -> Vec<FireDetection> {
    detections
        .into_iter()
        .filter(|d| boundary.contains(d.lat, d.lon))
        .collect()
}
