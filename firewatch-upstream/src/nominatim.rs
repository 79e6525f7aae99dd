use crate::error::{Result, UpstreamError};
use crate::http::{build_client, check_status};
use geojson::{FeatureCollection, GeoJson};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Simplification tolerance (degrees) applied by Nominatim to returned polygons.
/// Full resolution country outlines run into megabytes.
pub const DEFAULT_POLYGON_THRESHOLD: f64 = 0.005;

pub struct NominatimClient {
    client: Client,
    base_url: Url,
    polygon_threshold: f64,
}

impl NominatimClient {
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        Self::with_options(base_url, user_agent, DEFAULT_POLYGON_THRESHOLD, 20)
    }

    pub fn with_options(
        base_url: &str,
        user_agent: &str,
        polygon_threshold: f64,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = build_client(user_agent, timeout_secs)?;
        Ok(Self {
            client,
            base_url,
            polygon_threshold,
        })
    }

    /// Search URL for a country with its boundary as GeoJSON.
    pub fn search_url(base_url: &Url, query: &str, polygon_threshold: f64) -> Result<Url> {
        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(base_url.to_string()))?
            .pop_if_empty()
            .push("search");
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("featureType", "country")
            .append_pair("polygon_geojson", "1")
            .append_pair("polygon_threshold", &polygon_threshold.to_string())
            .append_pair("namedetails", "1")
            .append_pair("addressdetails", "1")
            .append_pair("format", "geojson");
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, query: &str) -> Result<Url> {
        Self::search_url(&self.base_url, query, self.polygon_threshold)
    }

    /// Run a country search. An unknown country yields an empty collection.
    pub async fn search_country(&self, query: &str) -> Result<FeatureCollection> {
        let url = self.url_for(query)?;
        debug!("Searching Nominatim: {}", url);

        let response = self.client.get(url).send().await?;
        let response = check_status("Nominatim", response).await?;
        let body = response.text().await?;

        match body.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => {
                info!(
                    "Nominatim returned {} feature(s) for '{}'",
                    collection.features.len(),
                    query
                );
                Ok(collection)
            }
            _ => Err(UpstreamError::ParseError(
                "Nominatim answer is not a FeatureCollection".to_string(),
            )),
        }
    }
}
