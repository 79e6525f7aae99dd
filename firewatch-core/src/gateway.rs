use crate::config::AppConfig;
use crate::detections::{merge_detections, normalize_all};
use crate::error::{GatewayError, Result};
use crate::geometry::{boundary_from_collection, filter_within, Boundary};
use crate::model::ActiveFires;
use chrono::{NaiveDate, Utc};
use firewatch_upstream::firms::{MAX_DAY_RANGE, MIN_DAY_RANGE};
use firewatch_upstream::{FirmsArea, FirmsClient, FirmsSource, KeyStatus, MapKey, NominatimClient};
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const FIRMS: &str = "FIRMS";
const NOMINATIM: &str = "Nominatim";

/// Defaults applied when a request leaves `days` or `sources` out.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDefaults {
    pub days: u8,
    pub sources: Vec<FirmsSource>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            days: 9,
            sources: FirmsSource::DEFAULTS.to_vec(),
        }
    }
}

/// Query parameters of `/active-fires` as they arrive, all optional text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveFiresParams {
    pub country: Option<String>,
    pub days: Option<String>,
    pub sources: Option<String>,
    pub include_low: Option<String>,
    pub date: Option<String>,
}

/// A validated active-fires request.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFiresRequest {
    pub country: String,
    pub days: u8,
    pub sources: Vec<FirmsSource>,
    pub include_low: bool,
    pub date: Option<NaiveDate>,
}

impl ActiveFiresRequest {
    pub fn validate(&self) -> Result<()> {
        if self.country.trim().is_empty() {
            return Err(GatewayError::invalid("country must not be empty"));
        }
        check_days(self.days)?;
        if self.sources.is_empty() {
            return Err(GatewayError::invalid("at least one source is required"));
        }
        if let Some(date) = self.date
            && date > Utc::now().date_naive()
        {
            return Err(GatewayError::invalid(format!("date {} is in the future", date)));
        }
        Ok(())
    }
}

impl ActiveFiresParams {
    pub fn validate(&self, defaults: &QueryDefaults) -> Result<ActiveFiresRequest> {
        let country = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GatewayError::invalid("country is required"))?;

        let days = match self.days.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(days) => parse_days(days)?,
            None => defaults.days,
        };

        let sources = match self.sources.as_deref() {
            Some(sources) => parse_sources(sources)?,
            None => defaults.sources.clone(),
        };

        let include_low = match self.include_low.as_deref() {
            Some(flag) => parse_bool("include_low", flag)?,
            None => false,
        };

        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => Some(parse_date(date)?),
            None => None,
        };

        let request = ActiveFiresRequest {
            country: country.to_string(),
            days,
            sources,
            include_low,
            date,
        };
        request.validate()?;
        Ok(request)
    }
}

fn check_days(days: u8) -> Result<()> {
    if (MIN_DAY_RANGE..=MAX_DAY_RANGE).contains(&days) {
        Ok(())
    } else {
        Err(GatewayError::invalid(format!(
            "days must be between {} and {}, got {}",
            MIN_DAY_RANGE, MAX_DAY_RANGE, days
        )))
    }
}

pub fn parse_days(raw: &str) -> Result<u8> {
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| GatewayError::invalid(format!("days must be a whole number, got '{}'", raw)))?;
    let days = u8::try_from(days).map_err(|_| {
        GatewayError::invalid(format!(
            "days must be between {} and {}, got {}",
            MIN_DAY_RANGE, MAX_DAY_RANGE, days
        ))
    })?;
    check_days(days)?;
    Ok(days)
}

/// Comma separated source names, case-insensitive, duplicates collapsed.
pub fn parse_sources(raw: &str) -> Result<Vec<FirmsSource>> {
    let mut sources = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let source = FirmsSource::from_str(name).ok_or_else(|| {
            let known: Vec<&str> = FirmsSource::ALL.iter().map(|s| s.as_str()).collect();
            GatewayError::invalid(format!(
                "unknown source '{}', expected one of {}",
                name,
                known.join(", ")
            ))
        })?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    if sources.is_empty() {
        return Err(GatewayError::invalid("at least one source is required"));
    }
    Ok(sources)
}

pub fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(GatewayError::invalid(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| GatewayError::invalid(format!("date must be YYYY-MM-DD, got '{}'", raw)))
}

/// Parse a user supplied map key, a bad key is the caller's fault.
pub fn parse_map_key(raw: &str) -> Result<MapKey> {
    MapKey::parse(raw).map_err(|e| GatewayError::from_upstream(FIRMS, e))
}

/// Body of `POST /create/nominatim_search_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimUrlRequest {
    pub country_code: String,
}

/// Body of `POST /create/firms_csv_urls`.
#[derive(Debug, Clone, Deserialize)]
pub struct FirmsUrlsRequest {
    pub firms_key: String,
    #[serde(default)]
    pub days: Option<u8>,
    #[serde(default)]
    pub area: Option<String>,
}

/// Combines Nominatim boundaries with FIRMS detections.
pub struct FireGateway {
    firms: FirmsClient,
    nominatim: NominatimClient,
    defaults: QueryDefaults,
}

impl FireGateway {
    pub fn new(firms: FirmsClient, nominatim: NominatimClient, defaults: QueryDefaults) -> Self {
        Self {
            firms,
            nominatim,
            defaults,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let map_key = config.map_key()?;
        info!("Using FIRMS map key {}", map_key.redacted());

        let firms = FirmsClient::with_timeout(&config.firms.base_url, map_key, config.firms.timeout_secs)?;
        let nominatim = NominatimClient::with_options(
            &config.nominatim.base_url,
            &config.nominatim.user_agent,
            config.nominatim.polygon_threshold,
            config.nominatim.timeout_secs,
        )?;

        Ok(Self::new(firms, nominatim, config.query_defaults()?))
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Resolve a country to its outline. An empty Nominatim answer is `CountryNotFound`.
    pub async fn lookup_boundary(&self, country: &str) -> Result<Boundary> {
        let country = country.trim();
        if country.is_empty() {
            return Err(GatewayError::invalid("country must not be empty"));
        }

        let collection = self
            .nominatim
            .search_country(country)
            .await
            .map_err(|e| GatewayError::from_upstream(NOMINATIM, e))?;

        let boundary = boundary_from_collection(country, &collection)?
            .ok_or_else(|| GatewayError::CountryNotFound(country.to_string()))?;

        debug!(
            "Boundary of '{}' ({}): {} ring(s), bbox {}",
            country,
            boundary.info.display_name,
            boundary.ring_count(),
            boundary.info.bbox.to_firms_area()
        );
        Ok(boundary)
    }

    pub async fn active_fires(&self, request: &ActiveFiresRequest) -> Result<ActiveFires> {
        self.active_fires_at(request, Utc::now().date_naive()).await
    }

    /// Like `active_fires`, with `days_ago` counted relative to `today`.
    pub async fn active_fires_at(
        &self,
        request: &ActiveFiresRequest,
        today: NaiveDate,
    ) -> Result<ActiveFires> {
        request.validate()?;
        info!(
            "Active fires for '{}' over {} day(s) from {} source(s)",
            request.country,
            request.days,
            request.sources.len()
        );

        let boundary = self.lookup_boundary(&request.country).await?;
        let area = FirmsArea::Bounds(boundary.info.bbox);
        let (area, outline) = (&area, &boundary);

        let fetches = request.sources.iter().map(|&source| async move {
            let raws = self
                .firms
                .fetch_area(source, area, request.days, request.date)
                .await
                .map_err(|e| GatewayError::from_upstream(FIRMS, e))?;
            let detections = normalize_all(raws, source)?;
            Ok::<_, GatewayError>(filter_within(detections, outline))
        });
        let batches = try_join_all(fetches).await?;

        let fires = merge_detections(batches, request.include_low, today);
        info!(
            "{} fire(s) inside {}",
            fires.len(),
            boundary.info.display_name
        );

        Ok(ActiveFires {
            country: boundary.info,
            boundary: boundary.geojson,
            fires,
            days: request.days,
            sources: request.sources.clone(),
            include_low_confidence: request.include_low,
            generated_at: Utc::now(),
        })
    }

    pub async fn key_status(&self) -> Result<KeyStatus> {
        self.firms
            .key_status()
            .await
            .map_err(|e| GatewayError::from_upstream(FIRMS, e))
    }

    pub fn nominatim_search_url(&self, country: &str) -> Result<Url> {
        let country = country.trim();
        if country.is_empty() {
            return Err(GatewayError::invalid("country_code must not be empty"));
        }
        self.nominatim
            .url_for(country)
            .map_err(|e| GatewayError::from_upstream(NOMINATIM, e))
    }

    /// FIRMS CSV URLs for every default source, with the given key.
    pub fn firms_csv_urls(
        &self,
        map_key: &MapKey,
        area: &FirmsArea,
        days: Option<u8>,
    ) -> Result<Vec<Url>> {
        let days = days.unwrap_or(self.defaults.days);
        check_days(days)?;
        self.defaults
            .sources
            .iter()
            .map(|&source| {
                FirmsClient::area_csv_url(self.firms.base_url(), map_key, source, area, days, None)
                    .map_err(|e| GatewayError::from_upstream(FIRMS, e))
            })
            .collect()
    }

    /// FIRMS CSV URLs with the configured key.
    pub fn configured_csv_urls(&self, area: &FirmsArea, days: Option<u8>) -> Result<Vec<Url>> {
        self.firms_csv_urls(self.firms.map_key(), area, days)
    }

    pub fn firms_urls_for(&self, request: &FirmsUrlsRequest) -> Result<Vec<Url>> {
        let map_key = parse_map_key(&request.firms_key)?;
        let area = match request.area.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(area) => FirmsArea::parse(area).ok_or_else(|| {
                GatewayError::invalid(format!(
                    "area must be 'world' or 'west,south,east,north', got '{}'",
                    area
                ))
            })?,
            None => FirmsArea::World,
        };
        self.firms_csv_urls(&map_key, &area, request.days)
    }
}
