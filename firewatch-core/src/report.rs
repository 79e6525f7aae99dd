// Report rendering for active fire payloads

use crate::model::{ActiveFires, ConfidenceLevel, FireDetection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str = "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    GeoJson,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "geojson" | "geo" => Some(ReportFormat::GeoJson),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::GeoJson => "geojson",
        }
    }
}

/// Fire counts per confidence level and per `days_ago`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FireSummary {
    pub total: usize,
    pub high_confidence: usize,
    pub low: usize,
    pub nominal: usize,
    pub high: usize,
    pub by_days_ago: BTreeMap<u32, usize>,
}

impl FireSummary {
    pub fn from_fires(fires: &[FireDetection]) -> Self {
        let mut summary = FireSummary {
            total: fires.len(),
            ..Default::default()
        };
        for fire in fires {
            if fire.high_confidence {
                summary.high_confidence += 1;
            }
            match fire.confidence_level {
                ConfidenceLevel::Low => summary.low += 1,
                ConfidenceLevel::Nominal => summary.nominal += 1,
                ConfidenceLevel::High => summary.high += 1,
            }
            *summary.by_days_ago.entry(fire.days_ago).or_insert(0) += 1;
        }
        summary
    }
}

fn format_sources(data: &ActiveFires) -> String {
    data.sources
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_days_ago(days_ago: u32) -> String {
    match days_ago {
        0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        n => format!("{} days ago", n),
    }
}

pub fn generate_text_report(data: &ActiveFires) -> String {
    let mut report = String::new();
    let summary = FireSummary::from_fires(&data.fires);

    report.push_str(HEAVY_RULE);
    report.push_str("                         FIREWATCH ACTIVE FIRES REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report.push_str(&format!("Country:      {}\n", data.country.display_name));
    if let Some(ref code) = data.country.country_code {
        report.push_str(&format!("Code:         {}\n", code));
    }
    report.push_str(&format!(
        "Center:       {:.4}, {:.4}\n",
        data.country.center[0], data.country.center[1]
    ));
    report.push_str(&format!("Area:         {}\n", data.country.bbox.to_firms_area()));
    report.push_str(&format!("Day Range:    {}\n", data.days));
    report.push_str(&format!("Sources:      {}\n", format_sources(data)));
    report.push_str(&format!(
        "Confidence:   {}\n",
        if data.include_low_confidence {
            "all detections"
        } else {
            "high confidence only"
        }
    ));
    report.push_str(&format!(
        "Generated:    {}\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push('\n');

    report.push_str(HEAVY_RULE);
    report.push_str("SUMMARY\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    if summary.total == 0 {
        report.push_str("No fires found.\n\n");
    } else {
        report.push_str(&format!("Total Fires: {}\n\n", summary.total));
        report.push_str(&format!("  [HIGH]     {}\n", summary.high));
        report.push_str(&format!("  [NOMINAL]  {}\n", summary.nominal));
        report.push_str(&format!("  [LOW]      {}\n", summary.low));
        report.push('\n');
        for (days_ago, count) in &summary.by_days_ago {
            report.push_str(&format!("  {:<12} {}\n", format_days_ago(*days_ago), count));
        }
        report.push('\n');

        report.push_str(HEAVY_RULE);
        report.push_str("DETECTIONS\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>9} {:>10} {:>10} {:>8} {:<16} {}\n",
            "acquired (UTC)", "latitude", "longitude", "confidence", "frp", "source", "age"
        ));
        report.push_str(LIGHT_RULE);
        for fire in &data.fires {
            report.push_str(&format!(
                "{:<20} {:>9.4} {:>10.4} {:>10} {:>8} {:<16} {}\n",
                fire.timestamp.format("%Y-%m-%d %H:%M"),
                fire.lat,
                fire.lon,
                fire.confidence,
                fire.frp.map(|f| format!("{:.1}", f)).unwrap_or_else(|| "-".to_string()),
                fire.source.as_str(),
                format_days_ago(fire.days_ago)
            ));
        }
        report.push('\n');
    }

    report.push_str(HEAVY_RULE);
    report.push_str("\nData: NASA FIRMS (https://firms.modaps.eosdis.nasa.gov), boundaries: OpenStreetMap Nominatim\n\n");

    report
}

pub fn generate_json_report(data: &ActiveFires) -> Result<String, serde_json::Error> {
    let summary = FireSummary::from_fires(&data.fires);
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Firewatch",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": data.generated_at.to_rfc3339(),
                "format": "json",
            },
            "query": {
                "country": data.country.query,
                "days": data.days,
                "sources": data.sources,
                "include_low_confidence": data.include_low_confidence,
            },
            "country": data.country,
            "summary": summary,
            "boundary": data.boundary,
            "fires": data.fires,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

const CSV_HEADER: [&str; 14] = [
    "latitude",
    "longitude",
    "acq_datetime",
    "confidence",
    "confidence_level",
    "days_ago",
    "source",
    "satellite",
    "instrument",
    "brightness",
    "brightness_secondary",
    "frp",
    "daynight",
    "version",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    latitude: f64,
    longitude: f64,
    acq_datetime: String,
    confidence: &'a str,
    confidence_level: &'a str,
    days_ago: u32,
    source: &'a str,
    satellite: Option<&'a str>,
    instrument: Option<&'a str>,
    brightness: Option<f64>,
    brightness_secondary: Option<f64>,
    frp: Option<f64>,
    daynight: Option<&'a str>,
    version: Option<&'a str>,
}

pub fn generate_csv_report(data: &ActiveFires) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for fire in &data.fires {
        writer.serialize(CsvRow {
            latitude: fire.lat,
            longitude: fire.lon,
            acq_datetime: fire.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            confidence: &fire.confidence,
            confidence_level: fire.confidence_level.as_str(),
            days_ago: fire.days_ago,
            source: fire.source.as_str(),
            satellite: fire.satellite.as_deref(),
            instrument: fire.instrument.as_deref(),
            brightness: fire.brightness,
            brightness_secondary: fire.brightness_secondary,
            frp: fire.frp,
            daynight: fire.daynight.as_deref(),
            version: fire.version.as_deref(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn generate_geojson_report(data: &ActiveFires) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&data.to_feature_collection())
}

pub fn render_report(data: &ActiveFires, format: ReportFormat) -> anyhow::Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_text_report(data),
        ReportFormat::Json => generate_json_report(data)?,
        ReportFormat::Csv => generate_csv_report(data)?,
        ReportFormat::GeoJson => generate_geojson_report(data)?,
    })
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
