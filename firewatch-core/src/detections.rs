// Normalization of raw FIRMS rows into fire detections

use crate::error::{GatewayError, Result};
use crate::model::{ConfidenceLevel, FireDetection};
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use firewatch_upstream::{FirmsSource, RawDetection};
use std::collections::HashSet;
use tracing::warn;

/// MODIS percentages at or above this count as high confidence.
pub const HIGH_CONFIDENCE_PERCENT: f64 = 70.0;

/// Zero-pad FIRMS `acq_time` (HHMM, leading zeros dropped by some exports) to four digits.
pub fn pad_acq_time(acq_time: &str) -> Option<String> {
    let acq_time = acq_time.trim();
    if acq_time.is_empty() || acq_time.len() > 4 || !acq_time.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>4}", acq_time))
}

pub fn parse_acquisition(acq_date: &str, acq_time: &str) -> Option<NaiveDateTime> {
    let time = pad_acq_time(acq_time)?;
    NaiveDateTime::parse_from_str(&format!("{} {}", acq_date.trim(), time), "%Y-%m-%d %H%M").ok()
}

/// Numeric confidence >= 70, or letter confidence nominal/high.
pub fn is_high_confidence(raw: &str) -> bool {
    let raw = raw.trim();
    if let Ok(percent) = raw.parse::<f64>() {
        return percent >= HIGH_CONFIDENCE_PERCENT;
    }
    matches!(
        raw.to_lowercase().as_str(),
        "n" | "nominal" | "h" | "high"
    )
}

pub fn valid_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Convert one raw row. Rows outside the valid coordinate ranges are skipped (`Ok(None)`),
/// an unparseable acquisition time fails the whole batch.
pub fn normalize(raw: RawDetection, source: FirmsSource) -> Result<Option<FireDetection>> {
    if !valid_coordinates(raw.latitude, raw.longitude) {
        warn!(
            "Dropping {} detection with invalid coordinates ({}, {})",
            source, raw.latitude, raw.longitude
        );
        return Ok(None);
    }

    let acquired = parse_acquisition(&raw.acq_date, &raw.acq_time).ok_or_else(|| {
        GatewayError::malformed(
            "FIRMS",
            format!(
                "invalid acquisition time '{} {}' in {} data",
                raw.acq_date, raw.acq_time, source
            ),
        )
    })?;

    let confidence_level = ConfidenceLevel::from_str(&raw.confidence).unwrap_or(ConfidenceLevel::Low);
    let high_confidence = is_high_confidence(&raw.confidence);

    Ok(Some(FireDetection {
        lat: raw.latitude,
        lon: raw.longitude,
        timestamp: Utc.from_utc_datetime(&acquired),
        confidence: raw.confidence.trim().to_string(),
        confidence_level,
        high_confidence,
        brightness: raw.brightness,
        brightness_secondary: raw.bright_t31,
        frp: raw.frp,
        satellite: raw.satellite,
        instrument: raw.instrument,
        version: raw.version,
        daynight: raw.daynight,
        source,
        days_ago: 0,
    }))
}

pub fn normalize_all(raws: Vec<RawDetection>, source: FirmsSource) -> Result<Vec<FireDetection>> {
    let mut detections = Vec::with_capacity(raws.len());
    for raw in raws {
        if let Some(detection) = normalize(raw, source)? {
            detections.push(detection);
        }
    }
    Ok(detections)
}

type DedupKey = (u64, u64, i64, String, Option<String>);

fn dedup_key(d: &FireDetection) -> DedupKey {
    (
        d.lat.to_bits(),
        d.lon.to_bits(),
        d.timestamp.timestamp(),
        d.confidence.clone(),
        d.version.clone(),
    )
}

/// Combine per-source batches into one list.
///
/// Low-confidence detections are dropped unless `include_low` is set, duplicates
/// (same position, time, confidence and product version) keep the last occurrence,
/// and the result is sorted by acquisition time with `days_ago` assigned.
pub fn merge_detections(
    batches: Vec<Vec<FireDetection>>,
    include_low: bool,
    today: NaiveDate,
) -> Vec<FireDetection> {
    let combined: Vec<FireDetection> = batches
        .into_iter()
        .flatten()
        .filter(|d| include_low || d.high_confidence)
        .collect();

    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut merged: Vec<FireDetection> = combined
        .into_iter()
        .rev()
        .filter(|d| seen.insert(dedup_key(d)))
        .collect();
    merged.reverse();

    merged.sort_by_key(|d| d.timestamp);
    assign_days_ago(&mut merged, today);
    merged
}

/// Dense rank of acquisition dates, newest first, starting at 1.
/// When the newest date is `today` everything shifts down so that today is 0.
pub fn assign_days_ago(detections: &mut [FireDetection], today: NaiveDate) {
    let mut dates: Vec<NaiveDate> = detections.iter().map(|d| d.timestamp.date_naive()).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some(newest) = dates.first().copied() else {
        return;
    };
    let offset = if newest == today { 0 } else { 1 };

    for detection in detections.iter_mut() {
        let date = detection.timestamp.date_naive();
        if let Some(rank) = dates.iter().position(|d| *d == date) {
            detection.days_ago = (rank + offset) as u32;
        }
    }
}
