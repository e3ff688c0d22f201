//! Display formatting for raw catalog fields.
//!
//! Everything here is pure: no I/O, no clock, no timezone.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Image width tokens accepted by the catalog's image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    W92,
    W154,
    #[default]
    W185,
    W342,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_token(&self) -> &'static str {
        match self {
            ImageSize::W92 => "w92",
            ImageSize::W154 => "w154",
            ImageSize::W185 => "w185",
            ImageSize::W342 => "w342",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Pull the calendar date out of an ISO string without going through an
/// instant, so the day never shifts with the local offset.
fn parse_calendar_date(iso: &str) -> Option<NaiveDate> {
    let iso = iso.trim();
    let date_part = match iso.find('T') {
        Some(idx) => &iso[..idx],
        None => iso,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Format a release date as e.g. "January 15, 2024".
pub fn format_date(iso: &str) -> String {
    match parse_calendar_date(iso) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Year part of a release date, "N/A" when unknown.
pub fn release_year(iso: &str) -> String {
    parse_calendar_date(iso)
        .map(|d| d.format("%Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Round half up to one decimal place, always printing the tenths digit.
///
/// The rounding works on the shortest decimal form of the float, so `8.95`
/// rounds to `9.0` even though its binary value sits just below 8.95.
pub fn format_rating(rating: f64) -> String {
    if !rating.is_finite() {
        return format!("{:.1}", rating);
    }

    let sign = if rating < 0.0 { "-" } else { "" };
    // f64 Display never uses exponent notation
    let repr = rating.abs().to_string();
    let (whole, frac) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let Ok(whole) = whole.parse::<u64>() else {
        return format!("{:.1}", rating);
    };

    let mut digits = frac.bytes().map(|b| u64::from(b - b'0'));
    let tenths_digit = digits.next().unwrap_or(0);
    let round_up = digits.next().is_some_and(|d| d >= 5);

    let tenths = whole * 10 + tenths_digit + u64::from(round_up);
    let sign = if tenths == 0 { "" } else { sign };
    format!("{}{}.{}", sign, tenths / 10, tenths % 10)
}

/// Absolute image URL for a catalog-relative path, or `None` without a path.
pub fn format_image_url(path: Option<&str>, size: ImageSize, image_base: &str) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!(
        "{}/{}{}",
        image_base.trim_end_matches('/'),
        size.as_token(),
        path
    ))
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{} minutes", minutes)
}
