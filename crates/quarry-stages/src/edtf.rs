//! EDTF to Solr date conversion
//!
//! Supports the parts of the Extended Date/Time Format that have a Solr
//! `DateRangeField` equivalent:
//!
//! - years, year-months and full dates, with an optional leading `-`
//! - `X` for unspecified digits (`19XX`, `1984-XX`), turned into ranges
//! - `?`, `~` and `%` qualifiers, on the whole value or on components
//! - seasons `21`–`24` in the month position
//! - intervals `A/B`, where an empty side is unknown and `..` is open
//! - date-times, normalised to UTC
//!
//! Years outside `-9999..=9999` (`Y` years, five or more digits, exponents)
//! are valid EDTF but have no Solr representation.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdtfError {
    #[error("\"{0}\" is not a valid EDTF string")]
    Parse(String),

    #[error("\"{value}\" cannot be represented as a Solr date: {reason}")]
    Unsupported { value: String, reason: &'static str },
}

const OUT_OF_RANGE: &str = "Solr does not support years outside the range -9999 to 9999";

/// A converted EDTF value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrDate {
    /// Solr date or `[lower TO upper]` range
    pub value: String,
    pub is_uncertain: bool,
    pub is_approximate: bool,
    pub is_uncertain_and_approximate: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct Qualifiers {
    uncertain: bool,
    approximate: bool,
    both: bool,
}

impl Qualifiers {
    fn merge(self, other: Self) -> Self {
        Self {
            uncertain: self.uncertain || other.uncertain,
            approximate: self.approximate || other.approximate,
            both: self.both || other.both,
        }
    }
}

/// Remove every qualifier character, remembering which were present
fn strip_qualifiers(value: &str) -> (String, Qualifiers) {
    let mut q = Qualifiers::default();
    let stripped = value
        .chars()
        .filter(|c| match c {
            '?' => {
                q.uncertain = true;
                false
            }
            '~' => {
                q.approximate = true;
                false
            }
            '%' => {
                q.both = true;
                q.uncertain = true;
                q.approximate = true;
                false
            }
            _ => true,
        })
        .collect();
    (stripped, q)
}

/// One date with its possible `X` digits resolved into bounds
#[derive(Debug, Clone)]
struct DateBounds {
    /// Normalised text, qualifiers removed
    text: String,
    lower: NaiveDate,
    upper: NaiveDate,
    /// Whether the value denotes a span rather than a plain date
    ranged: bool,
}

fn parse_err(value: &str) -> EdtfError {
    EdtfError::Parse(value.to_string())
}

fn last_day(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
}

/// Bounds of a digit string with `X` placeholders
fn digit_bounds(digits: &str) -> Option<(u32, u32)> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == 'X') {
        return None;
    }
    let low = digits.replace('X', "0").parse().ok()?;
    let high = digits.replace('X', "9").parse().ok()?;
    Some((low, high))
}

fn parse_year(original: &str, text: &str) -> Result<(i32, i32), EdtfError> {
    if text.starts_with('Y') || text.contains('E') {
        let digits = text.trim_start_matches('Y').trim_start_matches('-');
        if digits.chars().all(|c| c.is_ascii_digit() || c == 'E' || c == 'S') && !digits.is_empty() {
            return Err(EdtfError::Unsupported {
                value: original.to_string(),
                reason: OUT_OF_RANGE,
            });
        }
        return Err(parse_err(original));
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.len() > 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(EdtfError::Unsupported {
            value: original.to_string(),
            reason: OUT_OF_RANGE,
        });
    }
    if digits.len() != 4 {
        return Err(parse_err(original));
    }
    let (low, high) = digit_bounds(digits).ok_or_else(|| parse_err(original))?;
    let (low, high) = (low as i32, high as i32);
    Ok(if negative { (-high, -low) } else { (low, high) })
}

/// Season months to the span they cover, as (start month, end month, end
/// year offset)
fn season_span(season: u32) -> Option<(u32, u32, i32)> {
    match season {
        21 => Some((3, 5, 0)),
        22 => Some((6, 8, 0)),
        23 => Some((9, 11, 0)),
        24 => Some((12, 2, 1)),
        _ => None,
    }
}

/// Parse a date without time or interval syntax. `text` has its qualifiers
/// already removed.
fn parse_date(original: &str, text: &str) -> Result<DateBounds, EdtfError> {
    // A leading '-' belongs to the year
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let mut parts = body.split('-');
    let year_text = format!("{sign}{}", parts.next().unwrap_or_default());
    let month_text = parts.next();
    let day_text = parts.next();
    if parts.next().is_some() {
        return Err(parse_err(original));
    }

    let (year_low, year_high) = parse_year(original, &year_text)?;
    let mut ranged = year_low != year_high;

    let (lower, upper) = match (month_text, day_text) {
        (None, _) => (
            NaiveDate::from_ymd_opt(year_low, 1, 1),
            NaiveDate::from_ymd_opt(year_high, 12, 31),
        ),
        (Some(month), None) if month.len() == 2 && month.starts_with('2') && !month.contains('X') => {
            let season: u32 = month.parse().map_err(|_| parse_err(original))?;
            let (start, end, offset) = season_span(season).ok_or_else(|| parse_err(original))?;
            ranged = true;
            let end_year = year_high + offset;
            (
                NaiveDate::from_ymd_opt(year_low, start, 1),
                last_day(end_year, end).and_then(|d| NaiveDate::from_ymd_opt(end_year, end, d)),
            )
        }
        (Some(month), day) => {
            if month.len() != 2 {
                return Err(parse_err(original));
            }
            let (m_low, m_high) = digit_bounds(month).ok_or_else(|| parse_err(original))?;
            if month.contains('X') {
                ranged = true;
            } else if !(1..=12).contains(&m_low) {
                return Err(parse_err(original));
            }
            let (m_low, m_high) = (m_low.clamp(1, 12), m_high.clamp(1, 12));
            let high_last = last_day(year_high, m_high).ok_or_else(|| parse_err(original))?;

            match day {
                None => (
                    NaiveDate::from_ymd_opt(year_low, m_low, 1),
                    NaiveDate::from_ymd_opt(year_high, m_high, high_last),
                ),
                Some(day) => {
                    if day.len() != 2 {
                        return Err(parse_err(original));
                    }
                    let (d_low, d_high) = digit_bounds(day).ok_or_else(|| parse_err(original))?;
                    if day.contains('X') {
                        ranged = true;
                    }
                    (
                        NaiveDate::from_ymd_opt(year_low, m_low, d_low.max(1)),
                        NaiveDate::from_ymd_opt(year_high, m_high, d_high.clamp(1, high_last)),
                    )
                }
            }
        }
    };

    match (lower, upper) {
        (Some(lower), Some(upper)) => Ok(DateBounds {
            text: text.to_string(),
            lower,
            upper,
            ranged,
        }),
        _ => Err(parse_err(original)),
    }
}

fn format_date(date: NaiveDate) -> String {
    let year = date.year();
    if year < 0 {
        format!("-{:04}-{:02}-{:02}", -year, date.month(), date.day())
    } else {
        format!("{:04}-{:02}-{:02}", year, date.month(), date.day())
    }
}

fn parse_datetime(original: &str, text: &str) -> Result<String, EdtfError> {
    let utc = match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
            .map_err(|_| parse_err(original))?
            .and_utc(),
    };
    Ok(utc.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// One side of an interval
fn interval_side(original: &str, side: &str, upper: bool) -> Result<(String, Qualifiers), EdtfError> {
    if side.is_empty() || side == ".." {
        return Ok(("*".to_string(), Qualifiers::default()));
    }
    let (text, q) = strip_qualifiers(side);
    let bounds = parse_date(original, &text)?;
    let value = if bounds.ranged {
        format_date(if upper { bounds.upper } else { bounds.lower })
    } else {
        bounds.text
    };
    Ok((value, q))
}

/// Convert an EDTF string into a Solr date or date range
pub fn solr_date(value: &str) -> Result<SolrDate, EdtfError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(parse_err(value));
    }

    let (solr, q) = if let Some((start, end)) = trimmed.split_once('/') {
        if end.contains('/') || (start.is_empty() && end.is_empty()) {
            return Err(parse_err(value));
        }
        let (lower, lq) = interval_side(value, start, false)?;
        let (upper, uq) = interval_side(value, end, true)?;
        (format!("[{lower} TO {upper}]"), lq.merge(uq))
    } else if trimmed.contains('T') {
        (parse_datetime(value, trimmed)?, Qualifiers::default())
    } else {
        let (text, q) = strip_qualifiers(trimmed);
        let bounds = parse_date(value, &text)?;
        let solr = if bounds.ranged {
            format!(
                "[{} TO {}]",
                format_date(bounds.lower),
                format_date(bounds.upper)
            )
        } else {
            bounds.text
        };
        (solr, q)
    };

    Ok(SolrDate {
        value: solr,
        is_uncertain: q.uncertain,
        is_approximate: q.approximate,
        is_uncertain_and_approximate: q.both || (q.uncertain && q.approximate),
    })
}
