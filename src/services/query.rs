use std::sync::Arc;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::{
    error::{AppError, ValidationError},
    models::{
        CreateEntryRequest, Direction, Entry, EntryPredicate, NewEntry, SearchParams, TimeWindow,
    },
};

use super::storage::EntryStore;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Validates input, turns filters into predicates and applies retention.
/// Holds no per-request state.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn EntryStore>,
    retention: Months,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn EntryStore>, retention_months: u32) -> Self {
        Self {
            store,
            retention: Months::new(retention_months),
        }
    }

    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    pub async fn create(&self, request: CreateEntryRequest) -> Result<Entry, AppError> {
        let candidate = validate(request)?;
        let entry = self.store.insert(candidate).await?;
        info!(
            entry_id = %entry.id,
            city = %entry.city,
            direction = %entry.direction,
            "entry created"
        );
        Ok(entry)
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Entry>, AppError> {
        let predicate = build_predicate(params)?;
        let entries = self.store.find(&predicate).await?;
        debug!(?predicate, matched = entries.len(), "entries searched");
        Ok(entries)
    }

    pub async fn prune_stale(&self) -> Result<u64, AppError> {
        self.prune_stale_at(Utc::now()).await
    }

    pub async fn prune_stale_at(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = retention_cutoff(now, self.retention);
        let deleted = self.store.delete_where(cutoff).await?;
        info!(%cutoff, deleted, "stale entries pruned");
        Ok(deleted)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

pub fn validate(request: CreateEntryRequest) -> Result<NewEntry, ValidationError> {
    let name = required(request.name, "name")?;
    let phone = required(request.phone, "phone")?;
    let raw_time = required(request.time, "time")?;
    let location = required(request.location, "location")?;
    let city = required(request.city, "city")?;

    let time = parse_instant(&raw_time).ok_or(ValidationError::InvalidTime(raw_time))?;
    // Absent direction falls back to the booking form's preselected value.
    let direction = match present(&request.direction) {
        Some(raw) => raw.parse()?,
        None => Direction::ToAirport,
    };

    Ok(NewEntry {
        name,
        phone,
        time,
        location,
        direction,
        city,
    })
}

/// Parses an RFC 3339 instant (seconds optional), an offset-less local
/// datetime (read as UTC) or a bare date (UTC midnight). Sub-millisecond
/// precision is dropped.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let instant = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z"))
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            let naive = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;
    DateTime::from_timestamp_millis(instant.timestamp_millis())
}

/// Hours of tolerance around the anchor. Reads the leading integer the way a
/// browser form value is usually read ("2.5" is 2, "3h" is 3); anything without
/// one, or negative, is 0. Oversized values saturate.
///
/// A signed parse would turn "-3" into an inverted window that matches
/// nothing; here it reads as 0, an exact-instant match.
pub fn parse_range_hours(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return 0;
    };
    let unsigned = raw.strip_prefix('+').unwrap_or(raw);
    let digits: &str = &unsigned[..unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len())];
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// `[anchor - hours, anchor + hours]`, clamped to the representable range.
pub fn window_around(anchor: DateTime<Utc>, hours: u32) -> TimeWindow {
    let Some(delta) = TimeDelta::try_hours(i64::from(hours)) else {
        return TimeWindow {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        };
    };
    TimeWindow {
        start: anchor
            .checked_sub_signed(delta)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        end: anchor
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn build_predicate(params: &SearchParams) -> Result<EntryPredicate, ValidationError> {
    let window = match present(&params.datetime) {
        Some(raw) => {
            let anchor = parse_instant(raw)
                .ok_or_else(|| ValidationError::InvalidAnchor(raw.to_string()))?;
            Some(window_around(anchor, parse_range_hours(params.range.as_deref())))
        }
        None => None,
    };
    let direction = present(&params.direction)
        .map(str::parse::<Direction>)
        .transpose()?;
    let city = present(&params.city).map(str::to_string);

    Ok(EntryPredicate {
        window,
        direction,
        city,
    })
}

/// `now` minus the retention period in calendar months. Day-of-month is
/// clamped to the target month's length.
pub fn retention_cutoff(now: DateTime<Utc>, retention: Months) -> DateTime<Utc> {
    now.checked_sub_months(retention)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
