use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Direction {
    ToAirport,
    FromAirport,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToAirport => "To Airport",
            Direction::FromAirport => "From Airport",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    /// Accepts "To Airport", "ToAirport", "to_airport", "from-airport" and friends.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "toairport" => Ok(Direction::ToAirport),
            "fromairport" => Ok(Direction::FromAirport),
            _ => Err(ValidationError::InvalidDirection(raw.to_string())),
        }
    }
}

/// A validated trip that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    pub phone: String,
    pub time: DateTime<Utc>,
    pub location: String,
    pub direction: Direction,
    pub city: String,
}

impl NewEntry {
    pub fn with_id(self, id: String) -> Entry {
        Entry {
            id,
            name: self.name,
            phone: self.phone,
            time: self.time,
            location: self.location,
            direction: self.direction,
            city: self.city,
        }
    }
}

/// A stored trip. Never updated; only removed by a retention sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub time: DateTime<Utc>,
    pub location: String,
    pub direction: Direction,
    pub city: String,
}

impl Entry {
    /// Everything but the id, for comparing against what was submitted.
    pub fn details(&self) -> NewEntry {
        NewEntry {
            name: self.name.clone(),
            phone: self.phone.clone(),
            time: self.time,
            location: self.location.clone(),
            direction: self.direction,
            city: self.city.clone(),
        }
    }
}

/// Closed interval of instants; both ends match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// AND-combination of the restrictions a search asked for. `None` means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPredicate {
    pub window: Option<TimeWindow>,
    pub direction: Option<Direction>,
    pub city: Option<String>,
}

impl EntryPredicate {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.window.map_or(true, |window| window.contains(entry.time))
            && self.direction.map_or(true, |direction| direction == entry.direction)
            && self.city.as_deref().map_or(true, |city| city == entry.city)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn entry(direction: Direction, city: &str) -> Entry {
        Entry {
            id: "e1".into(),
            name: "Asha".into(),
            phone: "98450".into(),
            time: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
            location: "Indiranagar".into(),
            direction,
            city: city.into(),
        }
    }

    #[test]
    fn direction_accepts_spellings() {
        for raw in ["To Airport", "ToAirport", "to_airport", " to-airport "] {
            assert_eq!(raw.parse::<Direction>().unwrap(), Direction::ToAirport);
        }
        assert_eq!(
            "From Airport".parse::<Direction>().unwrap(),
            Direction::FromAirport
        );
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(ValidationError::InvalidDirection(_))
        ));
    }

    #[test]
    fn direction_wire_form() {
        let json = serde_json::to_string(&Direction::FromAirport).unwrap();
        assert_eq!(json, "\"From Airport\"");
        let parsed: Direction = serde_json::from_str("\"ToAirport\"").unwrap();
        assert_eq!(parsed, Direction::ToAirport);
    }

    #[test]
    fn window_is_inclusive() {
        let t = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let window = TimeWindow {
            start: t,
            end: t + Duration::hours(2),
        };
        assert!(window.contains(t));
        assert!(window.contains(t + Duration::hours(2)));
        assert!(!window.contains(t - Duration::seconds(1)));
    }

    #[test]
    fn predicate_combines_with_and() {
        let e = entry(Direction::ToAirport, "Bengaluru");
        assert!(EntryPredicate::any().matches(&e));

        let direction_only = EntryPredicate {
            direction: Some(Direction::ToAirport),
            ..EntryPredicate::any()
        };
        assert!(direction_only.matches(&e));

        let both = EntryPredicate {
            city: Some("Delhi".into()),
            ..direction_only
        };
        assert!(!both.matches(&e));
    }

    #[test]
    fn serializes_time_as_rfc3339() {
        let value = serde_json::to_value(entry(Direction::ToAirport, "Delhi")).unwrap();
        assert_eq!(value["time"], "2024-01-10T08:00:00Z");
        assert_eq!(value["direction"], "To Airport");
        assert_eq!(value["id"], "e1");
    }
}
