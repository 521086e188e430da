use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Fixed(FixedOffset),
    /// IANA zone; follows daylight saving, e.g. `Europe/Amsterdam`.
    Named(Tz),
}

/// Formats backend timestamps as wall-clock `HH:MM` in the portal's display zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDisplay {
    zone: Zone,
}

impl Default for TimeDisplay {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeDisplay {
    pub fn utc() -> Self {
        Self {
            zone: Zone::Fixed(Utc.fix()),
        }
    }

    /// Offset in minutes east of UTC. Out-of-range offsets fall back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => Self {
                zone: Zone::Fixed(offset),
            },
            None => {
                tracing::warn!(target: "dura::render", minutes, "display offset out of range; using UTC");
                Self::utc()
            }
        }
    }

    /// Named IANA zone such as `Europe/Amsterdam`; `None` when the name is unknown.
    pub fn with_zone(name: &str) -> Option<Self> {
        match name.trim().parse::<Tz>() {
            Ok(tz) => Some(Self { zone: Zone::Named(tz) }),
            Err(e) => {
                tracing::warn!(target: "dura::render", zone = name, error = %e, "unknown time zone");
                None
            }
        }
    }

    /// `HH:MM` for an ISO 8601 timestamp; empty when absent or unparsable.
    pub fn format(&self, iso: Option<&str>) -> String {
        let Some(raw) = iso.map(str::trim).filter(|s| !s.is_empty()) else {
            return String::new();
        };
        let at = match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => at,
            Err(e) => {
                tracing::debug!(target: "dura::render", timestamp = raw, error = %e, "unparsable timestamp");
                return String::new();
            }
        };
        match self.zone {
            Zone::Fixed(offset) => at.with_timezone(&offset).format("%H:%M").to_string(),
            Zone::Named(tz) => at.with_timezone(&tz).format("%H:%M").to_string(),
        }
    }
}
