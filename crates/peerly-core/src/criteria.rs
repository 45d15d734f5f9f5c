//! Search criteria for tutor discovery

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tutor::{DeliveryMode, TimeOfDay, Weekday};
use crate::{Error, Result};

/// Subject code the client sends when no subject is selected
pub const ALL_SUBJECTS: &str = "all";

/// Independently optional search facets.
///
/// An empty set (or `None`) means the facet places no constraint on the
/// result, it never means "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub subject_code: Option<String>,
    pub campuses: BTreeSet<String>,
    pub weekdays: BTreeSet<Weekday>,
    pub time_bands: Vec<TimeBand>,
    pub modes: BTreeSet<DeliveryMode>,
    /// Integer floors; bucket `r` covers ratings in `[r, r + 1)`
    pub rating_buckets: BTreeSet<u8>,
    /// Free text matched against tutor name and staff id
    pub query: Option<String>,
    pub use_recommendation: bool,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject_code: impl Into<String>) -> Self {
        self.subject_code = Some(subject_code.into());
        self
    }

    pub fn with_campus(mut self, campus: impl Into<String>) -> Self {
        self.campuses.insert(campus.into());
        self
    }

    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekdays.insert(weekday);
        self
    }

    pub fn with_time_band(mut self, band: TimeBand) -> Self {
        self.time_bands.push(band);
        self
    }

    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.modes.insert(mode);
        self
    }

    pub fn with_rating_bucket(mut self, bucket: u8) -> Self {
        self.rating_buckets.insert(bucket);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_recommendation(mut self, enabled: bool) -> Self {
        self.use_recommendation = enabled;
        self
    }

    /// The subject facet, ignoring blanks and the `all` sentinel
    pub fn subject(&self) -> Option<&str> {
        self.subject_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(ALL_SUBJECTS))
    }

    /// The text facet, lowercased, ignoring blanks
    pub fn text_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Campus tokens, lowercased, ignoring blanks
    pub fn campus_tokens(&self) -> Vec<String> {
        self.campuses
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Number of facets that constrain the result
    pub fn active_facets(&self) -> usize {
        [
            self.subject().is_some(),
            !self.campus_tokens().is_empty(),
            !self.weekdays.is_empty(),
            !self.time_bands.is_empty(),
            !self.modes.is_empty(),
            !self.rating_buckets.is_empty(),
            self.text_query().is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }
}

/// Half-open time-of-day range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeBandBounds")]
pub struct TimeBand {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

#[derive(Deserialize)]
struct TimeBandBounds {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<TimeBandBounds> for TimeBand {
    type Error = Error;

    fn try_from(bounds: TimeBandBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl TimeBand {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidValue(format!(
                "time band {}-{} is empty",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn morning() -> Self {
        Self::preset(7, 12)
    }

    pub fn afternoon() -> Self {
        Self::preset(12, 17)
    }

    pub fn evening() -> Self {
        Self::preset(17, 22)
    }

    fn preset(start_hour: u16, end_hour: u16) -> Self {
        Self {
            start: TimeOfDay::from_minutes(start_hour * 60),
            end: TimeOfDay::from_minutes(end_hour * 60),
        }
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start <= time && time < self.end
    }
}

impl fmt::Display for TimeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Accepts `morning`, `afternoon`, `evening` or an explicit `HH:MM-HH:MM`
impl FromStr for TimeBand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::morning()),
            "afternoon" => Ok(Self::afternoon()),
            "evening" => Ok(Self::evening()),
            range => {
                let (start, end) = range
                    .split_once('-')
                    .ok_or_else(|| Error::InvalidValue(format!("time band '{}'", s)))?;
                Self::new(start.parse()?, end.parse()?)
            }
        }
    }
}
