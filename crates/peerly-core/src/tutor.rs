//! Tutor and time slot domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

pub(crate) use string_id;

string_id!(
    /// Identifier of a tutor in the directory feed
    TutorId
);
string_id!(
    /// Identifier of a time slot, unique across the whole directory
    SlotId
);
string_id!(
    /// Identifier of a student (issued by the identity service)
    StudentId
);

/// A tutor as published by the profile/availability service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tutor {
    pub id: TutorId,
    pub name: String,
    pub staff_id: String,
    /// Subject codes in the order the tutor declared them
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default = "default_accepting")]
    pub accepting_students: bool,
    #[serde(default)]
    pub max_students: u32,
    #[serde(default)]
    pub current_students: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

fn default_accepting() -> bool {
    true
}

impl Tutor {
    pub fn teaches(&self, subject_code: &str) -> bool {
        self.subjects.iter().any(|s| s == subject_code)
    }

    /// Look up one of this tutor's published slots
    pub fn published_slot(&self, slot_id: &SlotId) -> Option<&TimeSlot> {
        self.published_slots().find(|slot| &slot.id == slot_id)
    }

    pub fn published_slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().filter(|slot| slot.published)
    }
}

/// A recurring weekly window a tutor offers for sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub mode: DeliveryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    /// Seats per session; the configured default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl TimeSlot {
    pub fn effective_capacity(&self, default_capacity: u32) -> u32 {
        self.capacity.unwrap_or(default_capacity)
    }

    /// Check the invariants the availability service promises for every slot
    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(Error::InvalidDirectory(format!(
                "slot {}: start {} is not before end {}",
                self.id, self.start, self.end
            )));
        }
        if self.capacity == Some(0) {
            return Err(Error::InvalidDirectory(format!(
                "slot {}: capacity must be positive",
                self.id
            )));
        }
        let has_location = self.location.as_deref().is_some_and(|l| !l.trim().is_empty());
        let has_link = self.meeting_link.as_deref().is_some_and(|l| !l.trim().is_empty());
        match self.mode {
            DeliveryMode::Offline if !has_location => Err(Error::InvalidDirectory(format!(
                "slot {}: offline slots need a location",
                self.id
            ))),
            DeliveryMode::Online | DeliveryMode::Both if !has_link => {
                Err(Error::InvalidDirectory(format!(
                    "slot {}: {} slots need a meeting link",
                    self.id, self.mode
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(alias = "monday")]
    Monday,
    #[serde(alias = "tuesday")]
    Tuesday,
    #[serde(alias = "wednesday")]
    Wednesday,
    #[serde(alias = "thursday")]
    Thursday,
    #[serde(alias = "friday")]
    Friday,
    #[serde(alias = "saturday")]
    Saturday,
    #[serde(alias = "sunday")]
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(s) || day.name()[..3].eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidValue(format!("unknown weekday '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Online,
    Offline,
    Both,
}

impl DeliveryMode {
    /// Whether a slot offered in this mode serves a student asking for `requested`.
    /// A `both` slot serves either kind of request.
    pub fn satisfies(self, requested: DeliveryMode) -> bool {
        self == requested || self == DeliveryMode::Both
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeliveryMode::Online => "online",
            DeliveryMode::Offline => "offline",
            DeliveryMode::Both => "both",
        })
    }
}

impl FromStr for DeliveryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(DeliveryMode::Online),
            "offline" => Ok(DeliveryMode::Offline),
            "both" => Ok(DeliveryMode::Both),
            other => Err(Error::InvalidValue(format!("unknown delivery mode '{}'", other))),
        }
    }
}

/// Time of day with minute precision, written as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    /// `24:00`, usable as the exclusive end of a band
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(24 * 60);

    pub fn from_hm(hour: u8, minute: u8) -> Result<Self> {
        if minute >= 60 || hour > 24 || (hour == 24 && minute != 0) {
            return Err(Error::InvalidValue(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self(u16::from(hour) * 60 + u16::from(minute)))
    }

    pub(crate) const fn from_minutes(minutes: u16) -> Self {
        Self(minutes)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidValue(s.to_string());
        let mut parts = s.trim().split(':');
        let hour = parts.next().and_then(|h| h.parse::<u8>().ok()).ok_or_else(invalid)?;
        let minute = parts.next().and_then(|m| m.parse::<u8>().ok()).ok_or_else(invalid)?;
        // Seconds are tolerated but must be zero
        if let Some(seconds) = parts.next() {
            if seconds.parse::<u8>().ok() != Some(0) || parts.next().is_some() {
                return Err(invalid());
            }
        }
        Self::from_hm(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(mode: DeliveryMode) -> TimeSlot {
        TimeSlot {
            id: SlotId::new("s1"),
            weekday: Weekday::Monday,
            start: "14:00".parse().unwrap(),
            end: "16:00".parse().unwrap(),
            mode,
            location: None,
            meeting_link: None,
            capacity: None,
            requires_approval: false,
            published: true,
        }
    }

    #[test]
    fn test_time_of_day_parsing() {
        let t: TimeOfDay = "09:30".parse().unwrap();
        assert_eq!(t.minutes(), 570);
        assert_eq!(t.to_string(), "09:30");
        assert_eq!("14:00:00".parse::<TimeOfDay>().unwrap().minutes(), 840);
        assert_eq!("24:00".parse::<TimeOfDay>().unwrap(), TimeOfDay::END_OF_DAY);

        assert!("25:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
        assert!("12:00:30".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_weekday_parsing() {
        assert_eq!("friday".parse::<Weekday>().unwrap(), Weekday::Friday);
        assert_eq!("Mon".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert!("Funday".parse::<Weekday>().is_err());

        let day: Weekday = serde_json::from_str("\"thursday\"").unwrap();
        assert_eq!(day, Weekday::Thursday);
    }

    #[test]
    fn test_both_mode_satisfies_either_request() {
        assert!(DeliveryMode::Both.satisfies(DeliveryMode::Online));
        assert!(DeliveryMode::Both.satisfies(DeliveryMode::Offline));
        assert!(DeliveryMode::Online.satisfies(DeliveryMode::Online));
        assert!(!DeliveryMode::Online.satisfies(DeliveryMode::Offline));
        assert!(!DeliveryMode::Offline.satisfies(DeliveryMode::Both));
    }

    #[test]
    fn test_slot_validation() {
        let mut online = slot(DeliveryMode::Online);
        assert!(online.validate().is_err());
        online.meeting_link = Some("https://meet.example.edu/abc".to_string());
        assert!(online.validate().is_ok());

        let mut offline = slot(DeliveryMode::Offline);
        offline.meeting_link = Some("https://meet.example.edu/abc".to_string());
        assert!(offline.validate().is_err());
        offline.location = Some("H6 - 101".to_string());
        assert!(offline.validate().is_ok());

        let mut inverted = offline.clone();
        inverted.end = "13:00".parse().unwrap();
        assert!(inverted.validate().is_err());

        let mut empty = offline;
        empty.capacity = Some(0);
        assert!(empty.validate().is_err());
    }
}
