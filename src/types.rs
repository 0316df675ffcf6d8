use crate::error::ValidationError;
use chrono::{DateTime, Datelike, Local, Utc};
use std::fmt;
use std::str::FromStr;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id derived from a creation instant, in epoch milliseconds.
    pub fn from_instant(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `[lat, lng]` pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    /// Any finite pair is accepted. Map widgets report longitudes past
    /// +/-180 once the view has wrapped around the globe.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            lat: finite("latitude", lat)?,
            lng: finite("longitude", lng)?,
        })
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♀️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl FromStr for WorkoutKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant data. The derived metric is always computed from distance/duration
/// by the `Workout` constructors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Running { cadence: f64, pace: f64 },
    Cycling { elevation_gain: f64, speed: f64 },
}

impl Activity {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// min/km
    Pace(f64),
    /// km/h
    Speed(f64),
}

impl Metric {
    pub fn value(self) -> f64 {
        match self {
            Self::Pace(v) | Self::Speed(v) => v,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Pace(_) => "min/km",
            Self::Speed(_) => "km/h",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detail {
    /// steps/min
    Cadence(f64),
    /// meters
    Elevation(f64),
}

impl Detail {
    pub fn value(self) -> f64 {
        match self {
            Self::Cadence(v) | Self::Elevation(v) => v,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Cadence(_) => "spm",
            Self::Elevation(_) => "m",
        }
    }
}

/// Display fields of a workout.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub kind: WorkoutKind,
    pub distance: f64,
    pub duration: f64,
    pub metric: Metric,
    pub detail: Detail,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Utc>,
    coords: Coords,
    distance: f64,
    duration: f64,
    clicks: u32,
    description: String,
    activity: Activity,
}

impl Workout {
    pub fn running(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: f64,
    ) -> Result<Self, ValidationError> {
        let (distance, duration) = check_distance_duration(distance, duration)?;
        let cadence = positive("cadence", cadence)?;
        let activity = Activity::Running {
            cadence,
            pace: duration / distance,
        };
        Ok(Self::assemble(id, created_at, coords, distance, duration, activity))
    }

    /// Elevation may be zero or negative for descents; it only has to be finite.
    pub fn cycling(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Result<Self, ValidationError> {
        let (distance, duration) = check_distance_duration(distance, duration)?;
        let elevation_gain = finite("elevationGain", elevation_gain)?;
        let activity = Activity::Cycling {
            elevation_gain,
            speed: distance / (duration / 60.0),
        };
        Ok(Self::assemble(id, created_at, coords, distance, duration, activity))
    }

    fn assemble(
        id: WorkoutId,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        activity: Activity,
    ) -> Self {
        let description = describe(activity.kind(), created_at);
        Self {
            id,
            created_at,
            coords,
            distance,
            duration,
            clicks: 0,
            description,
            activity,
        }
    }

    /// Reattach state that was captured after construction: the visit
    /// counter and the description generated when the workout was logged.
    pub(crate) fn with_history(mut self, clicks: u32, description: Option<String>) -> Self {
        self.clicks = clicks;
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            self.description = description;
        }
        self
    }

    pub fn identify(&self) -> &WorkoutId {
        &self.id
    }

    pub fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn metric(&self) -> Metric {
        match self.activity {
            Activity::Running { pace, .. } => Metric::Pace(pace),
            Activity::Cycling { speed, .. } => Metric::Speed(speed),
        }
    }

    pub fn detail(&self) -> Detail {
        match self.activity {
            Activity::Running { cadence, .. } => Detail::Cadence(cadence),
            Activity::Cycling { elevation_gain, .. } => Detail::Elevation(elevation_gain),
        }
    }

    pub fn summarize(&self) -> Summary {
        Summary {
            kind: self.kind(),
            distance: self.distance,
            duration: self.duration,
            metric: self.metric(),
            detail: self.detail(),
            description: self.description.clone(),
        }
    }

    pub fn register_visit(&mut self) {
        self.clicks = self.clicks.saturating_add(1);
    }

    pub fn popup_text(&self) -> String {
        format!("{}{}", self.kind().icon(), self.description)
    }

    pub fn popup_class(&self) -> String {
        format!("{}-popup", self.kind().as_str())
    }
}

/// `"Running on April 14"`, using the local calendar date.
fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    let local = created_at.with_timezone(&Local);
    let month = MONTHS[local.month0() as usize];
    format!("{} on {month} {}", kind.display_name(), local.day())
}

fn check_distance_duration(distance: f64, duration: f64) -> Result<(f64, f64), ValidationError> {
    Ok((positive("distance", distance)?, positive("duration", duration)?))
}

pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
}
