use thiserror::Error;

/// Rejected user or stored input. Never mutates session state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("unknown workout type: {0:?}")]
    UnknownKind(String),
    #[error("no map location selected")]
    NoPendingLocation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("geolocation unavailable: {0}")]
pub struct GeolocationUnavailable(pub String);

/// A stored record that was skipped while loading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeAnomaly {
    #[error("record {index} is malformed: {reason}")]
    NotARecord { index: usize, reason: String },
    #[error("record {index} has unknown type {kind:?}")]
    UnknownKind { index: usize, kind: String },
    #[error("record {index} repeats id {id}")]
    DuplicateId { index: usize, id: String },
    #[error("record {index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

impl DecodeAnomaly {
    pub fn index(&self) -> usize {
        match self {
            Self::NotARecord { index, .. }
            | Self::UnknownKind { index, .. }
            | Self::DuplicateId { index, .. }
            | Self::Invalid { index, .. } => *index,
        }
    }
}

/// The stored blob as a whole could not be used.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("stored workouts are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored workouts must be a JSON array, found {0}")]
    NotAnArray(&'static str),
}
