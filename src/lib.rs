pub mod cli;
pub mod codec;
pub mod collaborators;
pub mod controller;
pub mod database;
pub mod error;
pub mod gpx;
pub mod storage;
pub mod terminal;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use controller::{SessionConfig, SessionController, SessionState};
pub use error::{CodecError, DecodeAnomaly, GeolocationUnavailable, ValidationError};
pub use types::{Coords, Summary, Workout, WorkoutId, WorkoutKind};
