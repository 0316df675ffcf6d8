//! Seams between the session controller and the outside world.
//!
//! The controller only ever hands out owned copies (`ListEntry`, coordinates,
//! popup text); nothing here can reach into the repository.

use crate::error::GeolocationUnavailable;
use crate::types::{Coords, Summary, WorkoutId, WorkoutKind};

pub trait MapView {
    fn center(&mut self, coords: Coords, zoom: u8);
    fn add_marker(&mut self, coords: Coords, popup_text: &str, style_class: &str);
    /// Start delivering clicks to the host, which forwards them to
    /// `SessionController::handle_map_click`.
    fn subscribe_clicks(&mut self);
}

pub trait Geolocator {
    fn locate(&mut self) -> Result<Coords, GeolocationUnavailable>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Kind,
    Distance,
    Duration,
    Cadence,
    Elevation,
}

/// Raw form values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub kind: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

pub trait WorkoutForm {
    fn values(&self) -> FormFields;
    fn show(&mut self);
    fn hide(&mut self);
    fn clear(&mut self);
    fn focus(&mut self, field: FormField);
    /// Swap the cadence/elevation rows. Display only.
    fn toggle_fields_for_kind(&mut self, kind: WorkoutKind);
}

/// One list row.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub summary: Summary,
}

pub trait WorkoutList {
    /// Rendering the same entry twice is expected after a reload.
    fn render(&mut self, entry: ListEntry);
}

/// User-visible messages.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

pub trait Host {
    /// Start over with an empty session.
    fn restart(&mut self);
}

pub struct Collaborators {
    pub map: Box<dyn MapView>,
    pub form: Box<dyn WorkoutForm>,
    pub list: Box<dyn WorkoutList>,
    pub notifier: Box<dyn Notifier>,
    pub host: Box<dyn Host>,
}
