//! Terminal stand-ins for the map, form, list and notice UI.

use crate::collaborators::{
    FormField, FormFields, Geolocator, Host, ListEntry, MapView, Notifier, WorkoutForm,
    WorkoutList,
};
use crate::dlog;
use crate::error::GeolocationUnavailable;
use crate::gpx;
use crate::types::{Coords, WorkoutKind};
use crate::utils::format_row;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct TerminalMap;

impl MapView for TerminalMap {
    fn center(&mut self, coords: Coords, zoom: u8) {
        println!("map: centered on {coords} (zoom {zoom})");
    }

    fn add_marker(&mut self, coords: Coords, popup_text: &str, style_class: &str) {
        dlog!("marker at={coords} popup={popup_text:?} class={style_class}");
    }

    fn subscribe_clicks(&mut self) {
        dlog!("map clicks come from the command line");
    }
}

/// Form whose values come from command-line arguments.
#[derive(Debug, Default)]
pub struct ArgsForm {
    fields: FormFields,
}

impl ArgsForm {
    pub fn new(fields: FormFields) -> Self {
        Self { fields }
    }
}

impl WorkoutForm for ArgsForm {
    fn values(&self) -> FormFields {
        self.fields.clone()
    }

    fn show(&mut self) {
        dlog!("form shown");
    }

    fn hide(&mut self) {
        dlog!("form hidden");
    }

    fn clear(&mut self) {
        self.fields = FormFields {
            kind: std::mem::take(&mut self.fields.kind),
            ..FormFields::default()
        };
    }

    fn focus(&mut self, field: FormField) {
        dlog!("form focus field={field:?}");
    }

    fn toggle_fields_for_kind(&mut self, kind: WorkoutKind) {
        dlog!("form fields for kind={kind}");
    }
}

/// Prints one row per workout; a quiet list only logs.
#[derive(Debug, Default)]
pub struct StdoutList {
    quiet: bool,
}

impl StdoutList {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl WorkoutList for StdoutList {
    fn render(&mut self, entry: ListEntry) {
        let row = format_row(&entry.summary);
        if self.quiet {
            dlog!("row id={} {row}", entry.id);
        } else {
            println!("{}\t{row}", entry.id);
        }
    }
}

#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

#[derive(Debug, Default)]
pub struct ExitHost;

impl Host for ExitHost {
    fn restart(&mut self) {
        tracing::info!("next run starts with an empty session");
    }
}

/// Position given on the command line, if any.
#[derive(Debug, Clone)]
pub struct FixedPosition(pub Option<Coords>);

impl Geolocator for FixedPosition {
    fn locate(&mut self) -> Result<Coords, GeolocationUnavailable> {
        self.0
            .ok_or_else(|| GeolocationUnavailable("no position given".to_string()))
    }
}

/// First point of a GPX track.
#[derive(Debug, Clone)]
pub struct GpxPosition(pub PathBuf);

impl Geolocator for GpxPosition {
    fn locate(&mut self) -> Result<Coords, GeolocationUnavailable> {
        let point = gpx::first_point(&self.0)
            .map_err(|e| GeolocationUnavailable(format!("{e:#}")))?
            .ok_or_else(|| {
                GeolocationUnavailable(format!("no points in {}", self.0.display()))
            })?;
        Coords::new(point.lat, point.lon).map_err(|e| GeolocationUnavailable(e.to_string()))
    }
}
