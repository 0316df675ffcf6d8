use crate::codec;
use crate::collaborators::{Collaborators, FormField, FormFields, Geolocator, ListEntry};
use crate::dlog;
use crate::error::{DecodeAnomaly, GeolocationUnavailable, ValidationError};
use crate::storage::{BlobStore, DEFAULT_STORAGE_KEY};
use crate::types::{Coords, Workout, WorkoutId, WorkoutKind};
use chrono::{DateTime, Utc};

pub const DEFAULT_ZOOM: u8 = 13;

pub const INVALID_INPUT_NOTICE: &str = "Inputs have to be positive numbers!";
pub const NO_POSITION_NOTICE: &str = "Could not get your position";
pub const SAVE_FAILED_NOTICE: &str = "Could not save your workouts";
pub const LOAD_FAILED_NOTICE: &str = "Could not load your saved workouts";
pub const RESET_FAILED_NOTICE: &str = "Could not clear your saved workouts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub zoom: u8,
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingFormInput { pending: Coords },
}

/// Owns the workouts of one session and reacts to UI events.
///
/// Every handler runs to completion; the only asynchronous input is the
/// geolocation result, delivered through [`Self::position_resolved`] whenever
/// it arrives. Until then the session works without a map.
pub struct SessionController {
    workouts: Vec<Workout>,
    pending: Option<Coords>,
    map_ready: bool,
    store: Box<dyn BlobStore>,
    ui: Collaborators,
    config: SessionConfig,
    clock: fn() -> DateTime<Utc>,
}

impl SessionController {
    pub fn new(store: Box<dyn BlobStore>, ui: Collaborators, config: SessionConfig) -> Self {
        Self {
            workouts: Vec::new(),
            pending: None,
            map_ready: false,
            store,
            ui,
            config,
            clock: Utc::now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.identify().as_str() == id)
    }

    pub fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    pub fn state(&self) -> SessionState {
        self.pending
            .map_or(SessionState::Idle, |pending| SessionState::AwaitingFormInput { pending })
    }

    pub fn initialize(&mut self, geolocator: &mut dyn Geolocator) -> Vec<DecodeAnomaly> {
        let position = geolocator.locate();
        self.position_resolved(position);
        self.load_persisted()
    }

    pub fn position_resolved(&mut self, position: Result<Coords, GeolocationUnavailable>) {
        match position {
            Ok(coords) => {
                tracing::info!(%coords, zoom = self.config.zoom, "map ready");
                self.ui.map.center(coords, self.config.zoom);
                self.ui.map.subscribe_clicks();
                self.map_ready = true;

                // Workouts loaded before the map existed only have list rows.
                for w in &self.workouts {
                    self.ui
                        .map
                        .add_marker(w.coords(), &w.popup_text(), &w.popup_class());
                }
            }
            Err(e) => {
                tracing::warn!(err = %e, "continuing without a map");
                self.ui.notifier.notify(NO_POSITION_NOTICE);
            }
        }
    }

    /// Replace the in-memory workouts with whatever the store holds.
    pub fn load_persisted(&mut self) -> Vec<DecodeAnomaly> {
        let blob = match self.store.load() {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                dlog!("no stored workouts");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(err = %format!("{e:#}"), "reading stored workouts failed");
                self.ui.notifier.notify(LOAD_FAILED_NOTICE);
                return Vec::new();
            }
        };

        let decoded = match codec::decode(&blob) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(err = %e, "ignoring unreadable stored workouts");
                return Vec::new();
            }
        };

        self.workouts = decoded.workouts;
        tracing::info!(
            loaded = self.workouts.len(),
            skipped = decoded.anomalies.len(),
            "restored workouts"
        );

        for w in &self.workouts {
            render(&mut self.ui, self.map_ready, w);
        }

        decoded.anomalies
    }

    /// Only the latest click is kept.
    pub fn handle_map_click(&mut self, coords: Coords) {
        if let Some(previous) = self.pending.replace(coords) {
            dlog!("pending click replaced previous={previous} next={coords}");
        }
        self.ui.form.show();
        self.ui.form.focus(FormField::Distance);
    }

    pub fn select_kind(&mut self, kind: WorkoutKind) {
        self.ui.form.toggle_fields_for_kind(kind);
    }

    pub fn cancel_form(&mut self) {
        self.pending = None;
        self.hide_form();
    }

    pub fn submit_form(&mut self) -> Result<WorkoutId, ValidationError> {
        let fields = self.ui.form.values();
        let workout = match self.build_workout(&fields) {
            Ok(w) => w,
            Err(e) => {
                tracing::info!(err = %e, "rejected workout form");
                let message = match &e {
                    ValidationError::NotFinite { .. } | ValidationError::NotPositive { .. } => {
                        INVALID_INPUT_NOTICE.to_string()
                    }
                    other => other.to_string(),
                };
                self.ui.notifier.notify(&message);
                return Err(e);
            }
        };

        let id = workout.identify().clone();
        tracing::info!(%id, kind = %workout.kind(), "logged workout");

        render(&mut self.ui, self.map_ready, &workout);
        self.workouts.push(workout);
        self.pending = None;
        self.hide_form();
        self.persist();

        Ok(id)
    }

    /// A click on a list row. Unknown ids are ignored.
    pub fn resolve_clicked_entity(&mut self, dom_id: &str) -> bool {
        let Some(workout) = self.workouts.iter().find(|w| w.identify().as_str() == dom_id) else {
            dlog!("list click for unknown id={dom_id}");
            return false;
        };

        if !self.map_ready {
            dlog!("list click without map id={dom_id}");
            return false;
        }

        self.ui.map.center(workout.coords(), self.config.zoom);
        true
    }

    /// Wipe storage and restart. A failed clear leaves the session as it was.
    pub fn reset_session(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.store.clear() {
            tracing::error!(err = %format!("{e:#}"), "clearing stored workouts failed");
            self.ui.notifier.notify(RESET_FAILED_NOTICE);
            return Err(e.context("clearing stored workouts"));
        }
        self.workouts.clear();
        self.pending = None;
        tracing::info!("session reset");
        self.ui.host.restart();
        Ok(())
    }

    fn build_workout(&self, fields: &FormFields) -> Result<Workout, ValidationError> {
        let coords = self.pending.ok_or(ValidationError::NoPendingLocation)?;
        let kind: WorkoutKind = fields.kind.trim().parse()?;
        let distance = parse_number(&fields.distance);
        let duration = parse_number(&fields.duration);

        let now = (self.clock)();
        let id = self.next_id(now);

        match kind {
            WorkoutKind::Running => {
                let cadence = parse_number(&fields.cadence);
                Workout::running(id, now, coords, distance, duration, cadence)
            }
            WorkoutKind::Cycling => {
                let elevation = parse_number(&fields.elevation);
                Workout::cycling(id, now, coords, distance, duration, elevation)
            }
        }
    }

    /// Creation time in epoch ms, bumped past any id already in use.
    fn next_id(&self, now: DateTime<Utc>) -> WorkoutId {
        let mut candidate = now.timestamp_millis();
        loop {
            let id = WorkoutId::new(candidate.to_string());
            if self.workouts.iter().all(|w| w.identify() != &id) {
                return id;
            }
            candidate = candidate.saturating_add(1);
        }
    }

    fn hide_form(&mut self) {
        self.ui.form.hide();
        self.ui.form.clear();
    }

    fn persist(&mut self) {
        let blob = match codec::encode(&self.workouts) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!(err = %e, "encoding workouts failed");
                self.ui.notifier.notify(SAVE_FAILED_NOTICE);
                return;
            }
        };

        if let Err(e) = self.store.save(&blob) {
            tracing::error!(err = %format!("{e:#}"), "saving workouts failed");
            self.ui.notifier.notify(SAVE_FAILED_NOTICE);
        }
    }
}

fn render(ui: &mut Collaborators, map_ready: bool, w: &Workout) {
    if map_ready {
        ui.map
            .add_marker(w.coords(), &w.popup_text(), &w.popup_class());
    }
    ui.list.render(ListEntry {
        id: w.identify().clone(),
        summary: w.summarize(),
    });
}

/// Empty or unparsable input becomes NaN and fails validation.
fn parse_number(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return f64::NAN;
    }
    raw.parse().unwrap_or(f64::NAN)
}
