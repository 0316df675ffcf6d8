//! Recording collaborators for controller tests.

use crate::collaborators::{
    Collaborators, FormField, FormFields, Geolocator, Host, ListEntry, MapView, Notifier,
    WorkoutForm, WorkoutList,
};
use crate::controller::{SessionConfig, SessionController};
use crate::error::GeolocationUnavailable;
use crate::storage::{BlobStore, MemoryStore};
use crate::types::{Coords, WorkoutKind};
use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Center(Coords, u8),
    Marker(Coords, String, String),
    Subscribe,
    FormShow,
    FormHide,
    FormClear,
    Focus(FormField),
    Toggle(WorkoutKind),
    Render(ListEntry),
    Notify(String),
    Restart,
}

type Log = Rc<RefCell<Vec<Event>>>;

pub fn fixed_now() -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2024, 4, 14, 12, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

struct Recorder(Log);

impl Recorder {
    fn push(&self, e: Event) {
        self.0.borrow_mut().push(e);
    }
}

impl MapView for Recorder {
    fn center(&mut self, coords: Coords, zoom: u8) {
        self.push(Event::Center(coords, zoom));
    }

    fn add_marker(&mut self, coords: Coords, popup_text: &str, style_class: &str) {
        self.push(Event::Marker(
            coords,
            popup_text.to_string(),
            style_class.to_string(),
        ));
    }

    fn subscribe_clicks(&mut self) {
        self.push(Event::Subscribe);
    }
}

impl WorkoutList for Recorder {
    fn render(&mut self, entry: ListEntry) {
        self.push(Event::Render(entry));
    }
}

impl Notifier for Recorder {
    fn notify(&mut self, message: &str) {
        self.push(Event::Notify(message.to_string()));
    }
}

impl Host for Recorder {
    fn restart(&mut self) {
        self.push(Event::Restart);
    }
}

struct Form {
    log: Log,
    fields: Rc<RefCell<FormFields>>,
}

impl WorkoutForm for Form {
    fn values(&self) -> FormFields {
        self.fields.borrow().clone()
    }

    fn show(&mut self) {
        self.log.borrow_mut().push(Event::FormShow);
    }

    fn hide(&mut self) {
        self.log.borrow_mut().push(Event::FormHide);
    }

    fn clear(&mut self) {
        let mut f = self.fields.borrow_mut();
        f.distance.clear();
        f.duration.clear();
        f.cadence.clear();
        f.elevation.clear();
        self.log.borrow_mut().push(Event::FormClear);
    }

    fn focus(&mut self, field: FormField) {
        self.log.borrow_mut().push(Event::Focus(field));
    }

    fn toggle_fields_for_kind(&mut self, kind: WorkoutKind) {
        self.log.borrow_mut().push(Event::Toggle(kind));
    }
}

/// Store handle shared between the controller and the test. Writes fail
/// once `fail` is set; reads keep working.
#[derive(Clone)]
struct SharedStore {
    inner: Rc<RefCell<MemoryStore>>,
    fail: Rc<Cell<bool>>,
}

impl SharedStore {
    fn check(&self) -> Result<()> {
        if self.fail.get() {
            anyhow::bail!("disk full");
        }
        Ok(())
    }
}

impl BlobStore for SharedStore {
    fn load(&self) -> Result<Option<String>> {
        self.inner.borrow().load()
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        self.check()?;
        self.inner.borrow_mut().save(blob)
    }

    fn clear(&mut self) -> Result<()> {
        self.check()?;
        self.inner.borrow_mut().clear()
    }
}

pub struct FixedGeolocator(Result<Coords, GeolocationUnavailable>);

impl FixedGeolocator {
    pub fn at(coords: Coords) -> Self {
        Self(Ok(coords))
    }

    pub fn unavailable() -> Self {
        Self(Err(GeolocationUnavailable("permission denied".into())))
    }
}

impl Geolocator for FixedGeolocator {
    fn locate(&mut self) -> Result<Coords, GeolocationUnavailable> {
        self.0.clone()
    }
}

pub struct Harness {
    pub controller: SessionController,
    log: Log,
    fields: Rc<RefCell<FormFields>>,
    store: SharedStore,
}

impl Harness {
    pub fn new(store: MemoryStore) -> Self {
        let log: Log = Rc::default();
        let fields = Rc::new(RefCell::new(FormFields::default()));
        let store = SharedStore {
            inner: Rc::new(RefCell::new(store)),
            fail: Rc::default(),
        };

        let ui = Collaborators {
            map: Box::new(Recorder(log.clone())),
            form: Box::new(Form {
                log: log.clone(),
                fields: fields.clone(),
            }),
            list: Box::new(Recorder(log.clone())),
            notifier: Box::new(Recorder(log.clone())),
            host: Box::new(Recorder(log.clone())),
        };
        let controller =
            SessionController::new(Box::new(store.clone()), ui, SessionConfig::default())
                .with_clock(fixed_now);

        Self {
            controller,
            log,
            fields,
            store,
        }
    }

    pub fn fill(&self, kind: &str, distance: &str, duration: &str, cadence: &str, elevation: &str) {
        *self.fields.borrow_mut() = FormFields {
            kind: kind.to_string(),
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: cadence.to_string(),
            elevation: elevation.to_string(),
        };
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn fail_storage(&self) {
        self.store.fail.set(true);
    }

    pub fn stored_blob(&self) -> Option<String> {
        self.store.load().unwrap()
    }
}
