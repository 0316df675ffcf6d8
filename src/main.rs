#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Result, bail};
use clap::Parser;
use trailmark::cli::{Backend, Cli, Cmd};
use trailmark::collaborators::{Collaborators, FormFields, Geolocator};
use trailmark::database::SqliteStore;
use trailmark::storage::{BlobStore, DEFAULT_STORAGE_KEY, FileStore};
use trailmark::terminal::{
    ArgsForm, ExitHost, FixedPosition, GpxPosition, StderrNotifier, StdoutList, TerminalMap,
};
use trailmark::{SessionConfig, SessionController, WorkoutKind, gpx, utils};

#[macro_use]
extern crate trailmark;

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let config = SessionConfig {
        zoom: cli.zoom,
        storage_key: DEFAULT_STORAGE_KEY.to_string(),
    };
    let store = open_store(&cli, &config)?;
    dlog!(
        "store={} backend={:?} zoom={}",
        cli.store.display(),
        cli.backend,
        config.zoom
    );

    let mut geolocator: Box<dyn Geolocator> = match &cli.position_gpx {
        Some(path) => Box::new(GpxPosition(path.clone())),
        None => Box::new(FixedPosition(cli.here)),
    };

    let form = match &cli.cmd {
        Some(Cmd::Add {
            kind,
            distance,
            duration,
            cadence,
            elevation,
            ..
        }) => FormFields {
            kind: kind.clone(),
            distance: distance.clone(),
            duration: duration.clone(),
            cadence: cadence.clone(),
            elevation: elevation.clone(),
        },
        _ => FormFields::default(),
    };
    let listing = matches!(cli.cmd, None | Some(Cmd::List));

    let ui = Collaborators {
        map: Box::new(TerminalMap),
        form: Box::new(ArgsForm::new(form)),
        list: Box::new(StdoutList::new(!listing)),
        notifier: Box::new(StderrNotifier),
        host: Box::new(ExitHost),
    };
    let mut session = SessionController::new(store, ui, config);

    match cli.cmd {
        None | Some(Cmd::List) => {
            session.initialize(geolocator.as_mut());
            if session.workouts().is_empty() {
                println!("No workouts logged yet.");
            }
        }
        Some(Cmd::Add { at, kind, .. }) => {
            session.initialize(geolocator.as_mut());
            session.handle_map_click(at);
            if let Ok(kind) = kind.parse::<WorkoutKind>() {
                session.select_kind(kind);
            }
            match session.submit_form() {
                Ok(id) => {
                    if let Some(w) = session.find(id.as_str()) {
                        println!("{id}\t{}", utils::format_row(&w.summarize()));
                    }
                }
                Err(e) => bail!("workout not logged: {e}"),
            }
        }
        Some(Cmd::Show { id }) => {
            session.initialize(geolocator.as_mut());
            if session.find(&id).is_none() {
                eprintln!("No workout with id {id}");
            } else if !session.resolve_clicked_entity(&id) {
                eprintln!("No map to center; pass --here or --position-gpx");
            }
        }
        Some(Cmd::ExportGpx { out }) => {
            session.initialize(geolocator.as_mut());
            gpx::write_waypoints(&out, session.workouts())?;
            println!(
                "Wrote {} waypoints to {}",
                session.workouts().len(),
                out.display()
            );
        }
        Some(Cmd::Reset) => {
            session.reset_session()?;
            println!("Cleared stored workouts.");
        }
    }

    Ok(())
}

fn open_store(cli: &Cli, config: &SessionConfig) -> Result<Box<dyn BlobStore>> {
    let store: Box<dyn BlobStore> = match cli.backend {
        Backend::File => Box::new(FileStore::at(&cli.store)),
        Backend::Sqlite => Box::new(SqliteStore::open(&cli.store, &config.storage_key)?),
    };
    Ok(store)
}
