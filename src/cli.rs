use crate::controller::DEFAULT_ZOOM;
use crate::types::Coords;
use crate::utils::parse_coords;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const DEFAULT_STORE: &str = "workouts.json";

#[derive(Parser, Debug)]
#[command(
    name = "trailmark",
    about = "Log running and cycling workouts at map locations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,

    /// Storage file: a JSON blob for `--backend file`, a SQLite database for `--backend sqlite`.
    #[arg(
        long,
        global = true,
        env = "TRAILMARK_STORE",
        value_name = "PATH",
        default_value = DEFAULT_STORE
    )]
    pub store: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = Backend::File)]
    pub backend: Backend,

    /// Map zoom level used when centering.
    #[arg(long, global = true, default_value_t = DEFAULT_ZOOM)]
    pub zoom: u8,

    /// Your current position, as LAT,LNG. Without it (or --position-gpx) there is no map.
    #[arg(long, global = true, value_name = "LAT,LNG", value_parser = parse_coords, allow_hyphen_values = true)]
    pub here: Option<Coords>,

    /// Take the current position from the first point of a GPX file.
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "here")]
    pub position_gpx: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    File,
    Sqlite,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print logged workouts (the default).
    List,

    /// Log a workout at a map location.
    Add {
        /// Where on the map the workout happened, as LAT,LNG.
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_coords, allow_hyphen_values = true)]
        at: Coords,

        /// `running` or `cycling`.
        #[arg(long, default_value = "running")]
        kind: String,

        /// Kilometers.
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        distance: String,

        /// Minutes.
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        duration: String,

        /// Steps per minute (running).
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        cadence: String,

        /// Elevation gain in meters (cycling); may be negative.
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        elevation: String,
    },

    /// Center the map on a logged workout.
    Show {
        /// Workout id as printed by `list`.
        id: String,
    },

    /// Write every workout marker to a GPX file as waypoints.
    ExportGpx {
        #[arg(value_name = "OUT")]
        out: PathBuf,
    },

    /// Delete all stored workouts.
    Reset,
}
