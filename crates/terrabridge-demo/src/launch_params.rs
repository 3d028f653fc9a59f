//! Launch parameter parsing for the demo.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use terrabridge::config::{DEFAULT_DISTANCE, DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use terrabridge::{CoordinateSystem, MapConfig};

/// Key accepted by the synthetic engine.
const DEMO_API_KEY: &str = "00000000000000000000000000000000";

/// Coordinate system choice on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FrameArg {
    #[default]
    Local,
    Ecef,
}

impl From<FrameArg> for CoordinateSystem {
    fn from(arg: FrameArg) -> Self {
        match arg {
            FrameArg::Local => CoordinateSystem::LocalGrounded,
            FrameArg::Ecef => CoordinateSystem::Ecef,
        }
    }
}

impl fmt::Display for FrameArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameArg::Local => write!(f, "local"),
            FrameArg::Ecef => write!(f, "ecef"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Streams synthetic map tiles through terrabridge without a renderer")]
struct CliArgs {
    /// Starting latitude in degrees.
    #[arg(long, default_value_t = DEFAULT_LATITUDE)]
    lat: f64,

    /// Starting longitude in degrees.
    #[arg(long, default_value_t = DEFAULT_LONGITUDE)]
    lon: f64,

    /// Starting distance from the interest point in meters.
    #[arg(long, default_value_t = DEFAULT_DISTANCE)]
    distance: f64,

    /// Coordinate system objects are placed in.
    #[arg(long, value_enum, default_value_t = FrameArg::default())]
    frame: FrameArg,

    /// Frames to run per tour stop.
    #[arg(long, default_value_t = 180)]
    frames_per_stop: u32,

    /// Simulated seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// JSON map configuration; command-line values override its position.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Launch parameters for the demo.
#[derive(Debug)]
pub struct LaunchParams {
    pub map: MapConfig,
    pub frames_per_stop: u32,
    pub dt: f64,
}

/// Errors reading the launch parameters.
#[derive(Debug)]
pub enum LaunchError {
    Read(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::Read(e) => write!(f, "failed to read config: {e}"),
            LaunchError::Parse(e) => write!(f, "failed to parse config: {e}"),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Read(e) => Some(e),
            LaunchError::Parse(e) => Some(e),
        }
    }
}

/// Parse launch parameters from the command line.
pub fn parse() -> Result<LaunchParams, LaunchError> {
    from_args(CliArgs::parse())
}

fn from_args(args: CliArgs) -> Result<LaunchParams, LaunchError> {
    let mut map = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(LaunchError::Read)?;
            serde_json::from_str(&text).map_err(LaunchError::Parse)?
        }
        None => MapConfig {
            api_key: DEMO_API_KEY.to_owned(),
            ..MapConfig::default()
        },
    };
    map.latitude_degrees = args.lat;
    map.longitude_degrees = args.lon;
    map.distance_to_interest = args.distance;
    map.coordinate_system = args.frame.into();

    Ok(LaunchParams {
        map,
        frames_per_stop: args.frames_per_stop,
        dt: args.dt,
    })
}
