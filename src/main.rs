use argh::FromArgs;
use log::{info, warn};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use triangulation::api::formatting::{CsvFormatter, JsonFormatter};
use triangulation::api::types::InputDocument;
use triangulation::core::types::GeoPosition;
use triangulation::processing::pipeline::GeolocationPipeline;
use triangulation::utils::config::PipelineConfig;
use triangulation::utils::logging::init_logger;

#[derive(FromArgs)]
/// Geolocate a detected object from drone photographs and plan an inspection path
struct Args {
    /// input document with detections and metadata per image
    #[argh(positional)]
    input: PathBuf,

    /// pipeline configuration (JSON)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// write the JSON report here instead of stdout
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// write the flight plan as CSV
    #[argh(option)]
    csv: Option<PathBuf>,

    /// drone latitude used to orient the plan
    #[argh(option)]
    drone_lat: Option<f64>,

    /// drone longitude used to orient the plan
    #[argh(option)]
    drone_lon: Option<f64>,

    /// drone altitude used to orient the plan
    #[argh(option)]
    drone_alt: Option<f64>,
}

fn drone_position(args: &Args) -> Result<Option<GeoPosition>, Box<dyn Error>> {
    match (args.drone_lat, args.drone_lon, args.drone_alt) {
        (None, None, None) => Ok(None),
        (Some(lat), Some(lon), Some(alt)) => Ok(Some(GeoPosition::new(lat, lon, alt)?)),
        _ => Err("--drone-lat, --drone-lon and --drone-alt must be given together".into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let drone = drone_position(&args)?;

    let input = fs::read_to_string(&args.input)?;
    let document = InputDocument::from_json(&input)?;
    let (paths, detector, reader) = document.into_sources(config.metadata.coordinate_precision);
    info!("Loaded {} images from {}", paths.len(), args.input.display());

    let pipeline = GeolocationPipeline::new(config)?;
    let report = pipeline.run_images(&paths, &detector, &reader, drone);

    match report.best_pair() {
        Some(pair) => info!("Best pair: {} / {}", pair.first_image, pair.second_image),
        None => warn!("No image pair could be triangulated"),
    }

    let json = JsonFormatter::pretty().format_json(&report)?;
    match &args.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }

    if let Some(path) = &args.csv {
        match &report.flight_plan {
            Some(plan) => {
                fs::write(path, CsvFormatter::new().format_csv(plan))?;
                info!("Wrote {} waypoints to {}", plan.len(), path.display());
            }
            None => warn!("No flight plan; {} not written", path.display()),
        }
    }

    Ok(())
}
