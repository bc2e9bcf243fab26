//! bbox-inspect - headless front end for the bounding-box inspector.
//!
//! Loads the detection results of one scene, runs screen-space picks
//! through the scene's default camera and prints the camera framing planned
//! for each hit or requested box.
//!
//! ```text
//! bbox-inspect [--config FILE] [--data-root DIR|URL] [--scene ID]
//!              [--viewport WxH] [--pick X,Y]... [--frame ID]...
//! ```

use bbox_inspect::app::input::PointerEvent;
use bbox_inspect::app::{BoxInspector, InspectorEvent, ScenePort};
use bbox_inspect::assets::source_for_root;
use bbox_inspect::config::{ConfigError, ViewerConfig};
use bbox_inspect::render::{CameraPose, CameraRig, NullSurface, PerspectiveCamera};
use bbox_inspect::ui::display_title;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown scene: {0}")]
    UnknownScene(String),
    #[error("scene {0} has no bounding box data")]
    NoBoxData(String),
    #[error("failed to load bounding boxes from {0}")]
    LoadFailed(String),
    #[error("timed out loading bounding boxes")]
    Timeout,
}

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    data_root: Option<String>,
    scene: Option<String>,
    viewport: Option<(u32, u32)>,
    picks: Vec<(f32, f32)>,
    frames: Vec<String>,
    help: bool,
}

fn parse_pair<T: std::str::FromStr>(flag: &str, value: &str, separator: char) -> Result<(T, T), CliError> {
    let invalid = || CliError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    };
    let (a, b) = value.split_once(separator).ok_or_else(invalid)?;
    let a = a.trim().parse().map_err(|_| invalid())?;
    let b = b.trim().parse().map_err(|_| invalid())?;
    Ok((a, b))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, CliError> {
    let mut options = Options::default();
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        if flag == "-h" || flag == "--help" {
            options.help = true;
            continue;
        }
        let mut value = || args.next().ok_or_else(|| CliError::MissingValue(flag.clone()));
        match flag.as_str() {
            "--config" => options.config = Some(PathBuf::from(value()?)),
            "--data-root" => options.data_root = Some(value()?),
            "--scene" => options.scene = Some(value()?),
            "--viewport" => options.viewport = Some(parse_pair(&flag, &value()?, 'x')?),
            "--pick" => options.picks.push(parse_pair(&flag, &value()?, ',')?),
            "--frame" => options.frames.push(value()?),
            _ => return Err(CliError::UnknownArgument(flag.clone())),
        }
    }
    Ok(options)
}

fn print_usage() {
    println!("usage: bbox-inspect [--config FILE] [--data-root DIR|URL] [--scene ID]");
    println!("                    [--viewport WxH] [--pick X,Y]... [--frame ID]...");
}

fn print_pose(pose: &CameraPose) {
    println!(
        "  camera eye ({:.3}, {:.3}, {:.3}) -> look at ({:.3}, {:.3}, {:.3}), distance {:.3}",
        pose.eye.x,
        pose.eye.y,
        pose.eye.z,
        pose.look_at.x,
        pose.look_at.y,
        pose.look_at.z,
        pose.distance()
    );
}

fn run(options: Options) -> Result<(), CliError> {
    let mut config = match &options.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(root) = &options.data_root {
        config.data_root = root.clone();
    }
    let scene_id = options
        .scene
        .clone()
        .unwrap_or_else(|| config.default_scene.clone());
    let profile = config
        .scene(&scene_id)
        .cloned()
        .ok_or_else(|| CliError::UnknownScene(scene_id.clone()))?;
    let url = profile
        .box_data_url
        .clone()
        .ok_or_else(|| CliError::NoBoxData(scene_id.clone()))?;

    let source = source_for_root(&config.data_root);
    let mut inspector = BoxInspector::new(config, source, Box::new(NullSurface::new()));
    inspector.load_scene_for_id(&scene_id);
    match inspector.wait_for_load(LOAD_TIMEOUT) {
        Some(InspectorEvent::Loaded { count, labels, .. }) => {
            println!("{} ({}): {} boxes from {}", profile.title, scene_id, count, url);
            let objects: Vec<String> = labels.iter().map(|label| display_title(label)).collect();
            println!("objects: {}", objects.join(", "));
        }
        Some(_) => return Err(CliError::LoadFailed(url)),
        None => return Err(CliError::Timeout),
    }

    let mut camera = PerspectiveCamera::new(options.viewport.unwrap_or((1280, 720)));
    camera.reset(&profile.default_pose());

    for (x, y) in &options.picks {
        match inspector.handle_pointer(&PointerEvent::down(*x, *y), Some(&camera)) {
            Some(InspectorEvent::Selected {
                box_id,
                title,
                framing,
                ..
            }) => {
                println!("pick ({x}, {y}): {} [{}]", display_title(&title), box_id);
                print_pose(&framing);
                inspector.show_all_boxes();
            }
            _ => println!("pick ({x}, {y}): no hit"),
        }
    }

    for box_id in &options.frames {
        match inspector.framing_for(box_id) {
            Some(pose) => {
                println!("frame {box_id}:");
                print_pose(&pose);
            }
            None => log::warn!("No bounding box with id {}", box_id),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            log::error!("{}", err);
            print_usage();
            return ExitCode::from(2);
        }
    };
    if options.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
