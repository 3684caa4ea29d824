//! Viewer startup and the event loop shared by both binaries

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use log::{LevelFilter, debug, info};
use simplelog::{Config, WriteLogger};

use crate::cli::{ComicArgs, CommonArgs, WebtoonArgs};
use crate::compositor::Compositor;
use crate::controller::{Controller, Flow};
use crate::decode::{Decoder, HelperDecoder};
use crate::display::{Display, KittyDisplay, TerminalGuard};
use crate::inputs::{EventSource, TerminalEvents, action_for};
use crate::layout::{DEFAULT_FALLBACK_HEIGHT, Document};
use crate::panic_handler::initialize_panic_handler;
use crate::settings::{APP_NAME, Settings, load_settings};
use crate::viewport::Viewport;

/// Which of the two viewers is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerKind {
    Comic,
    Webtoon,
}

impl ViewerKind {
    pub fn name(self) -> &'static str {
        match self {
            ViewerKind::Comic => "comic-viewer",
            ViewerKind::Webtoon => "webtoon-viewer",
        }
    }

    /// Web-comic panels run much taller than comic pages.
    pub fn default_fallback_height(self) -> u32 {
        match self {
            ViewerKind::Comic => DEFAULT_FALLBACK_HEIGHT,
            ViewerKind::Webtoon => 500,
        }
    }
}

/// Fallback height by precedence: command line, settings, viewer default.
pub fn fallback_height(kind: ViewerKind, common: &CommonArgs, settings: &Settings) -> u32 {
    common
        .fallback_height
        .or(settings.fallback_height.filter(|&h| h > 0))
        .unwrap_or_else(|| kind.default_fallback_height())
}

pub fn run_comic_viewer(args: ComicArgs) -> Result<()> {
    let settings = prepare(ViewerKind::Comic, &args.common)?;
    let converter = args
        .converter
        .unwrap_or_else(|| settings.converter.clone());
    info!("converter {}", converter.display());
    run_viewer(
        ViewerKind::Comic,
        HelperDecoder::stdin(converter),
        args.items,
        &args.common,
        &settings,
    )
}

pub fn run_webtoon_viewer(args: WebtoonArgs) -> Result<()> {
    let settings = prepare(ViewerKind::Webtoon, &args.common)?;
    info!("helper {}", args.helper.display());
    run_viewer(
        ViewerKind::Webtoon,
        HelperDecoder::argument(args.helper),
        args.items,
        &args.common,
        &settings,
    )
}

/// Start logging, then load settings and apply the effective log level.
fn prepare(kind: ViewerKind, common: &CommonArgs) -> Result<Settings> {
    let log_path = common
        .log_file
        .clone()
        .unwrap_or_else(|| default_log_path(kind));
    init_logging(&log_path)?;
    info!("Starting {}", kind.name());

    let settings = load_settings(common.config.as_deref())?;
    let level = common
        .log_level
        .or_else(|| settings.log_level())
        .unwrap_or(LevelFilter::Info);
    log::set_max_level(level);
    debug!("log level {level}");
    Ok(settings)
}

/// `<cache dir>/stripview/<viewer>.log`, or the current directory when
/// there is no cache dir.
pub fn default_log_path(kind: ViewerKind) -> PathBuf {
    let file_name = format!("{}.log", kind.name());
    dirs::cache_dir()
        .map(|cache| cache.join(APP_NAME))
        .filter(|dir| fs::create_dir_all(dir).is_ok())
        .map(|dir| dir.join(&file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// The logger accepts everything; `log::set_max_level` does the filtering
/// once the settings are known.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    WriteLogger::init(LevelFilter::Trace, Config::default(), file)
        .context("failed to install logger")?;
    Ok(())
}

fn run_viewer<D: Decoder>(
    kind: ViewerKind,
    decoder: D,
    items: Vec<String>,
    common: &CommonArgs,
    settings: &Settings,
) -> Result<()> {
    initialize_panic_handler();

    let fallback = fallback_height(kind, common, settings);
    let document = Document::new(items, fallback);
    ensure!(!document.is_empty(), "no items to show");
    info!("{} items, fallback height {fallback}", document.len());

    let mut display = KittyDisplay::open(settings.surface_format, settings.compress_frames)
        .context("terminal does not report its size in pixels")?;
    let mut guard = TerminalGuard::enter().context("failed to set up the terminal")?;

    let (width, height) = display.geometry();
    let mut controller = Controller::new(
        document,
        decoder,
        Compositor::new(settings.palette()),
        Viewport::new(width, height),
        settings.steps(),
    );
    let result = run_event_loop(&mut controller, &mut display, &mut TerminalEvents);

    guard.restore();
    info!("Shutting down {}", kind.name());
    result
}

/// Draw the first frame, then translate input into actions until quit.
pub fn run_event_loop<D: Decoder>(
    controller: &mut Controller<D>,
    display: &mut dyn Display,
    events: &mut dyn EventSource,
) -> Result<()> {
    controller.refresh(display);
    loop {
        let event = events.next_event()?;
        let Some(action) = action_for(&event) else {
            continue;
        };
        if controller.handle(action, display) == Flow::Quit {
            return Ok(());
        }
    }
}
