use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use tracing::Level;
use tracing_subscriber::{
    filter::FilterFn,
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::config::{LoggingConfig, Section};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

// -------- level helpers --------

/// `None` means the output is switched off. Unknown names fall back to INFO.
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == name or target starts with "name::"
fn matches_crate_prefix(target: &str, name: &str) -> bool {
    target == name
        || (target.starts_with(name) && target[name.len()..].starts_with("::"))
}

/// Name of the section that owns `target`: the longest matching subsystem, else "default".
fn owning_section<'a>(subsystems: &'a [String], target: &str) -> &'a str {
    subsystems
        .iter()
        .filter(|name| matches_crate_prefix(target, name))
        .max_by_key(|name| name.len())
        .map(String::as_str)
        .unwrap_or(DEFAULT_SECTION)
}

// -------- rotating file writer --------

#[derive(Clone)]
struct RotatingWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl<'a> fmt::MakeWriter<'a> for RotatingWriter {
    type Writer = RotatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?
            .flush()
    }
}

/// Resolve a log file path against `base_dir` (home_dir).
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating_writer(section: &Section, base_dir: &Path) -> io::Result<RotatingWriter> {
    let log_path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let rot = FileRotate::new(
        &log_path,
        AppendCount::new(section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotatingWriter(Arc::new(Mutex::new(rot))))
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: subsystem name → section; `default` covers every target not named explicitly
/// - `base_dir`: base directory used to resolve relative log file paths (usually server.home_dir)
///
/// Console output is human-readable, file output is JSON lines. Calling this twice is a no-op.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let subsystems: Arc<Vec<String>> = Arc::new(
        cfg.keys()
            .filter(|k| k.as_str() != DEFAULT_SECTION)
            .cloned()
            .collect(),
    );

    let mut layers: Vec<BoxedLayer> = vec![console_layer(cfg, subsystems.clone())];
    for (name, section) in cfg {
        if section.file.trim().is_empty() {
            continue;
        }
        match open_rotating_writer(section, base_dir) {
            Ok(writer) => layers.push(file_layer(name, section, writer, subsystems.clone())),
            Err(e) => eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name, section.file, e
            ),
        }
    }

    let _ = Registry::default().with(layers).try_init();
}

fn init_default_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .try_init();
}

fn console_layer(cfg: &LoggingConfig, subsystems: Arc<Vec<String>>) -> BoxedLayer {
    let levels: Arc<Vec<(String, Option<Level>)>> = Arc::new(
        cfg.iter()
            .map(|(name, s)| (name.clone(), parse_tracing_level(&s.console_level)))
            .collect(),
    );

    let filter = FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        let owner = owning_section(&subsystems, meta.target());
        levels
            .iter()
            .find(|(name, _)| name == owner)
            .and_then(|(_, level)| *level)
            .map(|max| meta.level() <= &max)
            .unwrap_or(false)
    });

    fmt::layer()
        .with_ansi(io::stdout().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(UtcTime::rfc_3339())
        .with_filter(filter)
        .boxed()
}

fn file_layer(
    name: &str,
    section: &Section,
    writer: RotatingWriter,
    subsystems: Arc<Vec<String>>,
) -> BoxedLayer {
    let name = name.to_string();
    let level = parse_tracing_level(&section.file_level);

    let filter = FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        owning_section(&subsystems, meta.target()) == name
            && level.map(|max| meta.level() <= &max).unwrap_or(false)
    });

    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer)
        .with_filter(filter)
        .boxed()
}

// =================== tests ===================
