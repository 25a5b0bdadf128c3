use std::any::Any;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_DIR: &str = "SC_LOG_DIR";
pub const ENV_LOG_INCLUDE_BACKTRACE: &str = "SC_LOG_INCLUDE_BACKTRACE";
const DEFAULT_FILTER: &str = "info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogSettings {
    /// Daily-rotated `<dir>/<app>.log` instead of stderr.
    pub dir: Option<PathBuf>,
    /// Chain the default panic hook after logging, which prints the backtrace.
    pub include_backtrace: bool,
}

fn parse_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            dir: std::env::var_os(ENV_LOG_DIR)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            include_backtrace: parse_flag(ENV_LOG_INCLUDE_BACKTRACE),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic payload not string".into())
}

/// Route panics through `tracing` so they land in the same sink as other events.
/// Installed once per process; later calls are no-ops.
pub fn install_tracing_panic_hook(app_name: &'static str, settings: &LogSettings) {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    let include_backtrace = settings.include_backtrace;

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));

            tracing::error!(
                application = app_name,
                thread_name = thread.name().unwrap_or("unknown"),
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %panic_message(info.payload()),
                "panic captured"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

fn rotating_file_writer(app_name: &'static str, dir: &Path) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("{ENV_LOG_DIR}={} is not usable ({err}); logging to stderr", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Initialize the global subscriber. `RUST_LOG` filters (default `info`).
///
/// Events go to stderr so stdout stays free for command output, or to a daily-rotated
/// file when a log directory is configured.
pub fn init_tracing_subscriber(app_name: &'static str, settings: &LogSettings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    let file_writer = settings
        .dir
        .as_ref()
        .and_then(|dir| rotating_file_writer(app_name, dir.as_path()));

    match file_writer {
        Some(writer) => {
            let _ = builder.with_ansi(false).with_writer(writer).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
