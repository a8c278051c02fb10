use ::log::{Record, Level, Metadata, SetLoggerError};

/// Cible de tous les logs émis par le bot.
pub const TARGET: &str = "tickets";

#[macro_use]
pub mod macros {
    #[doc(alias = "log::error")]
    #[macro_export]
    macro_rules! log_error {
        ($($arg:tt)*) => {
            ::log::error!(target: $crate::log::TARGET, $($arg)*)
        };
    }
    #[doc(alias = "log::warn")]
    #[macro_export]
    macro_rules! log_warn {
        ($($arg:tt)*) => {
            ::log::warn!(target: $crate::log::TARGET, $($arg)*)
        };
    }
    #[doc(alias = "log::info")]
    #[macro_export]
    macro_rules! log_info {
        ($($arg:tt)*) => {
            ::log::info!(target: $crate::log::TARGET, $($arg)*)
        };
    }
    #[doc(alias = "log::debug")]
    #[macro_export]
    macro_rules! log_debug {
        ($($arg:tt)*) => {
            ::log::debug!(target: $crate::log::TARGET, $($arg)*)
        };
    }
}

struct SimpleLogger {
    level: Level,
}

impl ::log::Log for SimpleLogger {
    #[inline]
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) && record.target() == TARGET {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            println!("{} [{}] {}", now, record.level(), record.args());
        }
    }
    #[inline]
    fn flush(&self) {}
}

/// Lit un niveau de log tel qu'écrit dans la configuration (`"info"`, `"debug"`...).
pub fn parse_level(level: &str) -> Option<Level> {
    match level.to_ascii_lowercase().as_str() {
        "error" => Some(Level::Error),
        "warn" | "warning" => Some(Level::Warn),
        "info" => Some(Level::Info),
        "debug" => Some(Level::Debug),
        "trace" => Some(Level::Trace),
        _ => None,
    }
}

fn default_level() -> Level {
    if cfg!(feature = "verbose") {
        Level::Trace
    } else if cfg!(debug_assertions) {
        Level::Debug
    } else {
        Level::Info
    }
}

/// Installe le logger du bot.
///
/// Sans niveau explicite, le niveau dépend du profil de compilation.
pub fn init(level: Option<&str>) -> Result<(), SetLoggerError> {
    let level = level.and_then(parse_level).unwrap_or_else(default_level);
    let logger: &'static SimpleLogger = Box::leak(Box::new(SimpleLogger { level }));
    ::log::set_logger(logger)
        .map(|_| ::log::set_max_level(level.to_level_filter()))
}
