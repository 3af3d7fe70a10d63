//! `log` facade sink for the worker global scope.

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Logger that forwards records to the worker's `console`.
///
/// Off `wasm32` records are written to stderr so native tooling sees the same lines.
#[derive(Debug)]
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    /// Creates a logger that keeps records at or above `level`.
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);

        #[cfg(target_arch = "wasm32")]
        {
            let value = wasm_bindgen::JsValue::from_str(&line);
            match record.level() {
                Level::Error => web_sys::console::error_1(&value),
                Level::Warn => web_sys::console::warn_1(&value),
                Level::Info => web_sys::console::info_1(&value),
                Level::Debug | Level::Trace => web_sys::console::debug_1(&value),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("{line}");
    }

    fn flush(&self) {}
}

fn format_record(record: &Record<'_>) -> String {
    let level = match record.level() {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    format!("[{level} {}] {}", record.target(), record.args())
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(LevelFilter::Debug);

/// Installs the console logger and the panic hook.
///
/// Safe to call more than once; later calls only adjust the level.
pub fn init_logging(level: LevelFilter) {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::debug!("console logger installed");
    }
    log::set_max_level(level.min(LevelFilter::Debug));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_carry_level_and_target() {
        let line = format_record(
            &Record::builder()
                .level(Level::Warn)
                .target("offline_worker::strategy")
                .args(format_args!("caching {} failed", "/history"))
                .build(),
        );
        assert_eq!(line, "[WARN offline_worker::strategy] caching /history failed");
    }

    #[test]
    fn level_filter_gates_records() {
        let logger = ConsoleLogger::new(LevelFilter::Info);
        assert!(logger.enabled(&Metadata::builder().level(Level::Warn).build()));
        assert!(!logger.enabled(&Metadata::builder().level(Level::Debug).build()));
    }
}
