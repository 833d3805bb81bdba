//! Colored stderr sink for the `log` facade.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

const RESET: &str = "\x1b[0m";

struct StderrLogger {
    max_level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let color = level_color(record.level());
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{color}[{level:<5}]{RESET} {args}",
            level = record.level(),
            args = record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[33m",
        Level::Info => "\x1b[32m",
        Level::Debug => "\x1b[36m",
        Level::Trace => "\x1b[90m",
    }
}

/// Parses a `BRIDGE_LOG`-style level name, defaulting to `info`.
#[must_use]
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("error") => LevelFilter::Error,
        Some(value) if value.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        Some(value) if value.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        Some(value) if value.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        Some(value) if value.eq_ignore_ascii_case("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Installs the stderr sink at the level selected by `BRIDGE_LOG`.
///
/// Safe to call more than once; only the first installation wins.
pub fn init_from_env() {
    let level = parse_level(std::env::var("BRIDGE_LOG").ok().as_deref());
    init_with_level(level);
}

pub fn init_with_level(level: LevelFilter) {
    if log::set_boxed_logger(Box::new(StderrLogger { max_level: level })).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::{level_color, parse_level};

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(parse_level(Some("error")), LevelFilter::Error);
        assert_eq!(parse_level(Some("WARN")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("Debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("trace")), LevelFilter::Trace);
        assert_eq!(parse_level(Some("off")), LevelFilter::Off);
    }

    #[test]
    fn unknown_or_missing_levels_default_to_info() {
        assert_eq!(parse_level(None), LevelFilter::Info);
        assert_eq!(parse_level(Some("verbose")), LevelFilter::Info);
        assert_eq!(parse_level(Some("  ")), LevelFilter::Info);
    }

    #[test]
    fn every_level_has_a_distinct_color() {
        let colors = [
            level_color(log::Level::Error),
            level_color(log::Level::Warn),
            level_color(log::Level::Info),
            level_color(log::Level::Debug),
            level_color(log::Level::Trace),
        ];
        for (index, color) in colors.iter().enumerate() {
            assert!(color.starts_with("\x1b["));
            assert!(!colors[index + 1..].contains(color));
        }
    }
}
