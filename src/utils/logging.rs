use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Installs the process-wide logger. Call once, first thing in `main`.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    SimpleLogger::new().with_level(level).init()
}
