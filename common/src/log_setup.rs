use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};

/// Installs the process-wide `log` backend: rotating files under `logs/`
/// plus duplication of everything to stdout and warnings to stderr.
///
/// `base_level` is a `log`-style spec such as `"info"` or
/// `"warn, growcut=debug"`. The returned handle must be kept alive for as
/// long as file logging is wanted.
pub fn setup_logging(base_level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    let handle = Logger::try_with_str(base_level)?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .basename("growcut"),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .duplicate_to_stdout(Duplicate::All)
        .rotate(
            Criterion::Size(1024 * 1024), //1MB
            Naming::Timestamps,
            Cleanup::KeepLogFiles(5),
        )
        .start()?;

    log::debug!("Logging initialized with spec '{}'", base_level);

    Ok(handle)
}
