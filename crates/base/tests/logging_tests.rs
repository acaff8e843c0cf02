use base::{FileLogger, StdoutLogger, init_file_logger, init_stdout_logger};
use log::Log;
use std::fs;

fn record_with(level: log::Level, line: u32, f: impl FnOnce(&log::Record)) {
    f(&log::RecordBuilder::new()
        .level(level)
        .target("test")
        .file(Some("test.rs"))
        .line(Some(line))
        .args(format_args!("model warmed up"))
        .build());
}

#[test]
fn test_stdout_logger_accepts_records() {
    let logger = StdoutLogger;
    let metadata = log::MetadataBuilder::new()
        .level(log::Level::Info)
        .target("test")
        .build();
    assert!(logger.enabled(&metadata));
    record_with(log::Level::Info, 42, |record| logger.log(record));
    logger.flush();
}

#[test]
fn test_file_logger_writes_formatted_line() {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let logger = FileLogger::new(dir.path()).expect("Failed to create FileLogger");

    record_with(log::Level::Warn, 100, |record| logger.log(record));
    logger.flush();

    let entries: Vec<_> = fs::read_dir(dir.path())
        .expect("Failed to read log directory")
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(entries.len(), 1, "Should have exactly one log file");

    let name = entries[0].file_name().to_string_lossy().into_owned();
    assert!(name.ends_with(".log"));
    assert_eq!(name.len(), "YYYY-MM-DD.log".len());

    let content = fs::read_to_string(entries[0].path()).expect("Failed to read log file");
    assert!(content.contains("[WARN]"));
    assert!(content.contains("thread:"));
    assert!(content.contains("test.rs:100"));
    assert!(content.contains("model warmed up"));
    assert!(content.ends_with('\n'));
}

#[test]
fn test_file_logger_creates_nested_directory() {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let nested = dir.path().join("logs").join("classifier");
    let _logger = FileLogger::new(&nested).expect("Failed to create FileLogger");
    assert!(nested.is_dir());
}

#[test]
fn test_init_file_logger_invalid_dir_returns_error() {
    let result = init_file_logger("/proc/nonexistent/path");
    assert!(result.is_err());
}

#[test]
fn test_init_stdout_logger_is_idempotent() {
    init_stdout_logger();
    init_stdout_logger();
    log::info!("logger installed");
}
