//! `logging::init` installs a process-wide subscriber, so this test lives in
//! its own binary.

use std::io::Write;

use enroll::logging::{self, Event, EventSink, Level, TracingSink};

#[test]
fn init_appends_timestamped_leveled_lines() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "earlier run").unwrap();

    let guard = logging::init(file.path(), false).unwrap();
    TracingSink.emit(Event::new(Level::Error, "Failed to create user: ada@example.com"));
    TracingSink.emit(Event::new(Level::Warning, "No records found in the provided file."));
    // Dropping the guard flushes the non-blocking writer.
    drop(guard);

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "earlier run");

    let error_line = lines
        .iter()
        .find(|l| l.contains("Failed to create user: ada@example.com"))
        .expect("error event written to the log file");
    assert!(error_line.contains("ERROR"));
    let year = chrono::Utc::now().format("%Y").to_string();
    assert!(error_line.starts_with(&year), "no timestamp in {error_line:?}");

    assert!(
        lines
            .iter()
            .any(|l| l.contains("WARN") && l.contains("No records found"))
    );
    assert!(!contents.contains('\u{1b}'), "file output must not contain ANSI codes");
}
