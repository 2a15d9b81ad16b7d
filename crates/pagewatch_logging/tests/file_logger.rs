use std::fs;

use log::LevelFilter;
use pagewatch_logging::{initialize, watch_debug, watch_info, LogDestination, LOG_FILENAME};
use tempfile::TempDir;

#[test]
fn file_destination_writes_into_log_dir() {
    let temp = TempDir::new().unwrap();
    initialize(LogDestination::File, LevelFilter::Info, Some(temp.path()));

    watch_info!("instance adopted target={}", "abc");
    watch_debug!("filtered out at info level");
    log::logger().flush();

    let path = temp.path().join(LOG_FILENAME);
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("instance adopted target=abc"));
    assert!(!content.contains("filtered out"));
}
