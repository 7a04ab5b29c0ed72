//! Chrome Native Messaging Host for Habitkeep
//!
//! Runs as the native messaging host of the Habitkeep browser extension.
//! It talks to the extension over stdin/stdout, so all logging goes to
//! stderr or to the file named by `HABITKEEP_LOG_PATH`.

use habitkeep_lib::{
    default_db_path, native_host::NativeHost, open_database, tracker::TrackerConfig,
};
use log::error;
use std::sync::{Arc, Mutex};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Initialize logging, writing to `HABITKEEP_LOG_PATH` if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("HABITKEEP_LOG")
        .from_env_lossy();

    if let Ok(path) = std::env::var("HABITKEEP_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let db = match default_db_path().and_then(|path| open_database(&path)) {
        Ok(db) => db,
        Err(e) => {
            error!("Habitkeep initialization failed: {e}");
            std::process::exit(1);
        }
    };

    let host = NativeHost::new(Arc::new(Mutex::new(db)), TrackerConfig::default());

    // Returns once Chrome closes the pipe
    if let Err(e) = host.run(std::io::stdin().lock(), std::io::stdout().lock()) {
        error!("Native host error: {e}");
        std::process::exit(1);
    }
}
