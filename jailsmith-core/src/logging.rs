use env_logger::Target;
use std::fs;
use std::io;

const LOG_DIR: &str = "/var/log/jailsmith";
const LOG_FILE: &str = "/var/log/jailsmith/jailsmith.log";

/// Initialise the global logger once. `RUST_LOG` still wins over the level chosen here.
pub fn init(verbose: bool) {
    // Prefer a stable log file for unattended provisioning runs. If we cannot
    // open it (not root, read-only FS), fall back to stderr.
    let target = (|| -> io::Result<Target> {
        fs::create_dir_all(LOG_DIR)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(target)
        .try_init();
}
