// src/logging.rs
//
// A small per-worker tagged logger. Adapted from the desktop app's
// timestamped `tlog!` macro, generalised into a constructible value so it
// can be threaded through the acquisition core as an explicit argument
// rather than reached for as a global.

use std::fs::File;
use std::io::Write as _;
use std::sync::Mutex;

/// Leveled, timestamped logger tagged with a data source ID.
///
/// Writes to stderr always, and additionally to an append-only file when
/// one was configured at construction time.
pub struct WorkerLog {
    tag: String,
    file: Option<Mutex<File>>,
}

impl WorkerLog {
    pub fn new(data_source_id: i64) -> Self {
        Self {
            tag: format!("acqsrv:{}", data_source_id),
            file: None,
        }
    }

    /// Also append every line to `path`.
    pub fn with_file(mut self, path: &std::path::Path) -> std::io::Result<Self> {
        let file = File::options().create(true).append(true).open(path)?;
        self.file = Some(Mutex::new(file));
        Ok(self)
    }

    fn write(&self, level: &str, msg: &str) {
        let line = format!(
            "{} [{}] {} {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            self.tag,
            level,
            msg
        );
        eprintln!("{}", line);
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{}", line);
            }
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.write("INFO", msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.write("WARN", msg.as_ref());
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.write("ERROR", msg.as_ref());
    }
}
