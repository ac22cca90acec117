use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::paths::stackwm_log_dir;

/// Per-session file logger.
///
/// Each run gets `session-N/` under the log directory. Info and above go to
/// `stackwm.log`, debug and trace to `stackwm.dbg.log`; everything is mirrored
/// to stderr.
pub struct FileLogger {
    level: LevelFilter,
    main_file: Mutex<File>,
    debug_file: Mutex<File>,
}

impl FileLogger {
    pub fn init(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        Self::init_in(&stackwm_log_dir(), level)
    }

    pub fn init_in(log_dir: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        fs::create_dir_all(log_dir)?;

        let session_num = next_session_number(log_dir);
        let session_dir = log_dir.join(format!("session-{}", session_num));
        fs::create_dir_all(&session_dir)?;

        let main_file = open_log_file(&session_dir, "stackwm.log")?;
        let debug_file = open_log_file(&session_dir, "stackwm.dbg.log")?;

        let logger = FileLogger {
            level,
            main_file: Mutex::new(main_file),
            debug_file: Mutex::new(debug_file),
        };

        log::set_max_level(level);
        log::set_logger(Box::leak(Box::new(logger)))
            .map_err(|e| format!("Failed to set logger: {}", e))?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        log::info!("=== stackwm session {} ===", session_num);
        log::info!("Log directory: {}", session_dir.display());
        log::info!("Started at: {}", timestamp);

        Ok(())
    }
}

fn open_log_file(dir: &Path, name: &str) -> Result<File, Box<dyn std::error::Error>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dir.join(name))?;
    Ok(file)
}

fn next_session_number(log_dir: &Path) -> u32 {
    let mut max_num = 0u32;

    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(num) = name_str
                .strip_prefix("session-")
                .and_then(|rest| rest.parse::<u32>().ok())
            {
                max_num = max_num.max(num);
            }
        }
    }

    max_num + 1
}

fn level_char(level: Level) -> char {
    match level {
        Level::Error => 'E',
        Level::Warn => 'W',
        Level::Info => 'I',
        Level::Debug => 'D',
        Level::Trace => 'T',
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now().format("%H:%M:%S%.3f");
        let log_line = format!("{} {} {}\n", timestamp, record.target(), record.args());

        let file_mutex = match record.level() {
            Level::Debug | Level::Trace => &self.debug_file,
            _ => &self.main_file,
        };

        if let Ok(mut file) = file_mutex.lock() {
            let _ = file.write_all(log_line.as_bytes());
            let _ = file.flush();
        }

        eprint!("{} {}", level_char(record.level()), log_line);
    }

    fn flush(&self) {
        let _ = self.main_file.lock().map(|mut f| f.flush());
        let _ = self.debug_file.lock().map(|mut f| f.flush());
    }
}
