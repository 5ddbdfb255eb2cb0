use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

pub trait Logger: Send + Sync {
    fn log(&mut self, message: &str);
    fn debug_log(&mut self, message: &str);
}

#[derive(Debug)]
pub struct FileLogger {
    log_file: String,
    debug: bool,
}

impl FileLogger {
    pub fn new(log_file: &str, debug: bool) -> std::io::Result<Self> {
        // Create log directory if it doesn't exist
        if let Some(parent) = Path::new(log_file).parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(FileLogger {
            log_file: log_file.to_string(),
            debug,
        })
    }

    fn write_to_file(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{}: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
    }
}

impl Logger for FileLogger {
    fn log(&mut self, message: &str) {
        if let Err(e) = self.write_to_file(message) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            if let Err(e) = self.write_to_file(&format!("[DEBUG] {}", message)) {
                eprintln!("Failed to write debug log: {}", e);
            }
        }
    }
}

/// Console logger. Stdout is reserved for operator instructions.
#[derive(Debug)]
pub struct StderrLogger {
    debug: bool,
}

impl StderrLogger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Logger for StderrLogger {
    fn log(&mut self, message: &str) {
        eprintln!("[{}] {}", Local::now().format("%H:%M:%S"), message);
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            eprintln!("[{}] [DEBUG] {}", Local::now().format("%H:%M:%S"), message);
        }
    }
}

// MultiLogger allows logging to multiple destinations
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn Logger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, logger: Box<dyn Logger>) -> Self {
        self.loggers.push(logger);
        self
    }
}

impl Logger for MultiLogger {
    fn log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.log(message);
        }
    }

    fn debug_log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.debug_log(message);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryLogger;
    use super::*;

    #[test]
    fn file_logger_skips_debug_lines_unless_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/bootstrap.log");
        let path = path.to_str().unwrap();

        let mut quiet = FileLogger::new(path, false).unwrap();
        quiet.log("writing manifests");
        quiet.debug_log("hidden");

        let mut verbose = FileLogger::new(path, true).unwrap();
        verbose.debug_log("visible");

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("writing manifests"));
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("[DEBUG] visible"));
    }

    #[test]
    fn multi_logger_fans_out() {
        let a = MemoryLogger::default();
        let b = MemoryLogger::default();
        let mut logger = MultiLogger::new()
            .with(Box::new(a.clone()))
            .with(Box::new(b.clone()));

        logger.log("hello");

        assert!(a.contains("hello"));
        assert!(b.contains("hello"));
    }
}
