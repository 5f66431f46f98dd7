use std::{
    fmt::Write as _,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{unbounded, Sender};
use once_cell::sync::Lazy;
use strum::Display;

pub use rotate::Rotate;

/// 依日期與大小輪替的日誌檔
pub mod rotate;

/// 終端機已被報價畫面佔用，所有日誌一律寫檔
const LOG_DIR: &str = "log";
/// 背景線程累積到這個大小就先寫一次
const FLUSH_THRESHOLD: usize = 4096;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));
/// 畫面接手終端機後，寫檔失敗的訊息直接丟棄
static CONSOLE_MUTED: AtomicBool = AtomicBool::new(false);

#[derive(Display, Debug, Copy, Clone, PartialEq, Eq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

pub struct LogMessage {
    pub level: Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }

    fn write_to(&self, line: &mut String) -> std::fmt::Result {
        writeln!(
            line,
            "{} {} {}",
            self.created_at.format("%F %X%.6f"),
            self.level,
            self.msg
        )
    }
}

/// A file logger whose writes happen on a dedicated background thread.
///
/// Each logger appends to `log/<date>_<name>.log` through a [`Rotate`], so a
/// long-running process moves to a new file every day and whenever a file
/// reaches its size cap. Sending never blocks the caller. When the file
/// cannot be written the message goes to stderr until [`mute_console`] is
/// called, and is dropped after that.
pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        Self::with_rotate(Rotate::new(format!("{}/%Y-%m-%d_{}.log", LOG_DIR, log_name)))
    }

    pub fn with_rotate(mut rotate: Rotate) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || {
            let mut line = String::with_capacity(FLUSH_THRESHOLD);

            for received in &rx {
                if received.write_to(&mut line).is_err() {
                    continue;
                }

                if rx.is_empty() || line.len() >= FLUSH_THRESHOLD {
                    let written = rotate
                        .write_msg(received.created_at, line.as_bytes())
                        .and_then(|_| rotate.flush());

                    if let Err(why) = written {
                        fallback_console(format!(
                            "Failed to write to log file. because:{:?}\r\nmsg:{}",
                            why,
                            line.trim_end()
                        ));
                    }

                    line.clear();
                }
            }
        });

        Logger { writer: tx }
    }

    pub fn debug(&self, log: String) {
        self.send(Level::Debug, log);
    }

    pub fn info(&self, log: String) {
        self.send(Level::Info, log);
    }

    pub fn warn(&self, log: String) {
        self.send(Level::Warn, log);
    }

    pub fn error(&self, log: String) {
        self.send(Level::Error, log);
    }

    fn send(&self, level: Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            fallback_console(format!("{} ({})", why.0.msg, why));
        }
    }
}

/// Stops log fallbacks from reaching the terminal. Called once the price
/// board owns the screen.
pub fn mute_console() {
    CONSOLE_MUTED.store(true, Ordering::SeqCst);
}

pub fn console_muted() -> bool {
    CONSOLE_MUTED.load(Ordering::SeqCst)
}

/// 寫檔失敗時的退路：stdout 是報價畫面，只能用 stderr
fn fallback_console(log: String) {
    if console_muted() {
        return;
    }

    eprintln!(
        "{} Error {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

/// Startup only; once the board is drawn stdout belongs to the display.
pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}

#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, time::Duration};

    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_log_message_format() {
        let message = LogMessage::new(Level::Warn, "quote feed is slow".to_string());
        let mut line = String::new();
        message.write_to(&mut line).unwrap();

        assert!(line.ends_with(" WARN quote feed is slow\n"));
        assert!(line.starts_with(&message.created_at.format("%F").to_string()));
    }

    #[test]
    fn test_logger_writes_file() {
        let dir = env::temp_dir().join(format!("ticker_console_logger_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let logger = Logger::with_rotate(Rotate::new(format!(
            "{}/%Y-%m-%d_logging_test.log",
            dir.display()
        )));
        logger.info("first line".to_string());
        logger.error("second line".to_string());

        let path: PathBuf = dir.join(Local::now().format("%Y-%m-%d_logging_test.log").to_string());
        let mut content = String::new();
        for _ in 0..50 {
            content = fs::read_to_string(&path).unwrap_or_default();
            if content.contains("second line") {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }

        assert!(content.contains("INFO first line"));
        assert!(content.contains("ERROR second line"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unwritable_logger_keeps_running() {
        let dir = env::temp_dir().join(format!("ticker_console_blocked_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("log");
        fs::write(&blocker, "").unwrap();

        mute_console();
        assert!(console_muted());

        let logger = Logger::with_rotate(Rotate::new(format!(
            "{}/%Y-%m-%d_blocked.log",
            blocker.display()
        )));
        logger.debug("GET:http://x 200 OK".to_string());
        logger.error("still alive".to_string());
        thread::sleep(Duration::from_millis(50));

        // 寫檔失敗不會停掉背景線程，也不會建出目錄
        logger.info("after failure".to_string());
        assert!(blocker.is_file());

        fs::remove_dir_all(&dir).ok();
    }
}
