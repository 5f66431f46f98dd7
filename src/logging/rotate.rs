use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeDelta};

/// 預設單檔最大大小：10 MB
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// A log file that follows the calendar and a size cap.
///
/// The file name comes from a `chrono` pattern such as `log/%Y-%m-%d_http.log`,
/// so a new day opens a new file. A file that grows past `max_size` continues
/// in `<stem>.1.log`, `<stem>.2.log`, ... Files in the same directory older
/// than `max_age` are removed whenever the date rolls over.
pub struct Rotate {
    /// 檔名模式，例如 "log/%Y-%m-%d_name.log"
    fn_pattern: String,
    /// 當前完整檔名（含 generation）
    cur_fn: PathBuf,
    /// 當前基礎檔名（不含 generation，由日期決定）
    cur_base_fn: String,
    out_fh: Option<BufWriter<File>>,
    /// 只增不減
    generation: u32,
    max_size: u64,
    current_size: u64,
    max_age: TimeDelta,
}

impl Rotate {
    pub fn new(fn_pattern: String) -> Self {
        Self::with_options(fn_pattern, DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_options(fn_pattern: String, max_size: u64, max_age_days: i64) -> Self {
        Rotate {
            fn_pattern,
            cur_fn: PathBuf::new(),
            cur_base_fn: String::new(),
            out_fh: None,
            generation: 0,
            max_size,
            current_size: 0,
            max_age: TimeDelta::try_days(max_age_days).unwrap_or(TimeDelta::days(DEFAULT_MAX_AGE_DAYS)),
        }
    }

    /// Appends `msg` to the file for `now`, switching files first when the
    /// date changed or the size cap would be exceeded.
    pub fn write_msg(&mut self, now: DateTime<Local>, msg: &[u8]) -> Result<()> {
        let base_fn = now.format(&self.fn_pattern).to_string();

        // 日期變更：重設 generation
        if base_fn != self.cur_base_fn || self.out_fh.is_none() {
            self.generation = 0;
            self.cur_base_fn = base_fn;
            self.open_new_file()?;
            self.cleanup_old_files(now);
        }

        if self.current_size > 0 && self.current_size + msg.len() as u64 > self.max_size {
            self.generation += 1;
            self.open_new_file()?;
        }

        let writer = self
            .out_fh
            .as_mut()
            .ok_or_else(|| anyhow!("No log file is open for {}", self.cur_base_fn))?;
        writer.write_all(msg)?;
        self.current_size += msg.len() as u64;

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.out_fh.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn current_file(&self) -> &Path {
        &self.cur_fn
    }

    /// generation = 0: "log/2025-02-03_app.log"
    /// generation = 2: "log/2025-02-03_app.2.log"
    fn generate_full_fn(base_fn: &str, generation: u32) -> PathBuf {
        let path = Path::new(base_fn);
        if generation == 0 {
            return path.to_path_buf();
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("log");

        parent.join(format!("{}.{}.{}", stem, generation, ext))
    }

    fn open_new_file(&mut self) -> Result<()> {
        // 先 flush 並關閉舊檔案
        self.flush()?;
        self.out_fh = None;

        let filename = Self::generate_full_fn(&self.cur_base_fn, self.generation);
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.out_fh = Some(BufWriter::with_capacity(4096, file));
        self.cur_fn = filename;

        Ok(())
    }

    /// 清理超過 max_age 的 .log 檔，當前檔案除外
    fn cleanup_old_files(&self, now: DateTime<Local>) {
        let files = match Self::files_in_directory(&self.cur_fn) {
            Ok(files) => files,
            Err(why) => {
                super::fallback_console(format!(
                    "Failed to list the log directory because {:?}",
                    why
                ));
                return;
            }
        };

        let cut_off = (now - self.max_age).timestamp().max(0) as u64;
        for file in files {
            if file == self.cur_fn || file.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }

            let stale = fs::metadata(&file)
                .and_then(|metadata| metadata.modified())
                .ok()
                .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                .is_some_and(|age| age.as_secs() <= cut_off);

            if stale {
                if let Err(why) = fs::remove_file(&file) {
                    super::fallback_console(format!(
                        "couldn't remove the file({}). because {:?}",
                        file.display(),
                        why
                    ));
                }
            }
        }
    }

    fn files_in_directory(file_path: &Path) -> Result<Vec<PathBuf>, io::Error> {
        let parent_dir = match file_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(parent_dir)? {
            files.push(entry?.path());
        }

        Ok(files)
    }
}

impl Drop for Rotate {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("ticker_console_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn pattern(dir: &Path) -> String {
        format!("{}/%Y-%m-%d_test.log", dir.display())
    }

    #[test]
    fn test_generation_filename() {
        let base = "log/2025-02-03_app.log";
        assert_eq!(Rotate::generate_full_fn(base, 0), PathBuf::from("log/2025-02-03_app.log"));
        assert_eq!(Rotate::generate_full_fn(base, 1), PathBuf::from("log/2025-02-03_app.1.log"));
        assert_eq!(Rotate::generate_full_fn(base, 2), PathBuf::from("log/2025-02-03_app.2.log"));
    }

    #[test]
    fn test_switches_file_when_date_changes() {
        let dir = scratch_dir("rotate_date");
        let mut rotate = Rotate::new(pattern(&dir));
        let today = Local::now();
        let tomorrow = today + TimeDelta::days(1);

        rotate.write_msg(today, b"day one\n").unwrap();
        let first = rotate.current_file().to_path_buf();
        rotate.write_msg(tomorrow, b"day two\n").unwrap();
        let second = rotate.current_file().to_path_buf();
        rotate.flush().unwrap();

        assert_ne!(first, second);
        assert_eq!(first, dir.join(today.format("%Y-%m-%d_test.log").to_string()));
        assert_eq!(second, dir.join(tomorrow.format("%Y-%m-%d_test.log").to_string()));
        assert_eq!(fs::read_to_string(&first).unwrap(), "day one\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "day two\n");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_size_cap_opens_next_generation() {
        let dir = scratch_dir("rotate_size");
        let mut rotate = Rotate::with_options(pattern(&dir), 64, 7);
        let now = Local::now();
        let line = format!("{}\n", "X".repeat(39));

        for _ in 0..5 {
            rotate.write_msg(now, line.as_bytes()).unwrap();
        }
        rotate.flush().unwrap();

        let base = now.format("%Y-%m-%d_test").to_string();
        for generation in ["", ".1", ".2", ".3", ".4"] {
            let file = dir.join(format!("{}{}.log", base, generation));
            assert_eq!(fs::read_to_string(&file).unwrap(), line, "{}", file.display());
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_removes_files_past_retention() {
        let dir = scratch_dir("rotate_age");
        let mut rotate = Rotate::with_options(pattern(&dir), DEFAULT_MAX_SIZE, 7);
        let today = Local::now();

        rotate.write_msg(today, b"old\n").unwrap();
        let stale = rotate.current_file().to_path_buf();
        rotate.write_msg(today + TimeDelta::days(8), b"new\n").unwrap();

        assert!(!stale.exists());
        assert!(rotate.current_file().exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unwritable_directory() {
        let dir = scratch_dir("rotate_blocked");
        fs::create_dir_all(&dir).unwrap();
        // 同名的一般檔案擋住日誌目錄
        let blocker = dir.join("log");
        fs::write(&blocker, "").unwrap();

        let mut rotate = Rotate::new(format!("{}/%Y-%m-%d_test.log", blocker.display()));
        assert!(rotate.write_msg(Local::now(), b"lost\n").is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
