//! 日志：env_logger 控制台彩色输出，同时追加写入 `LOG_DIR/qtum-indexer.log`，启动时按大小轮转
use env_logger::fmt::Formatter;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter, Record};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

const ENV_LOG_DIR: &str = "LOG_DIR";
const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "qtum-indexer.log";
const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATIONS: usize = 5;

/// 依赖库的噪声日志只保留 warn 以上
const QUIET_TARGETS: [&str; 4] = ["ethers_providers", "reqwest", "hyper", "diesel"];

static INIT: Once = Once::new();
static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

struct LoggerSettings {
    dir: PathBuf,
    level: LevelFilter,
}

impl LoggerSettings {
    fn from_env() -> Self {
        let dir = std::env::var(ENV_LOG_DIR).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        let raw_level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "INFO".to_string());
        let level = parse_level(&raw_level).unwrap_or_else(|| {
            eprintln!("⚠️ 无效日志级别「{}」，使用默认 INFO", raw_level);
            LevelFilter::Info
        });
        Self {
            dir: PathBuf::from(dir),
            level,
        }
    }

    fn file_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" | "WARNING" => Some(LevelFilter::Warn),
        "ERROR" => Some(LevelFilter::Error),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}

pub fn init_logger() {
    INIT.call_once(|| {
        let settings = LoggerSettings::from_env();
        let file_enabled = prepare_log_file(&settings);

        let mut builder = Builder::from_default_env();
        builder.filter(None, settings.level);
        for target in QUIET_TARGETS {
            builder.filter(Some(target), LevelFilter::Warn);
        }
        builder
            .write_style(WriteStyle::Always)
            .target(Target::Stdout)
            .format(move |f: &mut Formatter, record: &Record| {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
                if file_enabled {
                    append_to_file(&file_line(&now, record));
                }
                writeln!(f, "{}", console_line(&now, record))
            });

        match builder.try_init() {
            Ok(()) => log::info!(
                "✅ 日志系统初始化完成 | 级别: {} | 日志文件: {}",
                settings.level,
                settings.file_path().display()
            ),
            Err(e) => eprintln!("❌ 日志初始化失败: {}", e),
        }
    });
}

/// 建目录、轮转、以追加模式打开日志文件；失败时只输出到控制台
fn prepare_log_file(settings: &LoggerSettings) -> bool {
    if let Err(e) = fs::create_dir_all(&settings.dir) {
        eprintln!("❌ 创建日志目录失败: {}", e);
        return false;
    }
    if let Err(e) = rotate_logs(&settings.file_path(), MAX_FILE_BYTES, KEEP_ROTATIONS) {
        eprintln!("⚠️ 日志轮转失败: {}", e);
    }
    match OpenOptions::new().create(true).append(true).open(settings.file_path()) {
        Ok(file) => match LOG_FILE.lock() {
            Ok(mut guard) => {
                *guard = Some(file);
                true
            }
            Err(_) => false,
        },
        Err(e) => {
            eprintln!("❌ 打开日志文件失败: {}", e);
            false
        }
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[91m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[92m",
        Level::Debug => "\x1b[96m",
        Level::Trace => "\x1b[95m",
    }
}

fn console_line(now: &str, record: &Record) -> String {
    const RESET: &str = "\x1b[0m";
    format!(
        "[{}] [{}{:>5}{}] [\x1b[31m{}{}] - {}",
        now,
        level_color(record.level()),
        record.level(),
        RESET,
        record.module_path().unwrap_or("unknown"),
        RESET,
        record.args()
    )
}

fn file_line(now: &str, record: &Record) -> String {
    format!(
        "[{}] [线程: {}] [模块: {}] [级别: {}] - {}\n",
        now,
        std::thread::current().name().unwrap_or("unknown"),
        record.module_path().unwrap_or("unknown"),
        record.level(),
        record.args()
    )
}

/// 写文件失败不影响控制台输出
fn append_to_file(line: &str) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

/// 超过 max_bytes 时 `name` → `name.1` → … → `name.keep`，最旧的被覆盖
fn rotate_logs(path: &Path, max_bytes: u64, keep: usize) -> io::Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size < max_bytes || keep == 0 {
        return Ok(false);
    }

    let numbered = |i: usize| {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{}", i));
        PathBuf::from(name)
    };
    for i in (1..keep).rev() {
        let src = numbered(i);
        if src.exists() {
            fs::rename(&src, numbered(i + 1))?;
        }
    }
    fs::rename(path, numbered(1))?;
    Ok(true)
}

// ==================== 便捷日志宏 ====================
#[macro_export]
macro_rules! log_trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
#[macro_export]
macro_rules! log_debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)*) => { log::info!($($arg)*) }; }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
#[macro_export]
macro_rules! log_error { ($($arg:tt)*) => { log::error!($($arg)*) }; }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" Warning "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn rotates_only_when_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);

        assert!(!rotate_logs(&path, 4, 3).unwrap());

        fs::write(&path, "ab").unwrap();
        assert!(!rotate_logs(&path, 4, 3).unwrap());

        fs::write(&path, "first").unwrap();
        assert!(rotate_logs(&path, 4, 3).unwrap());
        fs::write(&path, "second").unwrap();
        assert!(rotate_logs(&path, 4, 3).unwrap());

        assert!(!path.exists());
        let rotated = |i: usize| dir.path().join(format!("{}.{}", LOG_FILE_NAME, i));
        assert_eq!(fs::read_to_string(rotated(1)).unwrap(), "second");
        assert_eq!(fs::read_to_string(rotated(2)).unwrap(), "first");
    }
}
