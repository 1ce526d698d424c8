//! Terminal logging with colored prefixes.
//!
//! - `log!` / `debug!` macros for `[module] message` lines
//! - `BuildProgress` for the single-line bulk build counter
//! - `status_success` / `status_error` for timestamped recompile results
//!
//! ```ignore
//! log!("build"; "converting {} documents", count);
//!
//! let progress = BuildProgress::new(count);
//! progress.converted();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::SystemTime,
};

/// Global verbose flag (set by --verbose)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set when a progress line owns the current terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("watch"; "{} changed", path);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when --verbose is enabled.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Write one `[module] message` line.
///
/// If a progress line is on screen it is cleared first so the message does
/// not get glued to the counter.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "recompile" => prefix.bright_cyan().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status
// ============================================================================

/// Current wall-clock time as `HH:MM:SS` (UTC).
fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Serializes timestamped status blocks so a multi-line converter
/// diagnostic is never interleaved with another result.
static WATCH_STATUS: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

fn display_status(symbol: String, message: &str) {
    let _guard = WATCH_STATUS.lock();
    let timestamp = format!("[{}]", now()).dimmed().to_string();
    let mut stdout = stdout().lock();
    writeln!(stdout, "{timestamp} {symbol} {message}").ok();
    stdout.flush().ok();
}

/// Timestamped success line (`✓`, green).
pub fn status_success(message: &str) {
    display_status(format!("{}", "✓".green()), message);
}

/// Timestamped error block (`✗`, red); the detail keeps its own lines.
pub fn status_error(summary: &str, detail: &str) {
    display_status(format!("{}", "✗".red()), &error_block(summary, detail));
}

fn error_block(summary: &str, detail: &str) -> String {
    let detail = detail.trim();
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

// ============================================================================
// Build Progress
// ============================================================================

/// Single-line bulk build counter: `[build] converted(42/69) failed(1)`.
///
/// Updated from rayon workers. Refreshes use `try_lock` so a busy terminal
/// never stalls a conversion.
pub struct BuildProgress {
    total: usize,
    converted: AtomicUsize,
    failed: AtomicUsize,
    lock: Mutex<()>,
}

impl BuildProgress {
    pub fn new(total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let progress = Self {
            total,
            converted: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            lock: Mutex::new(()),
        };
        progress.display(false);
        progress
    }

    pub fn converted(&self) {
        self.converted.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    pub fn counts(&self) -> (usize, usize) {
        (
            self.converted.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }

    fn refresh(&self) {
        if let Some(_guard) = self.lock.try_lock() {
            self.display(false);
        }
    }

    fn line(&self) -> String {
        let (converted, failed) = self.counts();
        let mut line = format!("converted({converted}/{})", self.total);
        if failed > 0 {
            line.push_str(&format!(" failed({failed})"));
        }
        line
    }

    fn display(&self, newline: bool) {
        let prefix = colorize_prefix("build");
        let line = self.line();
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(stdout, "{prefix} {line}").ok();
        } else {
            write!(stdout, "{prefix} {line}").ok();
        }
        stdout.flush().ok();
    }

    /// Print the final counts and release the terminal line.
    pub fn finish(self) {
        {
            let _guard = self.lock.lock();
            self.display(true);
        }
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        std::mem::forget(self);
    }
}

impl Drop for BuildProgress {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}
