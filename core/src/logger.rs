// Ring-buffer logger for targets without a console

use core::fmt::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};
use spin::Mutex;

const MAX_LOG_ENTRIES: usize = 32;
const MAX_LINE_LEN: usize = 96;

/// One captured log line, truncated to `MAX_LINE_LEN` bytes.
#[derive(Clone, Copy)]
pub struct LogLine {
    level: Level,
    len: u8,
    text: [u8; MAX_LINE_LEN],
}

impl LogLine {
    const EMPTY: LogLine = LogLine {
        level: Level::Trace,
        len: 0,
        text: [0; MAX_LINE_LEN],
    };

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn text(&self) -> &str {
        // Writes stop on char boundaries, so this never fails in practice.
        core::str::from_utf8(&self.text[..self.len as usize]).unwrap_or("")
    }
}

impl Write for LogLine {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let used = self.len as usize;
        let room = MAX_LINE_LEN - used;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.text[used..used + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len = (used + take) as u8;
        Ok(())
    }
}

struct Ring {
    lines: [LogLine; MAX_LOG_ENTRIES],
    /// Total lines ever written; `total % MAX_LOG_ENTRIES` is the next slot.
    total: usize,
}

/// Keeps the last `MAX_LOG_ENTRIES` records in memory.
///
/// Install it once at start-up to capture the explorer's diagnostics;
/// leave it uninstalled and they cost nothing.
///
/// ```ignore
/// static LOGGER: RingLogger = RingLogger::new(LevelFilter::Debug);
/// LOGGER.install().ok();
/// ```
pub struct RingLogger {
    level: LevelFilter,
    ring: Mutex<Ring>,
}

impl RingLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            level,
            ring: Mutex::new(Ring {
                lines: [LogLine::EMPTY; MAX_LOG_ENTRIES],
                total: 0,
            }),
        }
    }

    /// Make this the global `log` backend.
    pub fn install(&'static self) -> Result<(), log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.level);
        Ok(())
    }

    /// Lines currently held (at most `MAX_LOG_ENTRIES`).
    pub fn len(&self) -> usize {
        self.ring.lock().total.min(MAX_LOG_ENTRIES)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lines ever written, including overwritten ones.
    pub fn total(&self) -> usize {
        self.ring.lock().total
    }

    pub fn clear(&self) {
        self.ring.lock().total = 0;
    }

    /// Visit every held line, oldest first.
    pub fn for_each(&self, f: impl FnMut(&LogLine)) {
        self.last_n(MAX_LOG_ENTRIES, f);
    }

    /// Visit the newest `n` lines, oldest first.
    pub fn last_n(&self, n: usize, mut f: impl FnMut(&LogLine)) {
        let ring = self.ring.lock();
        let count = n.min(ring.total).min(MAX_LOG_ENTRIES);
        let start = ring.total - count;
        for i in start..ring.total {
            f(&ring.lines[i % MAX_LOG_ENTRIES]);
        }
    }
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = LogLine::EMPTY;
        line.level = record.level();
        let _ = write!(line, "{}", record.args());

        let mut ring = self.ring.lock();
        let slot = ring.total % MAX_LOG_ENTRIES;
        ring.lines[slot] = line;
        ring.total += 1;
    }

    fn flush(&self) {}
}
