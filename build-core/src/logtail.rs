//! Log Tailing
//!
//! Follows a log file that another process is still writing:
//! - The file may not exist yet (nothing is returned until it does)
//! - Only complete lines are returned; a trailing partial line is held back
//! - Truncation restarts reading from the beginning
//! - `LogWatcher` uses `notify` to wake early, otherwise waits a fixed interval

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

/// Incremental reader over a growing file.
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    /// Bytes after the last newline, undecoded
    pending: Vec<u8>,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Complete lines appended since the previous call.
    pub fn poll(&mut self) -> std::io::Result<Vec<String>> {
        let mut file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            debug!("{} was truncated, restarting", self.path.display());
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let read = file.read_to_end(&mut self.pending)?;
        self.offset += read as u64;

        // Decode only up to the last newline so a split character waits
        // for its remaining bytes.
        let Some(last) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete: Vec<u8> = self.pending.drain(..=last).collect();
        Ok(String::from_utf8_lossy(&complete)
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// Final read: like `poll`, plus any unterminated last line.
    pub fn finish(&mut self) -> std::io::Result<Vec<String>> {
        let mut lines = self.poll()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            lines.push(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string());
        }
        Ok(lines)
    }
}

/// Wakes the tailing loop when the watched directory changes.
pub struct LogWatcher {
    _watcher: Option<RecommendedWatcher>,
    receiver: Receiver<notify::Result<Event>>,
    interval: Duration,
}

impl LogWatcher {
    /// Watch the directory holding `path`. Falls back to plain interval
    /// polling if the platform watcher cannot be created.
    pub fn new(path: &Path, interval: Duration) -> Self {
        let (tx, receiver) = channel();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let watcher = match notify::recommended_watcher(tx) {
            Ok(mut w) => match w.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => Some(w),
                Err(e) => {
                    warn!("Failed to watch {}: {}, polling instead", dir.display(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to create file watcher: {}, polling instead", e);
                None
            }
        };

        Self {
            _watcher: watcher,
            receiver,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until a filesystem event arrives or the interval elapses.
    pub fn wait(&self) {
        match self.receiver.recv_timeout(self.interval) {
            Ok(Err(e)) => warn!("File watcher error: {}", e),
            Ok(Ok(_)) | Err(RecvTimeoutError::Timeout) => {}
            // Sender dropped with the watcher; keep the fixed cadence
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(self.interval),
        }
        while self.receiver.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        append_bytes(path, text.as_bytes());
    }

    fn append_bytes(path: &Path, bytes: &[u8]) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(bytes).unwrap();
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut tail = LogTail::new(dir.path().join("lint.log"));
        assert!(tail.poll().unwrap().is_empty());
        assert_eq!(tail.offset(), 0);
    }

    #[test]
    fn test_reads_only_new_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("lint.log");
        let mut tail = LogTail::new(&log);

        append(&log, "first\nsecond\n");
        assert_eq!(tail.poll().unwrap(), vec!["first", "second"]);

        append(&log, "third\r\n");
        assert_eq!(tail.poll().unwrap(), vec!["third"]);
        assert!(tail.poll().unwrap().is_empty());
    }

    #[test]
    fn test_partial_line_held_until_complete() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("lint.log");
        let mut tail = LogTail::new(&log);

        append(&log, "src/map.cpp:12: warn");
        assert!(tail.poll().unwrap().is_empty());

        append(&log, "ing\nnext");
        assert_eq!(tail.poll().unwrap(), vec!["src/map.cpp:12: warning"]);
        assert_eq!(tail.finish().unwrap(), vec!["next"]);
    }

    #[test]
    fn test_multibyte_char_split_across_polls() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("lint.log");
        let mut tail = LogTail::new(&log);

        let line = "src/caf\u{e9}.cpp:3: style\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xc3).unwrap() + 1;
        append_bytes(&log, &line[..split]);
        assert!(tail.poll().unwrap().is_empty());

        append_bytes(&log, &line[split..]);
        assert_eq!(tail.poll().unwrap(), vec!["src/caf\u{e9}.cpp:3: style"]);
    }

    #[test]
    fn test_truncation_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("lint.log");
        let mut tail = LogTail::new(&log);

        append(&log, "old line one\nold line two\n");
        assert_eq!(tail.poll().unwrap().len(), 2);

        std::fs::write(&log, "new\n").unwrap();
        assert_eq!(tail.poll().unwrap(), vec!["new"]);
    }

    #[test]
    fn test_watcher_wait_returns() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = LogWatcher::new(&dir.path().join("lint.log"), Duration::from_millis(10));
        watcher.wait();
        assert_eq!(watcher.interval(), Duration::from_millis(10));
    }
}
