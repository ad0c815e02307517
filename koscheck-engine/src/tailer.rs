//! Incremental chat log reader.
//!
//! The game appends one line per chat message. A KOS-check request is a
//! message starting with `xxx `, for example:
//!
//! ```text
//! [ 2026.10.19 12:00:01 ] Alice > xxx Bob  Carol #gf
//! ```
//!
//! Names are separated by two spaces, and anything after `#` is a comment
//! that is echoed back with the results.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use koscheck_core::{KosResult, TailError};

/// Separates the speaker prefix from the requested names.
pub const COMMAND_MARKER: &str = "> xxx ";
/// Starts the free-text comment at the end of a request.
pub const COMMENT_DELIMITER: char = '#';
/// Separates names inside one request.
pub const NAME_DELIMITER: &str = "  ";
/// Longest line read in one piece. Longer runs are consumed and dropped.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// One recognised KOS-check request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailEntry {
    /// Raw names as typed. The processor normalises them.
    pub names: Vec<String>,
    /// `"<timestamp> <speaker>"`, plus `" > <comment>"` when one was given.
    pub comment: String,
}

/// Outcome of reading at the current offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// No complete line yet. The offset did not move.
    Pending,
    /// A complete line that is not a request was consumed.
    Skipped,
    Entry(TailEntry),
}

/// Reads complete lines appended to one log file.
pub struct LogTailer {
    path: PathBuf,
    file: File,
    offset: u64,
}

impl LogTailer {
    /// Tail `path` from the beginning, replaying every request already in it.
    pub fn open<P: AsRef<Path>>(path: P) -> KosResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| io_error(&path, e))?;
        tracing::info!(path = %path.display(), "Tailing chat log from start");
        Ok(Self {
            path,
            file,
            offset: 0,
        })
    }

    /// Tail `path` from its current end, ignoring existing content.
    pub fn open_at_end<P: AsRef<Path>>(path: P) -> KosResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| io_error(&path, e))?;
        let offset = file.metadata().map_err(|e| io_error(&path, e))?.len();
        tracing::info!(path = %path.display(), offset, "Tailing chat log from end");
        Ok(Self { path, file, offset })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read at most one line. `None` covers both "nothing new yet" and
    /// "a line that is not a request".
    pub fn poll(&mut self) -> KosResult<Option<TailEntry>> {
        match self.poll_line()? {
            LineRead::Entry(entry) => Ok(Some(entry)),
            LineRead::Pending | LineRead::Skipped => Ok(None),
        }
    }

    /// Read at most one line, telling apart an idle file from a consumed
    /// line that was not a request.
    pub fn poll_line(&mut self) -> KosResult<LineRead> {
        self.file
            .seek(SeekFrom::Start(self.offset))
            .map_err(|e| io_error(&self.path, e))?;

        let mut reader = BufReader::new(&mut self.file);
        let mut buf = Vec::new();
        let read = reader
            .by_ref()
            .take(MAX_LINE_LEN as u64 + 1)
            .read_until(b'\n', &mut buf)
            .map_err(|e| io_error(&self.path, e))?;

        if read > MAX_LINE_LEN {
            let rest = if buf.last() == Some(&b'\n') {
                Some(0)
            } else {
                skip_past_newline(&mut reader).map_err(|e| io_error(&self.path, e))?
            };
            // An oversized line is only dropped once its terminator is on disk.
            let Some(rest) = rest else {
                return Ok(LineRead::Pending);
            };
            self.offset += (read + rest) as u64;
            tracing::warn!(offset = self.offset, "Dropping oversized log line");
            return Ok(LineRead::Skipped);
        }
        // A writer may be mid-line; leave it for the next poll.
        if read == 0 || buf.last() != Some(&b'\n') {
            return Ok(LineRead::Pending);
        }
        self.offset += read as u64;

        let line = sanitize(&buf);
        match parse_line(&line) {
            Some(entry) => {
                tracing::debug!(names = entry.names.len(), offset = self.offset, "KOS request read");
                Ok(LineRead::Entry(entry))
            }
            None => Ok(LineRead::Skipped),
        }
    }
}

impl std::fmt::Debug for LogTailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTailer")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .finish()
    }
}

/// Consume bytes up to and including the next newline, returning how many
/// were consumed. `None` when the file ends first.
fn skip_past_newline<R: BufRead>(reader: &mut R) -> std::io::Result<Option<usize>> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(None);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(Some(skipped + pos + 1));
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

fn io_error(path: &Path, e: std::io::Error) -> TailError {
    TailError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Keep printable ASCII only. This also flattens the UTF-16LE the game
/// writes, whose high bytes are all zero for ASCII text.
fn sanitize(raw: &[u8]) -> String {
    raw.iter()
        .filter(|b| b.is_ascii_graphic() || **b == b' ')
        .map(|&b| char::from(b))
        .collect()
}

/// Parse one sanitised log line into a request, if it is one.
pub fn parse_line(line: &str) -> Option<TailEntry> {
    let (prefix, rest) = line.split_once(COMMAND_MARKER)?;

    let (names_part, comment) = match rest.split_once(COMMENT_DELIMITER) {
        Some((names, comment)) => (names, Some(comment.trim())),
        None => (rest, None),
    };

    let names = names_part
        .trim()
        .split(NAME_DELIMITER)
        .map(str::to_string)
        .collect();

    Some(TailEntry {
        names,
        comment: describe(prefix, comment),
    })
}

fn describe(prefix: &str, comment: Option<&str>) -> String {
    let prefix = prefix.trim();
    let (timestamp, speaker) = match prefix.strip_prefix('[').and_then(|r| r.split_once(']')) {
        Some((ts, speaker)) => (format!("[{}]", ts), speaker.trim()),
        None => (String::new(), prefix),
    };

    let header = [timestamp.as_str(), speaker]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match comment.filter(|c| !c.is_empty()) {
        Some(comment) => format!("{} > {}", header, comment),
        None => header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koscheck_core::KosError;
    use koscheck_test_utils::generators::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file creation should succeed");
        file.write_all(content).expect("write should succeed");
        file.flush().expect("flush should succeed");
        file
    }

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_poll_request_then_nothing() {
        let log = log_with(b"[12:00:01] Alice> xxx Bob  Carol #gf\n");
        let mut tailer = LogTailer::open(log.path()).expect("open should succeed");

        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["Bob".to_string(), "Carol".to_string()]);
        assert_eq!(entry.comment, "[12:00:01] Alice > gf");

        assert_eq!(tailer.poll().expect("poll should succeed"), None);
    }

    #[test]
    fn test_partial_line_does_not_advance() {
        let mut log = log_with(b"[12:00:01] Alice> xxx Bo");
        let mut tailer = LogTailer::open(log.path()).expect("open should succeed");

        assert_eq!(tailer.poll_line().expect("poll should succeed"), LineRead::Pending);
        assert_eq!(tailer.offset(), 0);

        log.write_all(b"b\n").expect("append should succeed");
        log.flush().expect("flush should succeed");

        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["Bob".to_string()]);
        assert_eq!(entry.comment, "[12:00:01] Alice");
    }

    #[test]
    fn test_chatter_is_skipped_and_consumed() {
        let log = log_with(b"[12:00:00] Alice > o7\n[12:00:02] Bob > xxx Dave\n");
        let mut tailer = LogTailer::open(log.path()).expect("open should succeed");

        assert_eq!(tailer.poll_line().expect("poll should succeed"), LineRead::Skipped);
        assert!(tailer.offset() > 0);
        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["Dave".to_string()]);
        assert_eq!(tailer.poll_line().expect("poll should succeed"), LineRead::Pending);
    }

    #[test]
    fn test_open_at_end_ignores_existing_lines() {
        let mut log = log_with(b"[12:00:01] Alice> xxx Old Name\n");
        let mut tailer = LogTailer::open_at_end(log.path()).expect("open should succeed");
        assert_eq!(tailer.poll().expect("poll should succeed"), None);

        log.write_all(b"[12:05:00] Alice> xxx New Name\n")
            .expect("append should succeed");
        log.flush().expect("flush should succeed");

        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["New Name".to_string()]);
    }

    #[test]
    fn test_utf16le_log_line() {
        let mut content = vec![0xFF, 0xFE];
        content.extend(utf16le("[ 2026.10.19 12:00:01 ] Alice > xxx Bob  Carol\r\n"));
        let log = log_with(&content);
        let mut tailer = LogTailer::open(log.path()).expect("open should succeed");

        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["Bob".to_string(), "Carol".to_string()]);
        assert_eq!(entry.comment, "[ 2026.10.19 12:00:01 ] Alice");
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut content = vec![b'a'; MAX_LINE_LEN + 10];
        content.extend_from_slice(b"\n[12:00:01] Alice> xxx Bob\n");
        let log = log_with(&content);
        let mut tailer = LogTailer::open(log.path()).expect("open should succeed");

        assert_eq!(tailer.poll_line().expect("poll should succeed"), LineRead::Skipped);
        assert_eq!(tailer.offset(), (MAX_LINE_LEN + 11) as u64);
        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["Bob".to_string()]);
    }

    #[test]
    fn test_oversized_partial_line_does_not_advance() {
        let mut log = log_with(&vec![b'a'; MAX_LINE_LEN + 10]);
        let mut tailer = LogTailer::open(log.path()).expect("open should succeed");

        assert_eq!(tailer.poll_line().expect("poll should succeed"), LineRead::Pending);
        assert_eq!(tailer.offset(), 0);

        log.write_all(b"aaa\n[12:00:01] Alice> xxx Bob\n").expect("write should succeed");
        log.flush().expect("flush should succeed");

        assert_eq!(tailer.poll_line().expect("poll should succeed"), LineRead::Skipped);
        assert_eq!(tailer.offset(), (MAX_LINE_LEN + 14) as u64);
        let entry = tailer.poll().expect("poll should succeed").expect("entry expected");
        assert_eq!(entry.names, vec!["Bob".to_string()]);
    }

    #[test]
    fn test_missing_file_is_tail_error() {
        let err = LogTailer::open("/nonexistent/Fleet_20261019_120000.txt").expect_err("open should fail");
        assert!(matches!(err, KosError::Tail(TailError::Io { .. })));
    }

    #[test]
    fn test_parse_line_without_timestamp() {
        let entry = parse_line("Alice> xxx Bob #  hostile  ").expect("entry expected");
        assert_eq!(entry.comment, "Alice > hostile");
        assert!(parse_line("Alice > hello there").is_none());
    }

    #[test]
    fn test_parse_line_blank_comment_is_dropped() {
        let entry = parse_line("[12:00:01] Alice> xxx Bob #").expect("entry expected");
        assert_eq!(entry.comment, "[12:00:01] Alice");
    }

    proptest! {
        #[test]
        fn prop_parse_line_recovers_names_and_comment(
            ts in arb_timestamp(),
            speaker in arb_entity_name(),
            names in arb_entity_names(),
            comment in arb_comment(),
        ) {
            let line = format!("{} {} > xxx {} #{}", ts, speaker, names.join(NAME_DELIMITER), comment);
            let entry = parse_line(&line).expect("entry expected");
            prop_assert_eq!(entry.names, names);
            prop_assert_eq!(entry.comment, format!("{} {} > {}", ts, speaker, comment));
        }

        #[test]
        fn prop_lines_without_marker_are_ignored(text in "[A-Za-z0-9 #>]{0,40}") {
            prop_assume!(!text.contains(COMMAND_MARKER));
            prop_assert!(parse_line(&text).is_none());
        }
    }
}
