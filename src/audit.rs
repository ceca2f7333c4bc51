use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::record::{header_line, parse_call_id};
use crate::{AttemptRecord, FetchError, Result};

/// Append-only, crash-recoverable audit trail of fetch attempts.
///
/// The file handle and the call-id counter share one mutex, so issuing an id
/// and appending its row happen in a single critical section. The lock is
/// only ever held for synchronous work.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

#[derive(Debug)]
struct LogState {
    file: Option<File>,
    next_call_id: u64,
}

impl AuditLog {
    /// Opens or creates the log file at `path`.
    ///
    /// A missing file is created with a header. An existing file is
    /// truncated and re-headed when `overwrite` is set, otherwise it is
    /// appended to, after terminating an unterminated last line. Numbering
    /// resumes after the last row's id.
    pub fn open(path: impl AsRef<Path>, overwrite: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let exists = path.is_file();

        let mut file = if exists && !overwrite {
            OpenOptions::new().append(true).open(&path)?
        } else {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)?;
            file.write_all(header_line().as_bytes())?;
            file.sync_data()?;
            file
        };

        let content = fs::read_to_string(&path)?;
        if !content.is_empty() && !content.ends_with('\n') {
            // Unterminated last line (older writer or torn write): close it
            // so the next row starts on its own line.
            file.write_all(b"\n")?;
            file.sync_data()?;
        }
        let next_call_id = recover_next_call_id(&path, &content);

        #[cfg(feature = "tracing")]
        tracing::info!(
            path = %path.display(),
            next_call_id,
            truncated = exists && overwrite,
            "audit log opened"
        );

        Ok(Self {
            path,
            state: Mutex::new(LogState {
                file: Some(file),
                next_call_id,
            }),
        })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current call id and advances the counter.
    pub fn next_id(&self) -> u64 {
        let mut state = self.lock();
        let id = state.next_call_id;
        state.next_call_id += 1;
        id
    }

    /// The id the next attempt will receive, without consuming it.
    pub fn peek_next_id(&self) -> u64 {
        self.lock().next_call_id
    }

    /// Appends one row and syncs it to disk before returning.
    pub fn append(&self, record: &AttemptRecord) -> Result<()> {
        let mut state = self.lock();
        let file = state.file.as_mut().ok_or(FetchError::LogClosed)?;
        write_line(file, record)
    }

    /// Issues a fresh call id, builds the record with it and appends it,
    /// all under one lock. Returns the id that was used.
    ///
    /// Rows written through this method appear in the file in id order even
    /// when many fetches share the log.
    pub fn append_next(&self, build: impl FnOnce(u64) -> AttemptRecord) -> Result<u64> {
        let mut state = self.lock();
        let call_id = state.next_call_id;
        let file = state.file.as_mut().ok_or(FetchError::LogClosed)?;

        let mut record = build(call_id);
        record.call_id = call_id;
        write_line(file, &record)?;

        state.next_call_id += 1;
        Ok(call_id)
    }

    /// Syncs and releases the file handle. Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        let file = self.lock().file.take();
        if let Some(file) = file {
            file.sync_all()?;

            #[cfg(feature = "tracing")]
            tracing::debug!(path = %self.path.display(), "audit log closed");
        }
        Ok(())
    }

    /// Whether [`AuditLog::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().file.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        // The state stays consistent even if a holder panicked mid-write.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = state.file.take() {
            let _ = file.sync_all();
        }
    }
}

fn write_line(file: &mut File, record: &AttemptRecord) -> Result<()> {
    file.write_all(record.to_line().as_bytes())?;
    file.sync_data()?;
    Ok(())
}

/// Derives the id following the last row of the file content.
///
/// A header-only file starts at 0. A last line whose first field is not an
/// integer also starts at 0; numbering is then no longer unique across the
/// file, but the log stays usable.
fn recover_next_call_id(path: &Path, content: &str) -> u64 {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let Some(last) = lines.next_back() else {
        return 0;
    };
    if lines.next().is_none() {
        // only the header
        return 0;
    }

    match parse_call_id(last) {
        Some(id) => id.saturating_add(1),
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                path = %path.display(),
                "last audit log line has no numeric call id, restarting numbering at 0"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = path;
            0
        }
    }
}
