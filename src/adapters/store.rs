//! On-disk storage adapter.
//!
//! Two artifacts under the data directory:
//!
//! - `session.bin` — the postcard-encoded recovery snapshot. Written with
//!   a temp-file-then-rename sequence so a power cut mid-write leaves the
//!   previous snapshot intact.
//! - `sessions.jsonl` — an append-only JSON-lines log, one record per
//!   completed session, for offline reporting.
//!
//! A missing recovery file is a normal cold boot, not an error. A file
//! that decodes to garbage is reported as corrupted and the caller starts
//! fresh.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::error::IoError;
use crate::ports::Storage;
use crate::session::SessionSnapshot;

const SNAPSHOT_FILE: &str = "session.bin";
const SNAPSHOT_TMP: &str = "session.bin.tmp";
const LOG_FILE: &str = "sessions.jsonl";

/// One line of `sessions.jsonl`.
#[derive(Serialize)]
struct SessionRecord {
    count: u16,
    cumulative_count: u32,
    started_at: u64,
    stopped_at: u64,
    duration_secs: u64,
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, IoError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            warn!("store: cannot create {}: {e}", dir.display());
            IoError::Unavailable
        })?;
        Ok(Self { dir })
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Append a completed-session record to the JSON-lines log.
    fn append_session_record(&self, snap: &SessionSnapshot) -> Result<(), IoError> {
        let (Some(started), Some(stopped)) = (snap.started_at, snap.stopped_at) else {
            return Ok(());
        };
        let record = SessionRecord {
            count: snap.count,
            cumulative_count: snap.cumulative_count,
            started_at: started.0,
            stopped_at: stopped.0,
            duration_secs: stopped.secs_since(started),
        };
        let mut line = serde_json::to_string(&record).map_err(|e| {
            warn!("store: session record encode failed: {e}");
            IoError::WriteFailed
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(LOG_FILE))
            .map_err(|e| {
                warn!("store: cannot open session log: {e}");
                IoError::WriteFailed
            })?;
        file.write_all(line.as_bytes()).map_err(|e| {
            warn!("store: session log append failed: {e}");
            IoError::WriteFailed
        })
    }
}

impl Storage for FileStore {
    fn persist(&mut self, snap: &SessionSnapshot) -> Result<(), IoError> {
        let bytes = postcard::to_allocvec(snap).map_err(|e| {
            warn!("store: snapshot encode failed: {e}");
            IoError::WriteFailed
        })?;

        let tmp = self.dir.join(SNAPSHOT_TMP);
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, self.snapshot_path())
        };
        write().map_err(|e| {
            warn!("store: snapshot write failed: {e}");
            IoError::WriteFailed
        })?;
        debug!("store: snapshot saved ({} bytes)", bytes.len());

        if !snap.active {
            self.append_session_record(snap)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<Option<SessionSnapshot>, IoError> {
        let path = self.snapshot_path();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!("store: snapshot read failed: {e}");
                return Err(IoError::ReadFailed);
            }
        };
        match postcard::from_bytes::<SessionSnapshot>(&bytes) {
            Ok(snap) => Ok(Some(snap)),
            Err(e) => {
                warn!("store: snapshot corrupted: {e}");
                Err(IoError::Corrupted)
            }
        }
    }
}
