//! Dump Sink
//!
//! Diagnostic persistence of raw received bytes.
//!
//! ```text
//! {dump_root}/
//!   └── {unix nanos at run start}/
//!         ├── 1.dat      (everything session 1 received, in order)
//!         └── 2.dat
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::error::Result;

/// Extension of every dump file
pub const DUMP_EXTENSION: &str = "dat";

/// Per-run dump directory; a disabled sink ignores everything
#[derive(Debug, Clone)]
pub struct DumpSink {
    dir: Option<PathBuf>,
}

impl DumpSink {
    /// A sink that records nothing
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Create the run directory under `root` when `enabled`
    pub fn create(root: impl AsRef<Path>, enabled: bool) -> Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let started = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let dir = root.as_ref().join(started.to_string());
        fs::create_dir_all(&dir)?;

        tracing::info!("[dump dir]: {}", dir.display());
        Ok(Self { dir: Some(dir) })
    }

    /// The run directory, if dumping is enabled
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Path of the file holding a session's received bytes
    pub fn file_for(&self, session: u64) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", session, DUMP_EXTENSION)))
    }

    /// Append one received buffer to the session's file
    ///
    /// Failures are logged and swallowed; dumping never ends a session.
    pub fn record(&self, session: u64, bytes: &[u8]) {
        let Some(path) = self.file_for(session) else {
            return;
        };

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(bytes));

        match written {
            Ok(()) => tracing::trace!("[{}] dumped {} bytes to {}", session, bytes.len(), path.display()),
            Err(e) => tracing::warn!("[{}] failed to dump to {}: {}", session, path.display(), e),
        }
    }
}
