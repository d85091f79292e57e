//! Persistence sink: one `<id>.json` artifact per order.
//!
//! ## `persist` protocol
//!
//! 1. Artifact already present → `Skipped`, nothing touched.
//! 2. Write the body to `<id>.json.<pid>.orderpull.tmp`.
//! 3. Hard-link the temp file to `<id>.json`. Linking fails if the target
//!    exists, so creation is exclusive and a reader never sees a partial file.
//!    Where the filesystem has no hard links, rename instead, after checking
//!    that the target is still absent.
//! 4. Remove the temp file, whatever happened in step 3.
//!
//! The presence of `<id>.json` is the only resume signal, so a truncated
//! artifact left by an interrupted write would be mistaken for a completed
//! fetch. Steps 2-3 rule that out.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use orderpull_core::OrderId;

use crate::error::{io_err, SinkError};

const ARTIFACT_EXT: &str = "json";

// ---------------------------------------------------------------------------
// Persist result
// ---------------------------------------------------------------------------

/// Outcome of persisting one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistResult {
    /// A new artifact was created.
    Written { path: PathBuf },
    /// An artifact already existed and was left unchanged.
    Skipped { path: PathBuf },
}

impl PersistResult {
    pub fn path(&self) -> &Path {
        match self {
            PersistResult::Written { path } | PersistResult::Skipped { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// OrderSink
// ---------------------------------------------------------------------------

/// Flat output directory holding one JSON document per order.
#[derive(Debug, Clone)]
pub struct OrderSink {
    dir: PathBuf,
}

impl OrderSink {
    /// Create the output directory if needed. Idempotent.
    pub fn prepare(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        Ok(Self { dir })
    }

    /// Sink over `dir` without touching the filesystem. Read-only callers use
    /// this so that a missing directory is never created.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<id>.json`, pure, no I/O.
    pub fn artifact_path(&self, id: &OrderId) -> Result<PathBuf, SinkError> {
        check_file_name(id)?;
        Ok(self.dir.join(format!("{id}.{ARTIFACT_EXT}")))
    }

    /// Whether an artifact for `id` is already on disk.
    pub fn is_fetched(&self, id: &OrderId) -> Result<bool, SinkError> {
        let path = self.artifact_path(id)?;
        path.try_exists().map_err(|e| io_err(path, e))
    }

    /// Write `body` verbatim as the artifact for `id`, unless one exists.
    pub fn persist(&self, id: &OrderId, body: &str) -> Result<PersistResult, SinkError> {
        let path = self.artifact_path(id)?;
        let tmp = self.dir.join(format!(
            "{id}.{ARTIFACT_EXT}.{}.orderpull.tmp",
            std::process::id()
        ));
        persist_with_tmp(&path, body, &tmp, hard_link)
    }

    /// IDs that have an artifact in the output directory. A directory that
    /// does not exist yet holds none.
    pub fn list_artifacts(&self) -> Result<BTreeSet<OrderId>, SinkError> {
        let mut ids = BTreeSet::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(io_err(&self.dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                if !stem.is_empty() {
                    ids.insert(OrderId::from(stem));
                }
            }
        }
        Ok(ids)
    }
}

fn hard_link(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::hard_link(src, dst)
}

/// Move `tmp` into place when the filesystem has no hard links (FAT, exFAT,
/// some network shares). Exclusive only against files that already exist.
fn rename_if_absent(tmp: &Path, path: &Path) -> std::io::Result<()> {
    if path.try_exists()? {
        return Err(std::io::Error::from(ErrorKind::AlreadyExists));
    }
    std::fs::rename(tmp, path)
}

fn links_unsupported(err: &std::io::Error) -> bool {
    // vfat reports EPERM for link(2).
    matches!(err.kind(), ErrorKind::Unsupported | ErrorKind::PermissionDenied)
}

fn persist_with_tmp(
    path: &Path,
    body: &str,
    tmp: &Path,
    link: fn(&Path, &Path) -> std::io::Result<()>,
) -> Result<PersistResult, SinkError> {
    if path.exists() {
        tracing::debug!("artifact exists, not overwriting: {}", path.display());
        return Ok(PersistResult::Skipped {
            path: path.to_path_buf(),
        });
    }

    if let Err(e) = std::fs::write(tmp, body) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    let linked = match link(tmp, path) {
        Err(e) if links_unsupported(&e) => {
            tracing::debug!("hard links unavailable ({e}), renaming into place");
            rename_if_absent(tmp, path)
        }
        other => other,
    };
    let _ = std::fs::remove_file(tmp);

    match linked {
        Ok(()) => {
            tracing::debug!("wrote: {}", path.display());
            Ok(PersistResult::Written {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::debug!("lost create race, keeping existing: {}", path.display());
            Ok(PersistResult::Skipped {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(io_err(path, e)),
    }
}

fn check_file_name(id: &OrderId) -> Result<(), SinkError> {
    let s = id.as_str();
    let unsafe_name = s.is_empty()
        || s == "."
        || s == ".."
        || s.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());
    if unsafe_name {
        return Err(SinkError::UnsafeId { id: s.to_string() });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sink(tmp: &TempDir) -> OrderSink {
        OrderSink::prepare(tmp.path().join("orders")).unwrap()
    }

    #[test]
    fn prepare_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("orders");
        OrderSink::prepare(&dir).unwrap();
        fs::write(dir.join("1.json"), "{}").unwrap();
        OrderSink::prepare(&dir).unwrap();
        assert!(dir.join("1.json").exists(), "re-prepare must not wipe artifacts");
    }

    #[test]
    fn first_persist_writes_body_verbatim() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        let id = OrderId::from("896024925");
        let body = "{\"data\":  {\"order\": null}}\n";

        let result = sink.persist(&id, body).unwrap();
        assert!(matches!(result, PersistResult::Written { .. }));
        assert_eq!(fs::read_to_string(result.path()).unwrap(), body);
        assert_eq!(result.path(), sink.dir().join("896024925.json"));
    }

    #[test]
    fn existing_artifact_is_skipped_and_left_unchanged() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        let id = OrderId::from("2");
        let path = sink.artifact_path(&id).unwrap();
        fs::write(&path, "original").unwrap();

        let result = sink.persist(&id, "{\"new\":true}").unwrap();
        assert!(matches!(result, PersistResult::Skipped { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn is_fetched_tracks_artifact_presence() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        let id = OrderId::from("5");
        assert!(!sink.is_fetched(&id).unwrap());
        sink.persist(&id, "{}").unwrap();
        assert!(sink.is_fetched(&id).unwrap());
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        sink.persist(&OrderId::from("9"), "{}").unwrap();

        let leftovers: Vec<_> = fs::read_dir(sink.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), ".orderpull.tmp must be cleaned up");
    }

    #[test]
    fn stale_tmp_from_interrupted_run_does_not_block_write() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        let path = sink.dir().join("3.json");
        let tmp_path = sink.dir().join("3.json.1.orderpull.tmp");
        fs::write(&tmp_path, "{\"trunc").unwrap();

        let result = persist_with_tmp(&path, "{\"id\":3}", &tmp_path, hard_link).unwrap();
        assert!(matches!(result, PersistResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"id\":3}");
        assert!(!tmp_path.exists());
    }

    fn no_links(_: &Path, _: &Path) -> std::io::Result<()> {
        Err(std::io::Error::from(ErrorKind::Unsupported))
    }

    #[test]
    fn filesystem_without_hard_links_falls_back_to_rename() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        let path = sink.dir().join("12.json");
        let tmp_path = sink.dir().join("12.json.1.orderpull.tmp");

        let result = persist_with_tmp(&path, "{\"id\":12}", &tmp_path, no_links).unwrap();
        assert!(matches!(result, PersistResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"id\":12}");
        assert!(!tmp_path.exists());
    }

    #[test]
    fn rename_fallback_never_replaces_existing_artifact() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        let path = sink.dir().join("13.json");
        let tmp_path = sink.dir().join("13.json.1.orderpull.tmp");
        fs::write(&path, "original").unwrap();

        fs::write(&tmp_path, "{}").unwrap();
        let err = rename_if_absent(&tmp_path, &path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn unsafe_ids_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        for bad in ["../escape", "a/b", "..", "", "x\\y"] {
            let err = sink.persist(&OrderId::from(bad), "{}").unwrap_err();
            assert!(matches!(err, SinkError::UnsafeId { .. }), "id {bad:?}");
        }
    }

    #[test]
    fn list_artifacts_ignores_temp_and_foreign_files() {
        let tmp = TempDir::new().unwrap();
        let sink = sink(&tmp);
        sink.persist(&OrderId::from("1"), "{}").unwrap();
        sink.persist(&OrderId::from("2"), "{}").unwrap();
        fs::write(sink.dir().join("3.json.1.orderpull.tmp"), "partial").unwrap();
        fs::write(sink.dir().join("notes.txt"), "x").unwrap();
        fs::create_dir(sink.dir().join("sub.json")).unwrap();

        let ids = sink.list_artifacts().unwrap();
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn sink_at_missing_dir_lists_nothing_and_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("not-yet");
        let sink = OrderSink::at(&dir);
        assert!(sink.list_artifacts().unwrap().is_empty());
        assert!(!sink.is_fetched(&OrderId::from("1")).unwrap());
        assert!(!dir.exists());
    }

    #[test]
    #[cfg(unix)]
    fn write_failure_in_readonly_dir_is_an_error_and_leaves_no_file() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let sink = OrderSink::prepare(root.path().join("readonly")).unwrap();

        let mut perms = fs::metadata(sink.dir()).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(sink.dir(), perms).unwrap();

        let result = sink.persist(&OrderId::from("4"), "{}");

        let mut perms = fs::metadata(sink.dir()).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(sink.dir(), perms).unwrap();

        // Root ignores directory permissions; only assert when they applied.
        if let Err(err) = result {
            assert!(matches!(err, SinkError::Io { .. }));
            assert!(!sink.dir().join("4.json").exists());
        }
    }
}
