//! File-backed run store: the per-run record the orchestrator's callers keep.
//!
//! # Storage layout
//!
//! ```text
//! ~/.stackforge/
//!   runs/
//!     <run_id>.yaml          (RunState, mode 0600)
//!     <run_id>.history.json  (Vec<HistoryEvent>, mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{io_err, CoreError};
use crate::history::HistoryEvent;
use crate::types::{RunId, RunState};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.stackforge/runs/`: pure, no I/O.
pub fn runs_dir_at(home: &Path) -> PathBuf {
    home.join(".stackforge").join("runs")
}

/// `<home>/.stackforge/runs/<run_id>.yaml`: pure, no I/O.
pub fn run_path_at(home: &Path, run_id: &RunId) -> PathBuf {
    runs_dir_at(home).join(format!("{run_id}.yaml"))
}

/// `<home>/.stackforge/runs/<run_id>.history.json`: pure, no I/O.
pub fn history_path_at(home: &Path, run_id: &RunId) -> PathBuf {
    runs_dir_at(home).join(format!("{run_id}.history.json"))
}

fn ensure_runs_dir(home: &Path) -> Result<PathBuf, CoreError> {
    let dir = runs_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

// ---------------------------------------------------------------------------
// 2. Runs
// ---------------------------------------------------------------------------

/// Create and persist a fresh run at `INIT`.
///
/// Returns `CoreError::RunExists` if a run with this id is already stored.
pub fn create_run_at(home: &Path, run_id: RunId) -> Result<RunState, CoreError> {
    let path = run_path_at(home, &run_id);
    if path.exists() {
        return Err(CoreError::RunExists { path });
    }
    ensure_runs_dir(home)?;
    let run = RunState::new(run_id);
    write_atomic(&path, serde_yaml::to_string(&run)?.as_bytes())?;
    tracing::debug!(run = %run.run_id, "created run");
    Ok(run)
}

/// `create_run_at` convenience wrapper.
pub fn create_run(run_id: RunId) -> Result<RunState, CoreError> {
    create_run_at(&home()?, run_id)
}

/// Load a run.
///
/// Returns `CoreError::RunNotFound` if absent, `CoreError::Parse` (with path)
/// if the YAML is malformed or names a stage outside the chain.
pub fn load_run_at(home: &Path, run_id: &RunId) -> Result<RunState, CoreError> {
    let path = run_path_at(home, run_id);
    if !path.exists() {
        return Err(CoreError::RunNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })
}

/// `load_run_at` convenience wrapper.
pub fn load_run(run_id: &RunId) -> Result<RunState, CoreError> {
    load_run_at(&home()?, run_id)
}

/// Atomically save a run, bumping `updated_at`.
pub fn save_run_at(home: &Path, run: &mut RunState) -> Result<(), CoreError> {
    ensure_runs_dir(home)?;
    run.updated_at = Utc::now();
    let path = run_path_at(home, &run.run_id);
    write_atomic(&path, serde_yaml::to_string(run)?.as_bytes())
}

/// `save_run_at` convenience wrapper.
pub fn save_run(run: &mut RunState) -> Result<(), CoreError> {
    save_run_at(&home()?, run)
}

/// All stored runs, sorted by run id.
pub fn list_runs_at(home: &Path) -> Result<Vec<RunState>, CoreError> {
    let dir = runs_dir_at(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut entries: Vec<_> = std::fs::read_dir(&dir)
        .map_err(|e| io_err(&dir, e))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut runs = Vec::new();
    for entry in entries {
        let fname = entry.file_name();
        let name = fname.to_string_lossy();
        let Some(stem) = name.strip_suffix(".yaml") else {
            continue;
        };
        let Ok(run_id) = RunId::new(stem) else {
            continue;
        };
        runs.push(load_run_at(home, &run_id)?);
    }
    Ok(runs)
}

/// `list_runs_at` convenience wrapper.
pub fn list_runs() -> Result<Vec<RunState>, CoreError> {
    list_runs_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. History
// ---------------------------------------------------------------------------

/// Load a run's history, oldest first. A missing file is an empty history.
pub fn load_history_at(home: &Path, run_id: &RunId) -> Result<Vec<HistoryEvent>, CoreError> {
    let path = history_path_at(home, run_id);
    if !path.exists() {
        return Ok(vec![]);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| CoreError::HistoryParse { path, source: e })
}

/// `load_history_at` convenience wrapper.
pub fn load_history(run_id: &RunId) -> Result<Vec<HistoryEvent>, CoreError> {
    load_history_at(&home()?, run_id)
}

/// Atomically replace a run's history.
pub fn save_history_at(
    home: &Path,
    run_id: &RunId,
    events: &[HistoryEvent],
) -> Result<(), CoreError> {
    ensure_runs_dir(home)?;
    let path = history_path_at(home, run_id);
    write_atomic(&path, serde_json::to_string_pretty(events)?.as_bytes())
}

/// Append one event to a run's history.
pub fn append_event_at(home: &Path, run_id: &RunId, event: HistoryEvent) -> Result<(), CoreError> {
    let mut events = load_history_at(home, run_id)?;
    tracing::debug!(run = %run_id, action = event.action(), "appending history event");
    events.push(event);
    save_history_at(home, run_id, &events)
}

/// `append_event_at` convenience wrapper.
pub fn append_event(run_id: &RunId, event: HistoryEvent) -> Result<(), CoreError> {
    append_event_at(&home()?, run_id, event)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Write flow: `.tmp` sibling → `chmod 0600` → `rename`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;
    use tempfile::TempDir;

    fn id() -> RunId {
        RunId::new("demo-run").unwrap()
    }

    #[test]
    fn run_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        let path = run_path_at(home.path(), &id());
        assert!(path.ends_with(".stackforge/runs/demo-run.yaml"));
    }

    #[test]
    fn create_then_load_roundtrip() {
        let home = TempDir::new().expect("tempdir");
        let created = create_run_at(home.path(), id()).expect("create");
        let loaded = load_run_at(home.path(), &id()).expect("load");
        assert_eq!(loaded, created);
        assert_eq!(loaded.stage, Stage::Init);
    }

    #[test]
    fn create_twice_is_rejected() {
        let home = TempDir::new().expect("tempdir");
        create_run_at(home.path(), id()).expect("create");
        let err = create_run_at(home.path(), id()).unwrap_err();
        assert!(matches!(err, CoreError::RunExists { .. }));
    }

    #[test]
    fn save_leaves_no_tmp_behind() {
        let home = TempDir::new().expect("tempdir");
        let mut run = create_run_at(home.path(), id()).expect("create");
        run.stage = Stage::Deploy;
        save_run_at(home.path(), &mut run).expect("save");
        let tmp = PathBuf::from(format!("{}.tmp", run_path_at(home.path(), &id()).display()));
        assert!(!tmp.exists());
        assert_eq!(load_run_at(home.path(), &id()).unwrap().stage, Stage::Deploy);
    }

    #[test]
    fn run_file_is_private() {
        let home = TempDir::new().expect("tempdir");
        create_run_at(home.path(), id()).expect("create");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let path = run_path_at(home.path(), &id());
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn missing_history_is_empty() {
        let home = TempDir::new().expect("tempdir");
        assert!(load_history_at(home.path(), &id()).unwrap().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let home = TempDir::new().expect("tempdir");
        append_event_at(home.path(), &id(), HistoryEvent::Message { text: "a".into() }).unwrap();
        append_event_at(home.path(), &id(), HistoryEvent::Run { command: "b".into() }).unwrap();
        let events = load_history_at(home.path(), &id()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].action(), "run");
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(CoreError::HomeNotFound.to_string().contains("home directory"));
    }
}
