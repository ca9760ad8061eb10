use crate::model::TaskRecord;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Fixed key the snapshot is stored under.
pub const STORAGE_KEY: &str = "kanban_tasks";
pub const PROJECT_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "config.yml";
pub const LOG_FILE: &str = "taskboard.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardScope {
    Project,
    Global,
    Explicit,
}

impl BoardScope {
    pub fn label(&self) -> &'static str {
        match self {
            BoardScope::Project => "project",
            BoardScope::Global => "global",
            BoardScope::Explicit => "custom",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardLocation {
    pub dir: PathBuf,
    pub scope: BoardScope,
}

impl BoardLocation {
    pub fn explicit(dir: impl Into<PathBuf>) -> Self {
        BoardLocation {
            dir: dir.into(),
            scope: BoardScope::Explicit,
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", STORAGE_KEY))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    /// Human-facing board name: the project directory for project boards.
    pub fn name(&self) -> String {
        match self.scope {
            BoardScope::Project => self
                .dir
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string(),
            BoardScope::Global => "default".to_string(),
            BoardScope::Explicit => self
                .dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("board")
                .to_string(),
        }
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {:?}", self.dir))
    }
}

/// Where the full board snapshot is read from and written to.
pub trait SnapshotStore {
    /// Absent or unreadable data yields an empty collection.
    fn load(&self) -> Result<Vec<TaskRecord>>;
    /// Replaces whatever was stored before.
    fn save(&mut self, records: &[TaskRecord]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(location: &BoardLocation) -> Self {
        FileStore {
            path: location.snapshot_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Vec<TaskRecord>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "unreadable snapshot, starting empty: {}", err);
                return Ok(Vec::new());
            }
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let values = match serde_json::from_str::<Option<Vec<serde_json::Value>>>(&data) {
            Ok(values) => values.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "corrupt snapshot, starting empty: {}", err);
                return Ok(Vec::new());
            }
        };
        let records = values
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| match serde_json::from_value::<TaskRecord>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), index = idx, "skipping unreadable record: {}", err);
                    None
                }
            })
            .collect();
        Ok(records)
    }

    fn save(&mut self, records: &[TaskRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let serialized = serde_json::to_string_pretty(records).context("serializing snapshot")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized).with_context(|| format!("writing {:?}", tmp))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing {:?}", self.path))?;
        tracing::debug!(path = %self.path.display(), tasks = records.len(), "snapshot saved");
        Ok(())
    }
}

/// Location of the project board rooted at `cwd`, whether or not it exists yet.
pub fn project_location(cwd: &Path) -> BoardLocation {
    BoardLocation {
        dir: cwd.join(PROJECT_DIR),
        scope: BoardScope::Project,
    }
}

/// Creates the board directory and an empty snapshot if none is there.
pub fn init_board(location: &BoardLocation) -> Result<()> {
    location
        .ensure_dir()
        .with_context(|| format!("failed to create board directory {:?}", location.dir))?;
    let mut store = FileStore::new(location);
    if !store.path().exists() {
        store.save(&[])?;
    }
    Ok(())
}

pub fn locate_board(start: &Path) -> Result<BoardLocation> {
    if let Some(dir) = find_project_board(start) {
        return Ok(BoardLocation {
            dir,
            scope: BoardScope::Project,
        });
    }
    Ok(BoardLocation {
        dir: global_board_dir()?,
        scope: BoardScope::Global,
    })
}

fn find_project_board(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_board_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "taskboard").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTimestamp;

    fn record(title: &str, column: &str) -> TaskRecord {
        TaskRecord {
            id: Some(format!("id-{}", title)),
            title: title.into(),
            desc: String::new(),
            column_id: column.into(),
            timestamp: Some(RawTimestamp::Millis(1_700_000_000_000)),
        }
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&BoardLocation::explicit(dir.path()));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let location = BoardLocation::explicit(dir.path());
        fs::write(location.snapshot_path(), "{not json").unwrap();
        assert!(FileStore::new(&location).load().unwrap().is_empty());

        fs::write(location.snapshot_path(), "null").unwrap();
        assert!(FileStore::new(&location).load().unwrap().is_empty());
    }

    #[test]
    fn bad_record_does_not_discard_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let location = BoardLocation::explicit(dir.path());
        fs::write(
            location.snapshot_path(),
            r#"[
                {"title":"good","desc":"","columnId":"todo","timestamp":1700000000000},
                {"title":"float","desc":"","columnId":"todo","timestamp":1700000000000.5},
                {"desc":"no title","columnId":"todo","timestamp":1},
                42
            ]"#,
        )
        .unwrap();

        let loaded = FileStore::new(&location).load().unwrap();
        let titles: Vec<_> = loaded.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["good", "float"]);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(&BoardLocation::explicit(dir.path().join("nested")));

        store
            .save(&[record("a", "todo"), record("b", "done")])
            .unwrap();
        store.save(&[record("c", "progress")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![record("c", "progress")]);
    }

    #[test]
    fn snapshot_file_is_named_after_storage_key() {
        let location = BoardLocation::explicit("/tmp/board");
        assert_eq!(
            location.snapshot_path(),
            PathBuf::from("/tmp/board/kanban_tasks.json")
        );
        assert_eq!(location.name(), "board");
    }

    #[test]
    fn init_keeps_an_existing_snapshot() {
        let root = tempfile::tempdir().unwrap();
        let location = project_location(root.path());
        init_board(&location).unwrap();
        assert!(FileStore::new(&location).load().unwrap().is_empty());

        FileStore::new(&location).save(&[record("a", "todo")]).unwrap();
        init_board(&location).unwrap();
        assert_eq!(FileStore::new(&location).load().unwrap(), vec![record("a", "todo")]);
        assert_eq!(location.name(), root.path().file_name().unwrap().to_str().unwrap());
    }

    #[test]
    fn project_board_is_found_from_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join(PROJECT_DIR)).unwrap();
        let nested = root.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();

        let location = locate_board(&nested).unwrap();
        assert_eq!(location.scope, BoardScope::Project);
        assert_eq!(location.dir, root.path().join(PROJECT_DIR));
    }
}
