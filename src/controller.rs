//! Task board controller: every mutation goes through here and is followed by
//! a full snapshot write.

use crate::model::{Board, BoardError, ColumnId, TaskId};
use crate::storage::{FileStore, SnapshotStore};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A task picked up for dragging. Cleared on drop or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub task_id: TaskId,
    pub hover: Option<ColumnId>,
}

pub type BoardController = Controller<FileStore, SystemClock>;

pub struct Controller<S, C> {
    board: Board,
    store: S,
    clock: C,
    drag: Option<DragSession>,
}

impl<S: SnapshotStore, C: Clock> Controller<S, C> {
    /// Restores the stored snapshot and reconciles every task's age, saving
    /// again if that moved anything.
    pub fn open(store: S, clock: C, stale_after: Duration) -> Result<Self> {
        let records = store.load()?;
        let now = clock.now();
        let board = Board::restore(records, stale_after, now);
        tracing::info!(tasks = board.len(), "board loaded");
        let mut controller = Controller {
            board,
            store,
            clock,
            drag: None,
        };
        controller.sweep()?;
        Ok(controller)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn create_task(&mut self, title: &str, description: &str) -> Result<TaskId> {
        let id = self.board.create_task(title, description, self.clock.now())?;
        tracing::info!(task = %id, "task created");
        self.persist()?;
        Ok(id)
    }

    pub fn move_task(&mut self, task_id: &str, dest: ColumnId) -> Result<()> {
        self.board.move_task(task_id, dest, self.clock.now())?;
        tracing::info!(task = task_id, column = %dest, "task moved");
        self.persist()
    }

    /// Fails with [`BoardError::AlreadyDone`] for a task that is already in
    /// `done`, leaving its position untouched.
    pub fn mark_done(&mut self, task_id: &str) -> Result<()> {
        if self.board.column_of(task_id) == Some(ColumnId::Done) {
            return Err(BoardError::AlreadyDone(task_id.to_string()).into());
        }
        self.move_task(task_id, ColumnId::Done)
    }

    /// Returns `false` without touching storage when the task is already gone.
    pub fn delete_task(&mut self, task_id: &str) -> Result<bool> {
        if self.board.delete_task(task_id).is_none() {
            return Ok(false);
        }
        if self.drag.as_ref().is_some_and(|d| d.task_id == task_id) {
            self.drag = None;
        }
        tracing::info!(task = task_id, "task deleted");
        self.persist()?;
        Ok(true)
    }

    /// Runs one age sweep over every task. Saves only when something moved.
    pub fn sweep(&mut self) -> Result<Vec<TaskId>> {
        let moved = self.board.sweep(self.clock.now());
        if !moved.is_empty() {
            self.persist()?;
        }
        Ok(moved)
    }

    pub fn begin_drag(&mut self, task_id: &str) -> bool {
        let hover = self.board.column_of(task_id);
        if hover.is_none() {
            return false;
        }
        self.drag = Some(DragSession {
            task_id: task_id.to_string(),
            hover,
        });
        true
    }

    pub fn hover(&mut self, column: Option<ColumnId>) {
        if let Some(drag) = self.drag.as_mut() {
            drag.hover = column;
        }
    }

    pub fn cancel_drag(&mut self) -> Option<DragSession> {
        self.drag.take()
    }

    /// Ends the drag session by moving the dragged task to `column`. Without
    /// an active session, or if the task vanished meanwhile, nothing happens.
    pub fn drop_on(&mut self, column: ColumnId) -> Result<Option<TaskId>> {
        let Some(session) = self.drag.take() else {
            return Ok(None);
        };
        if self.board.task(&session.task_id).is_none() {
            return Ok(None);
        }
        self.move_task(&session.task_id, column)?;
        Ok(Some(session.task_id))
    }

    fn persist(&mut self) -> Result<()> {
        let records = self.board.snapshot();
        if let Err(err) = self.store.save(&records) {
            tracing::error!("saving snapshot failed: {:#}", err);
            return Err(err);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;
    use crate::age::Accent;
    use crate::model::TaskRecord;
    use crate::storage::BoardLocation;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Keeps the serialized snapshot in memory and counts writes.
    #[derive(Clone, Default)]
    struct MemoryStore {
        data: Rc<RefCell<Option<String>>>,
        saves: Rc<Cell<usize>>,
        fail: Rc<Cell<bool>>,
    }

    impl MemoryStore {
        fn records(&self) -> Vec<TaskRecord> {
            self.data
                .borrow()
                .as_deref()
                .map(|s| serde_json::from_str(s).unwrap())
                .unwrap_or_default()
        }
    }

    impl SnapshotStore for MemoryStore {
        fn load(&self) -> Result<Vec<TaskRecord>> {
            Ok(self
                .data
                .borrow()
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_default())
        }

        fn save(&mut self, records: &[TaskRecord]) -> Result<()> {
            if self.fail.get() {
                return Err(anyhow!("disk full"));
            }
            *self.data.borrow_mut() = Some(serde_json::to_string(records)?);
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    fn open(store: &MemoryStore, clock: &ManualClock) -> Controller<MemoryStore, ManualClock> {
        Controller::open(store.clone(), clock.clone(), Duration::hours(24)).unwrap()
    }

    fn triples(records: &[TaskRecord]) -> Vec<(String, String, String)> {
        records
            .iter()
            .map(|r| (r.title.clone(), r.desc.clone(), r.column_id.clone()))
            .collect()
    }

    #[test]
    fn create_persists_snapshot() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);

        let id = ctl.create_task("Write report", "").unwrap();
        assert_eq!(ctl.board().count(ColumnId::Todo), 1);
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some(id.as_str()));
        assert_eq!(records[0].column_id, "todo");
    }

    #[test]
    fn empty_title_aborts_without_saving() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);

        let err = ctl.create_task("  ", "something").unwrap_err();
        assert_eq!(err.downcast_ref::<BoardError>(), Some(&BoardError::EmptyTitle));
        assert!(ctl.board().is_empty());
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn walkthrough_survives_reload() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);

        let id = ctl.create_task("Write report", "").unwrap();
        assert_eq!(
            ctl.board().task(&id).unwrap().description_or_placeholder(),
            "No description"
        );

        assert!(ctl.begin_drag(&id));
        ctl.hover(Some(ColumnId::Progress));
        assert_eq!(ctl.drop_on(ColumnId::Progress).unwrap(), Some(id.clone()));
        assert_eq!(ctl.board().count(ColumnId::Todo), 0);
        assert_eq!(ctl.board().count(ColumnId::Progress), 1);
        assert!(ctl.board().done_action_visible(&id));
        assert!(ctl.drag().is_none());

        ctl.mark_done(&id).unwrap();
        assert!(!ctl.board().done_action_visible(&id));
        assert_eq!(
            ctl.board().task(&id).unwrap().label.accent(),
            Accent::Completed
        );

        let before = store.records();
        let reloaded = open(&store, &clock);
        assert_eq!(triples(&reloaded.board().snapshot()), triples(&before));
        assert_eq!(
            reloaded.board().task(&id).unwrap().created_at,
            ctl.board().task(&id).unwrap().created_at
        );
        assert_eq!(reloaded.board().column_of(&id), Some(ColumnId::Done));
    }

    #[test]
    fn marking_done_twice_keeps_order() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);
        let a = ctl.create_task("a", "").unwrap();
        let b = ctl.create_task("b", "").unwrap();
        ctl.mark_done(&a).unwrap();
        ctl.mark_done(&b).unwrap();
        let saves = store.saves.get();

        let err = ctl.mark_done(&a).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BoardError>(),
            Some(&BoardError::AlreadyDone(a.clone()))
        );
        let order: Vec<_> = ctl.board().tasks_in(ColumnId::Done).map(|t| t.id.clone()).collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!(store.saves.get(), saves);

        let missing = ctl.mark_done("missing").unwrap_err();
        assert_eq!(
            missing.downcast_ref::<BoardError>(),
            Some(&BoardError::TaskNotFound("missing".into()))
        );
    }

    #[test]
    fn drop_without_drag_is_noop() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);
        ctl.create_task("a", "").unwrap();
        let saves = store.saves.get();

        assert_eq!(ctl.drop_on(ColumnId::Done).unwrap(), None);
        assert_eq!(store.saves.get(), saves);
        assert_eq!(ctl.board().count(ColumnId::Done), 0);
    }

    #[test]
    fn cancel_clears_drag_session() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);
        let id = ctl.create_task("a", "").unwrap();

        assert!(!ctl.begin_drag("missing"));
        assert!(ctl.begin_drag(&id));
        assert!(ctl.cancel_drag().is_some());
        assert_eq!(ctl.drop_on(ColumnId::Done).unwrap(), None);
        assert_eq!(ctl.board().column_of(&id), Some(ColumnId::Todo));
    }

    #[test]
    fn deleting_dragged_task_ends_session() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);
        let id = ctl.create_task("a", "").unwrap();
        ctl.begin_drag(&id);

        assert!(ctl.delete_task(&id).unwrap());
        assert!(ctl.drag().is_none());
        assert!(store.records().is_empty());

        let saves = store.saves.get();
        assert!(!ctl.delete_task(&id).unwrap());
        assert_eq!(store.saves.get(), saves);
    }

    #[test]
    fn sweep_moves_stale_todo_and_persists() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);
        let stale = ctl.create_task("stale", "").unwrap();
        let saves = store.saves.get();

        clock.advance(Duration::hours(23));
        assert!(ctl.sweep().unwrap().is_empty());
        assert_eq!(store.saves.get(), saves);

        clock.advance(Duration::hours(1));
        assert_eq!(ctl.sweep().unwrap(), vec![stale.clone()]);
        assert_eq!(store.records()[0].column_id, "progress");
        assert_eq!(
            ctl.board().task(&stale).unwrap().label.accent(),
            Accent::Warning
        );

        // next tick shows the plain label and leaves it in progress
        clock.advance(Duration::minutes(1));
        assert!(ctl.sweep().unwrap().is_empty());
        assert_eq!(
            ctl.board().task(&stale).unwrap().label.accent(),
            Accent::Default
        );
        assert_eq!(ctl.board().column_of(&stale), Some(ColumnId::Progress));
    }

    #[test]
    fn open_reconciles_stale_tasks_from_storage() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        {
            let mut ctl = open(&store, &clock);
            ctl.create_task("old", "").unwrap();
        }
        clock.advance(Duration::days(2));
        let ctl = open(&store, &clock);
        assert_eq!(ctl.board().count(ColumnId::Progress), 1);
        assert_eq!(store.records()[0].column_id, "progress");
    }

    #[test]
    fn save_failure_is_reported() {
        let store = MemoryStore::default();
        let clock = ManualClock::new();
        let mut ctl = open(&store, &clock);
        store.fail.set(true);
        assert!(ctl.create_task("a", "").is_err());
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let location = BoardLocation::explicit(dir.path());
        let clock = ManualClock::new();

        let mut ctl =
            Controller::open(FileStore::new(&location), clock.clone(), Duration::hours(24))
                .unwrap();
        let a = ctl.create_task("a", "alpha").unwrap();
        let b = ctl.create_task("b", "").unwrap();
        ctl.mark_done(&b).unwrap();

        let reopened =
            Controller::open(FileStore::new(&location), clock, Duration::hours(24)).unwrap();
        assert_eq!(reopened.board().snapshot(), ctl.board().snapshot());
        assert_eq!(reopened.board().column_of(&a), Some(ColumnId::Todo));
    }
}
