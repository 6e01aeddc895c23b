//! In-memory owner of tasks, notes, chat history and the live transcript,
//! mirrored to a [`KeyValueStore`] after every mutation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::chat::{ChatHistoryEntry, ChatMessage, Role};
use crate::core::ids::{IdAllocator, IdsExhausted};
use crate::core::note::Note;
use crate::core::task::Task;
use crate::storage::{KeyValueStore, StorageError};

pub const TASKS_KEY: &str = "ai_assistant_tasks";
pub const NOTES_KEY: &str = "ai_assistant_notes";
pub const HISTORY_KEY: &str = "ai_assistant_history";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} text must not be empty")]
    Validation(&'static str),
    #[error("stored {key} is not valid JSON: {source}")]
    Parse {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Ids(#[from] IdsExhausted),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What part of the store changed. Passed to subscribers after each mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Tasks,
    Notes,
    History,
    Messages,
}

type Listener = Box<dyn FnMut(Change)>;

pub struct Store<S: KeyValueStore> {
    backend: S,
    tasks: Vec<Task>,
    notes: Vec<Note>,
    history: Vec<ChatHistoryEntry>,
    messages: Vec<ChatMessage>,
    ids: IdAllocator,
    listeners: Vec<Listener>,
}

impl<S: KeyValueStore> Store<S> {
    /// An empty store over `backend`. Call [`Store::load`] to pick up
    /// persisted state.
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            tasks: Vec::new(),
            notes: Vec::new(),
            history: Vec::new(),
            messages: Vec::new(),
            ids: IdAllocator::new(),
            listeners: Vec::new(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Read all three collections. Each key is loaded on its own: a missing
    /// key gives an empty collection, and a broken one is reported and
    /// replaced by an empty collection without affecting the others.
    pub fn load(&mut self) -> Vec<StoreError> {
        let mut errors = Vec::new();

        self.tasks = load_key(&self.backend, TASKS_KEY, &mut errors);
        self.notes = load_key(&self.backend, NOTES_KEY, &mut errors);
        self.history = load_key(&self.backend, HISTORY_KEY, &mut errors);

        let max_id = self
            .tasks
            .iter()
            .map(|t| t.id)
            .chain(self.notes.iter().map(|n| n.id))
            .chain(self.history.iter().map(|h| h.id))
            .max();
        if let Some(id) = max_id {
            self.ids.observe(id);
        }

        log::info!(
            "Loaded {} tasks, {} notes, {} history entries",
            self.tasks.len(),
            self.notes.len(),
            self.history.len()
        );

        errors
    }

    /// Write all three collections. Every key is attempted even if an
    /// earlier one fails; each failure is logged and the first is returned.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let results = [
            save_key(&mut self.backend, TASKS_KEY, &self.tasks),
            save_key(&mut self.backend, NOTES_KEY, &self.notes),
            save_key(&mut self.backend, HISTORY_KEY, &self.history),
        ];
        let mut first = None;
        for err in results.into_iter().filter_map(Result::err) {
            log::error!("Failed to persist: {}", err);
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(Change) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // Tasks

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn add_task(&mut self, text: &str) -> Result<Task, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Validation("task"));
        }
        let task = Task::new(self.ids.next_id()?, text);
        log::debug!(
            "Adding task {} as {} {}",
            task.id,
            task.category,
            task.priority
        );
        self.tasks.push(task.clone());
        self.commit(Change::Tasks);
        Ok(task)
    }

    pub fn remove_task(&mut self, id: i64) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() != before {
            self.commit(Change::Tasks);
        }
    }

    pub fn toggle_task_completion(&mut self, id: i64) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.toggle();
            self.commit(Change::Tasks);
        }
    }

    // Notes

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn add_note(&mut self, text: &str) -> Result<Note, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Validation("note"));
        }
        let note = Note::new(self.ids.next_id()?, text);
        self.notes.push(note.clone());
        self.commit(Change::Notes);
        Ok(note)
    }

    pub fn note(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn remove_note(&mut self, id: i64) {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() != before {
            self.commit(Change::Notes);
        }
    }

    // History

    pub fn history(&self) -> &[ChatHistoryEntry] {
        &self.history
    }

    pub fn history_entry(&self, id: i64) -> Option<&ChatHistoryEntry> {
        self.history.iter().find(|h| h.id == id)
    }

    /// Newest first, at most `limit` entries.
    pub fn recent_history(&self, limit: usize) -> impl Iterator<Item = &ChatHistoryEntry> {
        self.history.iter().rev().take(limit)
    }

    /// Fails only when no fresh id can be issued.
    pub fn append_history(
        &mut self,
        prompt: &str,
        reply: &str,
    ) -> Result<ChatHistoryEntry, StoreError> {
        let entry = ChatHistoryEntry::new(self.ids.next_id()?, prompt, reply);
        self.history.push(entry.clone());
        self.commit(Change::History);
        Ok(entry)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.commit(Change::History);
    }

    // Transcript

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
        self.notify(Change::Messages);
    }

    /// Drop the transcript. History is untouched.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.notify(Change::Messages);
    }

    fn commit(&mut self, change: Change) {
        // flush logs each failed key itself.
        let _ = self.flush();
        self.notify(change);
    }

    fn notify(&mut self, change: Change) {
        for listener in &mut self.listeners {
            listener(change);
        }
    }
}

fn load_key<S, T>(backend: &S, key: &'static str, errors: &mut Vec<StoreError>) -> Vec<T>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            errors.push(e.into());
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(source) => {
            let err = StoreError::Parse { key, source };
            log::warn!("{}; starting with an empty list", err);
            errors.push(err);
            Vec::new()
        }
    }
}

fn save_key<S, T>(backend: &mut S, key: &'static str, items: &[T]) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize,
{
    let json =
        serde_json::to_string(items).map_err(|source| StoreError::Serialize { key, source })?;
    backend.set(key, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::task::{Category, Priority};
    use crate::storage::MemoryStore;

    fn store() -> Store<MemoryStore> {
        Store::new(MemoryStore::new())
    }

    /// Memory backend whose writes to one key always fail.
    #[derive(Default)]
    struct RejectingStore {
        inner: MemoryStore,
        reject: &'static str,
    }

    impl KeyValueStore for RejectingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.reject {
                return Err(StorageError::Io {
                    path: key.into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn add_task_classifies_and_persists() {
        let mut s = store();
        let task = s.add_task("  urgent: pay electricity bill today ").unwrap();
        assert_eq!(task.text, "urgent: pay electricity bill today");
        assert_eq!(task.category, Category::Finance);
        assert_eq!(task.priority, Priority::P1);

        let raw = s.backend().get(TASKS_KEY).unwrap().unwrap();
        assert!(raw.contains("electricity"));
    }

    #[test]
    fn maybe_read_a_book() {
        let mut s = store();
        let task = s.add_task("maybe read a book").unwrap();
        assert_eq!(task.category, Category::Personal);
        assert_eq!(task.priority, Priority::P3);
    }

    #[test]
    fn empty_task_is_rejected_without_write() {
        let mut s = store();
        assert!(matches!(s.add_task("   "), Err(StoreError::Validation(_))));
        assert!(s.tasks().is_empty());
        assert_eq!(s.backend().get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut s = store();
        let a = s.add_task("one").unwrap();
        let b = s.add_task("two").unwrap();
        let n = s.add_note("three").unwrap();
        assert!(a.id < b.id);
        assert!(b.id < n.id);
    }

    #[test]
    fn remove_task_is_idempotent() {
        let mut s = store();
        let keep = s.add_task("keep me").unwrap();
        let gone = s.add_task("remove me").unwrap();

        s.remove_task(gone.id);
        let after_first: Vec<Task> = s.tasks().to_vec();
        s.remove_task(gone.id);
        assert_eq!(s.tasks(), after_first.as_slice());
        assert_eq!(s.tasks().len(), 1);
        assert_eq!(s.tasks()[0].id, keep.id);
    }

    #[test]
    fn toggle_flips_and_ignores_unknown() {
        let mut s = store();
        let task = s.add_task("gym").unwrap();
        s.toggle_task_completion(task.id);
        assert!(s.task(task.id).unwrap().completed);
        assert_eq!(s.pending_task_count(), 0);
        s.toggle_task_completion(task.id);
        assert!(!s.task(task.id).unwrap().completed);
        s.toggle_task_completion(-1);
        assert_eq!(s.tasks().len(), 1);
    }

    #[test]
    fn flush_then_load_roundtrips() {
        let mut s = store();
        let t = s.add_task("finish report").unwrap();
        s.toggle_task_completion(t.id);
        s.add_task("buy milk").unwrap();
        s.add_note("first note").unwrap();
        s.add_note("second note").unwrap();
        s.append_history("hi", "hello").unwrap();
        s.flush().unwrap();

        let mut reloaded = Store::new(s.backend().clone());
        assert!(reloaded.load().is_empty());
        assert_eq!(reloaded.tasks(), s.tasks());
        assert_eq!(reloaded.notes(), s.notes());
        assert_eq!(reloaded.history(), s.history());
    }

    #[test]
    fn corrupt_key_does_not_block_others() {
        let mut backend = MemoryStore::new();
        backend.set(TASKS_KEY, "{not json").unwrap();
        backend
            .set(
                NOTES_KEY,
                r#"[{"id":5,"text":"kept","timestamp":"2026-02-23T14:00:00Z"}]"#,
            )
            .unwrap();

        let mut s = Store::new(backend);
        let errors = s.load();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StoreError::Parse { key: TASKS_KEY, .. }));
        assert!(s.tasks().is_empty());
        assert_eq!(s.notes().len(), 1);
        assert!(s.history().is_empty());

        // New ids land after the loaded ones.
        let note = s.add_note("next").unwrap();
        assert!(note.id > 5);
    }

    #[test]
    fn history_is_append_only_until_cleared() {
        let mut s = store();
        s.append_history("a", "1").unwrap();
        s.append_history("b", "2").unwrap();
        s.append_history("c", "3").unwrap();

        let recent: Vec<&str> = s.recent_history(2).map(|h| h.prompt.as_str()).collect();
        assert_eq!(recent, vec!["c", "b"]);

        s.clear_history();
        assert!(s.history().is_empty());
        assert_eq!(s.backend().get(HISTORY_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn new_chat_keeps_history() {
        let mut s = store();
        s.push_message(Role::User, "hello");
        s.append_history("hello", "hi").unwrap();
        s.new_chat();
        assert!(s.messages().is_empty());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn subscribers_see_every_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut s = store();
        let sink = Rc::clone(&seen);
        s.subscribe(move |change| sink.borrow_mut().push(change));

        let task = s.add_task("call mom").unwrap();
        s.remove_task(task.id);
        s.remove_task(task.id);
        s.add_note("note").unwrap();
        s.push_message(Role::User, "hey");
        s.clear_history();

        assert_eq!(
            *seen.borrow(),
            vec![
                Change::Tasks,
                Change::Tasks,
                Change::Notes,
                Change::Messages,
                Change::History
            ]
        );
    }

    #[test]
    fn flush_writes_remaining_keys_when_one_fails() {
        let mut s = Store::new(RejectingStore {
            reject: NOTES_KEY,
            ..RejectingStore::default()
        });
        // The mutation itself still succeeds; the failure is only logged.
        s.add_task("file taxes").unwrap();
        s.append_history("q", "a").unwrap();

        let err = s.flush().unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Io { .. })));
        assert!(s.backend().get(TASKS_KEY).unwrap().unwrap().contains("file taxes"));
        assert!(s.backend().get(HISTORY_KEY).unwrap().unwrap().contains("\"q\""));
        assert_eq!(s.backend().get(NOTES_KEY).unwrap(), None);
    }

    #[test]
    fn max_persisted_id_fails_instead_of_wrapping() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                NOTES_KEY,
                r#"[{"id":9223372036854775807,"text":"last","timestamp":"2026-02-23T14:00:00Z"}]"#,
            )
            .unwrap();
        let mut s = Store::new(backend);
        assert!(s.load().is_empty());

        assert!(matches!(s.add_task("next"), Err(StoreError::Ids(_))));
        assert!(matches!(s.append_history("q", "a"), Err(StoreError::Ids(_))));
        assert!(s.tasks().is_empty());
        assert!(s.history().is_empty());
        assert_eq!(s.notes()[0].id, i64::MAX);
    }
}
