use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{GenerationMode, MessageStore, PageSet, StoreError};
use crate::models::{Page, Platform};

/// Entry point for every page mutation.
///
/// Each read-modify-write of a message runs under that message's own lock, so
/// concurrent writers to the same message cannot lose each other's updates.
/// Writers to different messages do not block each other.
pub struct FeedService<S> {
    store: S,
    message_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks a generation as running for one message until dropped.
#[derive(Debug)]
pub struct GenerationGuard {
    message_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl GenerationGuard {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.message_id);
    }
}

impl<S: MessageStore> FeedService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            message_locks: Mutex::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn message_lock(&self, message_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.message_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(message_id.to_string()).or_default())
    }

    /// The stored page set, or an empty one for an unknown message.
    pub fn load(&self, message_id: &str) -> Result<PageSet, StoreError> {
        Ok(self.store.load(message_id)?.unwrap_or_default())
    }

    /// Drop the lock of a message left without pages, unless another caller
    /// is holding or waiting on it.
    fn release_lock(&self, message_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.message_locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one held by the caller
        if Arc::strong_count(lock) == 2 {
            locks.remove(message_id);
        }
    }

    /// Run `f` on the message's page set and save the result.
    ///
    /// Nothing is saved when `f` fails.
    pub fn update<T>(
        &self,
        message_id: &str,
        f: impl FnOnce(&mut PageSet) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let lock = self.message_lock(message_id);
        let _held = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut pages = self.load(message_id)?;
        let outcome = f(&mut pages).and_then(|result| {
            self.store.save(message_id, &pages)?;
            Ok(result)
        });
        if pages.is_empty() {
            self.release_lock(message_id, &lock);
        }
        outcome
    }

    /// Claim the message for one generation run.
    ///
    /// Fails with [`StoreError::GenerationInFlight`] while another guard for
    /// the same message is alive.
    pub fn begin_generation(&self, message_id: &str) -> Result<GenerationGuard, StoreError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(message_id.to_string()) {
            log::warn!("Rejected second generation for message {message_id}");
            return Err(StoreError::GenerationInFlight(message_id.to_string()));
        }
        Ok(GenerationGuard {
            message_id: message_id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Store a generator response for the guarded message.
    pub fn apply_generation(
        &self,
        guard: &GenerationGuard,
        response: &str,
        platform: Platform,
        mode: GenerationMode,
    ) -> Result<usize, StoreError> {
        let message_id = guard.message_id();
        let count = self.update(message_id, |pages| {
            pages.apply_generation(response, platform, mode)
        })?;
        log::info!("Stored {count} {platform} post(s) for message {message_id} ({mode:?})");
        Ok(count)
    }

    pub fn save_edit(&self, message_id: &str, text: &str) -> Result<(), StoreError> {
        self.update(message_id, |pages| pages.save_edit(text))?;
        log::info!("Saved edited page for message {message_id}");
        Ok(())
    }

    pub fn delete_page(&self, message_id: &str, index: usize) -> Result<Page, StoreError> {
        let removed = self.update(message_id, |pages| pages.delete(index))?;
        log::info!("Deleted page {index} of message {message_id}");
        Ok(removed)
    }

    pub fn select_page(&self, message_id: &str, index: usize) -> Result<(), StoreError> {
        self.update(message_id, |pages| pages.select(index))
    }

    pub fn toggle_collapsed(&self, message_id: &str) -> Result<bool, StoreError> {
        self.update(message_id, |pages| Ok(pages.toggle_collapsed()))
    }

    /// Editable markup of the message's current page.
    pub fn editable_text(&self, message_id: &str) -> Result<Option<String>, StoreError> {
        let pages = self.load(message_id)?;
        Ok(pages.editable_text(pages.page_index()))
    }
}
