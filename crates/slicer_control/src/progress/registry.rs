//! Thread-indexed progress indicator registry.
//!
//! Every pipeline stage, wherever it runs, asks the registry for "the
//! indicator for this thread". Worker threads get their own indicators so
//! they never contend for the front end's widgets; the thread recorded as
//! the main thread additionally mirrors its updates into the global
//! indicator slot (the status-bar analog) before the update call returns.
//!
//! Concurrency contract: all operations are linearizable with respect to
//! each other. Indicator creation runs *outside* the map lock, so two
//! threads creating for different keys never serialize on factory work;
//! two threads racing on the same key both create, but only the first
//! installed handle becomes visible and the loser observes it.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

use crate::identity::MainThreadIdentity;

use super::factory::IndicatorFactory;
use super::indicator::{IndicatorHandle, ProgressIndicator};

type GlobalSlot = Arc<RwLock<Option<IndicatorHandle>>>;

/// Mapping from thread identity to that thread's progress indicator.
pub struct ThreadProgressRegistry {
    entries: RwLock<HashMap<ThreadId, IndicatorHandle>>,
    global: GlobalSlot,
    main_thread: MainThreadIdentity,
    factory: Arc<dyn IndicatorFactory>,
}

impl ThreadProgressRegistry {
    pub fn new(main_thread: MainThreadIdentity, factory: Arc<dyn IndicatorFactory>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            global: Arc::new(RwLock::new(None)),
            main_thread,
            factory,
        }
    }

    /// The indicator bound to the calling thread, if any.
    pub fn get(&self) -> Option<IndicatorHandle> {
        self.get_for(thread::current().id())
    }

    /// The indicator bound to `thread`, if any.
    pub fn get_for(&self, thread: ThreadId) -> Option<IndicatorHandle> {
        self.entries.read().get(&thread).cloned()
    }

    /// The indicator for the calling thread, created through the factory
    /// when none is bound yet.
    ///
    /// On a cache hit the supplied parameters are ignored; installing a new
    /// indicator for an already-bound thread requires [`set`](Self::set)
    /// (or [`bind`](Self::bind)).
    pub fn get_or_create(
        &self,
        state_count: u32,
        title: &str,
        first_message: &str,
    ) -> IndicatorHandle {
        self.get_or_create_for(thread::current().id(), state_count, title, first_message)
    }

    /// Keyed form of [`get_or_create`](Self::get_or_create).
    pub fn get_or_create_for(
        &self,
        thread: ThreadId,
        state_count: u32,
        title: &str,
        first_message: &str,
    ) -> IndicatorHandle {
        if let Some(existing) = self.get_for(thread) {
            return existing;
        }

        // The factory may be arbitrarily slow (it can build front-end
        // widgets), so creation happens outside the map lock. Losing the
        // same-key race drops the freshly created indicator unused.
        let created = self.wrap_for(thread, self.factory.create(state_count, title, first_message));
        self.entries.write().entry(thread).or_insert(created).clone()
    }

    /// Unconditionally replace (or install) the calling thread's binding.
    ///
    /// The previous handle is released from the registry only; an in-flight
    /// stage still holding it keeps it alive.
    pub fn set(&self, handle: IndicatorHandle) {
        self.set_for(thread::current().id(), handle);
    }

    /// Keyed form of [`set`](Self::set).
    pub fn set_for(&self, thread: ThreadId, handle: IndicatorHandle) {
        let handle = self.wrap_for(thread, handle);
        self.entries.write().insert(thread, handle);
    }

    /// Create a fresh indicator through the factory and install it for the
    /// calling thread, replacing any previous binding.
    pub fn bind(&self, state_count: u32, title: &str, first_message: &str) -> IndicatorHandle {
        let thread = thread::current().id();
        let handle = self.wrap_for(thread, self.factory.create(state_count, title, first_message));
        self.entries.write().insert(thread, handle.clone());
        handle
    }

    /// Clear the calling thread's binding.
    ///
    /// Worker threads call this on termination so the registry does not
    /// grow without bound.
    pub fn remove(&self) {
        self.remove_for(thread::current().id());
    }

    /// Keyed form of [`remove`](Self::remove).
    pub fn remove_for(&self, thread: ThreadId) {
        self.entries.write().remove(&thread);
    }

    /// Install the global indicator (the front end's aggregate display).
    pub fn set_global(&self, handle: IndicatorHandle) {
        *self.global.write() = Some(handle);
    }

    /// The global indicator, if one was installed.
    pub fn global(&self) -> Option<IndicatorHandle> {
        self.global.read().clone()
    }

    /// Identity of the recorded main thread.
    pub fn main_thread(&self) -> MainThreadIdentity {
        self.main_thread
    }

    /// Number of per-thread bindings currently installed.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Handles bound under the main thread's key tee their updates into
    /// the global slot.
    fn wrap_for(&self, thread: ThreadId, handle: IndicatorHandle) -> IndicatorHandle {
        if thread == self.main_thread.id() {
            Arc::new(MirrorIndicator {
                inner: handle,
                global: Arc::clone(&self.global),
            })
        } else {
            handle
        }
    }
}

/// Tee for main-thread indicators: forwards each update to the inner
/// handle and then to the global slot, synchronously, so the global
/// display reflects the update before the call returns.
struct MirrorIndicator {
    inner: IndicatorHandle,
    global: GlobalSlot,
}

impl ProgressIndicator for MirrorIndicator {
    fn update(&self, state: u32, message: &str) {
        self.inner.update(state, message);
        // The slot is read per update so a later set_global is honored.
        if let Some(global) = self.global.read().clone() {
            if !Arc::ptr_eq(&global, &self.inner) {
                global.update(state, message);
            }
        }
    }

    fn range(&self) -> u32 {
        self.inner.range()
    }

    fn title(&self) -> String {
        self.inner.title()
    }

    fn state(&self) -> u32 {
        self.inner.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::factory::LogIndicatorFactory;
    use crate::progress::indicator::LogIndicator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::{Duration, Instant};

    fn registry() -> Arc<ThreadProgressRegistry> {
        Arc::new(ThreadProgressRegistry::new(
            MainThreadIdentity::capture(),
            Arc::new(LogIndicatorFactory),
        ))
    }

    /// Factory that counts creations and optionally stalls, for race and
    /// contention tests.
    struct CountingFactory {
        created: AtomicUsize,
        delay: Duration,
    }

    impl CountingFactory {
        fn new(delay: Duration) -> Self {
            Self {
                created: AtomicUsize::new(0),
                delay,
            }
        }
    }

    impl IndicatorFactory for CountingFactory {
        fn create(&self, state_count: u32, title: &str, first_message: &str) -> IndicatorHandle {
            self.created.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            Arc::new(LogIndicator::new(state_count, title, first_message))
        }
    }

    #[test]
    fn set_then_get_then_remove() {
        let registry = registry();
        assert!(registry.get().is_none());

        let handle: IndicatorHandle = Arc::new(LogIndicator::new(3, "Brim", ""));
        registry.set(handle);

        let bound = registry.get().unwrap();
        assert_eq!(bound.title(), "Brim");

        registry.remove();
        assert!(registry.get().is_none());
    }

    #[test]
    fn get_or_create_ignores_parameters_on_hit() {
        let registry = registry();

        let first = registry.get_or_create(5, "Perimeters", "Starting");
        let second = registry.get_or_create(99, "Something else", "ignored");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.range(), 5);
        assert_eq!(second.title(), "Perimeters");
    }

    #[test]
    fn bind_replaces_existing_binding() {
        let registry = registry();

        let first = registry.get_or_create(5, "Perimeters", "");
        let second = registry.bind(7, "Infill", "");

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.get().unwrap().title(), "Infill");
        // The replaced handle is still alive for whoever holds it.
        assert_eq!(first.title(), "Perimeters");
    }

    #[test]
    fn distinct_threads_get_distinct_handles() {
        let registry = registry();
        let barrier = Arc::new(Barrier::new(3));

        let mut workers = Vec::new();
        for i in 0..3 {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            workers.push(thread::spawn(move || {
                barrier.wait();
                let handle = registry.get_or_create(10, &format!("worker {}", i), "");
                (thread::current().id(), handle.title())
            }));
        }

        let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        // Three distinct bindings, none for the main thread until it asks.
        assert_eq!(registry.len(), 3);
        assert!(registry.get().is_none());

        let titles: Vec<_> = results.iter().map(|(_, t)| t.clone()).collect();
        for i in 0..3 {
            assert!(titles.contains(&format!("worker {}", i)));
        }
        for (thread, title) in &results {
            assert_eq!(registry.get_for(*thread).unwrap().title(), *title);
        }
    }

    #[test]
    fn same_key_race_installs_one_indicator() {
        let factory = Arc::new(CountingFactory::new(Duration::from_millis(5)));
        let registry = Arc::new(ThreadProgressRegistry::new(
            MainThreadIdentity::capture(),
            factory.clone(),
        ));

        // Eight threads race to create for the same fixed key.
        let key = thread::current().id();
        let barrier = Arc::new(Barrier::new(8));
        let mut racers = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            racers.push(thread::spawn(move || {
                barrier.wait();
                registry.get_or_create_for(key, 4, "raced", "")
            }));
        }

        let handles: Vec<_> = racers.into_iter().map(|r| r.join().unwrap()).collect();

        // Everyone observes the same installed handle, whatever the factory
        // call count was; losers' creations were dropped unused.
        for handle in &handles {
            assert!(Arc::ptr_eq(handle, &handles[0]));
        }
        assert_eq!(registry.len(), 1);
        assert!(factory.created.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn creation_for_different_keys_does_not_serialize() {
        let factory = Arc::new(CountingFactory::new(Duration::from_millis(100)));
        let registry = Arc::new(ThreadProgressRegistry::new(
            MainThreadIdentity::capture(),
            factory,
        ));

        let barrier = Arc::new(Barrier::new(4));
        let start = Instant::now();
        let mut workers = Vec::new();
        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            workers.push(thread::spawn(move || {
                barrier.wait();
                registry.get_or_create(1, "parallel", "");
            }));
        }
        for worker in workers {
            worker.join().unwrap();
        }

        // Four 100ms creations overlapping; serialized they would take 400ms.
        assert!(start.elapsed() < Duration::from_millis(300));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn main_thread_updates_mirror_into_global() {
        let registry = registry();

        let global: Arc<LogIndicator> = Arc::new(LogIndicator::new(100, "Status bar", ""));
        registry.set_global(global.clone());

        let mine = registry.bind(4, "Skirt", "");
        mine.update(2, "half way");

        // Reflected synchronously, before update returned.
        assert_eq!(global.state(), 2);
        assert_eq!(global.message(), "half way");
    }

    #[test]
    fn worker_updates_do_not_touch_global() {
        let registry = registry();

        let global: Arc<LogIndicator> = Arc::new(LogIndicator::new(100, "Status bar", ""));
        registry.set_global(global.clone());

        let registry_clone = Arc::clone(&registry);
        thread::spawn(move || {
            let handle = registry_clone.bind(4, "Worker stage", "");
            handle.update(3, "working");
        })
        .join()
        .unwrap();

        assert_eq!(global.state(), 0);
    }

    #[test]
    fn global_installed_after_binding_is_still_mirrored() {
        let registry = registry();

        let mine = registry.bind(4, "Skirt", "");

        let global: Arc<LogIndicator> = Arc::new(LogIndicator::new(100, "Status bar", ""));
        registry.set_global(global.clone());

        mine.update(4, "done");
        assert_eq!(global.state(), 4);
    }
}
