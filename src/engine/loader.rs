//! Named resource loading with progress reporting.
//!
//! The loader is a plain state machine: [`ResourceLoader::begin`] opens a
//! load cycle, and each asset later reports back through
//! [`ResourceLoader::complete`] or [`ResourceLoader::fail`].
//! [`ResourceLoader::load_all`] drives a whole manifest through an
//! [`AssetSource`] as local futures, one per entry, finishing in whatever
//! order the platform delivers them.
use crate::error::EngineError;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::{AbortHandle, Abortable, Aborted, FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub file: String,
}

impl ManifestEntry {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        ManifestEntry {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// Resources to load before the game starts. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(EngineError::DuplicateResource(entry.name.clone()));
            }
        }
        Ok(Manifest { entries })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches and decodes a single asset.
#[async_trait(?Send)]
pub trait AssetSource {
    type Handle: 'static;

    async fn fetch(&self, file: &str) -> Result<Self::Handle>;
}

/// Read-only view of everything loaded in the current cycle.
#[derive(Debug)]
pub struct Resources<H> {
    loaded: HashMap<String, H>,
}

impl<H> Resources<H> {
    fn new() -> Self {
        Resources {
            loaded: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&H, EngineError> {
        self.loaded
            .get(name)
            .ok_or_else(|| EngineError::ResourceNotLoaded(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub loaded: usize,
    pub failed: usize,
    pub total: usize,
}

/// An asset that will never count as loaded this cycle.
#[derive(Debug)]
pub struct LoadFailure {
    pub name: String,
    pub error: anyhow::Error,
}

/// Identifies the load cycle an asset belongs to. Results carrying an old
/// ticket are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

struct Subscribers<F: ?Sized> {
    entries: Vec<(SubscriberId, Box<F>)>,
}

impl<F: ?Sized> Default for Subscribers<F> {
    fn default() -> Self {
        Subscribers {
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> Subscribers<F> {
    fn add(&mut self, id: SubscriberId, handler: Box<F>) {
        self.entries.push((id, handler));
    }

    fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        before != self.entries.len()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> {
        self.entries.iter_mut().map(|(_, handler)| handler)
    }
}

type ItemLoaded = dyn FnMut(&str, Progress);
type AllLoaded<H> = dyn FnMut(&Resources<H>);
type LoadFailed = dyn FnMut(&LoadFailure);

pub type SharedLoader<H> = Rc<RefCell<ResourceLoader<H>>>;

/// Subscribers run while the loader is mutably borrowed. They get what
/// they need as arguments and must not borrow the loader again.
pub struct ResourceLoader<H> {
    resources: Resources<H>,
    pending: HashSet<String>,
    loaded: usize,
    failed: usize,
    total: usize,
    cycle: u64,
    in_flight: Vec<AbortHandle>,
    next_subscriber: u64,
    item_loaded: Subscribers<ItemLoaded>,
    all_loaded: Subscribers<AllLoaded<H>>,
    load_failed: Subscribers<LoadFailed>,
}

impl<H> Default for ResourceLoader<H> {
    fn default() -> Self {
        ResourceLoader {
            resources: Resources::new(),
            pending: HashSet::new(),
            loaded: 0,
            failed: 0,
            total: 0,
            cycle: 0,
            in_flight: Vec::new(),
            next_subscriber: 0,
            item_loaded: Subscribers::default(),
            all_loaded: Subscribers::default(),
            load_failed: Subscribers::default(),
        }
    }
}

impl<H: 'static> ResourceLoader<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts loading every entry of `manifest` through `source`. Each load
    /// is handed to `spawn` as its own future; previous in-flight loads are
    /// cancelled first.
    pub fn load_all<S, F>(loader: &SharedLoader<H>, source: Rc<S>, manifest: &Manifest, spawn: F)
    where
        S: AssetSource<Handle = H> + 'static,
        F: Fn(LocalBoxFuture<'static, ()>),
    {
        let ticket = loader.borrow_mut().begin(manifest);

        for entry in manifest.entries() {
            let (abort, registration) = AbortHandle::new_pair();
            loader.borrow_mut().in_flight.push(abort);

            let loader = Rc::clone(loader);
            let source = Rc::clone(&source);
            let entry = entry.clone();
            let task = async move {
                let fetch = Abortable::new(source.fetch(&entry.file), registration);
                match fetch.await {
                    Ok(Ok(handle)) => {
                        loader.borrow_mut().complete(ticket, &entry.name, handle);
                    }
                    Ok(Err(error)) => {
                        loader.borrow_mut().fail(ticket, &entry.name, error);
                    }
                    Err(Aborted) => log::debug!("load of '{}' cancelled", entry.name),
                }
            };
            spawn(task.boxed_local());
        }
    }

    /// Opens a new load cycle: forgets everything loaded so far, cancels
    /// in-flight loads and expects one result per manifest entry. An empty
    /// manifest completes immediately.
    pub fn begin(&mut self, manifest: &Manifest) -> LoadTicket {
        self.cancel();
        self.resources.loaded.clear();
        self.pending = manifest
            .entries()
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        self.loaded = 0;
        self.failed = 0;
        self.total = manifest.len();
        log::info!("loading {} resources", self.total);

        if self.total == 0 {
            self.notify_all_loaded();
        }
        LoadTicket(self.cycle)
    }

    /// Records a finished asset. Returns `false` for stale tickets, unknown
    /// names and names already reported this cycle.
    pub fn complete(&mut self, ticket: LoadTicket, name: &str, handle: H) -> bool {
        if !self.take_pending(ticket, name) {
            return false;
        }
        self.resources.loaded.insert(name.to_string(), handle);
        self.loaded += 1;
        log::debug!("loaded '{}' ({}/{})", name, self.loaded, self.total);

        let progress = self.progress();
        for handler in self.item_loaded.iter_mut() {
            handler(name, progress);
        }
        if self.loaded == self.total {
            self.notify_all_loaded();
        }
        true
    }

    /// Records an asset that could not be loaded. Same filtering as
    /// [`ResourceLoader::complete`].
    pub fn fail(&mut self, ticket: LoadTicket, name: &str, error: anyhow::Error) -> bool {
        if !self.take_pending(ticket, name) {
            return false;
        }
        self.failed += 1;
        log::error!("could not load '{}': {:#}", name, error);

        let failure = LoadFailure {
            name: name.to_string(),
            error,
        };
        for handler in self.load_failed.iter_mut() {
            handler(&failure);
        }
        true
    }

    /// Aborts in-flight loads. Results already on their way are ignored.
    pub fn cancel(&mut self) {
        for abort in self.in_flight.drain(..) {
            abort.abort();
        }
        if !self.pending.is_empty() {
            log::info!("cancelled {} pending loads", self.pending.len());
            self.pending.clear();
        }
        self.cycle += 1;
    }

    pub fn get_resource(&self, name: &str) -> Result<&H, EngineError> {
        self.resources.get(name)
    }

    pub fn resources(&self) -> &Resources<H> {
        &self.resources
    }

    pub fn progress(&self) -> Progress {
        Progress {
            loaded: self.loaded,
            failed: self.failed,
            total: self.total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.failed == 0 && self.loaded == self.total
    }

    pub fn on_item_loaded(
        &mut self,
        handler: impl FnMut(&str, Progress) + 'static,
    ) -> SubscriberId {
        let id = self.next_subscriber_id();
        self.item_loaded.add(id, Box::new(handler));
        id
    }

    pub fn on_all_loaded(&mut self, handler: impl FnMut(&Resources<H>) + 'static) -> SubscriberId {
        let id = self.next_subscriber_id();
        self.all_loaded.add(id, Box::new(handler));
        id
    }

    pub fn on_load_failed(&mut self, handler: impl FnMut(&LoadFailure) + 'static) -> SubscriberId {
        let id = self.next_subscriber_id();
        self.load_failed.add(id, Box::new(handler));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.item_loaded.remove(id) || self.all_loaded.remove(id) || self.load_failed.remove(id)
    }

    fn next_subscriber_id(&mut self) -> SubscriberId {
        self.next_subscriber += 1;
        SubscriberId(self.next_subscriber)
    }

    fn take_pending(&mut self, ticket: LoadTicket, name: &str) -> bool {
        if ticket.0 != self.cycle {
            log::debug!("ignoring '{}' from an earlier load cycle", name);
            return false;
        }
        if !self.pending.remove(name) {
            log::warn!("ignoring unexpected result for '{}'", name);
            return false;
        }
        if self.pending.is_empty() {
            self.in_flight.clear();
        }
        true
    }

    fn notify_all_loaded(&mut self) {
        log::info!("all {} resources loaded", self.total);
        for handler in self.all_loaded.iter_mut() {
            handler(&self.resources);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    fn manifest(names: &[&str]) -> Manifest {
        Manifest::new(
            names
                .iter()
                .map(|name| ManifestEntry::new(*name, format!("{}.png", name)))
                .collect(),
        )
        .expect("distinct names")
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn observed(loader: &mut ResourceLoader<String>) -> Log {
        let log = Log::default();
        let items = Rc::clone(&log);
        loader.on_item_loaded(move |name, progress| {
            items
                .borrow_mut()
                .push(format!("item {} {}/{}", name, progress.loaded, progress.total));
        });
        let all = Rc::clone(&log);
        loader.on_all_loaded(move |resources| {
            all.borrow_mut().push(format!("all {}", resources.len()));
        });
        let failures = Rc::clone(&log);
        loader.on_load_failed(move |failure| {
            failures.borrow_mut().push(format!("failed {}", failure.name));
        });
        log
    }

    /// Asset source whose loads finish when the test says so.
    #[derive(Default)]
    struct ManualSource {
        waiting: RefCell<HashMap<String, oneshot::Sender<Result<String>>>>,
    }

    impl ManualSource {
        fn finish(&self, file: &str, result: Result<String>) {
            let sender = self.waiting.borrow_mut().remove(file).expect("load requested");
            sender.send(result).ok();
        }
    }

    #[async_trait(?Send)]
    impl AssetSource for ManualSource {
        type Handle = String;

        async fn fetch(&self, file: &str) -> Result<String> {
            let (tx, rx) = oneshot::channel();
            self.waiting.borrow_mut().insert(file.to_string(), tx);
            rx.await?
        }
    }

    #[test]
    fn manifest_rejects_duplicate_names() {
        let result = Manifest::new(vec![
            ManifestEntry::new("ship", "a.png"),
            ManifestEntry::new("ship", "b.png"),
        ]);
        assert!(matches!(result, Err(EngineError::DuplicateResource(name)) if name == "ship"));
    }

    #[test]
    fn completion_out_of_order_fires_all_loaded_once_after_every_item() {
        let mut loader = ResourceLoader::new();
        let log = observed(&mut loader);
        let ticket = loader.begin(&manifest(&["stars", "ship"]));

        assert!(loader.complete(ticket, "ship", "ship-handle".to_string()));
        assert_eq!(loader.progress().loaded, 1);
        assert!(!loader.is_complete());
        assert!(loader.complete(ticket, "stars", "stars-handle".to_string()));

        assert_eq!(*log.borrow(), vec!["item ship 1/2", "item stars 2/2", "all 2"]);
        assert_eq!(loader.get_resource("ship").ok(), Some(&"ship-handle".to_string()));
        assert_eq!(loader.get_resource("stars").ok(), Some(&"stars-handle".to_string()));
        assert!(loader.is_complete());
    }

    fn orders<'a>(names: &[&'a str]) -> Vec<Vec<&'a str>> {
        if names.len() <= 1 {
            return vec![names.to_vec()];
        }
        let mut all = Vec::new();
        for (i, first) in names.iter().enumerate() {
            let mut rest = names.to_vec();
            rest.remove(i);
            for mut tail in orders(&rest) {
                tail.insert(0, *first);
                all.push(tail);
            }
        }
        all
    }

    #[test]
    fn every_completion_order_fires_all_loaded_once_at_the_end() {
        let names = ["stars", "ship", "bullet", "asteroid"];
        let all_orders = orders(&names);
        assert_eq!(all_orders.len(), 24);

        for order in all_orders {
            let mut loader = ResourceLoader::new();
            let log = observed(&mut loader);
            let ticket = loader.begin(&manifest(&names));
            for name in &order {
                assert!(loader.complete(ticket, name, format!("{}-handle", name)));
            }

            // items first, the last one completing the set, then "all" once
            let mut expected: Vec<String> = order
                .iter()
                .enumerate()
                .map(|(i, name)| format!("item {} {}/4", name, i + 1))
                .collect();
            expected.push("all 4".to_string());
            assert_eq!(*log.borrow(), expected);

            for name in names {
                let handle = format!("{}-handle", name);
                assert_eq!(loader.get_resource(name).ok(), Some(&handle));
            }
        }
    }

    #[test]
    fn repeated_completion_is_not_counted_twice() {
        let mut loader = ResourceLoader::new();
        let log = observed(&mut loader);
        let ticket = loader.begin(&manifest(&["stars", "ship"]));

        assert!(loader.complete(ticket, "ship", "first".to_string()));
        assert!(!loader.complete(ticket, "ship", "second".to_string()));
        assert!(!loader.complete(ticket, "bullet", "stray".to_string()));

        assert_eq!(loader.progress().loaded, 1);
        assert_eq!(*log.borrow(), vec!["item ship 1/2"]);
        assert_eq!(loader.get_resource("ship").ok(), Some(&"first".to_string()));
    }

    #[test]
    fn resource_is_not_available_before_it_loads() {
        let mut loader: ResourceLoader<String> = ResourceLoader::new();
        loader.begin(&manifest(&["stars"]));
        assert!(matches!(
            loader.get_resource("stars"),
            Err(EngineError::ResourceNotLoaded(name)) if name == "stars"
        ));
        assert!(loader.get_resource("never-listed").is_err());
    }

    #[test]
    fn empty_manifest_completes_immediately() {
        let mut loader = ResourceLoader::new();
        let log = observed(&mut loader);
        loader.begin(&Manifest::default());
        assert_eq!(*log.borrow(), vec!["all 0"]);
        assert!(loader.is_complete());
    }

    #[test]
    fn new_cycle_clears_handles_and_ignores_stale_results() {
        let mut loader = ResourceLoader::new();
        let log = observed(&mut loader);
        let first = loader.begin(&manifest(&["stars", "ship"]));
        loader.complete(first, "stars", "old".to_string());

        let second = loader.begin(&manifest(&["stars", "ship"]));
        assert!(loader.get_resource("stars").is_err());
        assert!(!loader.complete(first, "ship", "stale".to_string()));
        assert_eq!(loader.progress().loaded, 0);

        loader.complete(second, "ship", "new".to_string());
        loader.complete(second, "stars", "new".to_string());
        assert_eq!(
            *log.borrow(),
            vec!["item stars 1/2", "item ship 1/2", "item stars 2/2", "all 2"]
        );
    }

    #[test]
    fn failure_is_reported_and_blocks_all_loaded() {
        let mut loader = ResourceLoader::new();
        let log = observed(&mut loader);
        let ticket = loader.begin(&manifest(&["stars", "ship"]));

        loader.complete(ticket, "stars", "stars".to_string());
        let stalled = EngineError::LoadStalled {
            file: "ship.png".into(),
            after_ms: 10,
        };
        assert!(loader.fail(ticket, "ship", stalled.into()));

        assert_eq!(*log.borrow(), vec!["item stars 1/2", "failed ship"]);
        assert_eq!(
            loader.progress(),
            Progress {
                loaded: 1,
                failed: 1,
                total: 2
            }
        );
        assert!(!loader.is_complete());
    }

    #[test]
    fn every_subscriber_is_notified_until_unsubscribed() {
        let mut loader: ResourceLoader<String> = ResourceLoader::new();
        let count = Rc::new(RefCell::new(0));
        let first = Rc::clone(&count);
        let id = loader.on_all_loaded(move |_| *first.borrow_mut() += 1);
        let second = Rc::clone(&count);
        loader.on_all_loaded(move |_| *second.borrow_mut() += 10);

        loader.begin(&Manifest::default());
        assert_eq!(*count.borrow(), 11);

        assert!(loader.unsubscribe(id));
        assert!(!loader.unsubscribe(id));
        loader.begin(&Manifest::default());
        assert_eq!(*count.borrow(), 21);
    }

    #[test]
    fn load_all_drives_manifest_through_source_in_any_order() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let loader: SharedLoader<String> = Rc::new(RefCell::new(ResourceLoader::new()));
        let log = observed(&mut loader.borrow_mut());
        let source = Rc::new(ManualSource::default());

        let names = manifest(&["stars", "ship"]);
        ResourceLoader::load_all(&loader, Rc::clone(&source), &names, |task| {
            spawner.spawn_local(task).expect("spawn load");
        });
        pool.run_until_stalled();
        assert_eq!(source.waiting.borrow().len(), 2);

        source.finish("ship.png", Ok("ship!".to_string()));
        pool.run_until_stalled();
        assert_eq!(*log.borrow(), vec!["item ship 1/2"]);

        source.finish("stars.png", Ok("stars!".to_string()));
        pool.run_until_stalled();
        assert_eq!(*log.borrow(), vec!["item ship 1/2", "item stars 2/2", "all 2"]);
        assert_eq!(
            loader.borrow().get_resource("stars").ok(),
            Some(&"stars!".to_string())
        );
    }

    #[test]
    fn load_all_reports_source_errors() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let loader: SharedLoader<String> = Rc::new(RefCell::new(ResourceLoader::new()));
        let log = observed(&mut loader.borrow_mut());
        let source = Rc::new(ManualSource::default());

        ResourceLoader::load_all(&loader, Rc::clone(&source), &manifest(&["ship"]), |task| {
            spawner.spawn_local(task).expect("spawn load");
        });
        pool.run_until_stalled();
        source.finish("ship.png", Err(anyhow!("404")));
        pool.run_until_stalled();

        assert_eq!(*log.borrow(), vec!["failed ship"]);
    }

    #[test]
    fn cancel_aborts_in_flight_loads() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let loader: SharedLoader<String> = Rc::new(RefCell::new(ResourceLoader::new()));
        let log = observed(&mut loader.borrow_mut());
        let source = Rc::new(ManualSource::default());

        ResourceLoader::load_all(&loader, Rc::clone(&source), &manifest(&["ship"]), |task| {
            spawner.spawn_local(task).expect("spawn load");
        });
        pool.run_until_stalled();
        loader.borrow_mut().cancel();
        pool.run_until_stalled();

        assert!(log.borrow().is_empty());
        assert_eq!(loader.borrow().progress().loaded, 0);
        assert!(loader.borrow().get_resource("ship").is_err());
    }
}
