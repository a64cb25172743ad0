//! The sync engine: one authoritative bundle per client process.
//!
//! Every update path (remote push, authoring write, periodic tick, peer
//! signal, blob completion) is expressed as a [`Trigger`] consumed by a
//! single reconciliation step, which applies last-writer-wins, persists
//! the winning bundle to the local cache, recomputes the active content,
//! and notifies the renderer only when the active descriptor changes.
//!
//! States: `Uninitialized -> Loading -> Ready <-> Reconciling`. Triggers
//! arriving during a reconciliation are queued and coalesced, so one pass
//! observes the latest available data from all sources.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::LocalCache;
use crate::models::{Bundle, ContentItem};
use crate::resolve::{active, source, RenderInstruction};
use crate::store::BundleStore;

/// Queued triggers before senders apply backpressure.
const TRIGGER_BUFFER: usize = 64;

/// Default re-derivation tick; schedule-window membership depends on the
/// wall clock, so the engine re-evaluates even with no data change.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(45);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Loading,
    Ready,
    Reconciling,
}

/// A reconciliation trigger.
///
/// Anything that may change the answer to "what should be on screen"
/// arrives through this one type, which keeps the reconciliation step
/// testable with synthetic triggers and no timer dependence.
#[derive(Debug)]
pub enum Trigger {
    /// A bundle pushed by the remote store's change feed
    RemoteChange(Bundle),
    /// A whole-bundle authoring write from this instance
    Authoring(Bundle),
    /// Externally supplied current-item override
    OverrideCurrent(Uuid),
    /// Periodic re-evaluation; also re-polls the remote store
    Tick,
    /// Same-device hint that another instance changed the bundle;
    /// an optimization over the tick, never required for correctness
    PeerSignal,
    /// Completed blob lookup for a local upload
    BlobResolved {
        item_id: Uuid,
        url: Option<String>,
    },
}

/// Where the renderer finds the media bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// Directly streamable file (remote URL or local `file://`)
    File { url: String },
    /// Third-party page shown in an embedded frame
    Frame { url: String },
}

/// What the renderer should be showing right now.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenContent {
    /// Nothing to play: empty playlist or a dangling schedule target
    Idle,
    Playing {
        item: ContentItem,
        media: MediaSource,
    },
    /// A local upload whose bytes are not on this device; terminal for
    /// this playback attempt
    Unavailable { item: ContentItem },
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub poll_interval: Duration,
    /// Whether this instance replicates current-item overrides; plain
    /// viewers keep them local
    pub authoring: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            authoring: false,
        }
    }
}

/// Cheap cloneable handle for feeding triggers into a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    triggers: mpsc::Sender<Trigger>,
}

impl EngineHandle {
    /// Submits an authoring write. It wins locally regardless of
    /// timestamps and is replicated fire-and-forget.
    pub async fn authoring_write(&self, bundle: Bundle) {
        let _ = self.triggers.send(Trigger::Authoring(bundle)).await;
    }

    /// Overrides the current item, e.g. playlist advancement after the
    /// renderer reports content finished.
    pub async fn override_current(&self, item_id: Uuid) {
        let _ = self.triggers.send(Trigger::OverrideCurrent(item_id)).await;
    }

    /// Hints that another same-device instance changed the bundle.
    pub async fn peer_signal(&self) {
        let _ = self.triggers.send(Trigger::PeerSignal).await;
    }
}

pub struct SyncEngine {
    cache: LocalCache,
    store: Arc<dyn BundleStore>,
    options: EngineOptions,
    bundle: Bundle,
    state: EngineState,
    /// Item behind the last renderer hand-off; emission is gated on this
    last_emitted: Option<Uuid>,
    /// Item with an in-flight blob lookup, if any
    pending_blob: Option<Uuid>,
    triggers_tx: mpsc::Sender<Trigger>,
    triggers_rx: mpsc::Receiver<Trigger>,
    screen_tx: watch::Sender<ScreenContent>,
}

impl SyncEngine {
    pub fn new(
        cache: LocalCache,
        store: Arc<dyn BundleStore>,
        options: EngineOptions,
    ) -> (Self, EngineHandle, watch::Receiver<ScreenContent>) {
        let (triggers_tx, triggers_rx) = mpsc::channel(TRIGGER_BUFFER);
        let (screen_tx, screen_rx) = watch::channel(ScreenContent::Idle);

        let engine = Self {
            cache,
            store,
            options,
            bundle: Bundle::default(),
            state: EngineState::Uninitialized,
            last_emitted: None,
            pending_blob: None,
            triggers_tx: triggers_tx.clone(),
            triggers_rx,
            screen_tx,
        };
        let handle = EngineHandle {
            triggers: triggers_tx,
        };
        (engine, handle, screen_rx)
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Loads the startup bundle.
    ///
    /// Becomes ready as soon as one source returns: with a cached bundle
    /// the engine starts on it immediately and the remote read completes
    /// in the background as an ordinary reconciliation input, so a stalled
    /// read (remote reads carry no timeout) leaves the client on cached
    /// data. With no cached bundle the remote store is the only source;
    /// missing-both resolves to the empty default.
    pub async fn load(&mut self) {
        self.state = EngineState::Loading;

        let cached = match self.cache.load_bundle() {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("local cache unreadable: {}", e);
                None
            }
        };

        match cached {
            Some(bundle) => {
                self.bundle = bundle;

                let store = Arc::clone(&self.store);
                let triggers = self.triggers_tx.clone();
                tokio::spawn(async move {
                    match store.read_once().await {
                        Ok(Some(remote)) => {
                            let _ = triggers.send(Trigger::RemoteChange(remote)).await;
                        }
                        Ok(None) => {}
                        Err(e) => debug!("remote store unavailable at startup: {}", e),
                    }
                });
            }
            None => {
                self.bundle = match self.store.read_once().await {
                    Ok(Some(remote)) => remote,
                    Ok(None) => Bundle::default(),
                    Err(e) => {
                        debug!("remote store unavailable at startup: {}", e);
                        Bundle::default()
                    }
                };
            }
        }

        self.state = EngineState::Ready;
        self.apply_active(None);
    }

    /// Runs one reconciliation for a single trigger.
    ///
    /// The run loop batches queued triggers into one call; tests inject
    /// synthetic triggers here directly.
    pub async fn reconcile(&mut self, trigger: Trigger) {
        self.reconcile_batch(vec![trigger]).await;
    }

    async fn reconcile_batch(&mut self, triggers: Vec<Trigger>) {
        self.state = EngineState::Reconciling;

        let mut dirty = false;
        let mut replicate = false;
        let mut poll = false;
        let mut blob_result = None;

        for trigger in triggers {
            match trigger {
                Trigger::RemoteChange(incoming) => {
                    if incoming.supersedes(&self.bundle) {
                        debug!(last_update = incoming.last_update, "adopting remote bundle");
                        self.bundle = incoming;
                        dirty = true;
                        // Never replicate a bundle received from the store
                    } else {
                        debug!(
                            last_update = incoming.last_update,
                            "discarding stale remote bundle"
                        );
                    }
                }
                Trigger::Authoring(mut incoming) => {
                    // Authoring writes always win locally
                    if incoming.last_update <= self.bundle.last_update {
                        incoming.last_update = self.bundle.last_update + 1;
                    }
                    self.bundle = incoming;
                    dirty = true;
                    replicate = true;
                }
                Trigger::OverrideCurrent(item_id) => {
                    if self.bundle.config.current_item_id != Some(item_id) {
                        self.bundle.config.current_item_id = Some(item_id);
                        self.bundle.touch();
                        dirty = true;
                        replicate = replicate || self.options.authoring;
                    }
                }
                Trigger::Tick | Trigger::PeerSignal => poll = true,
                Trigger::BlobResolved { item_id, url } => blob_result = Some((item_id, url)),
            }
        }

        if poll {
            match self.store.read_once().await {
                Ok(Some(remote)) if remote.supersedes(&self.bundle) => {
                    debug!(last_update = remote.last_update, "re-poll found newer bundle");
                    self.bundle = remote;
                    dirty = true;
                }
                Ok(_) => {}
                Err(e) => debug!("re-poll failed, staying on cached data: {}", e),
            }
        }

        if dirty {
            if let Err(e) = self.cache.save_bundle(&self.bundle) {
                warn!("failed to persist bundle to local cache: {}", e);
            }
        }

        if replicate {
            // Fire-and-forget: replication failure degrades to local-only
            // operation and is never surfaced to the viewer
            let store = Arc::clone(&self.store);
            let bundle = self.bundle.clone();
            tokio::spawn(async move {
                if let Err(e) = store.write(&bundle).await {
                    warn!("replication failed, continuing locally: {}", e);
                }
            });
        }

        self.apply_active(blob_result);
        self.state = EngineState::Ready;
    }

    /// Recomputes the active item and hands the renderer a new instruction
    /// only when the active descriptor id changed.
    fn apply_active(&mut self, blob_result: Option<(Uuid, Option<String>)>) {
        let now = Local::now().naive_local();
        let item = active::resolve(
            now,
            &self.bundle.config,
            &self.bundle.schedules,
            &self.bundle.playlist,
        )
        .cloned();

        let Some(item) = item else {
            self.pending_blob = None;
            self.last_emitted = None;
            self.emit(ScreenContent::Idle);
            return;
        };

        // A finished blob lookup counts only for the still-active item;
        // anything else is a cancelled load whose result is discarded
        if let Some((item_id, url)) = blob_result {
            if self.pending_blob == Some(item_id) && item.id == item_id {
                self.pending_blob = None;
                self.last_emitted = Some(item_id);
                match url {
                    Some(url) => self.emit(ScreenContent::Playing {
                        item,
                        media: MediaSource::File { url },
                    }),
                    None => self.emit(ScreenContent::Unavailable { item }),
                }
                return;
            }
        }

        if self.last_emitted == Some(item.id) {
            // Descriptor unchanged: no new hand-off
            return;
        }

        match source::resolve(&item, &self.bundle.config) {
            RenderInstruction::Stream { url } => {
                self.pending_blob = None;
                self.last_emitted = Some(item.id);
                self.emit(ScreenContent::Playing {
                    item,
                    media: MediaSource::File { url },
                });
            }
            RenderInstruction::Embed { url } => {
                self.pending_blob = None;
                self.last_emitted = Some(item.id);
                self.emit(ScreenContent::Playing {
                    item,
                    media: MediaSource::Frame { url },
                });
            }
            RenderInstruction::LocalBlob { key } => {
                if self.pending_blob != Some(item.id) {
                    self.pending_blob = Some(item.id);
                    self.spawn_blob_lookup(item.id, key);
                }
            }
        }
    }

    fn spawn_blob_lookup(&self, item_id: Uuid, key: String) {
        let blobs = self.cache.blobs();
        let triggers = self.triggers_tx.clone();
        tokio::spawn(async move {
            let url = tokio::task::spawn_blocking(move || blobs.get_blob_url(&key))
                .await
                .unwrap_or(None);
            let _ = triggers.send(Trigger::BlobResolved { item_id, url }).await;
        });
    }

    fn emit(&self, content: ScreenContent) {
        self.screen_tx.send_if_modified(|current| {
            if *current == content {
                false
            } else {
                *current = content;
                true
            }
        });
    }

    /// Drives the engine until the process ends: loads the startup bundle,
    /// subscribes to remote changes, and reconciles coalesced triggers.
    pub async fn run(mut self) {
        if self.state == EngineState::Uninitialized {
            self.load().await;
        }

        let mut changes = match self.store.subscribe().await {
            Ok(rx) => Some(rx),
            Err(e) => {
                warn!("change subscription unavailable, relying on polling: {}", e);
                None
            }
        };

        let mut tick = tokio::time::interval(self.options.poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; consume it
        tick.tick().await;

        loop {
            let first = tokio::select! {
                Some(trigger) = self.triggers_rx.recv() => trigger,
                bundle = recv_change(&mut changes) => match bundle {
                    Some(bundle) => Trigger::RemoteChange(bundle),
                    None => {
                        warn!("change subscription ended, relying on polling");
                        changes = None;
                        continue;
                    }
                },
                _ = tick.tick() => Trigger::Tick,
            };

            // Coalesce everything that queued while we were waiting, so one
            // reconciliation observes the latest data from all sources
            let mut batch = vec![first];
            while let Ok(trigger) = self.triggers_rx.try_recv() {
                batch.push(trigger);
            }
            if let Some(rx) = changes.as_mut() {
                while let Ok(bundle) = rx.try_recv() {
                    batch.push(Trigger::RemoteChange(bundle));
                }
            }

            self.reconcile_batch(batch).await;
        }
    }
}

async fn recv_change(changes: &mut Option<mpsc::Receiver<Bundle>>) -> Option<Bundle> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentItem, ContentKind};
    use crate::store::MemoryBundleStore;
    use tempfile::TempDir;

    fn stream_item(title: &str) -> ContentItem {
        ContentItem::new(
            title,
            ContentKind::Direct {
                url: format!("https://example.com/{}.mp4", title),
            },
        )
    }

    fn upload_item(title: &str, key: &str) -> ContentItem {
        ContentItem::new(
            title,
            ContentKind::LocalUpload {
                blob_key: key.to_string(),
            },
        )
    }

    fn bundle_with(playlist: Vec<ContentItem>, last_update: i64) -> Bundle {
        Bundle {
            playlist,
            last_update,
            ..Default::default()
        }
    }

    fn test_engine() -> (
        SyncEngine,
        EngineHandle,
        watch::Receiver<ScreenContent>,
        Arc<MemoryBundleStore>,
        TempDir,
    ) {
        let temp = TempDir::new().unwrap();
        let cache = LocalCache::new(temp.path().to_path_buf());
        let store = Arc::new(MemoryBundleStore::new());
        let (engine, handle, screen) = SyncEngine::new(
            cache,
            Arc::clone(&store) as Arc<dyn BundleStore>,
            EngineOptions::default(),
        );
        (engine, handle, screen, store, temp)
    }

    async fn wait_for_playing(screen: &mut watch::Receiver<ScreenContent>, expected: Uuid) {
        let matched = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                {
                    let current = screen.borrow_and_update();
                    if let ScreenContent::Playing { item, .. } = &*current {
                        if item.id == expected {
                            return;
                        }
                    }
                }
                screen.changed().await.unwrap();
            }
        });
        matched.await.expect("expected item never started playing");
    }

    async fn wait_for_stored(store: &MemoryBundleStore, last_update: i64) {
        for _ in 0..100 {
            if let Some(bundle) = store.read_once().await.unwrap() {
                if bundle.last_update == last_update {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("bundle {} never replicated", last_update);
    }

    #[tokio::test]
    async fn test_load_missing_both_gives_default() {
        let (mut engine, _handle, screen, _store, _temp) = test_engine();

        engine.load().await;

        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(*engine.bundle(), Bundle::default());
        assert_eq!(*screen.borrow(), ScreenContent::Idle);
    }

    #[tokio::test]
    async fn test_load_without_cache_reads_remote() {
        let (mut engine, _handle, _screen, store, _temp) = test_engine();

        store.write(&bundle_with(vec![], 105)).await.unwrap();

        engine.load().await;
        assert_eq!(engine.bundle().last_update, 105);
    }

    #[tokio::test]
    async fn test_load_starts_on_cache_then_adopts_newer_remote() {
        let (mut engine, _handle, _screen, store, temp) = test_engine();

        let cache = LocalCache::new(temp.path().to_path_buf());
        cache.save_bundle(&bundle_with(vec![], 100)).unwrap();
        store.write(&bundle_with(vec![], 105)).await.unwrap();

        engine.load().await;
        // Ready on the cached copy without waiting for the remote read
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.bundle().last_update, 100);

        // The background remote read lands as an ordinary trigger
        let trigger = engine.triggers_rx.recv().await.unwrap();
        engine.reconcile(trigger).await;
        assert_eq!(engine.bundle().last_update, 105);
    }

    #[tokio::test]
    async fn test_load_keeps_newer_cached_copy() {
        let (mut engine, _handle, _screen, store, temp) = test_engine();

        let cache = LocalCache::new(temp.path().to_path_buf());
        cache.save_bundle(&bundle_with(vec![], 200)).unwrap();
        store.write(&bundle_with(vec![], 100)).await.unwrap();

        engine.load().await;
        assert_eq!(engine.bundle().last_update, 200);

        // The stale remote copy read in the background never wins
        let trigger = engine.triggers_rx.recv().await.unwrap();
        engine.reconcile(trigger).await;
        assert_eq!(engine.bundle().last_update, 200);
    }

    #[tokio::test]
    async fn test_stale_remote_changes_never_win() {
        let (mut engine, _handle, _screen, _store, _temp) = test_engine();
        engine.load().await;

        // Scenario: writes stamped 105 and 100 arrive out of network order
        engine
            .reconcile(Trigger::RemoteChange(bundle_with(vec![], 105)))
            .await;
        engine
            .reconcile(Trigger::RemoteChange(bundle_with(vec![], 100)))
            .await;

        assert_eq!(engine.bundle().last_update, 105);
    }

    #[tokio::test]
    async fn test_equal_timestamp_is_discarded() {
        let (mut engine, _handle, _screen, _store, _temp) = test_engine();
        engine.load().await;

        let mut incoming = bundle_with(vec![], 105);
        incoming.config.language = "first".to_string();
        engine.reconcile(Trigger::RemoteChange(incoming)).await;

        let mut echo = bundle_with(vec![], 105);
        echo.config.language = "second".to_string();
        engine.reconcile(Trigger::RemoteChange(echo)).await;

        assert_eq!(engine.bundle().config.language, "first");
    }

    #[tokio::test]
    async fn test_authoring_write_replicates_and_persists() {
        let (mut engine, _handle, _screen, store, temp) = test_engine();
        engine.load().await;

        let bundle = bundle_with(vec![stream_item("a")], 500);
        engine.reconcile(Trigger::Authoring(bundle)).await;

        assert_eq!(engine.bundle().last_update, 500);
        wait_for_stored(&store, 500).await;

        let cache = LocalCache::new(temp.path().to_path_buf());
        let cached = cache.load_bundle().unwrap().unwrap();
        assert_eq!(cached.last_update, 500);
    }

    #[tokio::test]
    async fn test_authoring_write_wins_over_newer_local_timestamp() {
        let (mut engine, _handle, _screen, _store, _temp) = test_engine();
        engine.load().await;

        engine
            .reconcile(Trigger::RemoteChange(bundle_with(vec![], 1000)))
            .await;

        // An authoring write stamped behind the held bundle still wins,
        // with its timestamp bumped past the held one
        let stale_authoring = bundle_with(vec![stream_item("mine")], 900);
        engine.reconcile(Trigger::Authoring(stale_authoring)).await;

        assert_eq!(engine.bundle().playlist.len(), 1);
        assert_eq!(engine.bundle().last_update, 1001);
    }

    #[tokio::test]
    async fn test_remote_changes_are_not_echoed_back() {
        let (mut engine, _handle, _screen, store, _temp) = test_engine();
        engine.load().await;

        engine
            .reconcile(Trigger::RemoteChange(bundle_with(vec![], 105)))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.read_once().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_emits_on_descriptor_change_only() {
        let (mut engine, _handle, mut screen, _store, _temp) = test_engine();
        engine.load().await;
        screen.borrow_and_update();

        let item = stream_item("a");
        let bundle = bundle_with(vec![item.clone()], 100);
        engine.reconcile(Trigger::Authoring(bundle.clone())).await;

        assert!(screen.has_changed().unwrap());
        match screen.borrow_and_update().clone() {
            ScreenContent::Playing { item: playing, media } => {
                assert_eq!(playing.id, item.id);
                assert_eq!(
                    media,
                    MediaSource::File {
                        url: "https://example.com/a.mp4".to_string()
                    }
                );
            }
            other => panic!("expected playing, got {:?}", other),
        }

        // Re-author the same content: descriptor id unchanged, no hand-off
        engine.reconcile(Trigger::Authoring(bundle)).await;
        assert!(!screen.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_emptied_playlist_goes_idle() {
        let (mut engine, _handle, mut screen, _store, _temp) = test_engine();
        engine.load().await;

        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![stream_item("a")], 100)))
            .await;
        screen.borrow_and_update();

        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![], 200)))
            .await;
        assert_eq!(*screen.borrow_and_update(), ScreenContent::Idle);
    }

    #[tokio::test]
    async fn test_override_current_switches_content() {
        let (mut engine, _handle, mut screen, _store, _temp) = test_engine();
        engine.load().await;

        let a = stream_item("a");
        let b = stream_item("b");
        let b_id = b.id;
        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![a, b], 100)))
            .await;
        screen.borrow_and_update();

        engine.reconcile(Trigger::OverrideCurrent(b_id)).await;

        assert_eq!(engine.bundle().config.current_item_id, Some(b_id));
        assert!(engine.bundle().last_update > 100);
        match screen.borrow_and_update().clone() {
            ScreenContent::Playing { item, .. } => assert_eq!(item.id, b_id),
            other => panic!("expected playing, got {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_tick_repolls_the_store() {
        let (mut engine, _handle, _screen, store, _temp) = test_engine();
        engine.load().await;

        store
            .write(&bundle_with(vec![stream_item("new")], 300))
            .await
            .unwrap();
        engine.reconcile(Trigger::Tick).await;

        assert_eq!(engine.bundle().last_update, 300);
    }

    #[tokio::test]
    async fn test_peer_signal_repolls_the_store() {
        let (mut engine, _handle, _screen, store, _temp) = test_engine();
        engine.load().await;

        store.write(&bundle_with(vec![], 300)).await.unwrap();
        engine.reconcile(Trigger::PeerSignal).await;

        assert_eq!(engine.bundle().last_update, 300);
    }

    #[tokio::test]
    async fn test_coalesced_batch_keeps_newest_remote() {
        let (mut engine, _handle, _screen, _store, _temp) = test_engine();
        engine.load().await;

        engine
            .reconcile_batch(vec![
                Trigger::RemoteChange(bundle_with(vec![], 105)),
                Trigger::RemoteChange(bundle_with(vec![], 100)),
                Trigger::Tick,
            ])
            .await;

        assert_eq!(engine.bundle().last_update, 105);
    }

    #[tokio::test]
    async fn test_run_loop_drives_handle_and_subscription() {
        let (engine, handle, mut screen, store, _temp) = test_engine();
        let task = tokio::spawn(engine.run());

        let a = stream_item("a");
        let b = stream_item("b");
        let (a_id, b_id) = (a.id, b.id);
        let authored = bundle_with(vec![a, b], 100);
        handle.authoring_write(authored.clone()).await;
        wait_for_playing(&mut screen, a_id).await;

        // The replication echo comes back through the subscription with an
        // equal timestamp and is discarded; the override still lands
        handle.override_current(b_id).await;
        wait_for_playing(&mut screen, b_id).await;

        // A newer write from another client arrives via the change feed
        let mut remote = authored;
        remote.config.current_item_id = Some(a_id);
        remote.last_update = i64::MAX - 1;
        store.write(&remote).await.unwrap();
        handle.peer_signal().await;
        wait_for_playing(&mut screen, a_id).await;

        task.abort();
    }

    #[tokio::test]
    async fn test_missing_blob_shows_unavailable() {
        let (mut engine, _handle, mut screen, _store, _temp) = test_engine();
        engine.load().await;

        let item = upload_item("on another device", "missing-key");
        let item_id = item.id;
        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![item], 100)))
            .await;

        // Lookup is in flight: nothing emitted yet
        assert_eq!(*screen.borrow_and_update(), ScreenContent::Idle);

        engine
            .reconcile(Trigger::BlobResolved {
                item_id,
                url: None,
            })
            .await;

        match screen.borrow_and_update().clone() {
            ScreenContent::Unavailable { item } => assert_eq!(item.id, item_id),
            other => panic!("expected unavailable, got {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_present_blob_plays_from_file_url() {
        let (mut engine, _handle, mut screen, _store, temp) = test_engine();
        engine.load().await;

        let cache = LocalCache::new(temp.path().to_path_buf());
        cache
            .blobs()
            .put_blob("here", &b"media"[..], 5, |_, _| {})
            .unwrap();

        let item = upload_item("local", "here");
        let item_id = item.id;
        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![item], 100)))
            .await;

        let url = cache.blobs().get_blob_url("here").unwrap();
        engine
            .reconcile(Trigger::BlobResolved {
                item_id,
                url: Some(url.clone()),
            })
            .await;

        match screen.borrow_and_update().clone() {
            ScreenContent::Playing { item, media } => {
                assert_eq!(item.id, item_id);
                assert_eq!(media, MediaSource::File { url });
            }
            other => panic!("expected playing, got {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_stale_blob_result_is_discarded() {
        let (mut engine, _handle, mut screen, _store, _temp) = test_engine();
        engine.load().await;

        let upload = upload_item("slow", "slow-key");
        let upload_id = upload.id;
        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![upload], 100)))
            .await;

        // Switch away before the lookup completes
        let b = stream_item("b");
        let b_id = b.id;
        engine
            .reconcile(Trigger::Authoring(bundle_with(vec![b], 200)))
            .await;
        match screen.borrow_and_update().clone() {
            ScreenContent::Playing { item, .. } => assert_eq!(item.id, b_id),
            other => panic!("expected playing, got {:?}", other),
        }

        // The late result for the cancelled load changes nothing
        engine
            .reconcile(Trigger::BlobResolved {
                item_id: upload_id,
                url: Some("file:///tmp/slow".to_string()),
            })
            .await;
        assert!(!screen.has_changed().unwrap());
    }
}
