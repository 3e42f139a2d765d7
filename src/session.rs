//! # Session
//!
//! Ties the landmark model to an opaque backend: loads assets and landmark
//! groups, saves them, and keeps undo history per `(asset, template)` pair so
//! navigating away and back does not lose it.
//!
//! ## Stale responses
//!
//! Every asset request gets a generation number. Requesting another asset
//! aborts the futures of earlier requests, and a response that still arrives
//! for an old generation is rejected with [`Error::Superseded`] instead of
//! replacing the newer asset.
//!
//! ## Switching
//!
//! Before a group is replaced, unsaved changes go through
//! [`UnsavedChanges`]: either they are saved first (a failed save keeps the
//! current group and aborts the switch) or the pair's history is dropped.

use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable, Aborted, FutureExt, LocalBoxFuture};

use crate::config::HistorySettings;
use crate::error::{Error, Result};
use crate::gfx::scene::Asset;
use crate::model::{GroupKey, LandmarkDocument, LandmarkGroup, LandmarkTracker, ParsedDocument};

/// The remote service holding assets and landmark documents.
pub trait Backend {
    fn fetch_asset(&self, asset_id: &str) -> LocalBoxFuture<'static, anyhow::Result<Asset>>;

    fn fetch_landmarks(
        &self,
        asset_id: &str,
        template: &str,
    ) -> LocalBoxFuture<'static, anyhow::Result<LandmarkDocument>>;

    fn save_landmarks(
        &self,
        asset_id: &str,
        template: &str,
        document: LandmarkDocument,
    ) -> LocalBoxFuture<'static, anyhow::Result<()>>;
}

impl<B: Backend + ?Sized> Backend for Rc<B> {
    fn fetch_asset(&self, asset_id: &str) -> LocalBoxFuture<'static, anyhow::Result<Asset>> {
        (**self).fetch_asset(asset_id)
    }

    fn fetch_landmarks(
        &self,
        asset_id: &str,
        template: &str,
    ) -> LocalBoxFuture<'static, anyhow::Result<LandmarkDocument>> {
        (**self).fetch_landmarks(asset_id, template)
    }

    fn save_landmarks(
        &self,
        asset_id: &str,
        template: &str,
        document: LandmarkDocument,
    ) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        (**self).save_landmarks(asset_id, template, document)
    }
}

/// User-visible success and error messages.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Sends notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        log::info!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// What to do with unsaved changes when leaving a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChanges {
    Autosave,
    Discard,
}

/// The outcome of one asset request.
#[derive(Debug)]
pub struct AssetResponse {
    pub generation: u64,
    pub asset_id: String,
    pub result: Result<Asset>,
}

pub struct Session<B, N> {
    backend: B,
    notifier: N,
    history: HistorySettings,
    trackers: HashMap<GroupKey, LandmarkTracker>,
    group: Option<LandmarkGroup>,
    asset: Option<Asset>,
    generation: u64,
    pending: Vec<AbortHandle>,
}

impl<B: Backend, N: Notifier> Session<B, N> {
    pub fn new(backend: B, notifier: N, history: HistorySettings) -> Self {
        Self {
            backend,
            notifier,
            history,
            trackers: HashMap::new(),
            group: None,
            asset: None,
            generation: 0,
            pending: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn group(&self) -> Option<&LandmarkGroup> {
        self.group.as_ref()
    }

    pub fn group_mut(&mut self) -> Option<&mut LandmarkGroup> {
        self.group.as_mut()
    }

    /// Generation of the most recent asset request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether history is cached for a pair that is not currently loaded.
    pub fn has_cached_history(&self, key: &GroupKey) -> bool {
        self.trackers.contains_key(key)
    }

    /// Start fetching an asset, aborting every earlier request still in
    /// flight. The returned future does not borrow the session; hand its
    /// output to [`accept_asset`](Self::accept_asset).
    pub fn request_asset(&mut self, asset_id: &str) -> LocalBoxFuture<'static, AssetResponse> {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
        self.generation += 1;
        let generation = self.generation;
        log::info!("requesting asset '{}' (generation {})", asset_id, generation);

        let (handle, registration) = AbortHandle::new_pair();
        self.pending.push(handle);
        let fetch = Abortable::new(self.backend.fetch_asset(asset_id), registration);
        let asset_id = asset_id.to_string();

        async move {
            let result = match fetch.await {
                Ok(result) => result.map_err(Error::Backend),
                Err(Aborted) => Err(Error::Superseded {
                    asset: asset_id.clone(),
                }),
            };
            AssetResponse {
                generation,
                asset_id,
                result,
            }
        }
        .boxed_local()
    }

    /// Install a fetched asset unless a newer request has been made since.
    pub fn accept_asset(&mut self, response: AssetResponse) -> Result<&Asset> {
        if response.generation != self.generation {
            log::warn!(
                "discarding stale response for asset '{}' (generation {}, current {})",
                response.asset_id,
                response.generation,
                self.generation
            );
            return Err(Error::Superseded {
                asset: response.asset_id,
            });
        }
        self.pending.clear();

        match response.result {
            Ok(asset) => Ok(self.asset.insert(asset)),
            Err(Error::Superseded { asset }) => Err(Error::Superseded { asset }),
            Err(err) => {
                log::warn!("failed to load asset '{}': {}", response.asset_id, err);
                self.notifier
                    .error(&format!("Failed to load asset '{}'", response.asset_id));
                Err(err)
            }
        }
    }

    /// Leave the current group. Unsaved changes are saved or dropped per
    /// `policy`; otherwise the group's history is cached for its pair.
    pub async fn release_group(&mut self, policy: UnsavedChanges) -> Result<()> {
        let Some(group) = self.group.as_ref() else {
            return Ok(());
        };
        if !group.is_up_to_date() {
            match policy {
                UnsavedChanges::Autosave => self.save().await?,
                UnsavedChanges::Discard => {
                    if let Some(group) = self.group.take() {
                        log::info!("discarding unsaved changes to {:?}", group.key());
                        self.trackers.remove(group.key());
                    }
                    return Ok(());
                }
            }
        }
        if let Some(group) = self.group.take() {
            let key = group.key().clone();
            self.trackers.insert(key, group.into_tracker());
        }
        Ok(())
    }

    /// Release the current group through the unsaved-changes gate, then
    /// fetch and install the group for another pair, reusing that pair's
    /// cached history. `dims` applies when the document has no points yet.
    ///
    /// A failed autosave leaves the current group in place. A document that
    /// fails to load leaves the pair's cached history untouched.
    pub async fn switch_group(
        &mut self,
        asset_id: &str,
        template: &str,
        dims: usize,
        policy: UnsavedChanges,
    ) -> Result<&mut LandmarkGroup> {
        self.release_group(policy).await?;

        let key = GroupKey::new(asset_id, template);
        let document = match self.backend.fetch_landmarks(asset_id, template).await {
            Ok(document) => document,
            Err(err) => {
                log::warn!("failed to load landmarks for {:?}: {:#}", key, err);
                self.notifier
                    .error(&format!("Failed to load landmarks for '{}'", asset_id));
                return Err(Error::Backend(err));
            }
        };
        let parsed = match ParsedDocument::parse(&document, dims) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("invalid landmarks for {:?}: {}", key, err);
                self.notifier
                    .error(&format!("Invalid landmarks for '{}'", asset_id));
                return Err(err);
            }
        };

        let tracker = self
            .trackers
            .remove(&key)
            .unwrap_or_else(|| LandmarkTracker::new(&self.history));
        let group = parsed.into_group(key, tracker);
        log::info!(
            "loaded {} landmarks for '{}' / '{}'",
            group.len(),
            asset_id,
            template
        );
        Ok(self.group.insert(group))
    }

    /// Persist the current group. On failure the group and its history are
    /// left untouched, so it stays out of date.
    pub async fn save(&mut self) -> Result<()> {
        let Some(group) = self.group.as_ref() else {
            return Ok(());
        };
        let key = group.key().clone();
        let save = self
            .backend
            .save_landmarks(&key.asset, &key.template, group.to_document());

        match save.await {
            Ok(()) => {
                if let Some(group) = self.group.as_mut() {
                    group.mark_saved();
                }
                log::info!("saved landmarks for {:?}", key);
                self.notifier.success("Landmarks saved");
                Ok(())
            }
            Err(err) => {
                log::warn!("failed to save landmarks for {:?}: {:#}", key, err);
                self.notifier.error("Failed to save landmarks");
                Err(Error::Backend(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use crate::interaction::ViewportCallbacks;
    use cgmath::Point3;
    use futures::channel::oneshot;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeBackend {
        documents: RefCell<HashMap<(String, String), LandmarkDocument>>,
        asset_senders: RefCell<HashMap<String, oneshot::Sender<Asset>>>,
        fail_saves: Cell<bool>,
        saves: Cell<usize>,
    }

    impl FakeBackend {
        fn resolve(&self, asset_id: &str) {
            if let Some(sender) = self.asset_senders.borrow_mut().remove(asset_id) {
                let _ = sender.send(Asset::mesh(asset_id, generate_cube()));
            }
        }
    }

    impl Backend for FakeBackend {
        fn fetch_asset(&self, asset_id: &str) -> LocalBoxFuture<'static, anyhow::Result<Asset>> {
            let (sender, receiver) = oneshot::channel();
            self.asset_senders
                .borrow_mut()
                .insert(asset_id.to_string(), sender);
            async move { receiver.await.map_err(|_| anyhow::anyhow!("request dropped")) }
                .boxed_local()
        }

        fn fetch_landmarks(
            &self,
            asset_id: &str,
            template: &str,
        ) -> LocalBoxFuture<'static, anyhow::Result<LandmarkDocument>> {
            let document = self
                .documents
                .borrow()
                .get(&(asset_id.to_string(), template.to_string()))
                .cloned()
                .unwrap_or_else(|| LandmarkDocument::empty(3));
            async move { Ok(document) }.boxed_local()
        }

        fn save_landmarks(
            &self,
            asset_id: &str,
            template: &str,
            document: LandmarkDocument,
        ) -> LocalBoxFuture<'static, anyhow::Result<()>> {
            let result = if self.fail_saves.get() {
                Err(anyhow::anyhow!("server unavailable"))
            } else {
                self.saves.set(self.saves.get() + 1);
                self.documents
                    .borrow_mut()
                    .insert((asset_id.to_string(), template.to_string()), document);
                Ok(())
            };
            async move { result }.boxed_local()
        }
    }

    #[derive(Default, Clone)]
    struct Toasts(Rc<RefCell<Vec<String>>>);

    impl Notifier for Toasts {
        fn success(&self, message: &str) {
            self.0.borrow_mut().push(format!("ok: {}", message));
        }

        fn error(&self, message: &str) {
            self.0.borrow_mut().push(format!("error: {}", message));
        }
    }

    fn session() -> (Session<Rc<FakeBackend>, Toasts>, Rc<FakeBackend>, Toasts) {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = Rc::new(FakeBackend::default());
        let toasts = Toasts::default();
        let session = Session::new(backend.clone(), toasts.clone(), HistorySettings::default());
        (session, backend, toasts)
    }

    fn open<'a>(
        session: &'a mut Session<Rc<FakeBackend>, Toasts>,
        asset: &str,
    ) -> &'a mut LandmarkGroup {
        pollster::block_on(session.switch_group(asset, "t", 3, UnsavedChanges::Autosave)).unwrap()
    }

    #[test]
    fn test_stale_asset_response_is_skipped() {
        let (mut session, backend, _) = session();

        let first = session.request_asset("a");
        backend.resolve("a");
        let first = pollster::block_on(first);

        let second = session.request_asset("b");
        assert!(matches!(
            session.accept_asset(first),
            Err(Error::Superseded { .. })
        ));
        assert!(session.asset().is_none());

        backend.resolve("b");
        let second = pollster::block_on(second);
        assert_eq!(session.accept_asset(second).unwrap().id, "b");
    }

    #[test]
    fn test_newer_request_aborts_pending_fetch() {
        let (mut session, backend, toasts) = session();

        let first = session.request_asset("a");
        let second = session.request_asset("b");
        backend.resolve("a");
        backend.resolve("b");

        let first = pollster::block_on(first);
        assert!(matches!(first.result, Err(Error::Superseded { .. })));
        assert!(session.accept_asset(first).is_err());
        assert!(session.accept_asset(pollster::block_on(second)).is_ok());
        assert_eq!(session.asset().map(|asset| asset.id.as_str()), Some("b"));
        assert!(toasts.0.borrow().is_empty());
    }

    #[test]
    fn test_failed_save_leaves_state_untouched() {
        let (mut session, backend, toasts) = session();
        let group = open(&mut session, "a");
        group.insert_new_landmark(Point3::new(1.0, 2.0, 3.0));
        assert!(!group.is_up_to_date());

        backend.fail_saves.set(true);
        assert!(matches!(
            pollster::block_on(session.save()),
            Err(Error::Backend(_))
        ));
        let group = session.group().unwrap();
        assert!(!group.is_up_to_date());
        assert!(group.can_undo());
        assert_eq!(
            toasts.0.borrow().last().map(String::as_str),
            Some("error: Failed to save landmarks")
        );

        backend.fail_saves.set(false);
        pollster::block_on(session.save()).unwrap();
        assert!(session.group().unwrap().is_up_to_date());
        assert_eq!(backend.saves.get(), 1);
    }

    #[test]
    fn test_history_survives_navigation() {
        let (mut session, _, _) = session();
        let group = open(&mut session, "a");
        group.insert_new_landmark(Point3::new(0.5, 0.5, 0.5));

        pollster::block_on(session.switch_group("b", "t", 3, UnsavedChanges::Autosave)).unwrap();
        assert!(session.has_cached_history(&GroupKey::new("a", "t")));

        let group = open(&mut session, "a");
        assert!(group.is_up_to_date());
        assert!(group.can_undo());
        assert!(group.undo());
        assert!(group.landmark(0).is_some_and(|lm| lm.is_empty()));
    }

    #[test]
    fn test_failed_autosave_aborts_switch() {
        let (mut session, backend, _) = session();
        let group = open(&mut session, "a");
        group.insert_new_landmark(Point3::new(0.5, 0.5, 0.5));

        backend.fail_saves.set(true);
        let switched =
            pollster::block_on(session.switch_group("b", "t", 3, UnsavedChanges::Autosave));
        assert!(switched.is_err());
        assert_eq!(session.group().map(|group| group.key().asset.as_str()), Some("a"));

        pollster::block_on(session.switch_group("b", "t", 3, UnsavedChanges::Discard)).unwrap();
        assert!(!session.has_cached_history(&GroupKey::new("a", "t")));
        assert_eq!(session.group().map(|group| group.key().asset.as_str()), Some("b"));
    }

    #[test]
    fn test_log_notifier_is_a_notifier() {
        let backend = Rc::new(FakeBackend::default());
        let mut session = Session::new(backend, LogNotifier, HistorySettings::default());
        pollster::block_on(session.switch_group("a", "t", 2, UnsavedChanges::Autosave)).unwrap();
        assert_eq!(session.group().map(LandmarkGroup::dims), Some(2));
    }

    #[test]
    fn test_invalid_document_keeps_cached_history() {
        let (mut session, backend, toasts) = session();
        let group = open(&mut session, "a");
        group.insert_new_landmark(Point3::new(0.5, 0.5, 0.5));
        pollster::block_on(session.switch_group("b", "t", 3, UnsavedChanges::Autosave)).unwrap();

        let key = (String::from("a"), String::from("t"));
        let saved = backend.documents.borrow().get(&key).cloned().unwrap();
        let mut broken = saved.clone();
        broken.landmarks.connectivity = vec![[0, 7]];
        backend.documents.borrow_mut().insert(key.clone(), broken);

        let loaded =
            pollster::block_on(session.switch_group("a", "t", 3, UnsavedChanges::Autosave));
        assert!(matches!(loaded, Err(Error::ConnectivityOutOfRange { index: 7, .. })));
        assert!(session.has_cached_history(&GroupKey::new("a", "t")));
        assert_eq!(
            toasts.0.borrow().last().map(String::as_str),
            Some("error: Invalid landmarks for 'a'")
        );

        backend.documents.borrow_mut().insert(key, saved);
        let group = open(&mut session, "a");
        assert!(group.can_undo());
    }

    #[test]
    fn test_reloading_the_loaded_pair_saves_first() {
        let (mut session, backend, _) = session();
        let group = open(&mut session, "a");
        group.insert_new_landmark(Point3::new(0.5, 0.5, 0.5));

        let group = open(&mut session, "a");
        assert_eq!(backend.saves.get(), 1);
        assert!(group.is_up_to_date());
        assert!(group.landmark(0).is_some_and(|lm| !lm.is_empty()));
        assert!(group.undo());
    }
}
