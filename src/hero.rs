//! The hero surface: one instruction at a time with back/forward history
//!
//! `Hero` owns a [`HistoryState`] and is the only thing that dispatches
//! actions to it. After every transition it mirrors the new state into
//! storage and the deep link. Fetch failures become a toast and leave the
//! history untouched.

use crate::daily::DailyCache;
use crate::deeplink::{share_url, DeepLink};
use crate::gateway::Gateway;
use crate::model::{hydrate, reduce, HistoryAction, HistoryState, Instruction, InstructionId};
use crate::notify::{Notifier, Toast};
use crate::storage::StorageAdapter;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

pub const HISTORY_KEY: &str = "instructionHistory";
pub const HISTORY_INDEX_KEY: &str = "instructionHistoryIndex";

pub const LOAD_FAILED_TITLE: &str = "Failed to load instruction";
const LOAD_FAILED_DESCRIPTION: &str = "Please try again.";

/// Where the instruction shown after startup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupSource {
    DeepLink,
    History,
    Daily,
    /// Nothing could be loaded.
    Empty,
}

pub struct Hero {
    history: HistoryState,
    gateway: Arc<Gateway>,
    storage: Arc<StorageAdapter>,
    daily: DailyCache,
    link: DeepLink,
    notifier: Arc<dyn Notifier>,
    total_count: Option<u64>,
}

impl Hero {
    pub fn new(
        gateway: Arc<Gateway>,
        storage: Arc<StorageAdapter>,
        notifier: Arc<dyn Notifier>,
        link: DeepLink,
    ) -> Self {
        Self {
            history: HistoryState::empty(),
            daily: DailyCache::new(storage.clone()),
            gateway,
            storage,
            link,
            notifier,
            total_count: None,
        }
    }

    /// Restore history, then resolve what to show.
    ///
    /// A shared link wins over saved history; saved history wins over the
    /// daily pick.
    pub async fn initialize(&mut self) -> StartupSource {
        self.restore();
        self.load_count().await;

        if let Some(id) = self.link.instruction_id() {
            if self.open(id).await {
                return StartupSource::DeepLink;
            }
        }

        if !self.history.is_empty() {
            return StartupSource::History;
        }

        if self.load_daily(false).await {
            StartupSource::Daily
        } else {
            StartupSource::Empty
        }
    }

    /// Load saved history without touching the network.
    pub fn restore(&mut self) {
        let (entries, index) = hydrate(
            self.storage.get(HISTORY_KEY).as_ref(),
            self.storage.get(HISTORY_INDEX_KEY).as_ref(),
        );
        tracing::debug!(entries = entries.len(), index, "hydrated history");
        self.dispatch(HistoryAction::Initialize { entries, index });
    }

    /// Fetch the collection size; a failure only leaves it unknown.
    pub async fn load_count(&mut self) {
        self.total_count = match self.gateway.count_instructions().await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::error!(error = %e, "error fetching total instruction count");
                None
            }
        };
    }

    /// Fetch `id` and make it current, as if opened from a shared link.
    ///
    /// Returns false when the id doesn't exist or the fetch failed.
    pub async fn open(&mut self, id: InstructionId) -> bool {
        match self.gateway.fetch_by_id(id).await {
            Ok(Some(instruction)) => {
                self.append(instruction.external());
                true
            }
            Ok(None) => {
                tracing::info!(%id, "linked instruction not found");
                false
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "linked instruction failed to load");
                false
            }
        }
    }

    /// Discard the daily pick and show a fresh random instruction.
    pub async fn refresh(&mut self) -> bool {
        self.load_daily(true).await
    }

    pub fn back(&mut self) {
        self.dispatch(HistoryAction::Back);
    }

    pub fn forward(&mut self) {
        self.dispatch(HistoryAction::Forward);
    }

    pub fn current(&self) -> Option<&Instruction> {
        self.history.current()
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    /// `(n, m)` for "n of m".
    pub fn position(&self) -> (usize, usize) {
        (self.history.position(), self.history.len())
    }

    /// Size of the whole collection, when the count request succeeded.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn link(&self) -> &DeepLink {
        &self.link
    }

    /// Share address for the current instruction.
    pub fn share_url(&self, base: &Url) -> Option<Url> {
        self.current().map(|current| share_url(base, current.id))
    }

    async fn load_daily(&mut self, force_refresh: bool) -> bool {
        match self.daily.fetch(&self.gateway, force_refresh).await {
            Ok(Some(instruction)) => {
                self.append(instruction);
                true
            }
            Ok(None) => {
                tracing::warn!("random endpoint returned no instructions");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching random instruction");
                self.notifier
                    .notify(Toast::destructive(LOAD_FAILED_TITLE, LOAD_FAILED_DESCRIPTION));
                false
            }
        }
    }

    fn append(&mut self, instruction: Instruction) {
        self.dispatch(HistoryAction::Append {
            instruction,
            replace_forward: true,
        });
    }

    fn dispatch(&mut self, action: HistoryAction) {
        let state = std::mem::take(&mut self.history);
        self.history = reduce(state, action);
        self.sync();
    }

    /// Mirror the state into the deep link and storage.
    fn sync(&mut self) {
        if let Some(current) = self.history.current() {
            self.link.set_instruction(current.id);
        }

        if self.history.is_empty() {
            self.storage.set(HISTORY_KEY, json!([]));
            self.storage.set(HISTORY_INDEX_KEY, json!(-1));
            return;
        }
        match serde_json::to_value(&self.history.entries) {
            Ok(entries) => {
                self.storage.set(HISTORY_KEY, entries);
                self.storage
                    .set(HISTORY_INDEX_KEY, Value::from(self.history.index as i64));
            }
            Err(e) => tracing::warn!(error = %e, "history could not be serialized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockRemote, RemoteError, RemoteOp};
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;

    struct Fixture {
        hero: Hero,
        storage: Arc<StorageAdapter>,
        remote: Arc<MockRemote>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(link: &str) -> Fixture {
        fixture_with_storage(link, Arc::new(MemoryStore::new()))
    }

    fn fixture_with_storage(link: &str, store: Arc<MemoryStore>) -> Fixture {
        let notifier = Arc::new(RecordingNotifier::new());
        let storage = Arc::new(StorageAdapter::with_store(store, notifier.clone()));
        let remote = Arc::new(MockRemote::new(vec![
            Instruction::new(1, "One"),
            Instruction::new(2, "Two"),
            Instruction::new(3, "Three").with_author("Anon"),
        ]));
        let hero = Hero::new(
            Arc::new(Gateway::new(remote.clone())),
            storage.clone(),
            notifier.clone(),
            DeepLink::parse(link).unwrap(),
        );
        Fixture {
            hero,
            storage,
            remote,
            notifier,
        }
    }

    fn current_id(hero: &Hero) -> Option<i64> {
        hero.current().map(|c| c.id.get())
    }

    #[tokio::test]
    async fn test_first_visit_loads_daily_pick() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        assert_eq!(f.hero.initialize().await, StartupSource::Daily);
        assert_eq!(current_id(&f.hero), Some(1));
        assert_eq!(f.hero.total_count(), Some(3));
        assert_eq!(f.hero.link().instruction_id(), Some(InstructionId::new(1)));
        assert_eq!(f.storage.get(HISTORY_INDEX_KEY), Some(json!(0)));
    }

    #[tokio::test]
    async fn test_deep_link_appends_external_entry() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut first = fixture_with_storage("https://www.daily-wisdom.com/", store.clone());
            first.hero.initialize().await;
        }

        let mut f = fixture_with_storage("https://www.daily-wisdom.com/?instruction=3", store);
        assert_eq!(f.hero.initialize().await, StartupSource::DeepLink);
        let current = f.hero.current().unwrap();
        assert_eq!(current.id.get(), 3);
        assert!(current.was_external);
        assert_eq!(f.hero.position(), (2, 2));
        assert_eq!(f.remote.count_calls(RemoteOp::Random), 0);
    }

    #[tokio::test]
    async fn test_unknown_deep_link_keeps_saved_history() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut first = fixture_with_storage("https://www.daily-wisdom.com/", store.clone());
            first.hero.initialize().await;
            first.hero.refresh().await;
        }

        let mut f = fixture_with_storage("https://www.daily-wisdom.com/?instruction=99", store);
        assert_eq!(f.hero.initialize().await, StartupSource::History);
        assert_eq!(f.hero.position(), (1, 1));
        assert!(f.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_back_forward_persist_and_update_link() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        f.hero.initialize().await;
        assert!(f.hero.open(InstructionId::new(2)).await);
        assert!(f.hero.open(InstructionId::new(3)).await);
        assert_eq!(f.hero.position(), (3, 3));

        f.hero.back();
        f.hero.back();
        assert_eq!(current_id(&f.hero), Some(1));
        assert!(!f.hero.can_go_back());
        assert!(f.hero.can_go_forward());
        assert_eq!(f.storage.get(HISTORY_INDEX_KEY), Some(json!(0)));
        assert_eq!(f.hero.link().instruction_id(), Some(InstructionId::new(1)));

        f.hero.forward();
        assert_eq!(current_id(&f.hero), Some(2));
    }

    #[tokio::test]
    async fn test_refresh_failure_toasts_and_keeps_state() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        f.hero.initialize().await;
        let before = f.hero.history().clone();

        f.remote.fail(RemoteOp::Random, RemoteError::transport("offline"));
        assert!(!f.hero.refresh().await);
        assert_eq!(f.hero.history(), &before);
        assert_eq!(f.notifier.titles(), vec![LOAD_FAILED_TITLE]);
    }

    #[tokio::test]
    async fn test_count_failure_is_not_fatal() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        f.remote.fail(RemoteOp::Count, RemoteError::transport("timeout"));
        assert_eq!(f.hero.initialize().await, StartupSource::Daily);
        assert_eq!(f.hero.total_count(), None);
    }

    #[tokio::test]
    async fn test_everything_failing_leaves_empty_history() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        f.remote.fail(RemoteOp::Random, RemoteError::transport("offline"));
        assert_eq!(f.hero.initialize().await, StartupSource::Empty);
        assert_eq!(f.hero.position(), (0, 0));
        assert_eq!(f.storage.get(HISTORY_KEY), Some(json!([])));
        assert_eq!(f.storage.get(HISTORY_INDEX_KEY), Some(json!(-1)));
    }

    #[tokio::test]
    async fn test_refresh_after_restore_fetches_once() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        f.hero.restore();
        assert!(f.hero.refresh().await);
        assert_eq!(f.hero.position(), (1, 1));
        assert_eq!(f.remote.count_calls(RemoteOp::Random), 1);
    }

    #[tokio::test]
    async fn test_share_url_points_at_current() {
        let mut f = fixture("https://www.daily-wisdom.com/");
        f.hero.initialize().await;
        let base = Url::parse("https://www.daily-wisdom.com").unwrap();
        assert_eq!(
            f.hero.share_url(&base).unwrap().as_str(),
            "https://www.daily-wisdom.com/?instruction=1"
        );
    }
}
