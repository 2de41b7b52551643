//! Shared fixtures for session-level tests
//!
//! A `TestSession` wires one mock remote, one storage backend, a fixed clock
//! and a recording notifier together the way the binary wires the real ones.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use daily_wisdom::storage::{CookieStore, KeyValueStore};
use daily_wisdom::{
    DeepLink, FixedClock, Gateway, Hero, Instruction, Label, MemoryStore, MockRemote,
    RecordingNotifier, SearchOrchestrator, StorageAdapter,
};
use std::sync::Arc;

pub struct TestSession {
    pub remote: Arc<MockRemote>,
    pub gateway: Arc<Gateway>,
    pub storage: Arc<StorageAdapter>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
}

impl TestSession {
    /// New session over `store`. Pass the same store again to simulate a restart.
    pub fn new<S>(remote: MockRemote, store: Arc<S>) -> Self
    where
        S: KeyValueStore + CookieStore + 'static,
    {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let storage = Arc::new(
            StorageAdapter::with_store(store, notifier.clone()).with_clock(clock.clone()),
        );
        let remote = Arc::new(remote);
        Self {
            gateway: Arc::new(Gateway::new(remote.clone())),
            remote,
            storage,
            notifier,
            clock,
        }
    }

    pub fn in_memory(remote: MockRemote) -> Self {
        Self::new(remote, Arc::new(MemoryStore::new()))
    }

    pub fn hero(&self, link: &str) -> Hero {
        Hero::new(
            self.gateway.clone(),
            self.storage.clone(),
            self.notifier.clone(),
            DeepLink::parse(link).unwrap(),
        )
    }

    pub fn search(&self) -> SearchOrchestrator {
        SearchOrchestrator::new(
            self.gateway.clone(),
            self.storage.clone(),
            self.notifier.clone(),
        )
    }
}

pub const HOME: &str = "https://www.daily-wisdom.com/";

/// Ten instructions: 1-3 tagged "growth", of which 1 and 2 are in "career";
/// 4 is in "career" without the tag. Text 9 and 10 exercise `LIKE` wildcards.
pub fn library() -> Vec<Instruction> {
    vec![
        Instruction::new(1, "Read something every day.")
            .with_author("Anon")
            .with_tags(["growth"])
            .with_categories(["career"]),
        Instruction::new(2, "Ask for feedback early.")
            .with_tags(["growth", "humility"])
            .with_categories(["career", "relationships"]),
        Instruction::new(3, "Learn one new skill each year.")
            .with_tags(["growth"])
            .with_categories(["health"]),
        Instruction::new(4, "Negotiate your salary.")
            .with_tags(["money"])
            .with_categories(["career"]),
        Instruction::new(5, "Call your parents."),
        Instruction::new(6, "Drink more water.").with_categories(["health"]),
        Instruction::new(7, "Say thank you.").with_tags(["kindness"]),
        Instruction::new(8, "Keep your promises."),
        Instruction::new(9, "Give 100% to the people you love."),
        Instruction::new(10, "Sleep 100x better with a routine."),
    ]
}

pub fn tags() -> Vec<Label> {
    vec![
        Label::new(1, "growth"),
        Label::new(2, "humility"),
        Label::new(3, "money"),
        Label::new(4, "kindness"),
    ]
}

pub fn categories() -> Vec<Label> {
    vec![
        Label::new(10, "career"),
        Label::new(11, "relationships"),
        Label::new(12, "health"),
    ]
}

pub fn library_remote() -> MockRemote {
    MockRemote::new(library())
        .with_tags(tags())
        .with_categories(categories())
}
