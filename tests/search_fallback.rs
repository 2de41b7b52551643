//! Search sessions against deployments with and without the filter function.

mod common;

use common::{library_remote, TestSession};
use daily_wisdom::gateway::{RemoteCall, RemoteOp};
use daily_wisdom::search::{FetchOutcome, SearchMode, SELECTED_TAGS_KEY};
use daily_wisdom::{Instruction, MemoryStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const GROWTH: i64 = 1;
const CAREER: i64 = 10;

fn ids(items: &[Instruction]) -> Vec<i64> {
    items.iter().map(|i| i.id.get()).collect()
}

#[tokio::test]
async fn test_missing_filter_function_is_probed_once() {
    let session = TestSession::in_memory(library_remote().without_filter_endpoint());
    let mut search = session.search();
    search.start().await.unwrap();

    search.toggle_tag(GROWTH).await.unwrap();
    assert_eq!(ids(&search.visible()), vec![1, 2, 3]);
    assert_eq!(session.remote.count_calls(RemoteOp::Search), 1);
    assert_eq!(session.remote.count_calls(RemoteOp::Scan), 1);
    assert!(!session.gateway.capabilities().supports_filter_endpoint());

    session.remote.clear_calls();
    search.toggle_category(CAREER).await.unwrap();
    assert_eq!(ids(&search.visible()), vec![1, 2]);
    assert_eq!(session.remote.count_calls(RemoteOp::Search), 0);
    assert_eq!(session.remote.count_calls(RemoteOp::Scan), 1);
    assert!(session.notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_local_mode_filters_without_network() {
    let session = TestSession::in_memory(library_remote());
    let mut search = session.search();
    search.start().await.unwrap();
    assert_eq!(search.visible().len(), 10);

    search.set_mode(SearchMode::Local).await.unwrap();
    session.remote.clear_calls();

    search.toggle_tag(GROWTH).await.unwrap();
    assert_eq!(ids(&search.visible()), vec![1, 2, 3]);
    search.toggle_category(CAREER).await.unwrap();
    assert_eq!(ids(&search.visible()), vec![1, 2]);
    search.set_query("feedback").await.unwrap();
    assert_eq!(ids(&search.visible()), vec![2]);

    assert!(session.remote.calls().is_empty());
    assert!(!search.has_more());
}

#[tokio::test]
async fn test_percent_in_query_is_literal_in_table_scan() {
    let session = TestSession::in_memory(library_remote().without_filter_endpoint());
    let mut search = session.search();
    search.start().await.unwrap();

    search.set_query("100%").await.unwrap();
    assert_eq!(ids(&search.visible()), vec![9]);

    let patterns: Vec<Option<String>> = session
        .remote
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RemoteCall::Scan(scan) => Some(scan.text_pattern),
            _ => None,
        })
        .collect();
    assert_eq!(patterns, vec![Some("%100\\%%".to_string())]);
}

#[tokio::test]
async fn test_endpoint_without_offsets_serves_first_page_only() {
    let session = TestSession::in_memory(library_remote().without_offset_parameter());
    let mut search = session.search().with_page_size(2);
    search.start().await.unwrap();

    search.toggle_tag(GROWTH).await.unwrap();
    assert_eq!(ids(&search.visible()), vec![1, 2]);
    assert!(!search.has_more());
    assert!(!session.gateway.capabilities().supports_offset_pagination());

    session.remote.clear_calls();
    assert_eq!(search.load_more().await.unwrap(), FetchOutcome::Applied { added: 0 });
    assert!(session.remote.calls().is_empty());
}

#[test]
fn test_saved_criteria_carry_into_next_session() {
    let store = Arc::new(MemoryStore::new());

    tokio_test::block_on(async {
        let session = TestSession::new(library_remote(), store.clone());
        let mut search = session.search();
        search.start().await.unwrap();
        search.toggle_tag(GROWTH).await.unwrap();
        search.set_query("skill").await.unwrap();
        assert_eq!(session.storage.get(SELECTED_TAGS_KEY), Some(json!([GROWTH])));
    });

    tokio_test::block_on(async {
        let session = TestSession::new(library_remote(), store);
        let mut search = session.search();
        search.start().await.unwrap();

        assert_eq!(search.state().query, "skill");
        assert_eq!(search.criteria().tags, vec!["growth".to_string()]);
        assert_eq!(ids(&search.visible()), vec![3]);
        assert_eq!(session.remote.count_calls(RemoteOp::Random), 0);
    });
}

#[tokio::test]
async fn test_load_more_pages_through_filtered_results() {
    let session = TestSession::in_memory(library_remote());
    let mut search = session.search().with_page_size(2);
    search.start().await.unwrap();

    search.toggle_tag(GROWTH).await.unwrap();
    assert!(search.has_more());

    assert_eq!(search.load_more().await.unwrap(), FetchOutcome::Applied { added: 1 });
    assert_eq!(ids(&search.visible()), vec![1, 2, 3]);
    assert!(!search.has_more());
}
