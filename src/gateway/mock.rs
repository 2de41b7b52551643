//! In-memory remote service: scripted behavior for tests and offline demos

use super::error::RemoteError;
use super::pattern::ilike_matches;
use super::remote::{RemoteService, ScanRequest, SearchParams, FILTER_ENDPOINT, OFFSET_PARAMETER};
use super::rows::{RpcRow, TableRow};
use crate::filter::Criteria;
use crate::model::{Instruction, Label};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Every request the mock receives, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetInstruction(i64),
    Random(usize),
    Search(SearchParams),
    Scan(ScanRequest),
    ListTags,
    ListCategories,
    Count,
}

/// Operation keys for scripted failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    GetInstruction,
    Random,
    Search,
    Scan,
    ListTags,
    ListCategories,
    Count,
}

impl RemoteCall {
    pub fn op(&self) -> RemoteOp {
        match self {
            Self::GetInstruction(_) => RemoteOp::GetInstruction,
            Self::Random(_) => RemoteOp::Random,
            Self::Search(_) => RemoteOp::Search,
            Self::Scan(_) => RemoteOp::Scan,
            Self::ListTags => RemoteOp::ListTags,
            Self::ListCategories => RemoteOp::ListCategories,
            Self::Count => RemoteOp::Count,
        }
    }
}

/// Mock service over a fixed dataset.
///
/// Search mirrors the production filter function (text substring, all tags,
/// any category). Random batches come back in id order so tests stay
/// deterministic. Scans evaluate `ILIKE` patterns with escapes.
pub struct MockRemote {
    instructions: Vec<Instruction>,
    tags: Vec<Label>,
    categories: Vec<Label>,
    filter_endpoint: bool,
    offset_parameter: bool,
    failures: Mutex<HashMap<RemoteOp, RemoteError>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl MockRemote {
    pub fn new(mut instructions: Vec<Instruction>) -> Self {
        instructions.sort_by_key(|i| i.id);
        Self {
            instructions,
            tags: Vec::new(),
            categories: Vec::new(),
            filter_endpoint: true,
            offset_parameter: true,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tags(mut self, tags: Vec<Label>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Label>) -> Self {
        self.categories = categories;
        self
    }

    /// Simulate a deployment without the filter function.
    pub fn without_filter_endpoint(mut self) -> Self {
        self.filter_endpoint = false;
        self
    }

    /// Simulate an older filter function that has no offset parameter.
    pub fn without_offset_parameter(mut self) -> Self {
        self.offset_parameter = false;
        self
    }

    /// Make every call of `op` fail with `error` until cleared.
    pub fn fail(&self, op: RemoteOp, error: RemoteError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(op, error);
        }
    }

    pub fn clear_failure(&self, op: RemoteOp) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(&op);
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count_calls(&self, op: RemoteOp) -> usize {
        self.calls().iter().filter(|c| c.op() == op).count()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let op = call.op();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.failures.lock() {
            Ok(failures) => match failures.get(&op) {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            },
            Err(_) => Err(RemoteError::transport("mock state poisoned")),
        }
    }
}

#[async_trait]
impl RemoteService for MockRemote {
    async fn get_instruction(&self, id: i64) -> Result<TableRow, RemoteError> {
        self.record(RemoteCall::GetInstruction(id))?;
        self.instructions
            .iter()
            .find(|i| i.id.get() == id)
            .map(TableRow::from_instruction)
            .ok_or(RemoteError::NotFound)
    }

    async fn random_instructions(&self, limit: usize) -> Result<Vec<RpcRow>, RemoteError> {
        self.record(RemoteCall::Random(limit))?;
        Ok(self
            .instructions
            .iter()
            .take(limit)
            .map(RpcRow::from_instruction)
            .collect())
    }

    async fn search_instructions(&self, params: &SearchParams) -> Result<Vec<RpcRow>, RemoteError> {
        self.record(RemoteCall::Search(params.clone()))?;
        if !self.filter_endpoint {
            return Err(RemoteError::missing(FILTER_ENDPOINT));
        }
        if params.result_offset.is_some() && !self.offset_parameter {
            return Err(RemoteError::unsupported(OFFSET_PARAMETER));
        }

        let criteria = Criteria::new(
            params.search_term.clone(),
            params.tag_filters.clone(),
            params.category_filters.clone(),
        );
        Ok(self
            .instructions
            .iter()
            .filter(|i| criteria.matches(i))
            .skip(params.result_offset.unwrap_or(0))
            .take(params.result_limit)
            .map(RpcRow::from_instruction)
            .collect())
    }

    async fn scan_instructions(&self, request: &ScanRequest) -> Result<Vec<TableRow>, RemoteError> {
        self.record(RemoteCall::Scan(request.clone()))?;
        Ok(self
            .instructions
            .iter()
            .filter(|i| {
                request
                    .text_pattern
                    .as_deref()
                    .map_or(true, |pattern| ilike_matches(pattern, &i.text))
            })
            .skip(request.offset)
            .take(request.limit)
            .map(TableRow::from_instruction)
            .collect())
    }

    async fn list_tags(&self) -> Result<Vec<Label>, RemoteError> {
        self.record(RemoteCall::ListTags)?;
        Ok(self.tags.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Label>, RemoteError> {
        self.record(RemoteCall::ListCategories)?;
        Ok(self.categories.clone())
    }

    async fn count_instructions(&self) -> Result<u64, RemoteError> {
        self.record(RemoteCall::Count)?;
        Ok(self.instructions.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> MockRemote {
        MockRemote::new(vec![
            Instruction::new(2, "Two"),
            Instruction::new(1, "One"),
        ])
    }

    #[tokio::test]
    async fn test_mock_returns_not_found_for_unknown_id() {
        let mock = remote();
        assert_eq!(mock.get_instruction(99).await.unwrap_err(), RemoteError::NotFound);
        assert_eq!(mock.get_instruction(1).await.unwrap().text, "One");
    }

    #[tokio::test]
    async fn test_mock_records_calls_and_scripted_failures() {
        let mock = remote();
        mock.fail(RemoteOp::Random, RemoteError::transport("boom"));
        assert!(mock.random_instructions(1).await.is_err());
        mock.clear_failure(RemoteOp::Random);
        assert_eq!(mock.random_instructions(5).await.unwrap().len(), 2);
        assert_eq!(mock.calls(), vec![RemoteCall::Random(1), RemoteCall::Random(5)]);
    }

    #[tokio::test]
    async fn test_mock_without_filter_endpoint_reports_missing() {
        let mock = remote().without_filter_endpoint();
        let params = SearchParams {
            search_term: "one".to_string(),
            tag_filters: Vec::new(),
            category_filters: Vec::new(),
            result_limit: 10,
            result_offset: None,
        };
        assert!(matches!(
            mock.search_instructions(&params).await,
            Err(RemoteError::EndpointMissing { .. })
        ));
    }
}
