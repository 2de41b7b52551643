//! PostgREST (Supabase) transport for [`RemoteService`]

use super::error::RemoteError;
use super::remote::{
    RemoteService, ScanRequest, SearchParams, FILTER_ENDPOINT, OFFSET_PARAMETER, RANDOM_ENDPOINT,
};
use super::rows::{RpcRow, TableRow, TABLE_ROW_SELECT};
use crate::model::Label;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Error body PostgREST sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Map a PostgREST error response onto the four-way taxonomy.
///
/// This is the only place that inspects wire codes and message text.
pub fn classify_error(status: u16, body: &str, endpoint: &str) -> RemoteError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.as_deref().unwrap_or_default();
    let message = parsed.message.clone().unwrap_or_else(|| body.to_string());

    match code {
        // Zero rows for a single-object request
        "PGRST116" => RemoteError::NotFound,
        // Function not found in schema cache / undefined function
        "PGRST202" | "42883" => {
            let mentions_offset = [&parsed.message, &parsed.details]
                .into_iter()
                .flatten()
                .any(|text| text.contains(OFFSET_PARAMETER));
            // A hint means a function of that name exists with another signature.
            if mentions_offset && parsed.hint.is_some() {
                RemoteError::unsupported(OFFSET_PARAMETER)
            } else {
                RemoteError::missing(endpoint)
            }
        }
        // Undefined table
        "42P01" | "PGRST205" => RemoteError::missing(endpoint),
        _ if status == 404 && code.is_empty() => RemoteError::missing(endpoint),
        _ => RemoteError::transport(format!("{} {}: {}", status, endpoint, message)),
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Connection settings for [`PostgrestClient`].
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub base_url: Url,
    /// Public anon key
    pub api_key: String,
    pub timeout: Duration,
}

impl PostgrestConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for a Supabase project's REST interface.
#[derive(Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    rest_root: Url,
}

impl PostgrestClient {
    pub fn new(config: &PostgrestConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| RemoteError::transport(format!("invalid api key header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| RemoteError::transport(format!("invalid api key header: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        Ok(Self {
            http,
            rest_root: rest_root(&config.base_url)?,
        })
    }

    pub fn rest_root(&self) -> &Url {
        &self.rest_root
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        self.rest_root
            .join(path)
            .map_err(|e| RemoteError::transport(format!("bad url for {}: {}", path, e)))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, RemoteError> {
        let resp = request
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("{}: {}", endpoint, e)))?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(endpoint, status, body = %body, "request failed");
        Err(classify_error(status, &body, endpoint))
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response, endpoint: &str) -> Result<T, RemoteError> {
        resp.json()
            .await
            .map_err(|e| RemoteError::transport(format!("{}: malformed response: {}", endpoint, e)))
    }

    async fn rpc<B, T>(&self, function: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(&format!("rpc/{}", function))?;
        let resp = self.send(self.http.post(url).json(body), function).await?;
        Self::decode(resp, function).await
    }

    async fn list_labels(&self, table: &str) -> Result<Vec<Label>, RemoteError> {
        let mut url = self.url(table)?;
        url.query_pairs_mut()
            .append_pair("select", "id,name")
            .append_pair("order", "name.asc");
        let resp = self.send(self.http.get(url), table).await?;
        Self::decode(resp, table).await
    }
}

fn rest_root(base: &Url) -> Result<Url, RemoteError> {
    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    root.join("rest/v1/")
        .map_err(|e| RemoteError::transport(format!("bad base url: {}", e)))
}

#[derive(Serialize)]
struct RandomArgs {
    result_limit: usize,
}

#[async_trait]
impl RemoteService for PostgrestClient {
    async fn get_instruction(&self, id: i64) -> Result<TableRow, RemoteError> {
        let mut url = self.url("instructions")?;
        url.query_pairs_mut()
            .append_pair("select", TABLE_ROW_SELECT)
            .append_pair("id", &format!("eq.{}", id));
        let request = self.http.get(url).header(ACCEPT, SINGLE_OBJECT);
        let resp = self.send(request, "instructions").await?;
        Self::decode(resp, "instructions").await
    }

    async fn random_instructions(&self, limit: usize) -> Result<Vec<RpcRow>, RemoteError> {
        self.rpc(RANDOM_ENDPOINT, &RandomArgs { result_limit: limit })
            .await
    }

    async fn search_instructions(&self, params: &SearchParams) -> Result<Vec<RpcRow>, RemoteError> {
        self.rpc(FILTER_ENDPOINT, params).await
    }

    async fn scan_instructions(&self, request: &ScanRequest) -> Result<Vec<TableRow>, RemoteError> {
        let mut url = self.url("instructions")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", TABLE_ROW_SELECT)
                .append_pair("order", "id.asc")
                .append_pair("offset", &request.offset.to_string())
                .append_pair("limit", &request.limit.to_string());
            if let Some(pattern) = &request.text_pattern {
                query.append_pair("text", &format!("ilike.{}", pattern));
            }
        }
        let resp = self.send(self.http.get(url), "instructions").await?;
        Self::decode(resp, "instructions").await
    }

    async fn list_tags(&self) -> Result<Vec<Label>, RemoteError> {
        self.list_labels("tags").await
    }

    async fn list_categories(&self) -> Result<Vec<Label>, RemoteError> {
        self.list_labels("categories").await
    }

    async fn count_instructions(&self) -> Result<u64, RemoteError> {
        let mut url = self.url("instructions")?;
        url.query_pairs_mut().append_pair("select", "id");
        let request = self.http.head(url).header("Prefer", "count=exact");
        let resp = self.send(request, "instructions").await?;
        resp.headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| RemoteError::transport("instructions: missing Content-Range total"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_single_object_miss_as_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned","details":"The result contains 0 rows","hint":null}"#;
        assert_eq!(classify_error(406, body, "instructions"), RemoteError::NotFound);
    }

    #[test]
    fn test_classify_missing_function() {
        let body = r#"{"code":"PGRST202","message":"Could not find the function public.search_instructions_secure(category_filters, result_limit, search_term, tag_filters) in the schema cache","details":null,"hint":null}"#;
        assert_eq!(
            classify_error(404, body, FILTER_ENDPOINT),
            RemoteError::missing(FILTER_ENDPOINT)
        );
    }

    #[test]
    fn test_classify_unknown_offset_parameter() {
        let body = r#"{"code":"PGRST202","message":"Could not find the function public.search_instructions_secure(category_filters, result_limit, result_offset, search_term, tag_filters) in the schema cache","details":"Searched for the function with parameters ...","hint":"Perhaps you meant to call the function public.search_instructions_secure(category_filters, result_limit, search_term, tag_filters)"}"#;
        assert_eq!(
            classify_error(404, body, FILTER_ENDPOINT),
            RemoteError::unsupported(OFFSET_PARAMETER)
        );
    }

    #[test]
    fn test_classify_bare_404_as_missing() {
        assert_eq!(
            classify_error(404, "", "rpc"),
            RemoteError::missing("rpc")
        );
    }

    #[test]
    fn test_classify_everything_else_as_transport() {
        let err = classify_error(500, r#"{"code":"XX000","message":"boom"}"#, "tags");
        assert!(matches!(err, RemoteError::Transport { message } if message.contains("boom")));
        assert!(matches!(
            classify_error(502, "<html>bad gateway</html>", "tags"),
            RemoteError::Transport { .. }
        ));
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_rest_root_appends_api_path() {
        let base = Url::parse("https://abc.supabase.co").unwrap();
        assert_eq!(rest_root(&base).unwrap().as_str(), "https://abc.supabase.co/rest/v1/");
        let nested = Url::parse("https://proxy.example/supabase").unwrap();
        assert_eq!(
            rest_root(&nested).unwrap().as_str(),
            "https://proxy.example/supabase/rest/v1/"
        );
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = PostgrestConfig::new(Url::parse("https://abc.supabase.co").unwrap(), "anon-key")
            .with_timeout(Duration::from_secs(5));
        let client = PostgrestClient::new(&config).unwrap();
        assert_eq!(client.rest_root().as_str(), "https://abc.supabase.co/rest/v1/");
    }
}
