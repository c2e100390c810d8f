use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::Evaluation;

#[derive(Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
}

/// Body of a successful `/query` response. The backend also echoes the
/// question; only the fields we render are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryReply {
    pub answer: String,
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("backend returned status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request task failed: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one question to the answering service.
    ///
    /// Non-2xx statuses are reported without reading the body.
    pub async fn query(&self, question: &str) -> Result<QueryReply, QueryError> {
        let url = format!("{}/query", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&QueryRequest { question })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueryError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = BackendClient::new("http://127.0.0.1:8000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_query_request_shape() {
        let body = serde_json::to_string(&QueryRequest {
            question: "What is insulin?",
        })
        .unwrap();
        assert_eq!(body, r#"{"question":"What is insulin?"}"#);
    }

    #[test]
    fn test_query_reply_evaluation_optional() {
        let reply: QueryReply = serde_json::from_str(r#"{"answer":"Hi"}"#).unwrap();
        assert_eq!(reply.answer, "Hi");
        assert!(reply.evaluation.is_none());

        let reply: QueryReply = serde_json::from_str(
            r#"{"question":"q","answer":"Hi","evaluation":{"global_score":0.85}}"#,
        )
        .unwrap();
        assert_eq!(reply.evaluation.unwrap().global_score, 0.85);
    }
}
