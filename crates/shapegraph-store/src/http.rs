//! HTTP-backed implementation of [`ContentStore`].
//!
//! Talks to a remote design service addressed by explicit user and design
//! identifiers:
//! - `POST {base}/{user}/{design}/vertex/` persists one vertex document and
//!   responds with its content identifier.
//! - `POST {base}/{user}/{design}/graph/` persists the edge snapshot.
//!
//! The addressing is plain constructor state -- there is no ambient session
//! context; a deployment wires in whatever identifiers it needs.

use async_trait::async_trait;
use serde_json::Value;

use shapegraph_core::ContentHash;

use crate::error::StoreError;
use crate::traits::ContentStore;
use crate::types::GraphSnapshot;

/// Remote [`ContentStore`] backend over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    vertex_url: String,
    graph_url: String,
}

impl HttpStore {
    /// Creates a store addressing `{base_url}/{user}/{design}/`.
    pub fn new(base_url: &str, user: &str, design: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        HttpStore {
            client: reqwest::Client::new(),
            vertex_url: format!("{}/{}/{}/vertex/", base, user, design),
            graph_url: format!("{}/{}/{}/graph/", base, user, design),
        }
    }
}

#[async_trait]
impl ContentStore for HttpStore {
    async fn persist_vertex(&self, content: &Value) -> Result<ContentHash, StoreError> {
        let response = self
            .client
            .post(&self.vertex_url)
            .json(content)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Rejected(format!(
                "vertex persist returned {}",
                response.status()
            )));
        }

        let hash: String = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(ContentHash::new(hash))
    }

    async fn persist_snapshot(&self, snapshot: &GraphSnapshot) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.graph_url)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Rejected(format!(
                "snapshot persist returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn persist_vertex_returns_collaborator_hash() {
        let server = MockServer::start().await;
        let content = json!({"id": "point0", "type": "point"});

        Mock::given(method("POST"))
            .and(path("/alice/design1/vertex/"))
            .and(body_json(&content))
            .respond_with(ResponseTemplate::new(200).set_body_json("abc123"))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), "alice", "design1");
        let hash = store.persist_vertex(&content).await.unwrap();
        assert_eq!(hash, ContentHash::new("abc123"));
    }

    #[tokio::test]
    async fn persist_vertex_surfaces_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/alice/design1/vertex/"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), "alice", "design1");
        let result = store.persist_vertex(&json!({"id": "x"})).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn persist_snapshot_posts_edge_document() {
        let server = MockServer::start().await;
        let mut snapshot = GraphSnapshot::default();
        snapshot
            .edges
            .insert(ContentHash::new("aa"), vec![ContentHash::new("bb")]);

        Mock::given(method("POST"))
            .and(path("/alice/design1/graph/"))
            .and(body_json(&snapshot))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), "alice", "design1");
        store.persist_snapshot(&snapshot).await.unwrap();
    }
}
