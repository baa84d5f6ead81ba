//! Pinecone data-plane client for one named index.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::index::VectorIndex;
use crate::models::IndexMatch;

const API_VERSION: &str = "2024-07";

pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    name: String,
    /// Data-plane base URL, e.g. `https://sivillage-products-abc123.svc.pinecone.io`
    host: String,
}

impl PineconeIndex {
    pub fn new(client: reqwest::Client, api_key: &str, name: &str, host: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            name: name.to_string(),
            host: normalize_host(host),
        }
    }

    /// Connect to `name`, using `host` when given and otherwise asking the
    /// control plane where the index lives.
    pub async fn connect(
        client: reqwest::Client,
        api_key: &str,
        control_url: &str,
        name: &str,
        host: Option<&str>,
    ) -> Result<Self> {
        let host = match host {
            Some(h) => h.to_string(),
            None => describe_index_host(&client, api_key, control_url, name).await?,
        };
        tracing::info!("Pinecone index '{name}' at {}", normalize_host(&host));
        Ok(Self::new(client, api_key, name, &host))
    }
}

/// The control plane reports bare hostnames; the data plane needs a URL.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

async fn describe_index_host(
    client: &reqwest::Client,
    api_key: &str,
    control_url: &str,
    name: &str,
) -> Result<String> {
    let url = format!("{}/indexes/{name}", control_url.trim_end_matches('/'));

    let resp = client
        .get(&url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .with_context(|| format!("Failed to describe Pinecone index '{name}'"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Pinecone describe_index '{name}' returned {status}: {body}");
    }

    let body: DescribeIndexResponse = resp
        .json()
        .await
        .context("Failed to parse Pinecone describe_index response")?;
    Ok(body.host)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let url = format!("{}/query", self.host);

        let req = QueryRequest {
            vector,
            top_k,
            include_metadata,
        };

        let resp = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("Failed to query Pinecone index '{}'", self.name))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Pinecone query on '{}' returned {status}: {body}", self.name);
        }

        let body: QueryResponse = resp
            .json()
            .await
            .context("Failed to parse Pinecone query response")?;
        Ok(body.matches)
    }
}
