//! Thin client for the search cluster's REST API. Just enough surface
//! for the bridge: index lifecycle, document upserts, bulk, stats.

use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Clone)]
pub struct EsClient {
    http: reqwest::Client,
    base: String,
}

impl EsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, base: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub async fn ping(&self) -> Result<()> {
        let resp = self.http.get(&self.base).send().await?;
        if !resp.status().is_success() {
            bail!("cluster answered {}", resp.status());
        }
        Ok(())
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let resp = self.http.head(format!("{}/{}", self.base, index)).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn create_index(&self, index: &str, mapping: &Value) -> Result<()> {
        let resp = self
            .http
            .put(format!("{}/{}", self.base, index))
            .json(mapping)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("create index failed: {}", resp.status());
        }
        Ok(())
    }

    /// Missing index counts as deleted.
    pub async fn delete_index(&self, index: &str) -> Result<()> {
        let resp = self.http.delete(format!("{}/{}", self.base, index)).send().await?;
        if resp.status() != StatusCode::NOT_FOUND && !resp.status().is_success() {
            bail!("delete index failed: {}", resp.status());
        }
        Ok(())
    }

    /// Upsert one document under an explicit id.
    pub async fn put_doc(&self, index: &str, id: &str, doc: &Value) -> Result<()> {
        let resp = self
            .http
            .put(format!("{}/{}/_doc/{}", self.base, index, id))
            .json(doc)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("index write failed: {}", resp.status());
        }
        Ok(())
    }

    /// 404 is success: the document is gone either way.
    pub async fn delete_doc(&self, index: &str, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/{}/_doc/{}", self.base, index, id))
            .send()
            .await?;
        if resp.status() != StatusCode::NOT_FOUND && !resp.status().is_success() {
            bail!("delete failed: {}", resp.status());
        }
        Ok(())
    }

    /// NDJSON bulk request; returns the parsed response body.
    pub async fn bulk(&self, body: String) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}/_bulk", self.base))
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("bulk request failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    pub async fn index_stats(&self, index: &str) -> Result<Value> {
        let resp = self
            .http
            .get(format!("{}/{}/_stats", self.base, index))
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("stats request failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    pub async fn cluster_health(&self) -> Result<Value> {
        let resp = self.http.get(format!("{}/_cluster/health", self.base)).send().await?;
        if !resp.status().is_success() {
            bail!("health request failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }

    pub async fn search(&self, index: &str, body: &Value, size: usize, from: usize) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}/{}/_search?size={}&from={}", self.base, index, size, from))
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("search request failed: {}", resp.status());
        }
        Ok(resp.json().await?)
    }
}
