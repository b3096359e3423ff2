//! PostgREST table mirror (the REST dialect Supabase exposes).
//!
//! Upserts go to `POST {url}/rest/v1/{table}?on_conflict=user_id,path` with
//! `Prefer: resolution=merge-duplicates`; deletes filter with `eq.` operators.

use async_trait::async_trait;
use reqwest::Client;

use super::{MirrorRecord, TableMirror};
use crate::config::MirrorConfig;
use crate::error::{CocoonError, Result};

pub struct RestMirror {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestMirror {
    pub fn new(config: &MirrorConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !config.url.is_empty(),
            "mirror.url must be set for the rest mirror (or COCOON_MIRROR_URL)"
        );
        anyhow::ensure!(
            !config.api_key.is_empty(),
            "mirror.api_key must be set for the rest mirror (or COCOON_MIRROR_KEY)"
        );
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", config.url.trim_end_matches('/'), config.table),
            api_key: config.api_key.clone(),
        })
    }

    fn url_with(&self, params: &[(&str, &str)]) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(&self.endpoint, params)
            .map_err(|e| CocoonError::Mirror(format!("bad mirror url {}: {e}", self.endpoint)))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn check_status(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(CocoonError::Mirror(format!("HTTP {status}: {body}")))
}

#[async_trait]
impl TableMirror for RestMirror {
    async fn upsert(&self, record: &MirrorRecord) -> Result<()> {
        let url = self.url_with(&[("on_conflict", "user_id,path")])?;
        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| CocoonError::Mirror(e.to_string()))?;
        check_status(response).await
    }

    async fn delete(&self, user_id: &str, path: &str) -> Result<()> {
        let user_filter = format!("eq.{user_id}");
        let path_filter = format!("eq.{path}");
        let url = self.url_with(&[
            ("user_id", user_filter.as_str()),
            ("path", path_filter.as_str()),
        ])?;
        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(|e| CocoonError::Mirror(e.to_string()))?;
        check_status(response).await
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
