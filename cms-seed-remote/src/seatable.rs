//! SeaTable base export.
//!
//! The source datasets live in a SeaTable base. Exporting is a two-step
//! exchange: the app token buys a short-lived base token, which then reads
//! each table's rows.

use std::path::{Path, PathBuf};

use tokio::time::Duration;

use crate::config::SeaTableSettings;
use crate::error::CmsError;
use crate::types::SeaTableAccess;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for SeaTable's app-token and row APIs.
pub struct SeaTableClient {
    http: reqwest::Client,
    server_url: String,
    app_token: String,
    view: String,
}

impl SeaTableClient {
    pub fn new(settings: &SeaTableSettings) -> Result<Self, CmsError> {
        let app_token = settings.app_token.clone().ok_or_else(|| {
            CmsError::config(format!(
                "No SeaTable app token. Set ${} or [seatable] app_token",
                crate::config::ENV_SEATABLE_TOKEN
            ))
        })?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            server_url: settings.server_url.clone(),
            app_token,
            view: settings.view.clone(),
        })
    }

    /// Exchange the app token for a base token and the base's uuid.
    pub async fn base_access(&self) -> Result<SeaTableAccess, CmsError> {
        let url = format!("{}/api/v2.1/dtable/app-access-token/", self.server_url);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.app_token))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CmsError::InvalidCredentials(
                "SeaTable rejected the app token".to_string(),
            ));
        }
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CmsError::from_response(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| {
            CmsError::api(format!(
                "Failed to parse SeaTable access token: {e}. Response: {}",
                crate::error::truncate(&text, 200)
            ))
        })
    }

    /// Fetch every row of `table` through the configured view.
    ///
    /// The response is returned as-is; it carries the `rows` array the
    /// loader reads.
    pub async fn table_rows(
        &self,
        access: &SeaTableAccess,
        table: &str,
    ) -> Result<serde_json::Value, CmsError> {
        let url = format!(
            "{}/api/v1/dtables/{}/rows/",
            self.dtable_server(access),
            access.dtable_uuid
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&access.access_token)
            .query(&[("table_name", table), ("view_name", self.view.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CmsError::from_response(status.as_u16(), &text));
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        if !value.get("rows").is_some_and(serde_json::Value::is_array) {
            return Err(CmsError::api(format!(
                "SeaTable response for table '{}' has no rows array",
                table
            )));
        }
        Ok(value)
    }

    /// Export `tables` into `out_dir` as `<table>.json`, returning the
    /// written paths in table order.
    pub async fn export_tables(
        &self,
        tables: &[&str],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, CmsError> {
        let access = self.base_access().await?;
        std::fs::create_dir_all(out_dir)?;

        let mut written = Vec::with_capacity(tables.len());
        for table in tables {
            log::info!("Fetching rows of table '{}'", table);
            let rows = self.table_rows(&access, table).await?;
            let count = rows
                .get("rows")
                .and_then(serde_json::Value::as_array)
                .map_or(0, Vec::len);

            let path = out_dir.join(format!("{}.json", table));
            std::fs::write(&path, serde_json::to_string_pretty(&rows)?)?;
            log::info!("Saved {} rows to {}", count, path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn dtable_server(&self, access: &SeaTableAccess) -> String {
        match &access.dtable_server {
            Some(server) if !server.is_empty() => server.trim_end_matches('/').to_string(),
            _ => format!("{}/dtable-server", self.server_url),
        }
    }
}
