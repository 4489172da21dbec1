use cms_seed_core::{CreatedRecord, DestinationId, EntityKind, LocaleView, RecordSink};
use tokio::time::Duration;

use crate::config::StrapiSettings;
use crate::error::CmsError;
use crate::types::{StrapiEntry, StrapiEnvelope, StrapiPayload};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a Strapi content API.
///
/// Every request carries the configured bearer token. Non-success responses
/// become [`CmsError::Server`] with the status and whatever error body the
/// server returned.
pub struct StrapiClient {
    http: reqwest::Client,
    settings: StrapiSettings,
}

impl StrapiClient {
    pub fn new(settings: &StrapiSettings) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            settings: settings.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    fn collection_url(&self, kind: EntityKind) -> String {
        format!("{}/api/{}", self.settings.url, self.settings.endpoint(kind))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Ask the CMS to purge previously seeded content.
    ///
    /// Calls the custom `GET /api/<sedes>/clean` route installed on the
    /// server side.
    pub async fn clean_loaded_data(&self) -> Result<(), CmsError> {
        let url = format!("{}/clean", self.collection_url(EntityKind::Sede));
        log::debug!("GET {}", url);
        let resp = self.authorized(self.http.get(&url)).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

/// Read the response body, turning auth failures and non-2xx statuses into
/// errors.
async fn check_status(resp: reqwest::Response) -> Result<String, CmsError> {
    let status = resp.status();
    let text = resp.text().await?;

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(CmsError::InvalidCredentials(format!(
            "CMS rejected the API token (HTTP {})",
            status.as_u16()
        )));
    }
    if !status.is_success() {
        return Err(CmsError::from_response(status.as_u16(), &text));
    }
    Ok(text)
}

impl RecordSink for StrapiClient {
    type Error = CmsError;

    async fn create(&self, kind: EntityKind, view: &LocaleView) -> Result<CreatedRecord, CmsError> {
        let url = self.collection_url(kind);
        let body = view.to_value();
        log::debug!("POST {} {}", url, body);

        let resp = self
            .authorized(self.http.post(&url))
            .json(&StrapiPayload { data: &body })
            .send()
            .await?;
        let text = check_status(resp).await?;

        let envelope: StrapiEnvelope<StrapiEntry> = serde_json::from_str(&text).map_err(|e| {
            CmsError::api(format!(
                "Failed to parse create response: {e}. Response: {}",
                crate::error::truncate(&text, 200)
            ))
        })?;

        Ok(CreatedRecord {
            id: DestinationId(envelope.data.id),
            document_id: envelope.data.document_id,
        })
    }

    async fn update(
        &self,
        kind: EntityKind,
        key: &str,
        locale: &str,
        view: &LocaleView,
    ) -> Result<(), CmsError> {
        let url = format!("{}/{}", self.collection_url(kind), key);
        let body = view.to_value();
        log::debug!("PUT {}?locale={} {}", url, locale, body);

        let resp = self
            .authorized(self.http.put(&url))
            .query(&[("locale", locale)])
            .json(&StrapiPayload { data: &body })
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}
