use std::time::{Duration, Instant};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::SheetsConfig;
use crate::store::tables::{self, FIRST_DATA_ROW};
use crate::store::{RawRow, RowStore, StoreError};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Access tokens are refreshed this long before their reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Google Sheets values API transport.
///
/// Service-account auth: an RS256 assertion is exchanged for a short-lived
/// access token, cached until shortly before expiry. All calls fail fast —
/// retry policy belongs to the caller, not here.
pub struct SheetsStore {
    client: reqwest::Client,
    spreadsheet_id: String,
    service_account_email: String,
    signing_key: EncodingKey,
    question_tab: String,
    token_cache: RwLock<Option<(Instant, String)>>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SheetsStore {
    pub fn new(config: &SheetsConfig) -> Result<Self, StoreError> {
        if config.spreadsheet_id.is_empty()
            || config.service_account_email.is_empty()
            || config.private_key.is_empty()
        {
            return Err(StoreError::Auth(
                "missing SHEETS_SPREADSHEET_ID / SHEETS_SERVICE_ACCOUNT_EMAIL / SHEETS_PRIVATE_KEY"
                    .to_string(),
            ));
        }

        let signing_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            spreadsheet_id: config.spreadsheet_id.clone(),
            service_account_email: config.service_account_email.clone(),
            signing_key,
            question_tab: config.question_tab.clone(),
            token_cache: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        if let Some((expires_at, token)) = self.token_cache.read().await.as_ref() {
            if *expires_at > Instant::now() {
                return Ok(token.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.service_account_email,
            scope: OAUTH_SCOPE,
            aud: OAUTH_TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StoreError::Auth(format!("assertion sign failed: {e}")))?;

        let response = self
            .client
            .post(OAUTH_TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token exchange failed: status={status}, body={message}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in)
            .saturating_sub(TOKEN_REFRESH_MARGIN);
        *self.token_cache.write().await = Some((Instant::now() + lifetime, token.access_token.clone()));

        Ok(token.access_token)
    }

    /// Builds `{base}/{spreadsheetId}/{trailing segment}` with the trailing
    /// segment percent-encoded (tab titles may be non-ASCII).
    fn values_url(&self, trailing: &str) -> Result<reqwest::Url, StoreError> {
        let mut url = reqwest::Url::parse(SHEETS_API_BASE)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Malformed("cannot-be-a-base url".to_string()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(trailing);
        Ok(url)
    }

    async fn check_api_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api { status, message })
    }
}

#[axum::async_trait]
impl RowStore for SheetsStore {
    async fn read_rows(&self, table: &str) -> Result<Vec<RawRow>, StoreError> {
        let token = self.access_token().await?;
        let range = format!("'{table}'!A{FIRST_DATA_ROW}:Z");
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let response = self.check_api_response(response).await?;

        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(body.values)
    }

    async fn append_row(&self, table: &str, fields: &[String]) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let range = format!("'{table}'!A:A:append");
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [fields] }))
            .send()
            .await?;
        self.check_api_response(response).await?;
        Ok(())
    }

    async fn update_row(
        &self,
        table: &str,
        row_number: u64,
        fields: &[String],
    ) -> Result<(), StoreError> {
        if row_number < FIRST_DATA_ROW {
            return Err(StoreError::InvalidRow(row_number));
        }
        let token = self.access_token().await?;
        let range = format!("'{table}'!A{row_number}:Z{row_number}");
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [fields] }))
            .send()
            .await?;
        self.check_api_response(response).await?;
        Ok(())
    }

    async fn ensure_tables(&self) -> Result<(), StoreError> {
        let token = self.access_token().await?;

        let mut meta_url = reqwest::Url::parse(SHEETS_API_BASE)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        meta_url
            .path_segments_mut()
            .map_err(|_| StoreError::Malformed("cannot-be-a-base url".to_string()))?
            .push(&self.spreadsheet_id);
        meta_url
            .query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(meta_url)
            .bearer_auth(&token)
            .send()
            .await?;
        let response = self.check_api_response(response).await?;
        let meta: SpreadsheetMeta = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        let existing: Vec<&str> = meta
            .sheets
            .iter()
            .map(|s| s.properties.title.as_str())
            .collect();

        let requests: Vec<serde_json::Value> = tables::provisioned(&self.question_tab)
            .into_iter()
            .filter(|title| !existing.contains(&title.as_str()))
            .map(|title| serde_json::json!({ "addSheet": { "properties": { "title": title } } }))
            .collect();

        if requests.is_empty() {
            return Ok(());
        }
        tracing::info!(count = requests.len(), "provisioning missing sheet tabs");

        let mut batch_url = reqwest::Url::parse(SHEETS_API_BASE)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        batch_url
            .path_segments_mut()
            .map_err(|_| StoreError::Malformed("cannot-be-a-base url".to_string()))?
            .push(&format!("{}:batchUpdate", self.spreadsheet_id));

        let response = self
            .client
            .post(batch_url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "requests": requests }))
            .send()
            .await?;
        self.check_api_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetsConfig;

    fn config_without_creds() -> SheetsConfig {
        SheetsConfig {
            mock: false,
            spreadsheet_id: String::new(),
            service_account_email: String::new(),
            private_key: String::new(),
            question_tab: "Questions".to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = SheetsStore::new(&config_without_creds());
        assert!(matches!(err, Err(StoreError::Auth(_))));
    }

    #[test]
    fn garbage_private_key_is_rejected() {
        let mut cfg = config_without_creds();
        cfg.spreadsheet_id = "sheet-id".to_string();
        cfg.service_account_email = "svc@example.iam.gserviceaccount.com".to_string();
        cfg.private_key = "not a pem".to_string();
        assert!(matches!(SheetsStore::new(&cfg), Err(StoreError::Auth(_))));
    }
}
