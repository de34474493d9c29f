use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use std::collections::BTreeMap;
use std::time::Duration;

use super::chunking::chunk_by_chars;
use super::{TranslationVendor, Vendor};
use crate::app_config::Settings;
use crate::captions::CaptionLine;
use crate::errors::ProviderError;

type HmacSha1 = Hmac<Sha1>;

const ACTION: &str = "TextTranslateBatch";
const API_VERSION: &str = "2018-03-21";

/// Tencent Machine Translation client (TextTranslateBatch, HmacSHA1 signature)
pub struct Tencent {
    /// HTTP client for API requests
    client: Client,
    /// API host, without scheme
    api_host: String,
    secret_id: String,
    secret_key: String,
    region: String,
    project_id: String,
    /// Character budget per request
    chunk_size_chars: usize,
}

impl std::fmt::Debug for Tencent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tencent")
            .field("api_host", &self.api_host)
            .field("region", &self.region)
            .field("project_id", &self.project_id)
            .field("chunk_size_chars", &self.chunk_size_chars)
            .finish_non_exhaustive()
    }
}

/// A signed TextTranslateBatch call.
///
/// `sign_string` and `query` list the same parameters in the same order;
/// only the percent-encoding of values differs.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// `GET<host>/?<params>` with raw values, the HMAC input
    pub sign_string: String,
    /// Query string with percent-encoded values, without the signature
    pub query: String,
    /// Base64 HMAC-SHA1 of `sign_string`
    pub signature: String,
    /// Final request URL
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct TmtEnvelope {
    #[serde(rename = "Response")]
    response: TmtResponse,
}

#[derive(Debug, Deserialize)]
struct TmtResponse {
    #[serde(rename = "TargetTextList")]
    target_text_list: Option<Vec<String>>,
    #[serde(rename = "Error")]
    error: Option<TmtError>,
}

#[derive(Debug, Deserialize)]
struct TmtError {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
}

impl Tencent {
    /// Create a client from explicit credentials
    pub fn new(
        client: Client,
        api_host: impl Into<String>,
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        project_id: impl Into<String>,
        chunk_size_chars: usize,
    ) -> Self {
        Self {
            client,
            api_host: api_host.into(),
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            project_id: project_id.into(),
            chunk_size_chars,
        }
    }

    /// Create a client from the `tmt*` settings
    pub fn from_settings(client: Client, settings: &Settings) -> Result<Self, ProviderError> {
        if settings.tmt_secret_id.is_empty() || settings.tmt_secret_key.is_empty() {
            return Err(ProviderError::InvalidConfig(
                "TMT secret id and secret key are required".to_string(),
            ));
        }
        if settings.tmt_chuck_size_cch == 0 {
            return Err(ProviderError::InvalidConfig(
                "TMT chunk size must be positive".to_string(),
            ));
        }
        Ok(Self::new(
            client,
            settings.tmt_api_host.trim_end_matches('/'),
            &settings.tmt_secret_id,
            &settings.tmt_secret_key,
            &settings.tmt_region,
            &settings.tmt_project_id,
            settings.tmt_chuck_size_cch,
        ))
    }

    /// Build and sign the request for one chunk
    pub fn sign_request(
        &self,
        chunk: &[String],
        from_lang: &str,
        to_lang: &str,
        timestamp: i64,
        nonce: u64,
    ) -> Result<SignedRequest, ProviderError> {
        let params = self.request_params(chunk, from_lang, to_lang, timestamp, nonce);
        let sign_string = format!("GET{}/?{}", self.api_host, canonical_query(&params, false));
        let query = canonical_query(&params, true);

        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ProviderError::InvalidConfig(format!("Invalid TMT secret key: {}", e)))?;
        mac.update(sign_string.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let url = format!(
            "https://{}/?{}&Signature={}",
            self.api_host,
            query,
            urlencoding::encode(&signature)
        );

        Ok(SignedRequest {
            sign_string,
            query,
            signature,
            url,
        })
    }

    fn request_params(
        &self,
        chunk: &[String],
        from_lang: &str,
        to_lang: &str,
        timestamp: i64,
        nonce: u64,
    ) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), ACTION.to_string());
        params.insert("Nonce".to_string(), nonce.to_string());
        params.insert("ProjectId".to_string(), self.project_id.clone());
        params.insert("Region".to_string(), self.region.clone());
        params.insert("SecretId".to_string(), self.secret_id.clone());
        params.insert("Source".to_string(), from_lang.to_string());
        params.insert("Target".to_string(), to_lang.to_string());
        params.insert("Timestamp".to_string(), timestamp.to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        for (i, text) in chunk.iter().enumerate() {
            params.insert(format!("SourceTextList.{}", i), text.replace('\n', " "));
        }
        params
    }
}

/// Join parameters in key order, optionally percent-encoding the values
fn canonical_query(params: &BTreeMap<String, String>, encode_values: bool) -> String {
    params
        .iter()
        .map(|(key, value)| {
            if encode_values {
                format!("{}={}", key, urlencoding::encode(value))
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Extract the translated texts from a TextTranslateBatch response body
pub fn parse_response(body: &str) -> Result<Vec<String>, ProviderError> {
    let envelope: TmtEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::ParseError(format!("TMT response: {}", e)))?;

    if let Some(err) = envelope.response.error {
        return Err(ProviderError::VendorError {
            code: err.code,
            message: err.message,
        });
    }

    envelope
        .response
        .target_text_list
        .ok_or_else(|| ProviderError::ParseError("TMT response has no TargetTextList".to_string()))
}

#[async_trait]
impl TranslationVendor for Tencent {
    fn vendor(&self) -> Vendor {
        Vendor::Tencent
    }

    fn chunk(&self, lines: &[CaptionLine]) -> Vec<Vec<String>> {
        chunk_by_chars(lines, self.chunk_size_chars)
    }

    async fn translate_chunk(
        &self,
        chunk: Vec<String>,
        from_lang: &str,
        to_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let timestamp = chrono::Utc::now().timestamp();
        let nonce = rand::random::<u32>() as u64;
        let request = self.sign_request(&chunk, from_lang, to_lang, timestamp, nonce)?;
        debug!("TMT request {}", request.query);

        let response = self
            .client
            .get(&request.url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("TMT: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("TMT: {}", e)))?;
        if !status.is_success() {
            error!("TMT API error ({}): {}", status, body);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        parse_response(&body)
    }
}
