use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::chunking::chunk_by_lines;
use super::{TranslationVendor, Vendor};
use crate::app_config::Settings;
use crate::captions::CaptionLine;
use crate::errors::ProviderError;

/// DeepL client for the v2 `translate` endpoint
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// Full endpoint URL
    endpoint: String,
    /// API key for authentication
    api_key: String,
    /// Lines per request
    chunk_size_lines: usize,
}

impl std::fmt::Debug for DeepL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepL")
            .field("endpoint", &self.endpoint)
            .field("chunk_size_lines", &self.chunk_size_lines)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DeepLErrorBody {
    message: String,
}

impl DeepL {
    /// Create a new DeepL client
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        chunk_size_lines: usize,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            chunk_size_lines,
        }
    }

    /// Create a client from the `dmt*` settings
    pub fn from_settings(client: Client, settings: &Settings) -> Result<Self, ProviderError> {
        if settings.dmt_api_key.is_empty() {
            return Err(ProviderError::InvalidConfig("DeepL API key is required".to_string()));
        }
        if settings.dmt_chunk_size_lines == 0 {
            return Err(ProviderError::InvalidConfig(
                "DeepL chunk size must be positive".to_string(),
            ));
        }
        Ok(Self::new(
            client,
            &settings.dmt_api_endpoint,
            &settings.dmt_api_key,
            settings.dmt_chunk_size_lines,
        ))
    }

    /// Form fields for one chunk; `text` repeats once per line
    pub fn form_params(&self, chunk: &[String], from_lang: &str, to_lang: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("auth_key", self.api_key.clone()),
            ("source_lang", from_lang.to_string()),
            ("target_lang", to_lang.to_string()),
        ];
        params.extend(chunk.iter().map(|text| ("text", text.clone())));
        params
    }
}

/// Extract the translated texts from a DeepL response body
pub fn parse_response(body: &str) -> Result<Vec<String>, ProviderError> {
    let response: DeepLResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::ParseError(format!("DeepL response: {}", e)))?;
    Ok(response.translations.into_iter().map(|t| t.text).collect())
}

#[async_trait]
impl TranslationVendor for DeepL {
    fn vendor(&self) -> Vendor {
        Vendor::DeepL
    }

    fn chunk(&self, lines: &[CaptionLine]) -> Vec<Vec<String>> {
        chunk_by_lines(lines, self.chunk_size_lines)
    }

    async fn translate_chunk(
        &self,
        chunk: Vec<String>,
        from_lang: &str,
        to_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let params = self.form_params(&chunk, from_lang, to_lang);

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(Duration::from_secs(30))
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("DeepL: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("DeepL: {}", e)))?;
        if !status.is_success() {
            error!("DeepL API error ({}): {}", status, body);
            let message = serde_json::from_str::<DeepLErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        parse_response(&body)
    }
}
