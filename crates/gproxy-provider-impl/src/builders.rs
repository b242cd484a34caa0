//! Assembles an `UpstreamHttpRequest` for a resolved `Provider`, filling in
//! the auth scheme and path conventions that vary per `ProviderType`
//! (api key header shape, base URL joining).

use bytes::Bytes;
use gproxy_common::GproxyError;
use gproxy_provider_core::{header_set, Headers, Provider, ProviderType};
use wreq::Client;

use crate::auth::{fetch_access_token, parse_service_account};
use crate::request::{HttpMethod, UpstreamHttpRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    ChatCompletions,
    Messages,
    Responses,
}

impl PathKind {
    fn openai_suffix(self) -> &'static str {
        match self {
            PathKind::ChatCompletions => "/v1/chat/completions",
            PathKind::Messages => "/v1/chat/completions",
            PathKind::Responses => "/v1/responses",
        }
    }
}

/// Builds the outbound request for everything except Vertex, which needs an
/// async token exchange and therefore its own async builder below.
pub fn build_request(
    provider: &Provider,
    _mapped_model: &str,
    path_kind: PathKind,
    body: Bytes,
    is_stream: bool,
) -> Result<UpstreamHttpRequest, GproxyError> {
    let mut headers: Headers = Vec::new();
    header_set(&mut headers, "content-type", "application/json");
    for (k, v) in &provider.provider_params.custom_headers {
        header_set(&mut headers, k.clone(), v.clone());
    }

    let path = match provider.provider_type {
        ProviderType::Anthropic => "/v1/messages",
        ProviderType::Openai | ProviderType::Azure | ProviderType::Copilot | ProviderType::Custom => {
            path_kind.openai_suffix()
        }
        ProviderType::GeminiVertex => {
            return Err(GproxyError::internal(
                "vertex providers must go through build_vertex_request",
            ))
        }
    };

    match provider.provider_type {
        ProviderType::Anthropic => {
            header_set(&mut headers, "x-api-key", provider.api_key.clone());
            header_set(&mut headers, "anthropic-version", "2023-06-01");
        }
        _ => {
            header_set(&mut headers, "authorization", format!("Bearer {}", provider.api_key));
        }
    }

    Ok(UpstreamHttpRequest {
        method: HttpMethod::Post,
        url: join_url(&provider.api_base, path),
        headers,
        body: Some(body),
        is_stream,
    })
}

/// Vertex AI: exchange the provider's service-account key for a bearer
/// token, then POST to the publisher-model endpoint for the resolved model.
pub async fn build_vertex_request(
    client: &Client,
    provider: &Provider,
    mapped_model: &str,
    is_stream: bool,
    body: Bytes,
) -> Result<UpstreamHttpRequest, GproxyError> {
    let sa = parse_service_account(&provider.api_key)?;
    let access_token = fetch_access_token(client, &sa).await?;

    let project = provider
        .provider_params
        .gcp_project
        .clone()
        .unwrap_or_else(|| sa.project_id.clone());
    let location = provider
        .provider_params
        .gcp_location
        .clone()
        .unwrap_or_else(|| "us-central1".to_string());
    let publisher = provider
        .provider_params
        .gcp_publisher
        .clone()
        .unwrap_or_else(|| "anthropic".to_string());

    let action = if is_stream { "streamRawPredict" } else { "rawPredict" };
    let path = format!(
        "/v1/projects/{project}/locations/{location}/publishers/{publisher}/models/{mapped_model}:{action}"
    );
    let base = if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{location}-aiplatform.googleapis.com")
    };

    let mut headers: Headers = Vec::new();
    header_set(&mut headers, "content-type", "application/json");
    header_set(&mut headers, "authorization", format!("Bearer {access_token}"));
    for (k, v) in &provider.provider_params.custom_headers {
        header_set(&mut headers, k.clone(), v.clone());
    }

    Ok(UpstreamHttpRequest {
        method: HttpMethod::Post,
        url: join_url(&base, &path),
        headers,
        body: Some(body),
        is_stream,
    })
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
