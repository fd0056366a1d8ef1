use crate::application::ports::{AccessToken, ParkingRemoteApi, ProfileApi, RemoteError};
use crate::domain::entities::parking::{
    EntryReceipt, ExitReceipt, VehicleEntryRequest, VehicleExitRequest,
};
use crate::domain::entities::session::UserProfile;
use crate::domain::value_objects::{IdempotencyKey, ParkingLotId};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// JSON-over-HTTP client for the parking service.
#[derive(Clone)]
pub struct HttpParkingApi {
    client: Client,
    base_url: Url,
}

impl HttpParkingApi {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            AppError::Configuration(format!("Invalid remote base_url '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "Remote base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Validation("remote base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn lot_url(&self, parking_lot_id: &ParkingLotId, resource: &str) -> Result<Url, RemoteError> {
        self.endpoint(&["parking-lots", parking_lot_id.as_str(), resource])
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, RemoteError> {
        let response = request.send().await.map_err(classify_transport_error)?;
        decode_response(response).await
    }
}

#[async_trait]
impl ParkingRemoteApi for HttpParkingApi {
    async fn register_entry(
        &self,
        token: &AccessToken,
        request: &VehicleEntryRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<EntryReceipt, RemoteError> {
        let url = self.lot_url(&request.parking_lot_id, "entries")?;
        self.send(
            self.client
                .post(url)
                .bearer_auth(token.as_str())
                .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.as_str())
                .json(request),
        )
        .await
    }

    async fn register_exit(
        &self,
        token: &AccessToken,
        request: &VehicleExitRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<ExitReceipt, RemoteError> {
        let url = self.lot_url(&request.parking_lot_id, "exits")?;
        self.send(
            self.client
                .post(url)
                .bearer_auth(token.as_str())
                .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.as_str())
                .json(request),
        )
        .await
    }
}

#[async_trait]
impl ProfileApi for HttpParkingApi {
    async fn fetch_profile(&self, token: &AccessToken) -> Result<UserProfile, RemoteError> {
        let url = self.endpoint(&["auth", "me"])?;
        self.send(self.client.get(url).bearer_auth(token.as_str()))
            .await
    }
}

fn classify_transport_error(err: reqwest::Error) -> RemoteError {
    // Never left the device: the request itself is malformed.
    if err.is_builder() {
        return RemoteError::Validation(format!("request could not be built: {err}"));
    }
    if err.is_timeout() {
        return RemoteError::Network(format!("request timed out: {err}"));
    }
    if err.is_connect() {
        return RemoteError::Network(format!("connection failed: {err}"));
    }
    RemoteError::Network(err.to_string())
}

async fn decode_response<R: DeserializeOwned>(response: Response) -> Result<R, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<R>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Auth(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::Unavailable {
            status: status.as_u16(),
            message,
        },
        s if s.is_server_error() => RemoteError::Unavailable {
            status: s.as_u16(),
            message,
        },
        _ => RemoteError::Validation(message),
    }
}

/// Prefers the server's own wording so it can be shown to the attendant verbatim.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error", "detail"] {
            if let Some(Value::String(text)) = map.get(field) {
                if !text.trim().is_empty() {
                    return text.clone();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
