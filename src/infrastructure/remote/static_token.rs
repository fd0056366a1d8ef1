use crate::application::ports::{AccessToken, TokenProvider};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Token handed over once by the host (CLI flag, environment).
pub struct StaticTokenProvider {
    token: Option<AccessToken>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Result<Self, AppError> {
        let token = token
            .filter(|value| !value.trim().is_empty())
            .map(AccessToken::new)
            .transpose()
            .map_err(AppError::Configuration)?;
        Ok(Self { token })
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<Option<AccessToken>, AppError> {
        Ok(self.token.clone())
    }
}
