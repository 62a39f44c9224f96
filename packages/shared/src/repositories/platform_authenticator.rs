use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::auth::requests::FACEBOOK_PLATFORM;
use crate::repositories::errors::platform_auth_errors::PlatformAuthError;

#[cfg(test)]
use mockall::automock;

/// Verifies third-party platform credentials presented at login.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlatformAuthenticator: Send + Sync {
    async fn authenticate(
        &self,
        platform: &str,
        account_id: &str,
        access_token: &str,
    ) -> Result<(), PlatformAuthError>;
}

pub struct FacebookAuthenticator {
    client: reqwest::Client,
    graph_url: String,
}

impl FacebookAuthenticator {
    pub fn new(client: reqwest::Client, graph_url: &str) -> Self {
        FacebookAuthenticator {
            client,
            graph_url: graph_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PlatformAuthenticator for FacebookAuthenticator {
    async fn authenticate(
        &self,
        platform: &str,
        account_id: &str,
        access_token: &str,
    ) -> Result<(), PlatformAuthError> {
        if platform != FACEBOOK_PLATFORM {
            return Err(PlatformAuthError::UnsupportedPlatform(platform.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/me", self.graph_url))
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| PlatformAuthError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Facebook rejected access token: account_id={}, status={}",
                account_id, status
            );
            return Err(PlatformAuthError::Rejected(status.as_u16()));
        }

        info!("Facebook authentication succeeded: account_id={}", account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_platform_is_rejected_without_request() {
        let authenticator = FacebookAuthenticator::new(reqwest::Client::new(), "http://127.0.0.1:9");

        let result = authenticator.authenticate("steam", "a", "token").await;

        assert_eq!(
            result,
            Err(PlatformAuthError::UnsupportedPlatform("steam".to_string()))
        );
    }
}
