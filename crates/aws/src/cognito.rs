//! Cognito user pool adapter
//!
//! Implements the IdentityDirectory trait. The subject attribute is pulled
//! out of the raw attribute list here so the core only ever sees typed
//! identity entries.

use async_trait::async_trait;
use aws_config::SdkConfig;

use ab_core::{Error, IdentityDirectory, IdentityPage, IdentityUser, Result};

/// Attribute holding the stable subject identifier.
const SUB_ATTRIBUTE: &str = "sub";

/// Cognito identity provider client wrapper
pub struct CognitoDirectory {
    inner: aws_sdk_cognitoidentityprovider::Client,
}

impl CognitoDirectory {
    /// Create a new Cognito adapter from a loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            inner: aws_sdk_cognitoidentityprovider::Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityDirectory for CognitoDirectory {
    async fn list_users_page(
        &self,
        pool_id: &str,
        pagination_token: Option<String>,
    ) -> Result<IdentityPage> {
        let mut request = self.inner.list_users().user_pool_id(pool_id);

        if let Some(token) = pagination_token {
            request = request.pagination_token(token);
        }

        let response = request.send().await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("ResourceNotFound") {
                Error::NotFound(format!("User pool not found: {pool_id}"))
            } else {
                Error::Network(err_str)
            }
        })?;

        let users = response
            .users()
            .iter()
            .map(|user| IdentityUser {
                username: user.username().unwrap_or_default().to_string(),
                sub: user
                    .attributes()
                    .iter()
                    .find(|attr| attr.name() == SUB_ATTRIBUTE)
                    .and_then(|attr| attr.value())
                    .map(str::to_string),
            })
            .collect();

        Ok(IdentityPage {
            users,
            next_token: response.pagination_token().map(str::to_string),
        })
    }
}
