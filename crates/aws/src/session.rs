//! AWS session construction
//!
//! Builds an SDK configuration from the CLI's session flags: profile,
//! region, and an optional role to assume via STS.

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Session options shared by every command
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Named AWS profile to load credentials from
    pub profile: Option<String>,
    /// Region override
    pub region: Option<String>,
    /// Role ARN to assume before issuing any request
    pub assume_role: Option<String>,
}

/// Load an SDK configuration honoring the session options.
///
/// When a role is assumed, the base profile/region chain supplies the
/// credentials for the STS call itself.
pub async fn load_sdk_config(session: &SessionConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(profile) = &session.profile {
        tracing::info!(profile = %profile, "using AWS profile");
        loader = loader.profile_name(profile);
    }

    if let Some(region) = &session.region {
        tracing::info!(region = %region, "using AWS region");
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(role_arn) = &session.assume_role {
        let session_name = format!("awsbuddy-{}", jiff::Timestamp::now().as_second());
        tracing::info!(role = %role_arn, session = %session_name, "assuming role");

        let mut builder = aws_config::sts::AssumeRoleProvider::builder(role_arn)
            .session_name(&session_name);
        if let Some(region) = &session.region {
            builder = builder.region(Region::new(region.clone()));
        }

        loader = loader.credentials_provider(builder.build().await);
    }

    loader.load().await
}
