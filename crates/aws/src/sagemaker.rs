//! SageMaker adapter
//!
//! Implements the LabelingJobs trait: job and workforce lookups reduced to
//! the typed descriptors the effort pipeline consumes.

use async_trait::async_trait;
use aws_config::SdkConfig;

use ab_core::{Error, LabelingJob, LabelingJobs, Result, Workforce};

/// SageMaker client wrapper
pub struct SageMakerJobs {
    inner: aws_sdk_sagemaker::Client,
}

impl SageMakerJobs {
    /// Create a new SageMaker adapter from a loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            inner: aws_sdk_sagemaker::Client::new(config),
        }
    }
}

fn map_describe_error(err_str: String, what: &str) -> Error {
    if err_str.contains("ResourceNotFound") {
        Error::NotFound(what.to_string())
    } else {
        Error::Network(err_str)
    }
}

#[async_trait]
impl LabelingJobs for SageMakerJobs {
    async fn describe_labeling_job(&self, name: &str) -> Result<LabelingJob> {
        let response = self
            .inner
            .describe_labeling_job()
            .labeling_job_name(name)
            .send()
            .await
            .map_err(|e| map_describe_error(e.to_string(), name))?;

        let output_dataset_uri = response
            .labeling_job_output()
            .and_then(|o| o.output_dataset_s3_uri())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::General(format!("labeling job '{name}' has no output dataset yet"))
            })?;

        Ok(LabelingJob {
            name: name.to_string(),
            output_dataset_uri,
        })
    }

    async fn describe_workforce(&self, name: &str) -> Result<Workforce> {
        let response = self
            .inner
            .describe_workforce()
            .workforce_name(name)
            .send()
            .await
            .map_err(|e| map_describe_error(e.to_string(), name))?;

        let user_pool_id = response
            .workforce()
            .and_then(|w| w.cognito_config())
            .and_then(|c| c.user_pool())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::General(format!("workforce '{name}' has no Cognito configuration"))
            })?;

        Ok(Workforce {
            name: name.to_string(),
            user_pool_id,
        })
    }
}
