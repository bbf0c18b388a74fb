//! ab-aws: AWS SDK adapters for the awsbuddy CLI
//!
//! This crate implements the ab-core capability traits against the real AWS
//! SDKs and hosts the thin single-call admin wrappers (bucket purge,
//! DynamoDB table truncation, Route 53 zone export/import). It is the only
//! crate that depends on the AWS SDKs.

pub mod cognito;
pub mod dynamo;
pub mod route53;
pub mod s3;
pub mod sagemaker;
pub mod session;

pub use cognito::CognitoDirectory;
pub use s3::S3Store;
pub use sagemaker::SageMakerJobs;
pub use session::{load_sdk_config, SessionConfig};
