//! Human-effort analytics for labelling jobs
//!
//! Two-stage pipeline over two independently paginated sources. Stage A
//! enumerates the job's results prefix, downloads every worker-response
//! record (idempotent skip, so an interrupted analysis resumes where it
//! left off), and folds the answers into per-worker counters. Stage B
//! drains the workforce's identity pool into a subject-to-identity mapping
//! and joins it against the Stage A accumulators. Workers whose identity
//! cannot be resolved fall back to their best available identifier with a
//! warning; they are never dropped and never abort the report.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::enumerate::enumerate;
use crate::error::{Error, Result};
use crate::traits::{IdentityDirectory, LabelingJobs, ObjectStore};
use crate::transfer::{download_batch, TransferOptions, TransferStatus, TransferTask};
use crate::uri::S3Uri;

/// Path segment inside a job's output location that marks the boundary
/// between the results tree and the manifest tree.
const MANIFESTS_SEGMENT: &str = "manifests";

/// Key fragment identifying per-task worker response records.
const WORKER_RESPONSE_MARKER: &str = "worker-response";

/// Worker responses are small JSON documents; a modest bound is plenty.
const RESPONSE_FETCH_CONCURRENCY: usize = 10;

/// The workforce every labelling job in this tool runs against.
const DEFAULT_WORKFORCE: &str = "default";

/// Per-worker accumulator, created on first observation and mutated
/// additively for every answer referencing the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerAggregate {
    /// Number of annotations submitted
    pub annotation_count: u64,
    /// Total time spent across all annotations
    pub time_spent_seconds: u64,
}

/// Final per-identity report plus any non-fatal warnings raised while
/// building it
#[derive(Debug, Serialize)]
pub struct EffortReport {
    /// Resolved identity (or fallback identifier) to effort totals
    pub workers: BTreeMap<String, WorkerAggregate>,
    /// Non-fatal problems: unparsable records, unresolvable identities
    pub warnings: Vec<String>,
}

// Wire shape of a worker-response document.
#[derive(Debug, Deserialize)]
struct WorkerResponse {
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Answer {
    worker_id: String,
    time_spent_in_seconds: f64,
    worker_metadata: WorkerMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkerMetadata {
    identity_data: IdentityData,
}

#[derive(Debug, Deserialize)]
struct IdentityData {
    sub: String,
}

/// Analyse human effort for a labelling job.
///
/// Worker responses are cached under
/// `data_dir/metadata/<job>/human-effort/`; re-running reuses them.
pub async fn analyse_human_effort<S, J, I>(
    store: &S,
    jobs: &J,
    identities: &I,
    job_name: &str,
    data_dir: &Path,
) -> Result<EffortReport>
where
    S: ObjectStore + ?Sized,
    J: LabelingJobs + ?Sized,
    I: IdentityDirectory + ?Sized,
{
    let job = jobs
        .describe_labeling_job(job_name)
        .await
        .map_err(|e| Error::Aggregation(format!("cannot describe job '{job_name}': {e}")))?;

    let output_uri = S3Uri::parse(&job.output_dataset_uri)?;
    let prefix = results_prefix(&output_uri)?;
    tracing::info!(prefix = %prefix, "labelling results prefix");

    let target_dir = data_dir
        .join("metadata")
        .join(job_name)
        .join("human-effort");

    let tasks = collect_response_tasks(store, &output_uri.bucket, &prefix, &target_dir).await?;
    if tasks.is_empty() {
        return Err(Error::Aggregation(format!(
            "no worker responses under s3://{}/{prefix}",
            output_uri.bucket
        )));
    }

    let options = TransferOptions::default()
        .with_skip_existing(true)
        .with_concurrency(RESPONSE_FETCH_CONCURRENCY);
    let outcomes = download_batch(store, tasks, &options).await?;

    let mut warnings = Vec::new();
    let mut aggregates: HashMap<String, WorkerAggregate> = HashMap::new();
    let mut subjects: HashMap<String, String> = HashMap::new();

    for outcome in &outcomes {
        if let TransferStatus::Failed(e) = &outcome.status {
            warnings.push(format!("failed to fetch {}: {e}", outcome.task.key));
            continue;
        }

        if let Err(e) = fold_response_file(&outcome.task.destination, &mut aggregates, &mut subjects)
        {
            warnings.push(format!(
                "skipping unparsable record {}: {e}",
                outcome.task.destination.display()
            ));
        }
    }

    let workforce = jobs
        .describe_workforce(DEFAULT_WORKFORCE)
        .await
        .map_err(|e| Error::Aggregation(format!("cannot describe workforce: {e}")))?;
    tracing::info!(user_pool = %workforce.user_pool_id, "resolving worker identities");

    let mapping = sub_to_identity_mapping(identities, &workforce.user_pool_id)
        .await
        .map_err(|e| {
            Error::Aggregation(format!(
                "identity lookup failed for pool '{}': {e}",
                workforce.user_pool_id
            ))
        })?;

    let mut workers: BTreeMap<String, WorkerAggregate> = BTreeMap::new();
    for (worker_id, aggregate) in aggregates {
        let identity = match subjects.get(&worker_id) {
            Some(sub) => match mapping.get(sub) {
                Some(identity) => identity.clone(),
                None => {
                    warnings.push(format!("no identity found for worker {worker_id}"));
                    sub.clone()
                }
            },
            None => {
                warnings.push(format!("no subject token captured for worker {worker_id}"));
                worker_id.clone()
            }
        };

        // Identities may collapse (same person, several worker ids); merge.
        let slot = workers.entry(identity).or_default();
        slot.annotation_count += aggregate.annotation_count;
        slot.time_spent_seconds += aggregate.time_spent_seconds;
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    Ok(EffortReport { workers, warnings })
}

/// Build a subject-to-identity snapshot by fully draining the identity
/// pool listing. Suitable for small to medium pools; a very large pool
/// deserves an externally maintained mapping instead.
pub async fn sub_to_identity_mapping<I>(
    identities: &I,
    pool_id: &str,
) -> Result<HashMap<String, String>>
where
    I: IdentityDirectory + ?Sized,
{
    let mut mapping = HashMap::new();
    let mut token: Option<String> = None;

    loop {
        let page = identities.list_users_page(pool_id, token).await?;

        for user in page.users {
            match user.sub {
                Some(sub) => {
                    mapping.insert(sub, user.username);
                }
                None => {
                    tracing::warn!(user = %user.username, "user has no subject attribute");
                }
            }
        }

        token = page.next_token;
        if token.is_none() {
            break;
        }
    }

    Ok(mapping)
}

/// Everything before the `manifests` segment of the output dataset key.
fn results_prefix(output_uri: &S3Uri) -> Result<String> {
    let segments: Vec<&str> = output_uri.key.split('/').collect();
    let index = segments
        .iter()
        .position(|s| *s == MANIFESTS_SEGMENT)
        .ok_or_else(|| {
            Error::Aggregation(format!(
                "no '{MANIFESTS_SEGMENT}' segment in output location {output_uri}"
            ))
        })?;

    Ok(segments[..index].join("/"))
}

async fn collect_response_tasks<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    target_dir: &Path,
) -> Result<Vec<TransferTask>>
where
    S: ObjectStore + ?Sized,
{
    let mut entries = enumerate(store, bucket, prefix);
    let mut tasks = Vec::new();

    while let Some(entry) = entries.try_next().await? {
        if !entry.key.contains(WORKER_RESPONSE_MARKER) {
            continue;
        }

        let relative = entry
            .key
            .strip_prefix(prefix)
            .unwrap_or(&entry.key)
            .trim_start_matches('/');

        // Colons appear in timestamped key segments and are invalid in
        // Windows paths.
        let sanitized = relative.replace(':', "_");
        let destination = target_dir.join(sanitized.replace('/', std::path::MAIN_SEPARATOR_STR));

        tasks.push(TransferTask::new(bucket, &entry.key, destination));
    }

    Ok(tasks)
}

fn fold_response_file(
    path: &Path,
    aggregates: &mut HashMap<String, WorkerAggregate>,
    subjects: &mut HashMap<String, String>,
) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let record: WorkerResponse = serde_json::from_str(&raw)?;

    for answer in record.answers {
        let slot = aggregates.entry(answer.worker_id.clone()).or_default();
        slot.annotation_count += 1;
        slot.time_spent_seconds += answer.time_spent_in_seconds.round() as u64;
        subjects.insert(answer.worker_id, answer.worker_metadata.identity_data.sub);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeStore;
    use crate::traits::{
        IdentityPage, IdentityUser, LabelingJob, MockIdentityDirectory, MockLabelingJobs,
        Workforce,
    };

    fn response_json(worker_id: &str, seconds: f64, sub: &str) -> String {
        format!(
            r#"{{"answers":[{{"workerId":"{worker_id}","timeSpentInSeconds":{seconds},"workerMetadata":{{"identityData":{{"sub":"{sub}"}}}}}}]}}"#
        )
    }

    fn mock_jobs(output_uri: &str, pool_id: &str) -> MockLabelingJobs {
        let output_uri = output_uri.to_string();
        let pool_id = pool_id.to_string();

        let mut jobs = MockLabelingJobs::new();
        jobs.expect_describe_labeling_job().returning(move |name| {
            Ok(LabelingJob {
                name: name.to_string(),
                output_dataset_uri: output_uri.clone(),
            })
        });
        jobs.expect_describe_workforce().returning(move |name| {
            Ok(Workforce {
                name: name.to_string(),
                user_pool_id: pool_id.clone(),
            })
        });
        jobs
    }

    fn single_page_directory(users: Vec<(&str, Option<&str>)>) -> MockIdentityDirectory {
        let users: Vec<IdentityUser> = users
            .into_iter()
            .map(|(username, sub)| IdentityUser {
                username: username.to_string(),
                sub: sub.map(str::to_string),
            })
            .collect();

        let mut directory = MockIdentityDirectory::new();
        directory.expect_list_users_page().returning(move |_, _| {
            Ok(IdentityPage {
                users: users.clone(),
                next_token: None,
            })
        });
        directory
    }

    #[test]
    fn test_results_prefix_derivation() {
        let uri = S3Uri::parse("s3://bucket/job-42/manifests/out").unwrap();
        assert_eq!(results_prefix(&uri).unwrap(), "job-42");

        let uri = S3Uri::parse("s3://bucket/teams/a/job-7/manifests/output/out.json").unwrap();
        assert_eq!(results_prefix(&uri).unwrap(), "teams/a/job-7");
    }

    #[test]
    fn test_results_prefix_requires_manifests_segment() {
        let uri = S3Uri::parse("s3://bucket/job-42/output/out").unwrap();
        let err = results_prefix(&uri).unwrap_err();
        assert!(matches!(err, Error::Aggregation(_)));
    }

    #[test]
    fn test_fold_accumulates_per_worker() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("r1.json");
        let second = dir.path().join("r2.json");
        std::fs::write(&first, response_json("w1", 10.0, "sub-1")).unwrap();
        std::fs::write(&second, response_json("w1", 20.0, "sub-1")).unwrap();

        let mut aggregates = HashMap::new();
        let mut subjects = HashMap::new();
        fold_response_file(&first, &mut aggregates, &mut subjects).unwrap();
        fold_response_file(&second, &mut aggregates, &mut subjects).unwrap();

        assert_eq!(
            aggregates["w1"],
            WorkerAggregate {
                annotation_count: 2,
                time_spent_seconds: 30
            }
        );
        assert_eq!(subjects["w1"], "sub-1");
    }

    #[tokio::test]
    async fn test_identity_mapping_drains_all_pages() {
        let pages = vec![
            IdentityPage {
                users: vec![IdentityUser {
                    username: "alice@example.com".into(),
                    sub: Some("sub-1".into()),
                }],
                next_token: Some("next".into()),
            },
            IdentityPage {
                users: vec![
                    IdentityUser {
                        username: "bob@example.com".into(),
                        sub: Some("sub-2".into()),
                    },
                    IdentityUser {
                        username: "no-sub@example.com".into(),
                        sub: None,
                    },
                ],
                next_token: None,
            },
        ];

        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_list_users_page()
            .returning(move |_, token| {
                let index = match token {
                    None => 0,
                    Some(_) => 1,
                };
                Ok(pages[index].clone())
            });

        let mapping = sub_to_identity_mapping(&directory, "pool-1").await.unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["sub-1"], "alice@example.com");
        assert_eq!(mapping["sub-2"], "bob@example.com");
    }

    #[tokio::test]
    async fn test_end_to_end_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new()
            .with_pages(vec![vec![
                ("job-42/annotations/worker-response/r1.json", 1),
                ("job-42/annotations/worker-response/r2.json", 1),
                ("job-42/annotations/consolidated/c1.json", 1),
            ]])
            .with_object(
                "job-42/annotations/worker-response/r1.json",
                response_json("w1", 15.0, "sub-1").into_bytes(),
            )
            .with_object(
                "job-42/annotations/worker-response/r2.json",
                response_json("w1", 15.0, "sub-1").into_bytes(),
            );

        let jobs = mock_jobs("s3://bucket/job-42/manifests/out", "pool-1");
        let directory = single_page_directory(vec![("alice@example.com", Some("sub-1"))]);

        let report = analyse_human_effort(&store, &jobs, &directory, "job-42", dir.path())
            .await
            .unwrap();

        assert!(report.warnings.is_empty());
        assert_eq!(report.workers.len(), 1);
        assert_eq!(
            report.workers["alice@example.com"],
            WorkerAggregate {
                annotation_count: 2,
                time_spent_seconds: 30
            }
        );

        // Responses were cached under the job's metadata directory.
        let cached = dir
            .path()
            .join("metadata/job-42/human-effort/annotations/worker-response/r1.json");
        assert!(cached.exists());
    }

    #[tokio::test]
    async fn test_unmapped_subject_falls_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new()
            .with_pages(vec![vec![(
                "job-42/annotations/worker-response/r1.json",
                1,
            )]])
            .with_object(
                "job-42/annotations/worker-response/r1.json",
                response_json("w1", 10.0, "sub-unknown").into_bytes(),
            );

        let jobs = mock_jobs("s3://bucket/job-42/manifests/out", "pool-1");
        let directory = single_page_directory(vec![("alice@example.com", Some("sub-1"))]);

        let report = analyse_human_effort(&store, &jobs, &directory, "job-42", dir.path())
            .await
            .unwrap();

        // Not dropped: keyed by the subject token, with a warning recorded.
        assert!(report.workers.contains_key("sub-unknown"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("w1"));
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new()
            .with_pages(vec![vec![
                ("job-42/annotations/worker-response/good.json", 1),
                ("job-42/annotations/worker-response/bad.json", 1),
            ]])
            .with_object(
                "job-42/annotations/worker-response/good.json",
                response_json("w1", 10.0, "sub-1").into_bytes(),
            )
            .with_object(
                "job-42/annotations/worker-response/bad.json",
                b"not json at all".to_vec(),
            );

        let jobs = mock_jobs("s3://bucket/job-42/manifests/out", "pool-1");
        let directory = single_page_directory(vec![("alice@example.com", Some("sub-1"))]);

        let report = analyse_human_effort(&store, &jobs, &directory, "job-42", dir.path())
            .await
            .unwrap();

        assert_eq!(report.workers["alice@example.com"].annotation_count, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("bad.json"));
    }

    #[tokio::test]
    async fn test_empty_results_prefix_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new().with_pages(vec![vec![(
            "job-42/annotations/consolidated/c1.json",
            1,
        )]]);

        let jobs = mock_jobs("s3://bucket/job-42/manifests/out", "pool-1");
        let directory = single_page_directory(vec![]);

        let err = analyse_human_effort(&store, &jobs, &directory, "job-42", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Aggregation(_)));
    }

    #[tokio::test]
    async fn test_missing_job_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new();
        let directory = single_page_directory(vec![]);

        let mut jobs = MockLabelingJobs::new();
        jobs.expect_describe_labeling_job()
            .returning(|name| Err(Error::NotFound(name.to_string())));

        let err = analyse_human_effort(&store, &jobs, &directory, "job-nope", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Aggregation(_)));
        assert!(err.to_string().contains("job-nope"));
    }
}
