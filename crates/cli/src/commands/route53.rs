//! Route 53 commands: export-hosted-zone, import-hosted-zone
//!
//! Zone files are plain JSON arrays of record sets; NS and SOA records are
//! exported but never imported.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use ab_aws::{load_sdk_config, route53, SessionConfig};
use ab_core::Error;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

#[derive(Subcommand, Debug)]
pub enum Route53Commands {
    /// Export all record sets from a hosted zone as JSON
    ExportHostedZone(ExportArgs),

    /// Upsert record sets from a zone file into a hosted zone
    ImportHostedZone(ImportArgs),
}

/// Arguments for the export-hosted-zone command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Hosted zone id
    pub zone_id: String,

    /// Write the zone file here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the import-hosted-zone command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Hosted zone id
    pub zone_id: String,

    /// Zone file to import
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ImportOutput {
    zone_id: String,
    imported: usize,
    skipped: usize,
}

/// Execute a Route 53 subcommand
pub async fn execute(
    cmd: Route53Commands,
    session: &SessionConfig,
    config: OutputConfig,
) -> ExitCode {
    match cmd {
        Route53Commands::ExportHostedZone(args) => export(args, session, config).await,
        Route53Commands::ImportHostedZone(args) => import(args, session, config).await,
    }
}

async fn export(args: ExportArgs, session: &SessionConfig, config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(config.clone());
    let sdk_config = load_sdk_config(session).await;

    let spinner = ProgressBar::spinner(&config, &format!("exporting zone {}", args.zone_id));
    let result = route53::export_record_sets(&sdk_config, &args.zone_id).await;
    spinner.finish_and_clear();

    let records = match result {
        Ok(records) => records,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    match &args.output {
        Some(path) => {
            let json = match serde_json::to_string_pretty(&records) {
                Ok(json) => json,
                Err(e) => {
                    let e = Error::Json(e);
                    formatter.error(&e.to_string());
                    return ExitCode::from_error(&e);
                }
            };
            if let Err(e) = std::fs::write(path, json) {
                let e = Error::Io(e);
                formatter.error(&e.to_string());
                return ExitCode::from_error(&e);
            }
            formatter.success(&format!(
                "Exported {} records to {}",
                records.len(),
                path.display()
            ));
        }
        None => formatter.json(&records),
    }

    ExitCode::Success
}

async fn import(args: ImportArgs, session: &SessionConfig, config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(config.clone());

    let records: Vec<route53::RecordSet> = match read_zone_file(&args.file) {
        Ok(records) => records,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let sdk_config = load_sdk_config(session).await;

    let spinner = ProgressBar::spinner(&config, &format!("importing zone {}", args.zone_id));
    let result = route53::import_record_sets(&sdk_config, &args.zone_id, &records).await;
    spinner.finish_and_clear();

    match result {
        Ok(imported) => {
            let skipped = records.len() - imported;
            if formatter.is_json() {
                formatter.json(&ImportOutput {
                    zone_id: args.zone_id,
                    imported,
                    skipped,
                });
            } else {
                formatter.success(&format!(
                    "Imported {imported} records into '{}' ({skipped} skipped)",
                    args.zone_id
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

fn read_zone_file(path: &PathBuf) -> ab_core::Result<Vec<route53::RecordSet>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_zone_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone.json");
        std::fs::write(
            &path,
            r#"[{"name":"example.com.","type":"A","ttl":300,"values":["192.0.2.1"]}]"#,
        )
        .unwrap();

        let records = read_zone_file(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "example.com.");
        assert_eq!(records[0].record_type, "A");
    }

    #[test]
    fn test_read_zone_file_missing() {
        let err = read_zone_file(&PathBuf::from("/nonexistent/zone.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_read_zone_file_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone.json");
        std::fs::write(&path, "not json").unwrap();

        let err = read_zone_file(&path).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
