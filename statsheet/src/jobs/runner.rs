//! Job execution: fetch → reshape → write, one job at a time.

use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::{discover_jobs, load_job, JobSpec};
use crate::config::Settings;
use crate::error::{JobError, JobResult};
use crate::export::{output_path, write_workbook};
use crate::logs::{log_error, log_info, log_success, watch};
use crate::providers::{fetch_items, HttpFetcher, Provider};
use crate::transform::reshape;

/// Outcome of a batch run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchReport {
    /// (job name, written workbook)
    pub succeeded: Vec<(String, PathBuf)>,
    /// (job name, error message)
    pub failed: Vec<(String, String)>,
    /// (job name, warning) for non-fatal problems such as a dropped pivot view
    pub warnings: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Reshape fetched items and write the job's workbook.
pub fn export_items(
    job: &JobSpec,
    items: Vec<Value>,
    output_root: &Path,
    date: NaiveDate,
) -> JobResult<PathBuf> {
    let bundle = reshape(items, job.pivot.as_ref())?;
    let path = output_path(
        output_root,
        job.output_subdir.as_deref(),
        job.output_prefix.as_deref(),
        date,
    );
    write_workbook(&bundle, &path)?;
    Ok(path)
}

/// Run one job file end to end.
pub async fn run_job_file(
    path: &Path,
    settings: &Settings,
    fetcher: &HttpFetcher,
) -> JobResult<PathBuf> {
    let job = load_job(path)?;
    let provider = Provider::parse(job.provider.as_deref())
        .ok_or_else(|| JobError::UnknownProvider(job.provider.clone().unwrap_or_default()))?;

    log_info(format!(
        "▶ {} (provider={})",
        job.display_name(path),
        provider.as_str()
    ));

    let items = fetch_items(&job, provider, settings, fetcher).await?;
    let out = export_items(&job, items, &settings.output_root, Local::now().date_naive())?;
    log_success(format!("Saved {}", out.display()));
    Ok(out)
}

/// Run every job in `settings.jobs_dir`. A failed job never stops the batch.
pub async fn run_all(settings: &Settings) -> JobResult<BatchReport> {
    let jobs = discover_jobs(&settings.jobs_dir)?;
    log_info(format!(
        "{} job(s) in {}",
        jobs.len(),
        settings.jobs_dir.display()
    ));

    let fetcher = HttpFetcher::from_settings(settings)?;
    let mut report = BatchReport::default();

    for path in jobs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut job_log = watch();
        let result = run_job_file(&path, settings, &fetcher).await;
        report.warnings.extend(
            job_log
                .drain_warnings()
                .into_iter()
                .map(|w| (name.clone(), w)),
        );

        match result {
            Ok(out) => report.succeeded.push((name, out)),
            Err(e) => {
                log_error(format!("{} -> {}", name, e));
                report.failed.push((name, e.to_string()));
            }
        }
    }

    log_info(format!(
        "Done: {} succeeded, {} failed, {} warning(s)",
        report.succeeded.len(),
        report.failed.len(),
        report.warnings.len()
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, ReshapeError};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    fn items() -> Vec<Value> {
        vec![
            json!({"C1_NM": "Seoul", "PRD_DE": "202412", "DT": "9"}),
            json!({"C1_NM": "Seoul", "PRD_DE": "202501", "DT": "10"}),
        ]
    }

    #[test]
    fn test_export_items_writes_workbook() {
        let dir = tempdir().unwrap();
        let job = JobSpec {
            output_prefix: Some("population".into()),
            output_subdir: Some("kosis".into()),
            ..Default::default()
        };

        let path = export_items(&job, items(), dir.path(), date()).unwrap();
        assert_eq!(path, dir.path().join("kosis").join("population_20250131.xlsx"));
        assert!(path.exists());
    }

    #[test]
    fn test_export_items_missing_pivot_column_still_writes() {
        let dir = tempdir().unwrap();
        let job = JobSpec {
            pivot: Some(json!({"index": ["REGION"], "columns": ["PRD_DE"]})),
            ..Default::default()
        };

        let path = export_items(&job, items(), dir.path(), date()).unwrap();
        assert_eq!(path, dir.path().join("export_20250131.xlsx"));
        assert!(path.exists());
    }

    #[test]
    fn test_export_items_empty() {
        let dir = tempdir().unwrap();
        let result = export_items(&JobSpec::default(), Vec::new(), dir.path(), date());
        assert!(matches!(
            result,
            Err(JobError::Reshape(ReshapeError::EmptyInput))
        ));
    }

    #[tokio::test]
    async fn test_run_all_empty_dir() {
        let dir = tempdir().unwrap();
        let settings = Settings::default().with_jobs_dir(dir.path().join("missing"));
        let report = run_all(&settings).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_run_all_collects_failures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("01_unknown.json"), r#"{"provider": "ecos"}"#).unwrap();
        fs::write(
            dir.path().join("02_kosis.json"),
            r#"{"orgId": "101", "tblId": "DT_1"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("03_broken.json"), "{").unwrap();

        let settings = Settings::default()
            .with_jobs_dir(dir.path())
            .with_output_root(dir.path().join("out"));
        let report = run_all(&settings).await.unwrap();

        assert!(report.succeeded.is_empty());
        let names: Vec<_> = report.failed.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["01_unknown.json", "02_kosis.json", "03_broken.json"]);
        assert!(report.failed[0].1.contains("ecos"));
        assert!(report.failed[1].1.contains("KOSIS_API_KEY"));
    }

    #[test]
    fn test_export_items_quoted_sheet_name() {
        let dir = tempdir().unwrap();
        let job = JobSpec {
            pivot: Some(json!({
                "index": ["C1_NM"],
                "columns": ["PRD_DE"],
                "sheet_name": "'Monthly'"
            })),
            ..Default::default()
        };

        let path = export_items(&job, items(), dir.path(), date()).unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_run_all_records_job_warnings() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("refused.json"),
            r#"{"provider": "data_go_kr", "base_url": "http://127.0.0.1:9/refused"}"#,
        )
        .unwrap();

        let mut settings = Settings::default()
            .with_jobs_dir(dir.path())
            .with_output_root(dir.path().join("out"));
        settings.timeout_secs = 5;
        settings.max_retries = 2;

        let report = run_all(&settings).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report
            .warnings
            .iter()
            .any(|(name, w)| name == "refused.json" && w.starts_with("Attempt 1/2 failed")));
    }

    #[tokio::test]
    async fn test_run_job_missing_key_is_fetch_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{"provider": "kosis", "orgId": "101", "tblId": "DT_1"}"#).unwrap();

        let settings = Settings::default();
        let fetcher = HttpFetcher::from_settings(&settings).unwrap();
        let result = run_job_file(&path, &settings, &fetcher).await;
        assert!(matches!(
            result,
            Err(JobError::Fetch(FetchError::MissingCredential(_)))
        ));
    }
}
