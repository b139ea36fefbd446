//! Job files: a saved reconciliation run (inputs, output and options)

use crate::coordinator::{reconcile_files, ProcessingMode};
use crate::error::{Error, Result};
use crate::options::ReconcileOptions;
use crate::writer::{save_table, OutputFormat};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A complete reconciliation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    /// Origin (left) dataset
    pub origin: PathBuf,
    /// Partner (right) dataset
    pub partner: PathBuf,
    /// Where the result is saved
    pub output: PathBuf,
    /// Save as an Excel spreadsheet instead of CSV
    #[serde(default)]
    pub xlsx: bool,
    /// Upper-case every string cell and header in the result
    #[serde(default)]
    pub uppercase: bool,
    /// Engine options
    #[serde(flatten)]
    pub options: ReconcileOptions,
}

/// Summary of a finished job
#[derive(Debug, Clone)]
pub struct JobReport {
    /// File actually written
    pub output: PathBuf,
    /// Rows in the result
    pub rows: usize,
    /// Columns in the result
    pub columns: usize,
    /// Mode the origin was processed in
    pub mode: ProcessingMode,
    /// Origin chunks processed
    pub chunks: usize,
}

impl JobFile {
    /// Create a job with default options
    pub fn new(origin: PathBuf, partner: PathBuf, output: PathBuf, options: ReconcileOptions) -> Self {
        Self {
            origin,
            partner,
            output,
            xlsx: false,
            uppercase: false,
            options,
        }
    }

    /// Load a job file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the job file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Output format selected by this job
    pub fn output_format(&self) -> OutputFormat {
        if self.xlsx {
            OutputFormat::Xlsx
        } else {
            OutputFormat::Csv
        }
    }

    /// Reconcile the inputs and write the result.
    ///
    /// Nothing is written unless reconciliation succeeds as a whole.
    pub fn run(&self) -> Result<JobReport> {
        let reconciliation = reconcile_files(&self.origin, &self.partner, &self.options)?;

        let mut table = reconciliation.table;
        if self.uppercase {
            table = table.to_uppercase();
        }

        info!("Saving file...");
        let output = save_table(&table, &self.output, self.output_format())?;

        Ok(JobReport {
            output,
            rows: table.row_count(),
            columns: table.column_count(),
            mode: reconciliation.mode,
            chunks: reconciliation.chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyRef;

    #[test]
    fn test_job_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");

        let mut options = ReconcileOptions::new("ID", KeyRef::Position(0));
        options.copy_columns = vec!["email".to_string()];
        let job = JobFile::new("a.csv".into(), "b.csv".into(), "out.csv".into(), options);
        job.save(&path).unwrap();

        let loaded = JobFile::load(&path).unwrap();
        assert_eq!(loaded, job);
    }

    #[test]
    fn test_minimal_job_json() {
        let job: JobFile = serde_json::from_str(
            r#"{"origin": "a.csv", "partner": "b.csv", "output": "out",
                "origin_key": "id", "partner_key": "code", "xlsx": true}"#,
        )
        .unwrap();

        assert!(job.xlsx);
        assert!(!job.uppercase);
        assert_eq!(job.output_format(), OutputFormat::Xlsx);
        assert_eq!(job.options.partner_key, KeyRef::Name("code".to_string()));
        assert_eq!(job.options.match_marker, "1");
        assert_eq!(job.options.chunk_row_limit, 100_000);
    }

    #[test]
    fn test_run_writes_uppercased_result() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin.csv");
        let partner = dir.path().join("partner.csv");
        fs::write(&origin, "id,name\n1,ana\n2,bob\n3,cy\n").unwrap();
        fs::write(&partner, "code,city\n2,lima\n3,oslo\n4,rome\n").unwrap();

        let mut options = ReconcileOptions::new("id", "code");
        options.copy_columns = vec!["city".to_string()];
        options.match_marker = "Y".to_string();
        options.mismatch_marker = "N".to_string();
        options.drop_unmatched = true;
        let mut job = JobFile::new(origin, partner, dir.path().join("out.csv"), options);
        job.uppercase = true;

        let report = job.run().unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.mode, ProcessingMode::Whole);
        let content = fs::read_to_string(&report.output).unwrap();
        assert_eq!(content, "ID,NAME,RESULTS,CITY\n2,BOB,Y,LIMA\n3,CY,Y,OSLO\n");
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin.csv");
        let partner = dir.path().join("partner.csv");
        fs::write(&origin, "id\n1\n").unwrap();
        fs::write(&partner, "code\n1\n").unwrap();

        let output = dir.path().join("out.csv");
        let job = JobFile::new(origin, partner, output.clone(), ReconcileOptions::new("id", "nope"));

        let err = job.run().unwrap_err();
        assert!(err.is_configuration());
        assert!(!output.exists());
    }
}
