use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::config::Config;
use crate::download;
use crate::junit::{diff, report};
use crate::output;
use crate::providers::circleci::CircleCiClient;

/// How many of the slowest tests the analyze command shows.
const SLOWEST_TESTS_SHOWN: usize = 30;

#[derive(Parser)]
#[command(name = "ciunit")]
#[command(author, version, about = "JUnit CI Report Tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a ciunit.toml configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download all JUnit artefacts produced by a CircleCI workflow
    Download {
        /// CircleCI workflow id
        workflow_id: String,

        /// Directory the artefacts are written to (cleared first!)
        #[arg(default_value = "output/artefacts")]
        output_directory: PathBuf,

        #[arg(short, long, env = "CIRCLECI_TOKEN")]
        token: Option<String>,

        #[arg(short, long)]
        base_url: Option<String>,

        /// Maximum number of downloads in flight
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Extract unique test fingerprints from a directory of JUnit reports
    Extract {
        input_directory: PathBuf,

        /// File the JSON fingerprint list is written to
        output: PathBuf,
    },

    /// Diff two extracted fingerprint lists
    Diff {
        /// Fingerprint list from the old CI run
        old: PathBuf,

        /// Fingerprint list from the new CI run
        new: PathBuf,
    },

    /// Report duplicated executions and slowest tests in a report directory
    Analyze { directory: PathBuf },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Download {
                workflow_id,
                output_directory,
                token,
                base_url,
                concurrency,
            } => {
                self.execute_download(
                    workflow_id,
                    output_directory,
                    token.as_deref(),
                    base_url.as_deref(),
                    *concurrency,
                )
                .await
            }
            Commands::Extract {
                input_directory,
                output,
            } => Self::execute_extract(input_directory, output),
            Commands::Diff { old, new } => Self::execute_diff(old, new),
            Commands::Analyze { directory } => Self::execute_analyze(directory),
        }
    }

    async fn execute_download(
        &self,
        workflow_id: &str,
        output_directory: &Path,
        token: Option<&str>,
        base_url: Option<&str>,
        concurrency: Option<usize>,
    ) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let token = token
            .map(str::to_string)
            .or(config.circleci.token)
            .context("No CircleCI token provided (use --token, CIRCLECI_TOKEN or ciunit.toml)")?;
        let base_url = base_url.unwrap_or(&config.circleci.base_url);
        let concurrency = concurrency.unwrap_or(config.circleci.concurrency);

        info!("Downloading JUnit artefacts for workflow: {workflow_id}");

        download::clear_output_dir(output_directory)?;

        let client = CircleCiClient::new(base_url, Token::from(token))?;

        let jobs = client.list_successful_build_jobs(workflow_id).await?;
        info!("Found {} successful build jobs", jobs.len());

        let mut artefacts = Vec::new();
        for job in &jobs {
            artefacts.extend(client.list_artefacts_for_job(job).await?);
        }
        info!("Found {} JUnit artefacts", artefacts.len());

        let outcomes = download::fetch_all(&client, artefacts, output_directory, concurrency).await;

        let failed: Vec<_> = outcomes
            .iter()
            .filter(|outcome| !outcome.is_success())
            .collect();

        println!(
            "Downloaded {} artefacts to {}",
            outcomes.len() - failed.len(),
            output_directory.display()
        );

        if !failed.is_empty() {
            println!(
                "{}",
                output::bright_red(format!("{} artefacts failed to download:", failed.len()))
            );
            for outcome in &failed {
                let reason = outcome.failure.as_deref().unwrap_or("unknown failure");
                match outcome.status {
                    Some(status) => {
                        println!("  {} (status {status}: {reason})", outcome.artefact.filename);
                    }
                    None => println!("  {} ({reason})", outcome.artefact.filename),
                }
            }
        }

        Ok(())
    }

    fn execute_extract(input_directory: &Path, output: &Path) -> Result<()> {
        let mut tests = Vec::new();

        for file in scan_directory(input_directory)? {
            let fingerprints = extract_file(&file)?;
            if fingerprints.is_empty() {
                println!("No test case found in {}", file.display());
            }
            tests.extend(fingerprints);
        }

        let duplicates = diff::find_duplicates(&tests);

        tests.sort();
        tests.dedup();

        fs::write(output, serde_json::to_string_pretty(&tests)?)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!(
            "Extracted {} unique tests to {}",
            tests.len(),
            output.display()
        );

        if !duplicates.is_empty() {
            println!(
                "{}",
                output::bright_red(format!(
                    "{} tests are launched several times!",
                    duplicates.len()
                ))
            );
        }

        Ok(())
    }

    fn execute_diff(old: &Path, new: &Path) -> Result<()> {
        let decoded_old = read_fingerprint_list(old)?;
        let decoded_new = read_fingerprint_list(new)?;

        println!("Old ci contains {} tests", decoded_old.len());
        println!("New ci contains {} tests", decoded_new.len());

        let result = diff::diff(&decoded_old, &decoded_new);

        println!("Only in old: {}", result.only_in_old.len());
        println!("Only in new: {}", result.only_in_new.len());

        fs::write(
            "onlyInOld.json",
            serde_json::to_string_pretty(&result.only_in_old)?,
        )?;
        fs::write(
            "onlyInNew.json",
            serde_json::to_string_pretty(&result.only_in_new)?,
        )?;

        Ok(())
    }

    fn execute_analyze(directory: &Path) -> Result<()> {
        let mut tests = Vec::new();
        let mut timings: IndexMap<String, u64> = IndexMap::new();

        for file in scan_directory(directory)? {
            tests.extend(extract_file(&file)?);

            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            // Last-seen value wins when a fingerprint repeats across files.
            timings.extend(report::extract_timings(&content)?);
        }

        let duplicates = diff::find_duplicates(&tests);
        if duplicates.is_empty() {
            println!("{}", output::cyan("No duplicated test executions found"));
        } else {
            println!(
                "{}",
                output::bright_red(format!(
                    "{} tests executed more than once:",
                    duplicates.len()
                ))
            );
            for fingerprint in &duplicates {
                println!("  {fingerprint}");
            }
        }

        let mut ranked: Vec<(String, u64)> = timings.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(SLOWEST_TESTS_SHOWN);

        println!(
            "\n{}",
            output::cyan(format!("{} slowest tests", ranked.len()))
        );
        println!("{}", output::timing_table(&ranked));

        Ok(())
    }
}

/// Files of a report directory in a stable order. Subdirectories are
/// skipped; every regular file is expected to be a JUnit report.
fn scan_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("Failed to read directory {}", directory.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    Ok(files)
}

fn read_fingerprint_list(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to decode fingerprint list {}", path.display()))
}

fn extract_file(file: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let suite =
        report::parse(&content).with_context(|| format!("Failed to parse {}", file.display()))?;

    Ok(report::extract_fingerprints(&suite))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_directory_is_sorted_and_skips_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.xml"), "<testsuite/>").unwrap();
        fs::write(temp_dir.path().join("a.xml"), "<testsuite/>").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();

        let files = scan_directory(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.xml"));
        assert!(files[1].ends_with("b.xml"));
    }

    #[test]
    fn test_extract_file_collects_fingerprints() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.xml");
        fs::write(
            &path,
            r#"<testsuite><testcase classname="A" name="one"/></testsuite>"#,
        )
        .unwrap();

        let fingerprints = extract_file(&path).unwrap();

        assert_eq!(fingerprints, vec!["A:one".to_string()]);
    }

    #[test]
    fn test_extract_file_rejects_malformed_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.xml");
        fs::write(&path, "<<<").unwrap();

        assert!(extract_file(&path).is_err());
    }
}
