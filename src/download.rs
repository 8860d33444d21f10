use std::path::Path;
use std::sync::Arc;

use futures::future;
use log::{info, warn};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::output::progress::download_bar;
use crate::providers::circleci::{ArtefactRef, CircleCiClient};

pub const DEFAULT_CONCURRENCY: usize = 20;

/// Result of one attempted artefact download.
///
/// A successful outcome has its file on disk under the destination
/// filename; a failed one does not (error bodies are never written).
#[derive(Debug)]
pub struct DownloadOutcome {
    pub artefact: ArtefactRef,
    /// HTTP status, absent when the request failed at transport level
    pub status: Option<u16>,
    pub failure: Option<String>,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Empties the output directory, creating it when absent.
///
/// Existing files and subdirectories are removed, children before
/// parents, leaving an empty directory. Destructive and intentional:
/// every run starts from a clean slate.
///
/// # Errors
///
/// Returns an IO error when the directory cannot be created or a child
/// cannot be removed.
pub fn clear_output_dir(directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        std::fs::create_dir_all(directory)?;
        return Ok(());
    }

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }

    Ok(())
}

/// Downloads all artefacts into `output_dir` with at most `concurrency`
/// requests in flight.
///
/// Admission is a shared semaphore: any queued artefact may be scheduled
/// next as slots free up. Outcomes are collected positionally, one per
/// artefact in input order. A transport failure or non-2xx status on one
/// artefact never aborts the others; non-success outcomes are surfaced to
/// the caller and logged once in aggregate.
pub async fn fetch_all(
    client: &CircleCiClient,
    artefacts: Vec<ArtefactRef>,
    output_dir: &Path,
    concurrency: usize,
) -> Vec<DownloadOutcome> {
    info!(
        "Downloading {} artefacts ({} concurrent)...",
        artefacts.len(),
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let progress = download_bar(artefacts.len() as u64);

    let futures: Vec<_> = artefacts
        .into_iter()
        .map(|artefact| {
            let semaphore = Arc::clone(&semaphore);
            let progress = progress.clone();
            async move {
                // One permit per request; holders release on completion.
                let _permit = semaphore.acquire().await.unwrap();
                let outcome = fetch_one(client, artefact, output_dir).await;
                progress.inc(1);
                outcome
            }
        })
        .collect();

    let outcomes = future::join_all(futures).await;
    progress.finish_and_clear();

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|outcome| !outcome.is_success())
        .map(|outcome| outcome.artefact.filename.as_str())
        .collect();

    if !failed.is_empty() {
        warn!(
            "{} of {} artefacts failed to download: {}",
            failed.len(),
            outcomes.len(),
            failed.join(", ")
        );
    }

    outcomes
}

async fn fetch_one(
    client: &CircleCiClient,
    artefact: ArtefactRef,
    output_dir: &Path,
) -> DownloadOutcome {
    let response = match client
        .auth_request(client.client().get(&artefact.url))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return DownloadOutcome {
                artefact,
                status: None,
                failure: Some(e.to_string()),
            }
        }
    };

    let status = response.status();
    if !status.is_success() {
        // Error bodies are skipped, not written; the status is recorded.
        return DownloadOutcome {
            artefact,
            status: Some(status.as_u16()),
            failure: Some("error response, body not written".to_string()),
        };
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            return DownloadOutcome {
                artefact,
                status: Some(status.as_u16()),
                failure: Some(e.to_string()),
            }
        }
    };

    let destination = output_dir.join(&artefact.filename);
    if let Err(e) = tokio::fs::write(&destination, &body).await {
        // A failed write may leave a truncated file behind; drop it so the
        // directory only ever holds complete artefacts.
        let _ = tokio::fs::remove_file(&destination).await;
        return DownloadOutcome {
            artefact,
            status: Some(status.as_u16()),
            failure: Some(e.to_string()),
        };
    }

    DownloadOutcome {
        artefact,
        status: Some(status.as_u16()),
        failure: None,
    }
}
