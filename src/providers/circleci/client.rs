use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{CiUnitError, Result};

use super::types::{Artefact, ArtefactRef, BuildJob, WorkflowJobsResponse};

/// CircleCI API client for listing workflow jobs and their artefacts.
///
/// Issues plain authenticated GETs; there is no retry and no pagination
/// support (a multi-page workflow is an error, not something to silently
/// truncate).
pub struct CircleCiClient {
    client: Client,
    base_url: Url,
    token: Token,
}

impl CircleCiClient {
    /// Creates a client for the given CircleCI instance.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the HTTP client cannot be built or the
    /// base URL is invalid.
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent("ciunit/0.3.0")
            .build()
            .map_err(|e| CiUnitError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| CiUnitError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Helper to get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Helper to build authenticated requests
    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Circle-Token", self.token.as_str())
    }

    /// Lists the successful build jobs of a workflow.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPagination` when the response carries a
    /// next-page token, `Transport` on network failure, `Api` on a
    /// non-success status and `Decode` on malformed JSON.
    pub async fn list_successful_build_jobs(&self, workflow_id: &str) -> Result<Vec<BuildJob>> {
        let url = self.endpoint(&format!("api/v2/workflow/{workflow_id}/job"))?;
        let response: WorkflowJobsResponse = self.get_json(url).await?;

        if response.next_page_token.is_some() {
            return Err(CiUnitError::UnsupportedPagination);
        }

        Ok(response
            .items
            .into_iter()
            .filter(BuildJob::is_successful_build)
            .collect())
    }

    /// Lists the JUnit XML artefacts of one job, with destination
    /// filenames computed as `{jobNumber}-{nodeIndex}-{basename}`.
    ///
    /// # Errors
    ///
    /// Returns `Decode` when the job carries no job number, plus the same
    /// transport/API/decode errors as any request.
    pub async fn list_artefacts_for_job(&self, job: &BuildJob) -> Result<Vec<ArtefactRef>> {
        let job_number = job.job_number.ok_or_else(|| {
            CiUnitError::Decode(format!("job in {} has no job number", job.project_slug))
        })?;

        let url = self.endpoint(&format!(
            "api/v1.1/project/{}/{job_number}/artifacts",
            job.project_slug
        ))?;
        let artefacts: Vec<Artefact> = self.get_json(url).await?;

        Ok(artefacts
            .into_iter()
            .filter(|artefact| artefact.path.ends_with(".xml"))
            .map(|artefact| ArtefactRef {
                filename: format!(
                    "{job_number}-{}-{}",
                    artefact.node_index,
                    basename(&artefact.path)
                ),
                url: artefact.url,
            })
            .collect())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CiUnitError::Config(format!("Invalid endpoint URL: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.auth_request(self.client.get(url.clone())).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CiUnitError::Api(format!("GET {url} returned {status}")));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CiUnitError::Decode(e.to_string()))
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
