use serde::Deserialize;

/// Response from the CircleCI v2 workflow jobs endpoint.
#[derive(Debug, Deserialize)]
pub struct WorkflowJobsResponse {
    pub items: Vec<BuildJob>,
    pub next_page_token: Option<String>,
}

/// A single job within a CircleCI workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildJob {
    /// Project slug (e.g. "gh/org/repo")
    pub project_slug: String,
    /// Job number; absent for jobs that never ran, such as approval gates
    pub job_number: Option<u64>,
    /// Job status (e.g. "success", "failed")
    pub status: String,
    /// Job type (e.g. "build", "approval")
    #[serde(rename = "type")]
    pub job_type: String,
}

impl BuildJob {
    /// Only successful build jobs produce test report artefacts worth
    /// fetching.
    pub fn is_successful_build(&self) -> bool {
        self.job_type == "build" && self.status == "success"
    }
}

/// Wire format of one entry from the v1.1 per-job artifacts endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Artefact {
    pub path: String,
    pub url: String,
    pub node_index: u64,
}

/// A downloadable artefact paired with its destination filename.
///
/// The filename is `{jobNumber}-{nodeIndex}-{basename(path)}`, unique by
/// construction across jobs and across parallel nodes of one job.
#[derive(Debug, Clone)]
pub struct ArtefactRef {
    pub url: String,
    pub filename: String,
}
