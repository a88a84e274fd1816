//! Client for the translation service.
//!
//! A [`Client`] owns the host, the API key, and the HTTP transport; it
//! replaces any notion of process-wide session globals so concurrent or
//! test-isolated use stays safe. All operations here are one-shot
//! request calls: errors propagate immediately, nothing is retried.
//! Retry-on-transience exists only in the poll loop (see
//! [`crate::poll`]).

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::error::{ShiftError, ShiftResult};
use crate::model::{DataSource, JobRecord, JobRef, Project};
use crate::report::title_case;
use crate::transport::{HttpTransport, Transport};

/// Target dialect assumed when the caller does not name one.
pub const DEFAULT_TARGET_KIND: &str = "databricks";

/// A connected session against the translation service.
pub struct Client {
    host: String,
    api_key: String,
    identity: Option<BTreeMap<String, String>>,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Create a client with the production HTTP transport.
    pub fn new(host: &str, api_key: &str) -> ShiftResult<Self> {
        Ok(Self::with_transport(
            host,
            api_key,
            Box::new(HttpTransport::new()?),
        ))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(host: &str, api_key: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            identity: None,
            transport,
        }
    }

    /// Attach caller-supplied identity metadata, forwarded when a
    /// translation is started.
    pub fn with_identity(mut self, identity: BTreeMap<String, String>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Exchange an organization token for an API key by provisioning a
    /// fresh workspace. Returns the connected client and the new
    /// organization id.
    pub fn provision(host: &str, org_token: &str) -> ShiftResult<(Self, i64)> {
        Self::provision_with(host, org_token, Box::new(HttpTransport::new()?))
    }

    /// Provisioning over an arbitrary transport.
    pub fn provision_with(
        host: &str,
        org_token: &str,
        transport: Box<dyn Transport>,
    ) -> ShiftResult<(Self, i64)> {
        let url = join_url(host, "org");
        let headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {org_token}"),
        )];
        let body = transport.post(&url, &headers, &json!({}))?;

        let api_key = body
            .get("api_token")
            .and_then(Value::as_str)
            .ok_or_else(|| ShiftError::UnexpectedResponse("missing api_token".into()))?
            .to_string();
        let org_id = body
            .get("org_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ShiftError::UnexpectedResponse("missing org_id".into()))?;

        Ok((Self::with_transport(host, &api_key, transport), org_id))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// List the data sources configured in the workspace.
    pub fn data_sources(&self) -> ShiftResult<Vec<DataSource>> {
        let body = self
            .transport
            .get(&self.url("api/v1/data_sources"), &self.headers())?;
        decode(body, "data source list")
    }

    /// Pick the source and target data sources for a translation.
    ///
    /// The target kind defaults to `databricks`; when no source kind is
    /// named, the first data source of a different kind than the target
    /// is used.
    pub fn select_data_sources(
        &self,
        source_kind: Option<&str>,
        target_kind: Option<&str>,
    ) -> ShiftResult<(DataSource, DataSource)> {
        let target_kind = target_kind.unwrap_or(DEFAULT_TARGET_KIND);
        let sources = self.data_sources()?;

        let source = match source_kind {
            Some(kind) => sources
                .iter()
                .find(|ds| ds.kind == kind)
                .ok_or_else(|| ShiftError::MissingDataSource(kind.to_string()))?,
            None => sources
                .iter()
                .find(|ds| ds.kind != target_kind)
                .ok_or_else(|| ShiftError::MissingDataSource(format!("non-{target_kind}")))?,
        }
        .clone();

        let target = sources
            .iter()
            .find(|ds| ds.kind == target_kind)
            .ok_or_else(|| ShiftError::MissingDataSource(target_kind.to_string()))?
            .clone();

        Ok((source, target))
    }

    /// Create a translation project between two data sources.
    pub fn create_project(
        &self,
        source_ds_id: i64,
        target_ds_id: i64,
        name: &str,
    ) -> ShiftResult<Project> {
        let payload = json!({
            "name": name,
            "from_data_source_id": source_ds_id,
            "to_data_source_id": target_ds_id,
            "version": 2,
            "settings": {
                "error_on_zero_diff": false,
                "transform_group_creation_strategy": "group_individual_operations",
                "experimental": {
                    "import_sql_files_as_script_objects": true,
                    "infer_schema_from_scripts": true,
                    "generate_synthetic_data": true,
                },
            },
        });
        let body = self.transport.post(
            &self.url("api/internal/dma/projects"),
            &self.headers(),
            &payload,
        )?;
        let project = body
            .get("project")
            .cloned()
            .ok_or_else(|| ShiftError::UnexpectedResponse("missing project".into()))?;
        decode(project, "project")
    }

    /// Upload queries to a project as numbered SQL files
    /// (`query_1.sql`, `query_2.sql`, ... in input order).
    pub fn upload_queries(&self, project_id: i64, queries: &[String]) -> ShiftResult<()> {
        let files: Vec<Value> = queries
            .iter()
            .enumerate()
            .map(|(i, query)| {
                json!({
                    "filename": format!("query_{}.sql", i + 1),
                    "content": query,
                })
            })
            .collect();
        self.transport.post(
            &self.url(&format!("api/internal/dma/v2/projects/{project_id}/files")),
            &self.headers(),
            &json!({ "files": files }),
        )?;
        Ok(())
    }

    /// Start the translation job for a project.
    pub fn start_translation(&self, project_id: i64) -> ShiftResult<JobRef> {
        let body = self.transport.post(
            &self.url(&format!(
                "api/internal/dma/v2/projects/{project_id}/translate/jobs"
            )),
            &self.headers(),
            &json!({
                "project_id": project_id,
                "identity": self.identity,
            }),
        )?;
        let task_id = body
            .get("task_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ShiftError::UnexpectedResponse("missing task_id".into()))?;
        Ok(JobRef {
            project_id,
            task_id,
        })
    }

    /// Fetch the current state of a translation job. One status
    /// request, no waiting; the poll loop drives this repeatedly.
    pub fn fetch_job(&self, job: &JobRef) -> ShiftResult<JobRecord> {
        let body = self.transport.get(
            &self.url(&format!(
                "api/internal/dma/v2/projects/{}/translate/jobs/{}",
                job.project_id, job.task_id
            )),
            &self.headers(),
        )?;
        decode(body, "job record")
    }

    /// End-to-end submission: pick data sources, create a project,
    /// upload the queries and start the translation.
    pub fn translate(
        &self,
        queries: &[String],
        source_kind: Option<&str>,
        target_kind: Option<&str>,
    ) -> ShiftResult<JobRef> {
        let (source, target) = self.select_data_sources(source_kind, target_kind)?;
        let name = format!(
            "{} to {} Translation",
            title_case(&source.kind),
            title_case(&target.kind)
        );
        let project = self.create_project(source.id, target.id, &name)?;
        self.upload_queries(project.id, queries)?;
        self.start_translation(project.id)
    }

    fn url(&self, segment: &str) -> String {
        join_url(&self.host, segment)
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![(
            "Authorization".to_string(),
            format!("Key {}", self.api_key),
        )]
    }
}

fn join_url(host: &str, segment: &str) -> String {
    format!("{}/{}", host.trim_end_matches('/'), segment)
}

fn decode<T: serde::de::DeserializeOwned>(body: Value, what: &str) -> ShiftResult<T> {
    serde_json::from_value(body)
        .map_err(|e| ShiftError::UnexpectedResponse(format!("malformed {what}: {e}")))
}
