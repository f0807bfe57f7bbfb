//! Azure DevOps REST adapter for the work item store and hosted git ports.

mod models;

use crate::work_item::{
    domain::{
        AvatarBlob, BranchName, BranchStats, JsonPatch, ProjectScope, QueryId, QueryResult,
        RemoteWorkItem, RepositoryId, URI_COMPONENT, WorkItemId,
    },
    ports::{
        GitRemote, RefUpdate, RefUpdateOutcome, RemoteResult, RemoteServiceError, WorkItemStore,
    },
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use models::{
    AvatarPayload, BranchStatsRow, CreatedWorkItemRow, RefUpdateResultRow, RefUpdateRow, ValueList,
    WorkItemRow,
};
use percent_encoding::utf8_percent_encode;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// REST API version sent with every request.
pub const API_VERSION: &str = "7.1";

/// Request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";
const FALLBACK_IMAGE_TYPE: &str = "image/png";

/// Connection settings for [`AzureDevOpsClient`].
#[derive(Clone)]
pub struct AzureDevOpsConfig {
    /// Personal access token sent with basic authentication.
    pub personal_access_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for AzureDevOpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsConfig")
            .field("personal_access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for work item tracking and git endpoints.
#[derive(Debug, Clone)]
pub struct AzureDevOpsClient {
    client: Client,
}

impl AzureDevOpsClient {
    /// Builds a client that authenticates every request with the token.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Transport`] when the token is not a
    /// valid header value or the HTTP client cannot be built.
    pub fn new(config: &AzureDevOpsConfig) -> Result<Self, RemoteServiceError> {
        let credentials = STANDARD.encode(format!(":{}", config.personal_access_token));
        let mut authorization = header::HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(RemoteServiceError::transport)?;
        authorization.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(RemoteServiceError::transport)?;
        Ok(Self { client })
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request
            .query(&[("api-version", API_VERSION)])
            .send()
            .await
            .map_err(RemoteServiceError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(RemoteServiceError::transport)?;
        tracing::debug!(%status, %url, "remote request failed");
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteServiceError::NotFound(url));
        }
        Err(RemoteServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn request_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(RemoteServiceError::transport)?;
        serde_json::from_str(&body).map_err(|err| RemoteServiceError::Malformed(err.to_string()))
    }
}

fn with_patch_body(request: RequestBuilder, patch: &JsonPatch) -> RemoteResult<RequestBuilder> {
    let body =
        serde_json::to_vec(patch).map_err(|err| RemoteServiceError::Malformed(err.to_string()))?;
    Ok(request
        .header(header::CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
        .body(body))
}

/// `{org}/_apis/{path}`.
fn organization_endpoint(scope: &ProjectScope, path: &str) -> String {
    format!("{}/_apis/{path}", scope.organization_url())
}

/// `{org}/{project}/_apis/{path}`.
fn project_endpoint(scope: &ProjectScope, path: &str) -> String {
    format!(
        "{}/{}/_apis/{path}",
        scope.organization_url(),
        utf8_percent_encode(scope.project_name(), URI_COMPONENT)
    )
}

fn repository_endpoint(scope: &ProjectScope, repository: &RepositoryId, path: &str) -> String {
    project_endpoint(
        scope,
        &format!(
            "git/repositories/{}/{path}",
            utf8_percent_encode(repository.as_str(), URI_COMPONENT)
        ),
    )
}

fn join_ids(ids: &[WorkItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("json"))
}

#[async_trait]
impl WorkItemStore for AzureDevOpsClient {
    async fn run_query(
        &self,
        scope: &ProjectScope,
        query_id: &QueryId,
    ) -> RemoteResult<QueryResult> {
        let url = project_endpoint(
            scope,
            &format!(
                "wit/wiql/{}",
                utf8_percent_encode(query_id.as_str(), URI_COMPONENT)
            ),
        );
        self.request_json(self.client.get(url)).await
    }

    async fn get_work_items(
        &self,
        scope: &ProjectScope,
        ids: &[WorkItemId],
    ) -> RemoteResult<Vec<RemoteWorkItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .client
            .get(organization_endpoint(scope, "wit/workitems"))
            .query(&[("ids", join_ids(ids).as_str()), ("$expand", "all")]);
        let rows: ValueList<WorkItemRow> = self.request_json(request).await?;
        Ok(rows.value.into_iter().map(RemoteWorkItem::from).collect())
    }

    async fn get_avatar(&self, image_url: &str) -> RemoteResult<AvatarBlob> {
        let response = self.send(self.client.get(image_url)).await?;
        if is_json(&response) {
            let body = response
                .text()
                .await
                .map_err(RemoteServiceError::transport)?;
            let payload: AvatarPayload = serde_json::from_str(&body)
                .map_err(|err| RemoteServiceError::Malformed(err.to_string()))?;
            return Ok(AvatarBlob::from_base64(
                payload.image_type,
                payload.image_data,
            ));
        }

        let media_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(FALLBACK_IMAGE_TYPE)
            .to_owned();
        let bytes = response
            .bytes()
            .await
            .map_err(RemoteServiceError::transport)?;
        Ok(AvatarBlob::from_bytes(media_type, &bytes))
    }

    async fn update_work_item(
        &self,
        scope: &ProjectScope,
        id: WorkItemId,
        patch: &JsonPatch,
    ) -> RemoteResult<()> {
        let url = organization_endpoint(scope, &format!("wit/workitems/{id}"));
        let request = with_patch_body(self.client.patch(url), patch)?;
        self.send(request).await?;
        tracing::debug!(item = %id, operations = patch.operations().len(), "work item updated");
        Ok(())
    }

    async fn create_work_item(
        &self,
        scope: &ProjectScope,
        work_item_type: &str,
        patch: &JsonPatch,
    ) -> RemoteResult<WorkItemId> {
        let url = project_endpoint(
            scope,
            &format!(
                "wit/workitems/${}",
                utf8_percent_encode(work_item_type, URI_COMPONENT)
            ),
        );
        let request = with_patch_body(self.client.post(url), patch)?;
        let created: CreatedWorkItemRow = self.request_json(request).await?;
        tracing::info!(item = %created.id, work_item_type, "work item created");
        Ok(created.id)
    }
}

#[async_trait]
impl GitRemote for AzureDevOpsClient {
    async fn get_branch(
        &self,
        scope: &ProjectScope,
        repository: &RepositoryId,
        name: &BranchName,
    ) -> RemoteResult<BranchStats> {
        let request = self
            .client
            .get(repository_endpoint(scope, repository, "stats/branches"))
            .query(&[("name", name.as_str())]);
        let row: BranchStatsRow = self.request_json(request).await?;
        Ok(row.into())
    }

    async fn update_ref(
        &self,
        scope: &ProjectScope,
        repository: &RepositoryId,
        update: &RefUpdate,
    ) -> RemoteResult<RefUpdateOutcome> {
        let request = self
            .client
            .post(repository_endpoint(scope, repository, "refs"))
            .json(&[RefUpdateRow::from(update)]);
        let results: ValueList<RefUpdateResultRow> = self.request_json(request).await?;
        results
            .value
            .into_iter()
            .next()
            .map(RefUpdateOutcome::from)
            .ok_or_else(|| {
                RemoteServiceError::Malformed("ref update returned no results".to_owned())
            })
    }
}
