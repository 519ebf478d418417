//! GraphQL-over-HTTP remote store.
//!
//! Sends every operation as a POST of `{query, variables}` to a single
//! endpoint, attaching a bearer token when one is configured. Transient
//! failures are retried with exponential backoff; see [`Retry`] for which
//! operations qualify.

use super::wire::{self, Envelope};
use super::{NewTask, RemoteError, RemoteStore, TaskPatch};
use crate::config::RemoteConfig;
use crate::types::{OwnerId, Task, TaskId};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

// Exponential backoff constant
const BACKOFF_MULTIPLIER: u32 = 2;

/// Which failures an operation may be repeated after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    /// Reads: any transient failure
    Transient,
    /// Writes: only when the request never reached the server
    ConnectOnly,
}

impl Retry {
    fn allows(self, error: &RemoteError) -> bool {
        match self {
            Self::Transient => error.is_retryable(),
            Self::ConnectOnly => error.is_connect_failure(),
        }
    }
}

/// Remote store backed by a GraphQL endpoint
#[derive(Debug, Clone)]
pub struct GraphqlRemote {
    client: Client,
    endpoint: String,
    token: Option<String>,
    max_retries: u32,
    base_delay: Duration,
}

impl GraphqlRemote {
    /// Build a client from configuration
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One HTTP round trip
    async fn send_once(&self, body: &Value) -> Result<Envelope, RemoteError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| RemoteError::Decode {
            message: format!("response is not a GraphQL envelope: {e}"),
        })
    }

    /// Run a document and return the payload of `field`, retrying per `retry`
    #[instrument(skip(self, query, variables), fields(endpoint = %self.endpoint))]
    async fn execute(
        &self,
        field: &str,
        query: &str,
        variables: Value,
        retry: Retry,
    ) -> Result<Value, RemoteError> {
        let body = json!({ "query": query, "variables": variables });
        let mut attempt = 0;

        loop {
            match self.send_once(&body).await {
                Ok(envelope) => {
                    debug!(attempt, "GraphQL response received");
                    return envelope.into_field(field);
                }
                Err(error) if attempt < self.max_retries && retry.allows(&error) => {
                    let delay = self.base_delay * BACKOFF_MULTIPLIER.pow(attempt);
                    warn!(attempt, ?delay, %error, "transient remote failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl RemoteStore for GraphqlRemote {
    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, RemoteError> {
        let value = self
            .execute(
                "tasks",
                wire::LIST_TASKS,
                json!({ "user_id": owner }),
                Retry::Transient,
            )
            .await?;
        wire::decode_tasks(value)
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, RemoteError> {
        let value = self
            .execute("task", wire::GET_TASK, json!({ "id": id }), Retry::Transient)
            .await
            .map_err(|e| match e {
                RemoteError::MissingData { .. } => RemoteError::NotFound { id: id.to_string() },
                other => other,
            })?;
        wire::decode_task(value)
    }

    async fn create_task(&self, input: &NewTask) -> Result<Task, RemoteError> {
        let value = self
            .execute(
                "createTask",
                wire::CREATE_TASK,
                wire::create_variables(input),
                Retry::ConnectOnly,
            )
            .await?;
        wire::decode_task(value)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError> {
        let value = self
            .execute(
                "updateTask",
                wire::UPDATE_TASK,
                wire::update_variables(id, patch),
                Retry::ConnectOnly,
            )
            .await?;
        wire::decode_task(value)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<TaskId, RemoteError> {
        let value = self
            .execute(
                "deleteTask",
                wire::DELETE_TASK,
                json!({ "id": id }),
                Retry::ConnectOnly,
            )
            .await?;
        wire::decode_deleted(value)
    }
}
