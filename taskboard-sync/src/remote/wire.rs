//! GraphQL documents and payload decoding

use super::{NewTask, RemoteError, TaskPatch};
use crate::types::{parse_instant, ColumnId, OwnerId, Task, TaskId};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

macro_rules! task_fields {
    () => {
        "id title description status dueDate user_id created_at updated_at"
    };
}

pub(super) const LIST_TASKS: &str = concat!(
    "query GetTasks($user_id: ID!) { tasks(user_id: $user_id) { ",
    task_fields!(),
    " } }"
);

pub(super) const GET_TASK: &str = concat!(
    "query GetTask($id: ID!) { task(id: $id) { ",
    task_fields!(),
    " } }"
);

pub(super) const CREATE_TASK: &str = concat!(
    "mutation CreateTask($input: TaskInput!) { createTask(input: $input) { ",
    task_fields!(),
    " } }"
);

pub(super) const UPDATE_TASK: &str = concat!(
    "mutation UpdateTask($id: ID!, $title: String, $description: String, $status: String, $dueDate: String) ",
    "{ updateTask(id: $id, title: $title, description: $description, status: $status, dueDate: $dueDate) { ",
    task_fields!(),
    " } }"
);

pub(super) const DELETE_TASK: &str = "mutation DeleteTask($id: ID!) { deleteTask(id: $id) { id } }";

/// Envelope of every GraphQL response
#[derive(Debug, Deserialize)]
pub(super) struct Envelope {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub errors: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorMessage {
    pub message: String,
}

impl Envelope {
    /// Take the payload of the named root field
    pub fn into_field(self, field: &str) -> Result<Value, RemoteError> {
        if !self.errors.is_empty() {
            return Err(RemoteError::GraphQl {
                messages: self.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        match self.data.and_then(|mut data| data.remove(field)) {
            Some(Value::Null) | None => Err(RemoteError::MissingData {
                field: field.to_string(),
            }),
            Some(value) => Ok(value),
        }
    }
}

/// GraphQL `ID` values may arrive as strings or numbers
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// A task as the server serializes it
#[derive(Debug, Deserialize)]
pub(super) struct WireTask {
    #[serde(deserialize_with = "id_string")]
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    status: String,
    #[serde(default, rename = "dueDate")]
    due_date: Option<String>,
    #[serde(deserialize_with = "id_string")]
    user_id: String,
    created_at: String,
    updated_at: String,
}

impl WireTask {
    fn into_task(self) -> Result<Task, RemoteError> {
        let instant = |field: &str, text: &str| {
            parse_instant(text).ok_or_else(|| RemoteError::Decode {
                message: format!("task {}: unreadable {field} '{text}'", self.id),
            })
        };

        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(instant("dueDate", text)?),
        };
        let created_at = instant("created_at", &self.created_at)?;
        let updated_at = instant("updated_at", &self.updated_at)?;

        Ok(Task {
            id: TaskId::from_string(self.id),
            title: self.title,
            description: self.description,
            status: ColumnId::from_string(self.status),
            due_date,
            owner_id: OwnerId::from_string(self.user_id),
            created_at,
            updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeletedTask {
    #[serde(deserialize_with = "id_string")]
    id: String,
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode {
        message: e.to_string(),
    })
}

pub(super) fn decode_task(value: Value) -> Result<Task, RemoteError> {
    decode::<WireTask>(value)?.into_task()
}

pub(super) fn decode_tasks(value: Value) -> Result<Vec<Task>, RemoteError> {
    decode::<Vec<WireTask>>(value)?
        .into_iter()
        .map(WireTask::into_task)
        .collect()
}

pub(super) fn decode_deleted(value: Value) -> Result<TaskId, RemoteError> {
    Ok(TaskId::from_string(decode::<DeletedTask>(value)?.id))
}

pub(super) fn create_variables(input: &NewTask) -> Value {
    json!({
        "input": {
            "title": input.title,
            "description": input.description,
            "status": input.status,
            "dueDate": input.due_date.map(|d| d.to_rfc3339()),
            "user_id": input.owner_id,
        }
    })
}

pub(super) fn update_variables(id: &TaskId, patch: &TaskPatch) -> Value {
    let mut vars = Map::new();
    vars.insert("id".into(), json!(id));
    if let Some(title) = &patch.title {
        vars.insert("title".into(), json!(title));
    }
    if let Some(description) = &patch.description {
        vars.insert("description".into(), json!(description));
    }
    if let Some(status) = &patch.status {
        vars.insert("status".into(), json!(status));
    }
    if let Some(due_date) = patch.due_date {
        vars.insert("dueDate".into(), json!(due_date.to_rfc3339()));
    }
    Value::Object(vars)
}
