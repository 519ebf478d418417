//! GraphqlRemote against a mock HTTP server

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use taskboard_sync::{
    BoardError, BoardStore, GraphqlRemote, MemoryLayoutStore, NewTask, RemoteConfig, RemoteError,
    RemoteStore, TaskId, TaskInput, TaskPatch,
};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        endpoint: format!("{}/graphql", server.uri()),
        token: Some("secret-token".into()),
        timeout_secs: 5,
        max_retries: 2,
        retry_delay_ms: 1,
    }
}

fn wire_task(id: Value, status: &str) -> Value {
    json!({
        "id": id,
        "title": "Write tests",
        "description": "",
        "status": status,
        "dueDate": "2025-06-01T00:00:00+00:00",
        "user_id": "u1",
        "created_at": "2025-05-01 08:00:00",
        "updated_at": "2025-05-01 08:00:00",
    })
}

fn data(field: &str, payload: Value) -> ResponseTemplate {
    let mut fields = serde_json::Map::new();
    fields.insert(field.to_string(), payload);
    ResponseTemplate::new(200).set_body_json(json!({ "data": fields }))
}

#[tokio::test]
async fn test_list_tasks_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_string_contains("tasks(user_id: $user_id)"))
        .and(body_partial_json(json!({"variables": {"user_id": "u1"}})))
        .respond_with(data("tasks", json!([wire_task(json!(1), "Done")])))
        .expect(1)
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let tasks = remote.list_tasks(&"u1".into()).await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id.as_str(), "1");
    assert_eq!(tasks[0].status.as_str(), "Done");
    assert!(tasks[0].due_date.is_some());
}

#[tokio::test]
async fn test_graphql_errors_are_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createTask": null },
            "errors": [{ "message": "Failed to create task" }]
        })))
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let input = NewTask {
        title: "x".into(),
        description: None,
        status: None,
        due_date: None,
        owner_id: "u1".into(),
    };
    let err = remote.create_task(&input).await.unwrap_err();
    assert!(matches!(err, RemoteError::GraphQl { ref messages } if messages[0] == "Failed to create task"));
}

#[tokio::test]
async fn test_read_retries_transient_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(data("task", wire_task(json!("7"), "Task Ready")))
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let task = remote.get_task(&"7".into()).await.unwrap();
    assert_eq!(task.id.as_str(), "7");
}

#[tokio::test]
async fn test_read_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let err = remote.list_tasks(&"u1".into()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 500, ref body } if body == "boom"));
}

#[tokio::test]
async fn test_mutation_not_retried_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let err = remote
        .update_task(&"1".into(), &TaskPatch::status("Done".into()))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_mutation_retried_after_connect_failure() {
    // Reserve a port and leave it closed so the first attempt is refused
    let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = reserved.local_addr().unwrap();
    drop(reserved);

    let remote = GraphqlRemote::new(&RemoteConfig {
        endpoint: format!("http://{address}/graphql"),
        token: None,
        timeout_secs: 5,
        max_retries: 3,
        retry_delay_ms: 200,
    })
    .unwrap();

    let patch = TaskPatch::status("Done".into());
    let id: TaskId = "1".into();
    let update = remote.update_task(&id, &patch);
    let late_server = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let listener = std::net::TcpListener::bind(address).unwrap();
        listener.set_nonblocking(true).unwrap();
        let server = MockServer::builder().listener(listener).start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("updateTask"))
            .respond_with(data("updateTask", wire_task(json!(1), "Done")))
            .expect(1)
            .mount(&server)
            .await;
        server
    };
    let (result, server) = tokio::join!(update, late_server);

    assert_eq!(result.unwrap().status.as_str(), "Done");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_task_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(data("task", Value::Null))
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let err = remote.get_task(&"404".into()).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_and_update_variables() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"variables": {"id": "3", "status": "Done"}})))
        .respond_with(data("updateTask", wire_task(json!(3), "Done")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("deleteTask"))
        .respond_with(data("deleteTask", json!({"id": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let updated = remote
        .update_task(&"3".into(), &TaskPatch::status("Done".into()))
        .await
        .unwrap();
    assert_eq!(updated.status.as_str(), "Done");

    let deleted = remote.delete_task(&"3".into()).await.unwrap();
    assert_eq!(deleted.as_str(), "3");
}

#[tokio::test]
async fn test_board_store_over_graphql() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("GetTasks"))
        .respond_with(data("tasks", json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("CreateTask"))
        .and(body_partial_json(json!({"variables": {"input": {
            "title": "Write tests",
            "status": "Task Ready",
            "user_id": "u1"
        }}})))
        .respond_with(data("createTask", wire_task(json!(11), "Task Ready")))
        .expect(1)
        .mount(&server)
        .await;

    let remote = GraphqlRemote::new(&config(&server)).unwrap();
    let store = BoardStore::new(Arc::new(remote), Arc::new(MemoryLayoutStore::new()), 5);
    store.initialize("u1".into()).await.unwrap();

    let task = store
        .create_task(TaskInput::new(" Write tests "))
        .await
        .unwrap();
    assert_eq!(task.id.as_str(), "11");
    assert_eq!(store.tasks().await, vec![task]);

    let err = store
        .delete_task(&"99".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotFound { .. }));
}
