//! Local execution, remote dispatch through a loopback client, sessions and
//! resources.

use std::sync::Arc;

use command_tree::connection::{Client, Loopback, RemoteCall};
use command_tree::{
    hook_fn, App, Command, CommandError, HttpMethod, Service, Session, TypedSchema, USER_ID,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::support::{self, TodoStore};

#[tokio::test]
async fn local_crud() {
    let app = support::server_app();
    app.start().await.unwrap();

    let created = app
        .execute("todosCreate", json!({ "title": "milk" }))
        .await
        .unwrap();
    assert_eq!(created, json!({ "id": "t1", "title": "milk", "completed": false }));

    let updated = app
        .execute("todosUpdate", json!({ "id": "t1", "completed": true }))
        .await
        .unwrap();
    assert_eq!(updated["completed"], true);

    let all = app.execute("todosGet", json!({})).await.unwrap();
    assert_eq!(all, json!([{ "id": "t1", "title": "milk", "completed": true }]));

    app.execute("todosDelete", json!({ "id": "t1" })).await.unwrap();
    let err = app
        .execute("todosDelete", json!({ "id": "t1" }))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn schema_rejects_before_the_handler() {
    let app = support::server_app();
    let err = app.execute("todosCreate", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.data, Some(json!({ "missing": ["title"] })));

    let store = app.resources().get::<TodoStore>().unwrap();
    assert_eq!(store.list(), json!([]));
}

#[tokio::test]
async fn missing_resource_is_a_server_error() {
    let app = App::new(support::tree()).unwrap();
    let err = app.execute("todosGet", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn session_reaches_hooks() {
    let app = support::server_app();

    let err = app.execute("accountWhoami", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 401);

    let session = Session::new().with(USER_ID, "u1").with("x-role", "admin");
    let me = app
        .execute_with_session("accountWhoami", json!({}), session)
        .await
        .unwrap();
    assert_eq!(me, json!({ "user_id": "u1", "role": "admin" }));
}

#[tokio::test]
async fn hooks_run_in_order_after_the_schema() {
    #[derive(Deserialize, Serialize)]
    struct Input {
        n: i64,
    }

    let add = |by: i64| {
        hook_fn(move |_, mut data: Value| {
            data["n"] = json!(data["n"].as_i64().unwrap_or(0) + by);
            Ok(data)
        })
    };
    let double = hook_fn(|_, mut data: Value| {
        data["n"] = json!(data["n"].as_i64().unwrap_or(0) * 2);
        Ok(data)
    });

    let command = Command::new("compute")
        .set_schema(TypedSchema::<Input>::new())
        .use_hook(add(1))
        .use_hook(double)
        .use_pre_hook(add(10));

    // (3 + 10 + 1) * 2
    assert_eq!(command.execute(json!({ "n": 3 })).await.unwrap(), json!({ "n": 28 }));

    let err = command.execute(json!({ "n": "three" })).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn hooks_can_stop_the_pipeline() {
    let guarded = Command::new("deleteEverything")
        .use_hook(hook_fn(|ctx, data| {
            if ctx.role() != Some("admin") {
                return Err(CommandError::forbidden("admins only"));
            }
            Ok(data)
        }))
        .handle_fn(|_, _| Ok(json!({ "deleted": true })));
    assert_eq!(guarded.method(), HttpMethod::Delete);

    let app = App::new(Service::new().use_command(guarded)).unwrap();
    let err = app.execute("deleteEverything", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    let admin = Session::new().with("x-role", "admin");
    let ok = app
        .execute_with_session("deleteEverything", json!({}), admin)
        .await
        .unwrap();
    assert_eq!(ok, json!({ "deleted": true }));
}

#[tokio::test]
async fn local_execution_is_the_pipeline_itself() {
    let command = Command::new("echo").handle_fn(|_, data| Ok(data));
    let app = App::new(Service::new().use_command(command.clone())).unwrap();

    // Values that would not survive a query string or a path segment
    let input = json!({ "n": 1, "flag": false, "nested": { "list": [1, null] } });
    assert_eq!(app.execute("echo", input.clone()).await.unwrap(), input);
    assert_eq!(command.execute(input.clone()).await.unwrap(), input);
}

fn remote_app(server: App) -> App {
    App::new(support::tree())
        .unwrap()
        .with_client(Loopback::new(Arc::new(server)))
}

#[tokio::test]
async fn remote_calls_go_through_the_server() {
    let client = remote_app(support::server_app());
    assert!(client.executor().is_remote());

    let created = client
        .execute("todosCreate", json!({ "title": "bread" }))
        .await
        .unwrap();
    assert_eq!(created["id"], "t1");

    let updated = client
        .execute("todosUpdate", json!({ "id": "t1", "completed": true }))
        .await
        .unwrap();
    assert_eq!(updated, json!({ "id": "t1", "title": "bread", "completed": true }));

    let all = client.execute("todosGet", json!({})).await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn remote_errors_keep_their_status() {
    let client = remote_app(support::server_app());

    let err = client.execute("todosCreate", json!({})).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.name, "BadRequest");

    let err = client
        .execute("todosUpdate", json!({ "id": "nope" }))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn remote_calls_carry_the_session() {
    let client = remote_app(support::server_app());
    let me = client
        .execute_with_session(
            "accountWhoami",
            json!({}),
            Session::new().with(USER_ID, "u7"),
        )
        .await
        .unwrap();
    assert_eq!(me["user_id"], "u7");
}

/// Records what it was asked to send.
#[derive(Default)]
struct Recorder {
    calls: std::sync::Mutex<Vec<(String, String, Option<Value>)>>,
}

#[async_trait::async_trait]
impl Client for Recorder {
    async fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, CommandError> {
        self.calls.lock().unwrap().push((
            call.name.to_string(),
            format!("{} {}", call.request.method, call.request.url),
            call.request.body.clone(),
        ));
        Ok(json!({ "forwarded": call.name }))
    }
}

#[tokio::test]
async fn remote_handlers_never_run_locally() {
    let recorder = Arc::new(Recorder::default());
    let exploding = Service::new().use_command(
        Command::new("update")
            .set_path("/{id}")
            .unwrap()
            .handle_fn(|_, _| Err(CommandError::general("ran locally"))),
    );
    let app = App::new(Service::new().use_service("/todos", exploding))
        .unwrap()
        .with_shared_client(recorder.clone());

    let out = app
        .execute("todosUpdate", json!({ "id": "a b", "completed": true }))
        .await
        .unwrap();
    assert_eq!(out, json!({ "forwarded": "todosUpdate" }));

    let calls = recorder.calls.lock().unwrap();
    assert_eq!(
        calls[0],
        (
            "todosUpdate".to_string(),
            "PUT /todos/a%20b".to_string(),
            Some(json!({ "completed": true }))
        )
    );
}
