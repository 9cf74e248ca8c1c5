//! Path templates and request handlers: placing data into wire requests and
//! reading it back.

use command_tree::{Command, HttpMethod, PathTemplate, RequestHandler, WireRequest};
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn single_param_both_ways() {
    let template = PathTemplate::parse("/orphans/{ace}").unwrap();

    let (path, leftover) = template.to_path(&json!({ "ace": "1" })).unwrap();
    assert_eq!(path, "/orphans/1");
    assert_eq!(leftover, json!({}));

    let data = template.match_path("/orphans/1", Map::new()).unwrap();
    assert_eq!(Value::Object(data), json!({ "ace": "1" }));
}

#[test]
fn get_without_params_sends_no_query_and_no_body() {
    let find = Command::new("find");
    assert_eq!(find.method(), HttpMethod::Get);

    let request = find.to_request(&json!({ "query": {} })).unwrap();
    assert_eq!(request.url, "/");
    assert_eq!(request.query(), "");
    assert_eq!(request.body, None);
}

#[test]
fn put_moves_params_to_the_path_and_the_rest_to_the_body() {
    let update = Command::new("update").set_path("/todos/{id}").unwrap();
    assert_eq!(update.method(), HttpMethod::Put);

    let request = update
        .to_request(&json!({ "id": "abc", "completed": true }))
        .unwrap();
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.url, "/todos/abc");
    assert_eq!(request.body, Some(json!({ "completed": true })));
}

#[test]
fn round_trip_for_every_method() {
    let cases = [
        (HttpMethod::Get, "/users/{user}/posts", json!({ "user": "u1", "page": "2", "tags": ["a", "b"] })),
        (HttpMethod::Post, "/users/{user}/posts", json!({ "user": "u1", "title": "hello", "draft": true })),
        (HttpMethod::Put, "/posts/{post}/comments/{comment}", json!({ "post": "p1", "comment": "c9", "text": "ok" })),
        (HttpMethod::Delete, "/posts/{post}", json!({ "post": "p 1/2" })),
        (HttpMethod::Patch, "/", json!({ "nested": { "deep": [1, { "x": null }] } })),
    ];

    for (method, template, data) in cases {
        let handler = RequestHandler::new(method, PathTemplate::parse(template).unwrap());
        let request = handler.to_request(&data).unwrap();
        let back = handler
            .match_request(&request)
            .unwrap_or_else(|| panic!("{method} {template} did not match {}", request.url));
        assert_eq!(back, data, "{method} {template}");
    }
}

#[test]
fn params_are_percent_encoded() {
    let template = PathTemplate::parse("/files/{name}").unwrap();
    let (path, _) = template.to_path(&json!({ "name": "a b/c?d" })).unwrap();
    assert!(!path["/files/".len()..].contains('/'));
    assert!(!path.contains(' '));

    let back = template.match_path(&path, Map::new()).unwrap();
    assert_eq!(back["name"], "a b/c?d");
}

#[test]
fn numeric_params_come_back_as_strings() {
    let template = PathTemplate::parse("/todos/{id}").unwrap();
    let (path, _) = template.to_path(&json!({ "id": 0 })).unwrap();
    assert_eq!(path, "/todos/0");
    let back = template.match_path(&path, Map::new()).unwrap();
    assert_eq!(back["id"], "0");
}

#[test]
fn foreign_urls_do_not_match() {
    let template = PathTemplate::parse("/todos/{id}/items").unwrap();
    for url in ["/orders/1/items", "/todos/1/things", "/todosx", "/todos/1/items/extra"] {
        assert!(
            template.match_path(url, Map::new()).is_none(),
            "{url} should not match"
        );
    }
}

#[test]
fn short_urls_underflow_to_empty_params() {
    let template = PathTemplate::parse("/todos/{id}/items/{item}").unwrap();
    let data = template.match_path("/todos", Map::new()).unwrap();
    assert_eq!(Value::Object(data), json!({ "id": "", "item": "" }));

    let data = template.match_path("/todos/t1/items", Map::new()).unwrap();
    assert_eq!(Value::Object(data), json!({ "id": "t1", "item": "" }));
}

#[test]
fn path_values_win_over_body_values() {
    let handler = RequestHandler::new(HttpMethod::Put, PathTemplate::parse("/todos/{id}").unwrap());
    let request = WireRequest::new(HttpMethod::Put, "/todos/t1").with_body(json!({ "id": "t2", "done": true }));
    let data = handler.match_request(&request).unwrap();
    assert_eq!(data, json!({ "id": "t1", "done": true }));
}

#[test]
fn method_mismatch_is_no_match() {
    let handler = RequestHandler::new(HttpMethod::Delete, PathTemplate::parse("/todos/{id}").unwrap());
    assert!(handler
        .match_request(&WireRequest::new(HttpMethod::Get, "/todos/t1"))
        .is_none());
}

#[test]
fn scalar_data_on_get_is_unhandled() {
    let handler = RequestHandler::new(HttpMethod::Get, PathTemplate::root());
    assert!(handler.to_request(&json!("plain")).is_err());

    let post = RequestHandler::new(HttpMethod::Post, PathTemplate::root());
    let request = post.to_request(&json!("plain")).unwrap();
    assert_eq!(request.body, Some(json!("plain")));
}

#[test]
fn adjacent_params_are_rejected() {
    assert!(PathTemplate::parse("/{a}{b}").is_err());
    assert!(PathTemplate::from_parts(
        vec!["/".into(), "".into(), "".into()],
        vec!["a".into(), "b".into()]
    )
    .is_err());
}

#[test]
fn prefixing_keeps_params() {
    let template = PathTemplate::parse("/{id}").unwrap().prefixed("/todos");
    assert_eq!(template.to_string(), "/todos/{id}");
    assert_eq!(
        template.match_path("/todos/t1", object(json!({ "seed": 1 }))),
        Some(object(json!({ "seed": 1, "id": "t1" })))
    );
}
