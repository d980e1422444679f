//! End-to-end tests through the reqwest transport against a wiremock server

use serde_json::{json, Map, Value};

use relay_http::{
    ClientConfig, HttpClient, HttpError, RequestDescriptor, StatusCode, TransformHooks,
    TransformOutcome, UploadParams,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope_hooks() -> TransformHooks {
    TransformHooks::new().with_transform_response(|response, _| {
        let envelope: Value = response.json()?;
        Ok(match envelope["code"].as_i64() {
            Some(0) => TransformOutcome::Success(envelope["data"].clone()),
            _ => TransformOutcome::Failure("request error".to_string()),
        })
    })
}

fn client_for(server: &MockServer, hooks: Option<TransformHooks>) -> HttpClient {
    let mut config = ClientConfig::new().with_base_url(server.uri());
    config.hooks = hooks;
    HttpClient::new(config).unwrap()
}

#[tokio::test]
async fn envelope_code_zero_resolves_to_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"id": 1}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some(envelope_hooks()));
    let reply = client
        .request(RequestDescriptor::get("/user/1"), None)
        .await
        .unwrap();

    assert_eq!(reply.into_value(), Some(json!({"id": 1})));
}

#[tokio::test]
async fn envelope_nonzero_code_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 1, "data": null})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Some(envelope_hooks()));
    let err = client
        .request(RequestDescriptor::get("/user/1"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Rejected(_)));
}

#[tokio::test]
async fn no_hooks_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let reply = client
        .request(RequestDescriptor::get("/ping"), None)
        .await
        .unwrap();

    let raw = reply.into_raw().unwrap();
    assert_eq!(raw.status, StatusCode::OK);
    assert_eq!(raw.text(), "pong");
}

#[tokio::test]
async fn query_parameters_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let reply = client
        .request(RequestDescriptor::get("/search").with_query("q", "rust"), None)
        .await
        .unwrap();

    assert_eq!(reply.into_raw().unwrap().text(), "ok");
}

#[tokio::test]
async fn post_form_sends_urlencoded_body_with_bracket_arrays() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("a=1"))
        .and(body_string_contains("b%5B%5D=x"))
        .and(body_string_contains("b%5B%5D=y"))
        .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let params: Map<String, Value> = json!({"a": "1", "b": ["x", "y"]})
        .as_object()
        .unwrap()
        .clone();
    let reply = client.post_form("/save", params, None).await.unwrap();

    assert_eq!(reply.into_raw().unwrap().text(), "saved");
}

#[tokio::test]
async fn default_headers_apply_unless_descriptor_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(header("x-client", "relay"))
        .and(header("accept", "text/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client.set_default_headers(vec![
        ("X-Client".to_string(), "relay".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ]);

    let reply = client
        .request(
            RequestDescriptor::get("/a").with_header("Accept", "text/html"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(reply.into_raw().unwrap().text(), "ok");
}

#[tokio::test]
async fn upload_file_sends_multipart_and_returns_raw() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("name=\"tag\""))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"a.png\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 1, "stored": true})),
        )
        .mount(&server)
        .await;

    // Transform hook present but uploads bypass it.
    let client = client_for(&server, Some(envelope_hooks()));

    let data: Map<String, Value> = json!({"tag": "x"}).as_object().unwrap().clone();
    let response = client
        .upload_file(
            RequestDescriptor::post("/upload"),
            UploadParams {
                data: Some(data),
                field_name: None,
                filename: "a.png".to_string(),
                file: b"png-bytes".to_vec(),
            },
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let body: Value = response.json().unwrap();
    assert_eq!(body["stored"], json!(true));
}

#[tokio::test]
async fn verb_shortcuts_fix_the_method() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("updated"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/user/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);

    let reply = client
        .put(RequestDescriptor::get("/user/1"), None)
        .await
        .unwrap();
    assert_eq!(reply.into_raw().unwrap().text(), "updated");

    let reply = client
        .delete(RequestDescriptor::get("/user/1"), None)
        .await
        .unwrap();
    assert_eq!(reply.into_raw().unwrap().text(), "deleted");
}

#[tokio::test]
async fn non_2xx_surfaces_as_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .request(RequestDescriptor::get("/broken"), None)
        .await
        .unwrap_err();

    match err {
        HttpError::Status { status, message } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message, "boom");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn json_params_dispatch_as_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"name\":\"ada\""))
        .respond_with(ResponseTemplate::new(200).set_body_string("created"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let params: Map<String, Value> = json!({"name": "ada"}).as_object().unwrap().clone();
    let reply = client
        .post(RequestDescriptor::post("/user").with_params(params), None)
        .await
        .unwrap();

    assert_eq!(reply.into_raw().unwrap().text(), "created");
}
