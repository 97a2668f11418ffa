use serde::Deserialize;
use sketch::http::request::{Method, Request};

fn get(url: &str) -> Request {
    Request::builder().method(Method::GET).url(url).build().unwrap()
}

#[test]
fn test_request_header_retrieval() {
    let req = Request::builder()
        .method(Method::GET)
        .url("/")
        .header("Host", "example.com")
        .header("Content-Type", "application/json")
        .build()
        .unwrap();

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_header_keys_are_lowercased() {
    let req = Request::builder()
        .method(Method::GET)
        .url("/")
        .header("X-Trace-Id", "abc")
        .build()
        .unwrap();

    let keys: Vec<&str> = req.headers().iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["x-trace-id"]);
}

#[test]
fn test_request_content_length_parsing() {
    let req = Request::builder()
        .method(Method::POST)
        .url("/api")
        .header("Content-Length", "42")
        .build()
        .unwrap();

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_invalid() {
    let req = Request::builder()
        .method(Method::POST)
        .url("/api")
        .header("Content-Length", "not-a-number")
        .build()
        .unwrap();

    assert_eq!(req.content_length(), 0);
    assert_eq!(get("/").content_length(), 0);
}

#[test]
fn test_raw_path_and_query() {
    let req = get("/search?q=rust&page=2");

    assert_eq!(req.raw_path(), "/search");
    assert_eq!(req.query(), Some("q=rust&page=2"));
    assert_eq!(req.query_param("page").as_deref(), Some("2"));
    assert_eq!(req.query_param("missing"), None);
}

#[test]
fn test_url_uses_host_header() {
    let req = Request::builder()
        .method(Method::GET)
        .url("/a")
        .header("Host", "example.com:8080")
        .build()
        .unwrap();

    assert_eq!(req.url().as_str(), "http://example.com:8080/a");
}

#[test]
fn test_absolute_url_target() {
    let req = get("http://example.com/x/y?z=1");

    assert_eq!(req.raw_path(), "/x/y");
    assert_eq!(req.url().host_str(), Some("example.com"));
}

#[test]
fn test_double_slash_target_stays_a_path() {
    let req = get("//other/x");

    assert_eq!(req.url().host_str(), Some("localhost"));
    assert_eq!(req.raw_path(), "//other/x");
}

#[test]
fn test_builder_requires_method_and_url() {
    let err = Request::builder().url("/").build().unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);

    let err = Request::builder().method(Method::GET).build().unwrap_err();
    assert_eq!(err.reason(), Some("url missing"));
}

#[test]
fn test_invalid_absolute_url_is_bad_request() {
    let err = Request::builder()
        .method(Method::GET)
        .url("not a url")
        .build()
        .unwrap_err();

    assert_eq!(err.status_code().as_u16(), 400);
}

#[test]
fn test_text_body() {
    let req = Request::builder()
        .method(Method::POST)
        .url("/")
        .body("hello")
        .build()
        .unwrap();

    assert_eq!(req.text().unwrap(), Some("hello"));
    assert_eq!(get("/").text().unwrap(), None);
}

#[test]
fn test_text_rejects_invalid_utf8() {
    let req = Request::builder()
        .method(Method::POST)
        .url("/")
        .body(vec![0xff, 0xfe])
        .build()
        .unwrap();

    assert_eq!(req.text().unwrap_err().status_code().as_u16(), 400);
}

#[test]
fn test_json_body() {
    #[derive(Deserialize)]
    struct User {
        name: String,
    }

    let req = Request::builder()
        .method(Method::POST)
        .url("/users")
        .body(r#"{"name":"alice"}"#)
        .build()
        .unwrap();

    let user: User = req.json().unwrap();
    assert_eq!(user.name, "alice");

    assert!(get("/").json::<User>().is_err());
}

#[test]
fn test_match_info_empty_before_routing() {
    let req = get("/alice");

    assert!(req.match_info().is_empty());
    assert_eq!(req.param("username"), None);
    assert!(req.app().is_none());
}

#[test]
fn test_method_parsing() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("OPTIONS"), Some(Method::OPTIONS));
    assert_eq!(Method::from_str("get"), None);
    assert_eq!(Method::from_str("BREW"), None);
    assert_eq!(Method::DELETE.to_string(), "DELETE");
}
