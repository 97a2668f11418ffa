use sketch::http::request::{Method, Request};
use sketch::http::response::Response;
use sketch::web::{Handler, HandlerResult, MatchPolicy, Router};

async fn ok(_request: Request) -> HandlerResult {
    Ok(Response::ok("ok"))
}

fn request(method: Method, path: &str) -> Request {
    Request::builder().method(method).url(path).build().unwrap()
}

fn reason(router: &Router, method: Method, path: &str) -> String {
    match router.resolve(&request(method, path)) {
        Ok(_) => panic!("{method} {path} should not resolve"),
        Err(exc) => {
            assert_eq!(exc.status_code().as_u16(), 404);
            exc.reason().unwrap().to_string()
        }
    }
}

#[test]
fn test_exact_path_resolves_with_empty_params() {
    let mut router = Router::new();
    router.add_get("/status", ok).unwrap();

    let (params, _) = router.resolve(&request(Method::GET, "/status")).unwrap();

    assert!(params.is_empty());
}

#[test]
fn test_placeholder_captures_segment() {
    let mut router = Router::new();
    router.add_get("/{username}", ok).unwrap();

    let (params, _) = router.resolve(&request(Method::GET, "/alice")).unwrap();

    assert_eq!(params.get("username"), Some("alice"));
    assert_eq!(params.len(), 1);
}

#[test]
fn test_pattern_requires_full_path_match() {
    let mut router = Router::new();
    router.add_get("/{username}", ok).unwrap();

    assert_eq!(reason(&router, Method::GET, "/alice/extra"), "Could not find /alice/extra");
}

#[test]
fn test_multiple_placeholders_and_literals() {
    let mut router = Router::new();
    router.add_get("/users/{id}/posts/{post_id}.json", ok).unwrap();

    let (params, _) = router
        .resolve(&request(Method::GET, "/users/42/posts/7.json"))
        .unwrap();

    assert_eq!(params.get("id"), Some("42"));
    assert_eq!(params.get("post_id"), Some("7"));

    // `.` is literal, not a wildcard
    reason(&router, Method::GET, "/users/42/posts/7xjson");
}

#[test]
fn test_placeholder_does_not_cross_slashes() {
    let mut router = Router::new();
    router.add_get("/files/{name}", ok).unwrap();

    reason(&router, Method::GET, "/files/a/b");
    reason(&router, Method::GET, "/files/");
}

#[test]
fn test_method_mismatch_is_not_found() {
    let mut router = Router::new();
    router.add_get("/{username}", ok).unwrap();

    assert_eq!(reason(&router, Method::POST, "/alice"), "POST not allowed for /alice");
}

#[test]
fn test_empty_router_is_not_found() {
    let router = Router::new();

    assert_eq!(reason(&router, Method::GET, "/"), "Could not find /");
}

#[test]
fn test_first_registered_route_decides() {
    let mut router = Router::new();
    router.add_get("/foo", ok).unwrap();
    router.add_get("/{x}", ok).unwrap();

    // `/{x}` would match, but resolution stops at `/foo`.
    assert_eq!(reason(&router, Method::GET, "/bar"), "Could not find /bar");
    assert!(router.resolve(&request(Method::GET, "/foo")).is_ok());
}

#[test]
fn test_first_entry_method_mismatch_hides_later_routes() {
    let mut router = Router::new();
    router.add_get("/items", ok).unwrap();
    router.add_post("/items", ok).unwrap();

    assert_eq!(reason(&router, Method::POST, "/items"), "POST not allowed for /items");
}

#[test]
fn test_scan_policy_falls_through() {
    let mut router = Router::with_policy(MatchPolicy::Scan);
    router.add_get("/foo", ok).unwrap();
    router.add_get("/{x}", ok).unwrap();
    router.add_post("/items", ok).unwrap();

    let (params, _) = router.resolve(&request(Method::GET, "/bar")).unwrap();
    assert_eq!(params.get("x"), Some("bar"));

    assert!(router.resolve(&request(Method::POST, "/items")).is_ok());
    assert_eq!(reason(&router, Method::PUT, "/foo"), "PUT not allowed for /foo");
    assert_eq!(reason(&router, Method::GET, "/a/b"), "Could not find /a/b");
}

#[test]
fn test_scan_policy_keeps_registration_order() {
    let mut router = Router::with_policy(MatchPolicy::Scan);
    router.add_get("/{first}", ok).unwrap();
    router.add_get("/{second}", ok).unwrap();

    let (params, _) = router.resolve(&request(Method::GET, "/x")).unwrap();

    assert_eq!(params.get("first"), Some("x"));
}

#[test]
fn test_duplicate_registration_replaces_in_place() {
    let mut router = Router::new();
    router.add_get("/a", ok).unwrap();
    router.add_get("/b", ok).unwrap();
    router.add_get("/a", ok).unwrap();
    router.add_post("/a", ok).unwrap();

    let routes: Vec<(Method, &str)> = router.routes().map(|r| (r.method(), r.path())).collect();
    assert_eq!(
        routes,
        vec![(Method::GET, "/a"), (Method::GET, "/b"), (Method::POST, "/a")]
    );
}

#[test]
fn test_convenience_methods_register_verbs() {
    let mut router = Router::new();
    router.add_get("/", ok).unwrap();
    router.add_post("/", ok).unwrap();
    router.add_put("/", ok).unwrap();
    router.add_head("/", ok).unwrap();
    router.add_options("/", ok).unwrap();

    let methods: Vec<Method> = router.routes().map(|r| r.method()).collect();
    assert_eq!(
        methods,
        vec![Method::GET, Method::POST, Method::PUT, Method::HEAD, Method::OPTIONS]
    );
}

#[test]
fn test_duplicate_placeholder_name_is_rejected() {
    let mut router = Router::new();

    assert!(router.add_get("/{id}/{id}", ok).is_err());
    assert!(router.is_empty());
}

#[tokio::test]
async fn test_resolved_handler_is_callable() {
    let mut router = Router::new();
    router.add_get("/hello", ok).unwrap();

    let (_, handler) = router.resolve(&request(Method::GET, "/hello")).unwrap();
    let response = handler.call(request(Method::GET, "/hello")).await.unwrap();

    assert_eq!(response.body().unwrap().as_ref(), b"ok");
}
