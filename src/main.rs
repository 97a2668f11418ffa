use sketch::{Application, Config, HandlerResult, Request, Response, run_app};

async fn hello(request: Request) -> HandlerResult {
    let username = request.param("username").unwrap_or_default();
    Ok(Response::ok(format!("Hello, {username}")))
}

fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log.level()?)
        .init();

    let mut app = Application::builder()
        .match_policy(cfg.router.match_policy)
        .build();
    app.get("/{username}", hello)?;

    run_app(app, &cfg)
}
