use fitplan::{app, auth::JwtKeys, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fitplan=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // `fitplan mint-token <user-id>` prints an access token for local testing.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("mint-token") {
        let user_id: uuid::Uuid = args
            .get(2)
            .ok_or_else(|| anyhow::anyhow!("usage: fitplan mint-token <user-id>"))?
            .parse()?;
        let config = AppConfig::from_env()?;
        println!("{}", JwtKeys::from(&config.jwt).sign_access(user_id)?);
        return Ok(());
    }

    let state = AppState::init().await?;
    app::serve(app::build_app(state)).await
}
