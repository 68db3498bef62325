#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let config = autodoc_server::config::Config::from_env()?;
    autodoc_server::web::start_web_server(config).await
}
