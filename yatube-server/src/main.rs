use yatube_server::infrastructure::config::AppConfig;
use yatube_server::infrastructure::logging::init_logging;
use yatube_server::server::start_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    start_server(config).await
}
