use geosections::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    geosections::init_logging(&config.log_level);

    geosections::serve(config).await
}
