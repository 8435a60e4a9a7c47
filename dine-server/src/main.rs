use dine_server::{print_banner, setup_environment, Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_environment()?;

    print_banner();

    tracing::info!("QuickDine engine starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(&config)?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
