use clipdock_core::Config;

// mimalloc replaces the system allocator; the musl default fragments badly
// under sustained multipart uploads.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // All wiring (telemetry, database, storage, routes) happens in setup.
    let router = clipdock_api::setup::initialize_app(config.clone()).await?;

    clipdock_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
