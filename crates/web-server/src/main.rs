use configuration::{init_tracing, load_config};

// This main function is the entry point when running `cargo run -p web-server`.
// It loads the configuration and hands over to the crate's library.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = load_config()?;
    let _guard = init_tracing(&config.logging)?;
    web_server::serve(&config).await
}
