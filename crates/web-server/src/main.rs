// This main function is the entry point when running `cargo run -p web-server`.
// Its only job is to load the configuration and call the `run_server`
// function from the crate's library.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = configuration::load_config()?;
    web_server::run_server(&config).await
}
