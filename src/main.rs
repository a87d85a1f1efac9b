use alphaagent::{cli, utils};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    utils::init_tracing();

    if let Err(e) = cli::run().await {
        tracing::error!("{}", e);
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}
