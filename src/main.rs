use clap::Parser;
use sweep_rmq::{logging, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let args = Args::parse();

    sweep_rmq::run(args).await?;
    Ok(())
}
