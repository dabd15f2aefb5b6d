// src/main.rs

use funcdag::{cli, logging, run, session_log_path};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("funcdag error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let session_log = session_log_path(&args);
    logging::init_logging(args.log_level, session_log.as_deref())?;
    run(args).await
}
