#[tokio::main]
async fn main() {
    if let Err(err) = fgt_api::cli::run().await {
        eprintln!("fgt-api: {}", err);
        if let Some(hint) = err.hint.as_deref() {
            eprintln!("hint: {}", hint);
        }
        std::process::exit(1);
    }
}
