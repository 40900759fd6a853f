#[tokio::main]
async fn main() {
    if let Err(err) = worksync_lib::run().await {
        log::error!("WorkSync failed: {err:#}");
        eprintln!("worksync: {err:#}");
        std::process::exit(1);
    }
}
