//! Tournament coordinator binary: runs `tc-server` on `BIND_ADDR`
//! (default `0.0.0.0:8787`).

#[tokio::main]
async fn main() {
    tc_core::init_logging(log::LevelFilter::Info);
    if let Err(e) = tc_server::run().await {
        log::error!("server exited: {e}");
        std::process::exit(1);
    }
}
