use canteen_server::{CanteenManager, Config};
use canteen_server::utils::logger::init_logger_with_file;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    // Environment first: .env, then logging with the configured level
    dotenv::dotenv().ok();
    let config = Config::from_env();

    let log_dir = format!("{}/logs", config.work_dir);
    std::fs::create_dir_all(&log_dir).ok();
    init_logger_with_file(Some(&config.log_level), Some(&log_dir));

    tracing::info!("Canteen server starting...");
    tracing::info!(
        work_dir = %config.work_dir,
        timezone = %config.timezone,
        ttl_minutes = config.flash_sale_ttl_minutes,
        "Configuration loaded"
    );

    std::fs::create_dir_all(&config.work_dir)?;
    let db_path = Path::new(&config.work_dir).join("canteen.redb");
    let manager = CanteenManager::new(db_path, config.clone())?;

    tracing::info!(epoch = %manager.epoch(), "Order core ready");

    // The transport layer (HTTP API, websocket fan-out) attaches here.
    // Until one is wired in, keep the process alive so operators can
    // inspect the database through side tooling.
    let mut rx = manager.subscribe();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        loop {
            match rx.recv().await {
                Ok(note) => {
                    tracing::debug!(order_id = %note.order().id, "Notification emitted")
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification receiver lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    Ok(())
}
