use std::sync::Arc;

use donation_settlement::application::pipeline::PipelineLauncher;
use donation_settlement::config::AppConfig;
use donation_settlement::infrastructure::persistence::DbPool;
use donation_settlement::infrastructure::web;
use donation_settlement::utils::logging;

#[tokio::main]
async fn main() {
    logging::init_logger();

    let config = AppConfig::from_env();

    match DbPool::new(&config).await {
        Ok(db_pool) => match PipelineLauncher::new(config.clone(), &db_pool) {
            Ok(launcher) => {
                let launcher = Arc::new(launcher);

                // Serve the trigger API until shutdown is requested
                let server_config = config.clone();
                let server_launcher = launcher.clone();
                tokio::spawn(async move {
                    web::server::start_server(&server_config, server_launcher).await;
                });

                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to listen for Ctrl+C");

                // Active runs stop at their next chunk boundary
                launcher.stop_all().await;
            }
            Err(e) => {
                logging::log_error(&format!("Failed to initialize pipeline: {}", e));
            }
        },
        Err(e) => logging::log_error(&format!("Failed to connect to database: {}", e)),
    }
}
