use std::sync::Arc;

use tgdir_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), tgdir_core::Error> {
    tgdir_core::logging::init("tgdir")?;

    let cfg = Arc::new(Config::load()?);

    tgdir_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| tgdir_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
