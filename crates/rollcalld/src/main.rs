use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;
mod slot;

use config::Config;
use engine::EngineError;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("rollcalld starting");

    let config = Config::from_env();

    let store = rollcall_store::Store::open(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "attendance database ready");

    let engine = match engine::spawn_engine(&config, store.clone()) {
        Ok(engine) => engine,
        Err(e @ EngineError::Camera(_)) => {
            // No camera, no session: fail fast, but tell the operator
            // what capture devices do exist.
            for dev in rollcall_hw::Camera::list_devices() {
                tracing::error!(path = %dev.path, name = %dev.name, "available capture device");
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let service = dbus_interface::RollcallService::new(engine, store);
    let _conn = zbus::connection::Builder::session()?
        .name("org.rollcall.Rollcall1")?
        .serve_at("/org/rollcall/Rollcall1", service)?
        .build()
        .await?;

    tracing::info!("rollcalld ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("rollcalld shutting down");

    Ok(())
}
