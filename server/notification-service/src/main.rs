//! Binary entrypoint for the notification service.
//!
//! Bus messages are read from stdin as `topic payload` lines, e.g.
//! `mosquitto_sub -v -t 'ecohub/+/notifications' | notification-service`.

use std::net::SocketAddr;
use std::sync::Arc;

use notification_engine::{Engine, FileStore, PersistenceAdapter};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use notification_service::{bus, router, HttpDispatcher, PersistenceWriter, Service, ServiceConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Use reasonable defaults for printing structured logs to stderr.
  let subscriber = tracing_subscriber::FmtSubscriber::builder()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

  let config = ServiceConfig::from_env()?;
  tracing::info!(
    namespace = %config.engine.namespace,
    capacity = config.engine.capacity,
    storage_dir = %config.storage_dir.display(),
    command_url = %config.command_url,
    authenticated = config.api_token.is_some(),
    "starting notification service"
  );

  let store = FileStore::open(&config.storage_dir)?;
  let persistence = PersistenceAdapter::new(store, config.engine.storage_key.clone());
  let mut engine = Engine::restore(config.engine.clone(), persistence.load());
  tracing::info!(restored = engine.notifications().len(), "notifications restored");
  let (writer, writer_task) = PersistenceWriter::spawn(persistence);
  engine.subscribe(Box::new(writer));

  let dispatcher = HttpDispatcher::new(
    config.command_url.clone(),
    config.api_token.clone(),
    config.dispatch_timeout,
  )?;
  let (handle, service_task) = Service::spawn(engine, Arc::new(dispatcher), 256);

  // Blocking stdin reads live on their own thread so they never hold up runtime shutdown.
  let feed_handle = handle.clone();
  std::thread::Builder::new()
    .name("bus-feed".into())
    .spawn(move || {
      if let Err(e) = bus::feed_lines(std::io::stdin().lock(), feed_handle) {
        tracing::error!(error = %e, "bus feed failed");
      }
      tracing::info!("bus feed closed");
    })?;

  let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
  tracing::info!(%addr, "notification-service listening");

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, router(handle.clone()))
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

  // The feed thread may still hold a handle; stop the loop explicitly.
  handle.shutdown().await?;
  let engine = service_task.await?;
  tracing::info!(remaining = engine.notifications().len(), "service loop stopped");
  // Dropping the engine drops the writer's sender, letting the last snapshot flush.
  drop(engine);
  writer_task.await?;
  Ok(())
}
