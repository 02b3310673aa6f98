use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use inputlayer::host::gilrs_host::GilrsHost;
use inputlayer::{DispatcherHandle, DispatcherSettings, HostEvent, InputDispatcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[tokio::main]
async fn main() -> Result<()> {
    let log_level_from_env = setup()?;
    let set_log_level = setup_logging_env();

    let settings =
        DispatcherSettings::load().map_err(|e| eyre!("Failed to load settings: {}", e))?;
    if !log_level_from_env {
        set_log_level(&settings.log_level);
    }
    info!("Starting input layer with settings: {:?}", settings);

    let host = GilrsHost::new().map_err(|e| eyre!("Failed to start gamepad host: {}", e))?;

    let (engine_tx, mut engine_rx) = mpsc::channel(settings.queue_capacity);
    let mut dispatcher = InputDispatcher::new(host.devices(), engine_tx);
    dispatcher.apply_settings(&settings);

    let (handle, dispatcher_task) = DispatcherHandle::spawn(dispatcher, &settings);
    handle
        .send(HostEvent::InitDevices)
        .await
        .map_err(|e| eyre!("Failed to initialize devices: {}", e))?;

    let poll_handle = handle.clone();
    let cancel = handle.cancellation_token();
    let poller = tokio::task::spawn_blocking(move || {
        info!("Gamepad polling thread started");
        let mut host = host;
        while !cancel.is_cancelled() {
            for event in host.poll() {
                if let Err(e) = poll_handle.blocking_send(event) {
                    warn!("Stopping gamepad polling: {}", e);
                    return;
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        info!("Gamepad polling thread stopped");
    });

    loop {
        tokio::select! {
            event = engine_rx.recv() => match event {
                Some(event) => info!("Engine event: {:?}", event),
                None => {
                    warn!("Engine channel closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    handle.shutdown();
    let dispatcher = dispatcher_task
        .await
        .map_err(|e| eyre!("Dispatcher task failed: {}", e))?;
    info!(
        "Dispatcher stopped with {} joysticks registered",
        dispatcher.registry().len()
    );
    poller
        .await
        .map_err(|e| eyre!("Polling thread failed: {}", e))?;
    debug!("Shutdown complete");
    Ok(())
}

/// Returns whether `RUST_LOG` was set by the caller.
fn setup() -> Result<bool> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    let log_level_from_env = std::env::var("RUST_LOG").is_ok();
    if !log_level_from_env {
        std::env::set_var("RUST_LOG", "info")
    }
    Ok(log_level_from_env)
}

/// Installs the subscriber and returns a setter for the level once settings are loaded.
fn setup_logging_env() -> impl Fn(&str) {
    let builder = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .with_filter_reloading();
    let filter = builder.reload_handle();
    builder.init();

    move |log_level: &str| match EnvFilter::try_new(log_level) {
        Ok(level) => {
            if let Err(e) = filter.reload(level) {
                warn!("Failed to apply log level {}: {}", log_level, e);
            }
        }
        Err(e) => warn!("Invalid log level {}: {}", log_level, e),
    }
}
