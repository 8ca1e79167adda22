//! Application entry point — microphone → base64 PCM16 JSON lines.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Open the output (stdout or `transport.output_path`) and spawn the
//!    chunk forwarder on the current-thread tokio runtime.
//! 4. Start the microphone streamer and tick it every `tick_interval_ms`.
//! 5. When the loop ends (Ctrl-C or any failure) stop the streamer; dropping
//!    it closes the chunk channel and the forwarder appends the stop marker.

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

use mic_streamer::{
    audio::{input_device_names, CpalCapture},
    config::AppConfig,
    stream::{MicStreamer, TickOutcome},
    transport::{forward_chunks, JsonLinesTransport},
};

async fn open_output(config: &AppConfig) -> anyhow::Result<Box<dyn AsyncWrite + Unpin + Send>> {
    match &config.transport.output_path {
        Some(path) => {
            log::info!("writing chunks to {}", path.display());
            Ok(Box::new(tokio::fs::File::create(path).await?))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

fn list_devices() -> anyhow::Result<()> {
    for name in input_device_names()? {
        println!("{name}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Logging (stderr, so stdout stays clean for JSON lines)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if std::env::args().skip(1).any(|a| a == "--list-devices") {
        return list_devices();
    }

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    match input_device_names() {
        Ok(names) => log::info!("input devices: {}", names.join(", ")),
        Err(e) => log::warn!("could not enumerate input devices: {e}"),
    }

    // 3. Forwarder
    let writer = open_output(&config).await?;
    let send_stop = config.transport.send_stop_marker;
    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<String>();
    let mut forwarder = tokio::spawn(async move {
        let mut transport = JsonLinesTransport::new(writer);
        forward_chunks(chunk_rx, &mut transport, send_stop).await
    });

    // 4. Streamer
    let device = CpalCapture::new(config.stream.audio_device.as_deref());
    let mut streamer = MicStreamer::new(device, config.stream.clone());
    streamer.on_chunk(move |chunk| {
        // Fails only once the forwarder has exited; the tick loop sees that.
        let _ = chunk_tx.send(chunk);
    });

    let mut ticker = tokio::time::interval(config.stream.tick_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut failure: Option<anyhow::Error> = None;
    let mut forwarded = None;
    match streamer.start() {
        Ok(()) => loop {
            tokio::select! {
                _ = ticker.tick() => match streamer.tick() {
                    Ok(TickOutcome::Ready) => log::info!("Recording started... streaming chunks"),
                    Ok(_) => {}
                    Err(e) => {
                        failure = Some(e.into());
                        break;
                    }
                },
                res = &mut forwarder => {
                    log::error!("chunk forwarder exited early, stopping");
                    forwarded = Some(res);
                    break;
                }
                _ = &mut ctrl_c => {
                    log::info!("interrupt received, stopping");
                    break;
                }
            }
        },
        Err(e) => failure = Some(e.into()),
    }

    // 5. Shutdown
    streamer.stop();
    drop(streamer);

    let forwarded = match forwarded {
        Some(res) => res,
        None => forwarder.await,
    };
    match forwarded? {
        Ok(sent) => log::info!("Recording stopped. Chunks sent: {sent}"),
        Err(e) => {
            failure.get_or_insert(e.into());
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
