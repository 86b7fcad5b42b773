//! Application entry point for live microphone speech-to-text.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse CLI flags, load [`AppConfig`] and overlay the flags.
//! 3. Validate the engine configuration.
//! 4. Spawn the inference worker; the engine is built on its thread.
//! 5. Open the default input device (must support 16 kHz i16 mono).
//! 6. Run [`eframe::run_native`], blocking until the window is closed.
//! 7. Shut the worker down with the configured policy and join it.
//!
//! Any failure in steps 2–5 is fatal: a diagnostic is printed and the process
//! exits non-zero before capture begins.

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use live_stt::{
    app::SpeechApp,
    audio::AudioCapture,
    cli::Cli,
    config::AppConfig,
    engine::WhisperEngine,
    worker::InferenceWorker,
};

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([360.0, 140.0])
        .with_min_inner_size([240.0, 90.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("live-stt starting up");

    // 2. Configuration
    let cli = Cli::parse();
    let mut config = cli.load_config().context("failed to load settings file")?;
    cli.apply_to(&mut config);

    // 3. Validation
    let engine_config = config.engine_config().context("invalid engine configuration")?;
    engine_config
        .validate()
        .context("engine files are not usable")?;
    let worker_options = config.worker_options().context("invalid worker configuration")?;

    // 4. Inference worker
    log::info!("loading model {}", engine_config.model_path.display());
    let (controller, worker) =
        InferenceWorker::spawn(move || WhisperEngine::load(engine_config), worker_options)
            .context("failed to start inference worker")?;

    // 5. Audio capture
    let capture = AudioCapture::new().context("audio capture unavailable")?;
    log::info!("recording from {:?}", capture.device_name());

    // 6. UI
    let options = native_options(&config);
    let ui_config = config.ui.clone();
    let ui_result = eframe::run_native(
        "Live STT",
        options,
        Box::new(move |cc| {
            let app = SpeechApp::new(controller, capture, ui_config);
            app.attach(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    );

    // 7. Shutdown
    let stats = worker.shutdown().context("inference worker did not exit cleanly")?;
    log::info!("worker stats: {stats:?}");

    ui_result.map_err(|e| anyhow::anyhow!("UI error: {e}"))
}
