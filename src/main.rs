use ink_calc::gui::InkCalcApp;
use ink_calc::logging;
use ink_calc::settings::{resolve_settings_path, AppSettings};
use ink_calc::solve::HttpSolverClient;

use eframe::egui;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings_path = resolve_settings_path()?;
    let mut settings = AppSettings::load(&settings_path)?;
    settings.apply_env_overrides();

    let _log_guard = match settings.log_dir.clone() {
        Some(dir) => Some(logging::init_with_file(settings.debug_logging, &dir)?),
        None => {
            logging::init(settings.debug_logging);
            None
        }
    };
    tracing::info!(
        settings = %settings_path.display(),
        solver = %settings.solver_url,
        "starting ink_calc"
    );

    let client = Arc::new(HttpSolverClient::new(
        &settings.solver_url,
        settings.request_timeout(),
    )?);
    tracing::debug!(endpoint = %client.endpoint(), "solver client ready");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "ink_calc",
        native_options,
        Box::new(move |_cc| Box::new(InkCalcApp::new(settings, client))),
    )
    .map_err(|err| anyhow::anyhow!("run ink_calc window: {err}"))
}
