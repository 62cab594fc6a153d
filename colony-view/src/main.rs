//! Application entry point for the colony growth viewer.
//!
//! Sets up logging and eframe/egui, then delegates all interactive logic
//! and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Colony",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new()))),
    )
}
