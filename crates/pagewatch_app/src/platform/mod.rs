mod app;
mod control;
mod effects;
mod persistence;
mod settings;

pub use app::run_app;
