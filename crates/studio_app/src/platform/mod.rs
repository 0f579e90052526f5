mod app;
mod config;
mod effects;
mod persistence;
mod render;

pub use app::run;
