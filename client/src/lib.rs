mod app;
mod canvas;
mod dom;
mod keymap;

pub use app::run;
