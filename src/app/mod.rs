mod client;
mod debounce;
mod error;
mod navigation;
mod runtime;
mod tui;
mod types;
mod ui_utils;
mod widget;

pub use runtime::run;
