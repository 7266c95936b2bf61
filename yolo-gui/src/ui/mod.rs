//! UI rendering split by panel.

pub mod dialogs;
pub mod menu_bar;
pub mod preview;
pub mod splash;
pub mod status_bar;

pub(crate) use preview::load_texture_from_rgb;
