//! Non-rendering application logic: settings, detection jobs, capture.

pub mod detection;
pub mod realtime;
pub mod settings;
