//! Page controllers
//!
//! Each page keeps the state its screen renders and drives the host through
//! the command wrappers.

pub mod deps;
pub mod settings;
pub mod splash;
pub mod watchalong;
pub mod ytdlp_page;

pub use deps::{DepsInstaller, InstallOutcome};
pub use settings::SettingsPage;
pub use splash::{SplashController, SplashStep};
pub use watchalong::WatchAlongPage;
pub use ytdlp_page::YtdlpPage;
