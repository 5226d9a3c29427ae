//! Terminal front-ends for the launcher and the two tools, plus the shared
//! widgets and form state they are built from.

mod admin;
mod forms;
mod helpers;
mod launcher;
mod recommender;
mod screens;
mod terminal;

pub use admin::AdminApp;
pub use launcher::LauncherApp;
pub use recommender::RecommenderApp;
pub use terminal::{run_app, TuiApp};

#[cfg(test)]
pub(crate) use helpers::surface_error;
