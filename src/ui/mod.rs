//! Terminal step viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus
//! - **[`panes`]**: stateless render functions for each visible pane
//! - **[`theme`]**: colour palette shared by all panes
//!
//! Construct an [`App`] around an [`Execution`] and call [`App::run`].
//! Execution only moves forward; the panes show the live state after the
//! last step.
//!
//! [`Execution`]: crate::interpreter::Execution
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
