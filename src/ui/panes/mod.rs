//! TUI pane rendering modules
//!
//! - [`source`]: program text with the location of the last step
//! - [`stack`]: globals and call frames, one word per variable
//! - [`heap`]: live heap blocks and their contents
//! - [`terminal`]: everything the program printed so far
//! - [`status`]: step counters, run state and keybindings
//!
//! Every pane is a stateless render function; scroll offsets live in the
//! [`crate::ui::App`].

pub mod heap;
pub mod source;
pub mod stack;
pub mod status;
pub mod terminal;

pub use heap::render_heap_pane;
pub use source::{render_source_pane, SourceScrollState};
pub use stack::render_stack_pane;
pub use status::{render_status_bar, StatusRenderData};
pub use terminal::render_terminal_pane;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    widgets::{Block, Borders, ListItem},
};

/// Bordered block, highlighted when the pane has focus
fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Keep `offset` within the list and return the visible window
fn visible_window<'a>(
    items: Vec<ListItem<'a>>,
    visible_height: usize,
    offset: &mut usize,
) -> Vec<ListItem<'a>> {
    if items.len() > visible_height {
        *offset = (*offset).min(items.len() - visible_height);
    } else {
        *offset = 0;
    }
    items.into_iter().skip(*offset).take(visible_height).collect()
}
