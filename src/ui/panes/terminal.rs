//! Terminal pane: program output, standard error in red

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{List, ListItem, Padding, Paragraph},
    Frame,
};

/// Render the terminal output pane
pub fn render_terminal_pane(
    frame: &mut Frame,
    area: Rect,
    stdout: &str,
    stderr: &str,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = super::pane_block(" Output ", is_focused);

    if stdout.is_empty() && stderr.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let out = stdout
        .lines()
        .map(|line| ListItem::new(line).style(Style::default().fg(DEFAULT_THEME.fg)));
    let err = stderr
        .lines()
        .map(|line| ListItem::new(line).style(Style::default().fg(DEFAULT_THEME.error)));
    let items: Vec<ListItem> = out.chain(err).collect();

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let items = super::visible_window(items, visible_height, scroll_offset);
    let list = List::new(items).block(block.padding(Padding::new(1, 0, 0, 0)));
    frame.render_widget(list, area);
}
