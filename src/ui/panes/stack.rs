//! Stack pane: globals, then one section per call frame
//!
//! Variables are untyped words, so each one is shown as a signed integer
//! with its raw hex beside it.

use crate::memory::value::{word_to_int, Address};
use crate::memory::Memory;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

fn variable_line<'a>(memory: &Memory, name: &'a str, address: Address) -> ListItem<'a> {
    let value = match memory.read(i64::from(address), Default::default()) {
        Ok(word) => Span::styled(
            format!("{} (0x{:08x})", word_to_int(word), word),
            Style::default().fg(DEFAULT_THEME.number),
        ),
        Err(_) => Span::styled("?", Style::default().fg(DEFAULT_THEME.error)),
    };
    ListItem::new(Line::from(vec![
        Span::raw("  "),
        Span::styled(name, Style::default().fg(DEFAULT_THEME.fg)),
        Span::styled(
            format!(" @{address} = "),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        value,
    ]))
}

fn header(text: String, style: Style) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(
        text,
        style.add_modifier(Modifier::BOLD),
    )))
}

pub(crate) fn stack_items(memory: &Memory) -> Vec<ListItem<'_>> {
    let stack = memory.stack();
    let mut items = Vec::new();

    if !stack.globals().is_empty() {
        items.push(header(
            "GLOBALS".to_string(),
            Style::default().fg(DEFAULT_THEME.keyword),
        ));
        for name in stack.globals() {
            if let Some(address) = stack.global_address(name) {
                items.push(variable_line(memory, name, address));
            }
        }
    }

    // innermost frame first
    let depth = stack.depth();
    for (i, frame) in stack.frames().iter().rev().enumerate() {
        let style = if i == 0 {
            Style::default().fg(DEFAULT_THEME.function)
        } else {
            Style::default().fg(DEFAULT_THEME.comment)
        };
        items.push(header(
            format!("#{} {}()  base {}", depth - i, frame.function_name, frame.base),
            style,
        ));
        if frame.is_empty() {
            items.push(ListItem::new("  (no locals)").style(Style::default().fg(DEFAULT_THEME.comment)));
        }
        for (slot, name) in frame.locals().iter().enumerate() {
            items.push(variable_line(memory, name, frame.base + slot as Address));
        }
    }

    if items.is_empty() {
        items.push(ListItem::new("(empty stack)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }
    items
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    memory: &Memory,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = super::pane_block(" Stack ", is_focused);
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let items = super::visible_window(stack_items(memory), visible_height, scroll_offset);
    frame.render_widget(List::new(items).block(block), area);
}
