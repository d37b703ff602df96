//! Heap pane: live blocks from the top of memory down, with their words

use crate::memory::value::word_to_int;
use crate::memory::Memory;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Words listed per block before the rest is elided
const WORDS_PER_BLOCK: u32 = 16;

pub(crate) fn heap_items(memory: &Memory) -> Vec<ListItem<'static>> {
    let blocks = memory.heap_blocks();
    if blocks.is_empty() {
        return vec![ListItem::new("(no allocations)").style(Style::default().fg(DEFAULT_THEME.comment))];
    }

    let mut items = Vec::new();
    for block in blocks {
        items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("0x{:06x}", block.address),
                Style::default().fg(DEFAULT_THEME.address),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{} words", block.size),
                Style::default().fg(DEFAULT_THEME.primary),
            ),
        ])));

        for offset in 0..block.size.min(WORDS_PER_BLOCK) {
            let address = i64::from(block.address) + i64::from(offset);
            let text = match memory.read(address, Default::default()) {
                Ok(word) => word_to_int(word).to_string(),
                Err(_) => "?".to_string(),
            };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(
                    format!("  [{offset}] "),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(text, Style::default().fg(DEFAULT_THEME.number)),
            ])));
        }
        if block.size > WORDS_PER_BLOCK {
            items.push(
                ListItem::new(format!("  ... {} more", block.size - WORDS_PER_BLOCK))
                    .style(Style::default().fg(DEFAULT_THEME.comment)),
            );
        }
    }
    items
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    memory: &Memory,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = super::pane_block(" Heap ", is_focused);
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let items = super::visible_window(heap_items(memory), visible_height, scroll_offset);
    frame.render_widget(List::new(items).block(block), area);
}
