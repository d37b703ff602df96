//! Source code pane rendering with syntax highlighting
//!
//! Keywords, type tags and library functions are all upper case in SYN-C, so
//! a word's colour is decided from its spelling alone. Block comments are
//! only recognised when they open and close on the same line. The line of the last
//! step is highlighted and kept at a fixed row while stepping.

use crate::parser::ast::Builtin;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Split one source line into styled spans
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, d)| d);

        if c == '/' && next == Some('/') {
            spans.push(Span::styled(
                &line[start..],
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '/' && next == Some('*') {
            let end = line[start + 2..]
                .find("*/")
                .map_or(line.len(), |at| start + 2 + at + 2);
            spans.push(Span::styled(
                &line[start..end],
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            i = chars.partition_point(|&(at, _)| at < end);
            continue;
        }

        if c == '"' || c == '\'' {
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != c {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            let byte_end = chars.get(end).map_or(line.len(), |&(at, _)| at);
            spans.push(Span::styled(
                &line[start..byte_end],
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if c.is_ascii_alphanumeric() || c == '_' {
            let mut end = i;
            while end < chars.len() && (chars[end].1.is_ascii_alphanumeric() || chars[end].1 == '_') {
                end += 1;
            }
            let byte_end = chars.get(end).map_or(line.len(), |&(at, _)| at);
            let word = &line[start..byte_end];
            spans.push(Span::styled(word, word_style(word)));
            i = end;
            continue;
        }

        let style = match c {
            '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
            '$' | '&' => Style::default().fg(DEFAULT_THEME.address),
            _ => Style::default().fg(DEFAULT_THEME.fg),
        };
        let byte_end = chars.get(i + 1).map_or(line.len(), |&(at, _)| at);
        spans.push(Span::styled(&line[start..byte_end], style));
        i += 1;
    }

    Line::from(spans)
}

fn word_style(word: &str) -> Style {
    match word {
        "GLOBALS" | "ENDGLOBALS" | "STRUCT" | "ENDSTRUCT" | "FUNCTION" | "END" | "IF"
        | "ELIF" | "ELSE" | "ENDIF" | "FOR" | "ENDFOR" | "WHILE" | "ENDWHILE" | "RETURN"
        | "CONTINUE" | "BREAK" | "NOT" | "AND" | "OR" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "INT" | "FLOAT" | "BOOL" | "CHAR" | "STRING" | "POINTER" => {
            Style::default().fg(DEFAULT_THEME.type_tag)
        }
        "TRUE" | "FALSE" | "NULL" => Style::default().fg(DEFAULT_THEME.number),
        _ if Builtin::from_keyword(word).is_some() => Style::default().fg(DEFAULT_THEME.function),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to; `None` until first render
    pub target_line_row: Option<usize>,
}

impl SourceScrollState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            target_line_row: None,
        }
    }
}

impl Default for SourceScrollState {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    current_line: usize,
    is_error: bool,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = super::pane_block(" Source ", is_focused);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    if current_line > 0 && current_line <= total_lines {
        scroll_state.offset = (current_line - 1).saturating_sub(target_row);
        if total_lines > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = line_num == current_line;
            let mut content = highlight_source_code(line);

            let num_style = match (is_current, is_error) {
                (true, true) => Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD),
                (true, false) => Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(DEFAULT_THEME.comment),
            };

            if is_current && is_error {
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content.spans {
                    span.style = error_style;
                }
            } else if is_current {
                for span in &mut content.spans {
                    span.style = span.style.bg(DEFAULT_THEME.current_line_bg);
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        highlight_source_code(line)
            .spans
            .iter()
            .map(|span| span.content.to_string())
            .collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let line = r#"  PRINT(STRING, "a\"b", INT, x_1)"#;
        assert_eq!(texts(line).concat(), line);
    }

    #[test]
    fn test_words_and_literals_are_single_spans() {
        let spans = texts("x = IABS(-12) 'c'");
        assert!(spans.contains(&"IABS".to_string()));
        assert!(spans.contains(&"12".to_string()));
        assert!(spans.contains(&"'c'".to_string()));
    }

    #[test]
    fn test_comments() {
        assert_eq!(texts("x = 1 // note"), vec!["x", " ", "=", " ", "1", " ", "// note"]);
        assert_eq!(texts("/* a */x").concat(), "/* a */x");
        assert_eq!(texts("/* a */x")[0], "/* a */");
    }

    #[test]
    fn test_word_styles() {
        assert_eq!(word_style("WHILE").fg, Some(DEFAULT_THEME.keyword));
        assert_eq!(word_style("FLOAT").fg, Some(DEFAULT_THEME.type_tag));
        assert_eq!(word_style("MALLOC").fg, Some(DEFAULT_THEME.function));
        assert_eq!(word_style("counter").fg, Some(DEFAULT_THEME.fg));
    }
}
