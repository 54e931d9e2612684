use super::styles::DESK_THEME;
use colored::Colorize;
use officedesk::board::{Board, UNASSIGNED};
use officedesk::entities::EntityKind;
use officedesk::model::{IdKey, Record};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_CELL_WIDTH: usize = 28;
const COLUMN_GAP: &str = "  ";
const EMPTY_CELL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub fn print_message(level: MessageLevel, content: &str) {
    match level {
        MessageLevel::Info => println!("{}", content.dimmed()),
        MessageLevel::Success => println!("{}", content.green()),
        MessageLevel::Warning => println!("{}", content.yellow()),
        MessageLevel::Error => eprintln!("{}", content.red()),
    }
}

pub fn print_records(kind: EntityKind, records: &[Record]) {
    if records.is_empty() {
        print_message(MessageLevel::Info, &format!("No {} found.", kind));
        return;
    }
    print!("{}", render_table(kind.columns(), records));
}

pub fn print_board(kind: EntityKind, board: &Board) {
    print!("{}", render_board(&kind.id_key(), kind.title_field(), board));
}

/// Fixed-width table; cells wider than the cap are cut with an ellipsis.
pub fn render_table(columns: &[&str], records: &[Record]) -> String {
    let cells: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|field| {
                    let text = record.text(field).unwrap_or_else(|| EMPTY_CELL.to_string());
                    truncate_to_width(&single_line(&text), MAX_CELL_WIDTH)
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(name.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, width)| pad(&DESK_THEME.header.apply_to(name).to_string(), name.width(), *width))
        .collect();
    out.push_str(header.join(COLUMN_GAP).trim_end());
    out.push('\n');

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                let styled = if i == 0 {
                    DESK_THEME.id.apply_to(cell).to_string()
                } else {
                    cell.clone()
                };
                pad(&styled, cell.width(), *width)
            })
            .collect();
        out.push_str(line.join(COLUMN_GAP).trim_end());
        out.push('\n');
    }
    out
}

pub fn render_board(id_key: &IdKey, title_field: &str, board: &Board) -> String {
    let mut out = String::new();
    for (i, column) in board.columns.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let heading = format!("{} ({})", column.key.to_uppercase(), column.records.len());
        let heading = if column.key == UNASSIGNED {
            DESK_THEME.unassigned.apply_to(heading)
        } else {
            DESK_THEME.column_title.apply_to(heading)
        };
        out.push_str(&format!("{}\n", heading));

        if column.records.is_empty() {
            out.push_str(&format!("  {}\n", DESK_THEME.muted.apply_to("empty")));
            continue;
        }
        for record in &column.records {
            let id = record
                .id(id_key)
                .map(|id| id.to_string())
                .unwrap_or_else(|| EMPTY_CELL.to_string());
            let title = record
                .text(title_field)
                .map(|t| truncate_to_width(&single_line(&t), MAX_CELL_WIDTH * 2))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {} {}\n",
                DESK_THEME.id.apply_to(format!("#{}", id)),
                DESK_THEME.card_title.apply_to(title)
            ));
        }
    }
    out
}

fn pad(styled: &str, visible: usize, width: usize) -> String {
    format!("{}{}", styled, " ".repeat(width.saturating_sub(visible)))
}

fn single_line(s: &str) -> String {
    s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect()
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use officedesk::board::BoardLayout;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_truncate_respects_wide_chars() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // Each CJK char is two columns wide.
        let cut = truncate_to_width("東京都港区", 6);
        assert_eq!(cut, "東京…");
        assert!(cut.width() <= 6);
    }

    #[test]
    fn test_table_has_header_and_placeholders() {
        console::set_colors_enabled(false);
        let out = render_table(
            &["id", "name", "status"],
            &[record(json!({"id": "1", "name": "Ana"}))],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id"));
        assert!(lines[1].contains("Ana"));
        assert!(lines[1].ends_with(EMPTY_CELL));
    }

    #[test]
    fn test_board_lists_unassigned_last() {
        console::set_colors_enabled(false);
        let layout = BoardLayout::new("stage", &["lead", "won"]);
        let board = Board::build(
            &layout,
            &[
                record(json!({"id": "1", "title": "Flota", "stage": "lead"})),
                record(json!({"id": "2", "title": "Perdida"})),
            ],
        );
        let out = render_board(&IdKey::default(), "title", &board);
        let lead = out.find("LEAD (1)").unwrap();
        let won = out.find("WON (0)").unwrap();
        let unassigned = out.find("UNASSIGNED (1)").unwrap();
        assert!(lead < won && won < unassigned);
        assert!(out.contains("#1 Flota"));
    }
}
