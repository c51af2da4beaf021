//! Plain-text table rendering for the inspection commands.
//!
//! Widths are measured in terminal cells: East Asian wide characters (the
//! floor-plan keywords are mostly CJK) and emoji occupy two cells, combining
//! marks none.

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

const SEPARATOR: &str = "  ";

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(&flatten(cell)));
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers.iter().copied(), &widths);
    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(1)))
        .collect::<Vec<_>>();
    push_line(&mut output, rule.iter().map(String::as_str), &widths);
    for row in rows {
        let cells = row.iter().map(|cell| flatten(cell)).collect::<Vec<_>>();
        push_line(&mut output, cells.iter().map(String::as_str), &widths);
    }
    output
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn push_line<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(SEPARATOR);
        }
        line.push_str(cell);
        let padding = width.saturating_sub(cell_width(cell));
        line.extend(std::iter::repeat_n(' ', padding));
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn flatten(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

fn cell_width(value: &str) -> usize {
    UnicodeWidthStr::width(value)
}
