//! Minimal GitHub-flavored markdown document builder.
//!
//! Blocks are accumulated in order and joined with a blank line on output.

use std::fmt;

/// Column alignment for [`Document::table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    #[cfg_attr(not(test), allow(dead_code))]
    Right,
}

impl Align {
    fn marker(self) -> &'static str {
        match self {
            Align::Left => ":---",
            Align::Center => ":---:",
            Align::Right => "---:",
        }
    }
}

#[derive(Debug, Default)]
pub struct Document {
    blocks: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// `level` is clamped to the markdown range 1..=6.
    pub fn heading(&mut self, text: &str, level: usize) {
        let level = level.clamp(1, 6);
        self.blocks.push(format!("{} {}", "#".repeat(level), text));
    }

    /// Append text verbatim. Empty text adds nothing.
    pub fn raw(&mut self, text: &str) {
        let text = text.trim_end();
        if !text.is_empty() {
            self.blocks.push(text.to_string());
        }
    }

    pub fn bold(&mut self, text: &str) {
        self.blocks.push(format!("**{}**", text));
    }

    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>], align: &[Align]) {
        let mut lines = Vec::with_capacity(rows.len() + 2);
        lines.push(table_row(headers.iter().map(|h| escape_cell(h))));
        lines.push(table_row(
            (0..headers.len()).map(|i| align.get(i).copied().unwrap_or(Align::Left).marker().to_string()),
        ));
        for row in rows {
            lines.push(table_row(
                (0..headers.len()).map(|i| row.get(i).map(|c| escape_cell(c)).unwrap_or_default()),
            ));
        }
        self.blocks.push(lines.join("\n"));
    }

    pub fn code(&mut self, text: &str, lang: &str) {
        self.blocks
            .push(format!("```{}\n{}\n```", lang, text.trim_end_matches('\n')));
    }

    pub fn rule(&mut self) {
        self.blocks.push("***".to_string());
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            f.write_str(block)?;
        }
        if !self.blocks.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

fn table_row(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

fn escape_cell(text: &str) -> String {
    text.trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_are_clamped() {
        let mut doc = Document::new();
        doc.heading("Top", 0);
        doc.heading("Deep", 9);
        assert_eq!(doc.to_string(), "# Top\n\n###### Deep\n");
    }

    #[test]
    fn empty_raw_text_is_skipped() {
        let mut doc = Document::new();
        doc.raw("");
        doc.raw("  \n");
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn table_with_alignment() {
        let mut doc = Document::new();
        doc.table(
            &["Name", "Default"],
            &[vec!["`x`".to_string(), "1".to_string()]],
            &[Align::Left, Align::Center],
        );
        assert_eq!(
            doc.to_string(),
            "| Name | Default |\n| :--- | :---: |\n| `x` | 1 |\n"
        );
    }

    #[test]
    fn table_cells_escape_pipes_and_newlines() {
        let mut doc = Document::new();
        doc.table(
            &["Type", "Description"],
            &[vec!["string|nil".to_string(), "first\nsecond".to_string()]],
            &[Align::Left, Align::Left],
        );
        assert!(doc.to_string().contains("| string\\|nil | first<br>second |"));
    }

    #[test]
    fn short_rows_are_padded() {
        let mut doc = Document::new();
        doc.table(&["A", "B"], &[vec!["1".to_string()]], &[Align::Right]);
        assert_eq!(doc.to_string(), "| A | B |\n| ---: | :--- |\n| 1 |  |\n");
    }

    #[test]
    fn code_bold_and_rule() {
        let mut doc = Document::new();
        doc.bold("Usage");
        doc.code("print(1)\n", "lua");
        doc.rule();
        assert_eq!(doc.to_string(), "**Usage**\n\n```lua\nprint(1)\n```\n\n***\n");
    }
}
