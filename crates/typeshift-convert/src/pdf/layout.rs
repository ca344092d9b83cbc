//! Line and table reconstruction from positioned PDF text.
//!
//! Input is a flat list of text fragments with bounding boxes in PDF user
//! space (origin bottom-left, y grows upwards). Fragments sharing a baseline
//! band become a [`TextLine`]; wide horizontal gaps split a line into cells.
//! A run of consecutive multi-cell lines whose cells stay in the same columns
//! is reported as a table.

/// A positioned run of text as reported by the PDF reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub text: String,
}

/// Horizontally contiguous text within a line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCell {
    pub left: f32,
    pub right: f32,
    pub text: String,
}

/// One visual line of text, cells ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub top: f32,
    pub bottom: f32,
    pub cells: Vec<TextCell>,
}

impl TextLine {
    fn height(&self) -> f32 {
        (self.top - self.bottom).max(1.0)
    }

    fn center(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// The line's text with cells separated by tabs.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// Lines `start..end` of a page form a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRegion {
    pub start: usize,
    pub end: usize,
}

impl TableRegion {
    /// Cell texts of the region's lines.
    pub fn rows(&self, lines: &[TextLine]) -> Vec<Vec<String>> {
        lines[self.start..self.end]
            .iter()
            .map(|line| line.cells.iter().map(|c| c.text.clone()).collect())
            .collect()
    }
}

/// Gap, relative to line height, that separates two cells.
const CELL_GAP: f32 = 0.8;

/// Gap, relative to line height, above which joined fragments get a space.
const WORD_GAP: f32 = 0.15;

/// Horizontal slack, in points, when matching columns between lines.
const COLUMN_SLACK: f32 = 2.0;

/// Group fragments into lines, top of page first.
pub fn group_lines(mut fragments: Vec<Fragment>) -> Vec<TextLine> {
    fragments.retain(|f| !f.text.trim().is_empty());
    fragments.sort_by(|a, b| {
        b.top
            .total_cmp(&a.top)
            .then_with(|| a.left.total_cmp(&b.left))
    });

    let mut bands: Vec<(f32, f32, Vec<Fragment>)> = Vec::new();
    for fragment in fragments {
        let center = (fragment.top + fragment.bottom) / 2.0;
        let height = (fragment.top - fragment.bottom).max(1.0);
        let joins_last = bands.last().is_some_and(|(top, bottom, _)| {
            let band_center = (top + bottom) / 2.0;
            let band_height = (top - bottom).max(1.0);
            (center - band_center).abs() <= height.max(band_height) * 0.5
        });

        if joins_last {
            if let Some((top, bottom, members)) = bands.last_mut() {
                *top = top.max(fragment.top);
                *bottom = bottom.min(fragment.bottom);
                members.push(fragment);
            }
        } else {
            bands.push((fragment.top, fragment.bottom, vec![fragment]));
        }
    }

    bands
        .into_iter()
        .map(|(top, bottom, members)| build_line(top, bottom, members))
        .collect()
}

fn build_line(top: f32, bottom: f32, mut members: Vec<Fragment>) -> TextLine {
    members.sort_by(|a, b| a.left.total_cmp(&b.left));
    let height = (top - bottom).max(1.0);

    let mut cells: Vec<TextCell> = Vec::new();
    for fragment in members {
        let text = fragment.text.trim();
        match cells.last_mut() {
            Some(cell) if fragment.left - cell.right < height * CELL_GAP => {
                if fragment.left - cell.right > height * WORD_GAP {
                    cell.text.push(' ');
                }
                cell.text.push_str(text);
                cell.right = cell.right.max(fragment.right);
            }
            _ => cells.push(TextCell {
                left: fragment.left,
                right: fragment.right,
                text: text.to_string(),
            }),
        }
    }

    TextLine { top, bottom, cells }
}

/// Find runs of at least two consecutive lines that share a column layout.
pub fn find_tables(lines: &[TextLine]) -> Vec<TableRegion> {
    let mut regions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let anchor = &lines[i];
        if anchor.cells.len() < 2 {
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < lines.len()
            && same_columns(anchor, &lines[end])
            && close_below(&lines[end - 1], &lines[end])
        {
            end += 1;
        }

        if end - i >= 2 {
            regions.push(TableRegion { start: i, end });
            i = end;
        } else {
            i += 1;
        }
    }
    regions
}

fn same_columns(anchor: &TextLine, line: &TextLine) -> bool {
    anchor.cells.len() == line.cells.len()
        && anchor.cells.iter().zip(&line.cells).all(|(a, b)| {
            b.left <= a.right + COLUMN_SLACK && a.left <= b.right + COLUMN_SLACK
        })
}

fn close_below(above: &TextLine, line: &TextLine) -> bool {
    above.center() - line.center() <= above.height().max(line.height()) * 3.0
}

/// Plain-text fallback: one row per non-blank line, split on whitespace.
pub fn text_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}
