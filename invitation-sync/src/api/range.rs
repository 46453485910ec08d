//! A1 notation helpers
//!
//! Only what the sync needs: finding the first row of a range and
//! addressing cells in a single column.

use once_cell::sync::Lazy;
use regex::Regex;

static START_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Za-z]*)\$?([0-9]*)").expect("valid start cell regex"));

static COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Za-z]+)$").expect("valid column regex"));

/// Split `Sheet!A1:B2` into the optional sheet name and the cell part
fn split_sheet(range: &str) -> (Option<&str>, &str) {
    match range.rfind('!') {
        Some(pos) => (Some(&range[..pos]), &range[pos + 1..]),
        None => (None, range),
    }
}

/// Row number of the first cell in an A1 range, if the range names one
///
/// `Guests!A2:F` → `Some(2)`, `Guests!A:F` → `None`
pub fn start_row(range: &str) -> Option<usize> {
    let (_, cells) = split_sheet(range.trim());
    let start = cells.split(':').next().unwrap_or_default();
    let caps = START_CELL.captures(start)?;
    caps.get(2)?.as_str().parse::<usize>().ok().filter(|row| *row > 0)
}

/// A single column of a sheet, e.g. `Guests!G`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    sheet: Option<String>,
    column: String,
}

impl ColumnRef {
    /// Parse `Sheet!G`, `'My Sheet'!G` or `G`
    pub fn parse(raw: &str) -> Option<Self> {
        let (sheet, cells) = split_sheet(raw.trim());
        let column = COLUMN.captures(cells)?.get(1)?.as_str().to_ascii_uppercase();
        Some(Self {
            sheet: sheet.filter(|s| !s.is_empty()).map(str::to_string),
            column,
        })
    }

    fn prefix(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("{}!", sheet),
            None => String::new(),
        }
    }

    /// Address of the cell in `row`, e.g. `Guests!G7`
    pub fn cell(&self, row: usize) -> String {
        format!("{}{}{}", self.prefix(), self.column, row)
    }

    /// Address spanning `first..=last` rows, e.g. `Guests!G2:G40`
    pub fn span(&self, first: usize, last: usize) -> String {
        format!(
            "{}{}{}:{}{}",
            self.prefix(),
            self.column,
            first,
            self.column,
            last
        )
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix(), self.column)
    }
}
