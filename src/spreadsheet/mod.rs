//! Spreadsheet module for section import and export
//!
//! Sections are laid out one per row: the section name in the first column
//! followed by name/code pairs for each geological class. The first row is
//! a header sized for the section with the most classes.

pub mod csv_sheet;
pub mod workbook;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::geological_class::ClassEntry;
use crate::models::section::{NewSection, SectionResponse};

pub const SECTION_NAME_HEADER: &str = "Section name";
pub const CLASS_NAME_HEADER: &str = "Class name";
pub const CLASS_CODE_HEADER: &str = "Class code";

/// Spreadsheet errors
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid sheet format: {0}. Use 'xlsx' or 'csv'")]
    UnknownFormat(String),

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Sheet exceeds the spreadsheet size limits")]
    TooLarge,
}

/// Spreadsheet file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    /// Excel workbook; written as xlsx, read from xlsx or legacy xls
    #[default]
    Xlsx,
    Csv,
}

impl std::str::FromStr for SheetFormat {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "xls" => Ok(SheetFormat::Xlsx),
            "csv" => Ok(SheetFormat::Csv),
            _ => Err(SheetError::UnknownFormat(s.to_string())),
        }
    }
}

impl SheetFormat {
    /// Get file extension for format
    pub fn extension(&self) -> &'static str {
        match self {
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Csv => "csv",
        }
    }

    /// MIME type used when serving a file of this format
    pub fn content_type(&self) -> &'static str {
        match self {
            SheetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            SheetFormat::Csv => "text/csv",
        }
    }

    /// Guess the format from a file name; anything but `.csv` is a workbook
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SheetFormat::Csv,
            _ => SheetFormat::Xlsx,
        }
    }
}

/// Cells of a sheet by row, `None` for empty cells
pub type SheetRows = Vec<Vec<Option<String>>>;

/// Lay sections out as rows, header first
pub fn layout_sections(sections: &[SectionResponse]) -> Vec<Vec<String>> {
    let max_classes = sections
        .iter()
        .map(|s| s.geological_classes.len())
        .max()
        .unwrap_or(0);

    let mut header = Vec::with_capacity(1 + max_classes * 2);
    header.push(SECTION_NAME_HEADER.to_string());
    for _ in 0..max_classes {
        header.push(CLASS_NAME_HEADER.to_string());
        header.push(CLASS_CODE_HEADER.to_string());
    }

    let mut rows = Vec::with_capacity(sections.len() + 1);
    rows.push(header);

    for section in sections {
        let mut row = Vec::with_capacity(1 + section.geological_classes.len() * 2);
        row.push(section.name.clone());
        for class in &section.geological_classes {
            row.push(class.name.clone());
            row.push(class.code.clone());
        }
        rows.push(row);
    }

    rows
}

/// Parse sheet rows back into sections.
///
/// The header's populated cell count bounds how many columns are read. A
/// class is taken only when both its name and code cells are filled.
pub fn parse_sections(rows: &[Vec<Option<String>>]) -> Vec<NewSection> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };
    let columns = header.iter().filter(|cell| cell.is_some()).count();

    let mut sections = Vec::new();
    for (i, row) in data.iter().enumerate() {
        if row.iter().all(Option::is_none) {
            continue;
        }

        let Some(name) = cell(row, 0) else {
            tracing::warn!("Skipping row {} without a section name", i + 2);
            continue;
        };

        let mut classes = Vec::new();
        for col in (1..columns).step_by(2) {
            if let (Some(class_name), Some(code)) = (cell(row, col), cell(row, col + 1)) {
                classes.push(ClassEntry::new(class_name, code));
            }
        }

        sections.push(NewSection::new(name, classes));
    }

    sections
}

fn cell(row: &[Option<String>], col: usize) -> Option<&str> {
    row.get(col)
        .and_then(|c| c.as_deref())
        .filter(|c| !c.is_empty())
}

/// Write sections to `path` in the given format
pub fn write_sections(
    sections: &[SectionResponse],
    path: &Path,
    format: SheetFormat,
) -> Result<(), SheetError> {
    let rows = layout_sections(sections);
    match format {
        SheetFormat::Xlsx => workbook::write_xlsx(&rows, path),
        SheetFormat::Csv => csv_sheet::write_csv(&rows, path),
    }
}

/// Read sections from the first sheet of the file at `path`
pub fn read_sections(path: &Path, format: SheetFormat) -> Result<Vec<NewSection>, SheetError> {
    let rows = match format {
        SheetFormat::Xlsx => workbook::read_workbook(path)?,
        SheetFormat::Csv => csv_sheet::read_csv(path)?,
    };
    Ok(parse_sections(&rows))
}
