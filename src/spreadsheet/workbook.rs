//! Excel workbook reading and writing
//!
//! Writes xlsx through rust_xlsxwriter. Reading goes through calamine,
//! which sniffs the content so legacy xls uploads work as well.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;

use super::{SheetError, SheetRows};

/// Name of the single worksheet written on export
pub const SHEET_NAME: &str = "Sections";

/// Write rows of text cells to an xlsx file
pub fn write_xlsx(rows: &[Vec<String>], path: &Path) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r).map_err(|_| SheetError::TooLarge)?;
        for (c, value) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| SheetError::TooLarge)?;
            worksheet.write_string(r, c, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Read the first worksheet of an xls or xlsx file.
///
/// Rows and columns keep their absolute positions, so the header is always
/// row 0 and section names column 0.
pub fn read_workbook(path: &Path) -> Result<SheetRows, SheetError> {
    let bytes = std::fs::read(path)?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoSheets)??;

    let Some((last_row, last_col)) = range.end() else {
        return Ok(Vec::new());
    };

    let rows = (0..=last_row)
        .map(|r| {
            (0..=last_col)
                .map(|c| range.get_value((r, c)).and_then(cell_text))
                .collect()
        })
        .collect();

    Ok(rows)
}

fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::{read_sections, SheetFormat};

    fn create_test_rows() -> Vec<Vec<String>> {
        vec![
            vec!["Section name".to_string(), "Class name".to_string(), "Class code".to_string()],
            vec!["S1".to_string(), "Clay".to_string(), "CL".to_string()],
            vec!["S2".to_string()],
        ]
    }

    #[test]
    fn test_write_then_read_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.xlsx");

        write_xlsx(&create_test_rows(), &path).unwrap();
        let rows = read_workbook(&path).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].as_deref(), Some("Section name"));
        assert_eq!(rows[1][2].as_deref(), Some("CL"));
        assert_eq!(rows[2][0].as_deref(), Some("S2"));
        assert_eq!(rows[2][1], None);
    }

    #[test]
    fn test_read_legacy_xls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.xls");
        std::fs::write(&path, include_bytes!("testdata/sections.xls")).unwrap();

        let rows = read_workbook(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].as_deref(), Some("Section name"));
        assert_eq!(rows[1][4].as_deref(), Some("GC12"));
        assert_eq!(rows[2][2].as_deref(), Some("GC21"));
        assert_eq!(rows[2][3], None);

        let sections = read_sections(&path, SheetFormat::from_path(&path)).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Section 1");
        assert_eq!(sections[0].geological_classes.len(), 2);
        assert_eq!(sections[0].geological_classes[1].name, "Geo Class 12");
        assert_eq!(sections[1].name, "Section 2");
        assert_eq!(sections[1].geological_classes.len(), 1);
        assert_eq!(sections[1].geological_classes[0].code, "GC21");
    }

    #[test]
    fn test_read_invalid_content_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xls");
        std::fs::write(&path, b"invalid content").unwrap();

        assert!(read_workbook(&path).is_err());
    }

    #[test]
    fn test_read_missing_file_fails() {
        let err = read_workbook(Path::new("invalid-path")).unwrap_err();
        assert!(matches!(err, SheetError::Io(_)));
    }
}
