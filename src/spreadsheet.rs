use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::BuildError;

pub const ROW_WIDTH: usize = 6;
pub const FRONT: usize = 0;
pub const EXAMPLE: usize = 3;

/// One lesson row: the first six cells of a spreadsheet row, rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row([String; ROW_WIDTH]);

impl Row {
    /// Pads with empty strings or drops cells past the sixth.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut fields: [String; ROW_WIDTH] = Default::default();
        for (slot, cell) in fields.iter_mut().zip(cells) {
            *slot = cell;
        }
        Row(fields)
    }

    /// English front text.
    pub fn front(&self) -> &str {
        &self.0[FRONT]
    }

    /// English example sentence.
    pub fn example(&self) -> &str {
        &self.0[EXAMPLE]
    }

    pub fn fields(&self) -> &[String; ROW_WIDTH] {
        &self.0
    }
}

/// Reads the first worksheet of `path`. The first row is a header and is not
/// returned.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, BuildError> {
    info!("Reading spreadsheet {}", path.display());
    let spreadsheet_err = |source| BuildError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BuildError::NoWorksheet(path.to_path_buf()))?
        .map_err(spreadsheet_err)?;

    let rows = rows_from_range(&range);
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn rows_from_range(range: &Range<Data>) -> Vec<Row> {
    // calamine trims leading empty columns; put them back so field positions
    // stay anchored to column A.
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    range
        .rows()
        .skip(1)
        .map(|cells| {
            let padded = std::iter::repeat_with(String::new)
                .take(leading)
                .chain(cells.iter().map(render_cell));
            Row::from_cells(padded)
        })
        .inspect(|row| debug!(?row, "normalized row"))
        .collect()
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_nan() => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use rust_xlsxwriter::Workbook;

    /// Writes `rows` as strings into the first worksheet of a new .xlsx file.
    pub fn write_workbook(path: &Path, rows: &[&[&str]]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save(path).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn header_row_is_skipped() {
        let range = sheet(&[
            &[s("front"), s("back"), s("x"), s("example")],
            &[s("hello"), s("xin chao"), Data::Empty, s("hello world")],
        ]);
        let rows = rows_from_range(&range);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].front(), "hello");
        assert_eq!(rows[0].example(), "hello world");
        assert_eq!(rows[0].fields()[2], "");
    }

    #[test]
    fn rows_are_padded_and_truncated_to_six() {
        let range = sheet(&[
            &[s("a"), s("b"), s("c"), s("d"), s("e"), s("f"), s("g"), s("h")],
            &[s("1"), s("2"), s("3"), s("4"), s("5"), s("6"), s("7"), s("8")],
            &[s("only")],
        ]);
        let rows = rows_from_range(&range);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields(), &["1", "2", "3", "4", "5", "6"].map(String::from));
        assert_eq!(rows[1].fields(), &["only", "", "", "", "", ""].map(String::from));
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(render_cell(&Data::Empty), "");
        assert_eq!(render_cell(&Data::Int(7)), "7");
        assert_eq!(render_cell(&Data::Float(3.0)), "3");
        assert_eq!(render_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(render_cell(&Data::Bool(true)), "True");
        assert_eq!(render_cell(&s("café")), "café");
    }

    #[test]
    fn date_cells_render_like_timestamps() {
        let date = Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(render_cell(&date), "2024-01-01 00:00:00");
        let noon = Data::DateTime(ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(render_cell(&noon), "2024-01-01 12:00:00");
        assert_eq!(
            render_cell(&Data::DateTimeIso("2024-01-01T08:30:00".to_string())),
            "2024-01-01T08:30:00"
        );
        assert_eq!(render_cell(&Data::DurationIso("PT1H".to_string())), "PT1H");
    }

    #[test]
    fn leading_empty_columns_keep_positions() {
        let mut range = Range::new((0, 1), (1, 4));
        range.set_value((0, 1), s("b"));
        range.set_value((0, 4), s("e"));
        range.set_value((1, 1), s("back"));
        range.set_value((1, 4), s("example"));
        let rows = rows_from_range(&range);
        assert_eq!(rows[0].front(), "");
        assert_eq!(rows[0].fields()[1], "back");
        assert_eq!(rows[0].fields()[4], "example");
    }

    #[test]
    fn reads_first_sheet_of_workbook() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Unit 1.xlsx");
        test_support::write_workbook(
            &path,
            &[
                &["front", "back", "note", "example", "ex back", "tag", "extra"],
                &["hello", "xin chao", "", "hello world", "", "greet", "dropped"],
                &["", "", "", "bye now"],
            ],
        );

        let rows = read_rows(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].fields(),
            &["hello", "xin chao", "", "hello world", "", "greet"].map(String::from)
        );
        assert_eq!(rows[1].fields(), &["", "", "", "bye now", "", ""].map(String::from));
    }

    #[test]
    fn numbers_in_workbook_render_without_fraction() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("numbers.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "front").unwrap();
        sheet.write_number(1, 0, 3.0).unwrap();
        sheet.write_number(1, 1, 2.5).unwrap();
        workbook.save(&path).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0].front(), "3");
        assert_eq!(rows[0].fields()[1], "2.5");
    }

    #[test]
    fn missing_file_is_a_spreadsheet_error() {
        let err = read_rows(Path::new("/nonexistent/lesson.xlsx")).unwrap_err();
        assert!(matches!(err, BuildError::Spreadsheet { .. }));
    }

    #[test]
    fn row_serializes_as_array() {
        let row = Row::from_cells(["hello".to_string(), "".to_string()]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["hello","","","","",""]"#);
    }
}
