use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{ReconError, Result, Source};
use crate::models::{Cell, RawTable};

/// 读取工作簿 (xlsx, xls, xlsb, ods) 的第一个工作表
///
/// 行号与工作表绝对行号对齐: 数据区不从 A1 开始时, 前面补空行/空列。
pub fn read_first_sheet(bytes: &[u8], origin: Source) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| {
        ReconError::Load {
            origin,
            message: e.to_string(),
        }
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReconError::EmptyWorkbook { origin })?
        .map_err(|e| ReconError::Load {
            origin,
            message: e.to_string(),
        })?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(convert));
        rows.push(cells);
    }

    tracing::debug!("{}: loaded {} rows from first worksheet", origin, rows.len());
    Ok(RawTable::new(rows))
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::from_excel_serial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}
