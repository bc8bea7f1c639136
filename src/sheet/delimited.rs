use std::borrow::Cow;
use std::io::Write;

use crate::error::{ReconError, Result, Source};
use crate::models::{RawTable, ResultTable};

/// 解析 CSV 导出 (逗号或分号分隔, 无表头假设, 行长度可不一致)
pub fn read_csv(bytes: &[u8], origin: Source) -> Result<RawTable> {
    let (text, replaced) = decode_utf8(bytes);
    if replaced {
        tracing::warn!(
            "{}: CSV is not valid UTF-8, invalid bytes replaced (column names with accents may not match)",
            origin
        );
    }
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Load {
            origin,
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(|v| v.trim().to_string()).collect::<Vec<_>>());
    }

    tracing::debug!("{}: loaded {} CSV rows", origin, rows.len());
    Ok(RawTable::from_text_rows(rows))
}

/// 按 UTF-8 解码; 第二个值表示是否替换了非法字节
fn decode_utf8(bytes: &[u8]) -> (Cow<'_, str>, bool) {
    let text = String::from_utf8_lossy(bytes);
    let replaced = matches!(text, Cow::Owned(_));
    (text, replaced)
}

fn sniff_delimiter(text: &str) -> u8 {
    let head: Vec<&str> = text.lines().take(10).collect();
    let semicolons: usize = head.iter().map(|l| l.matches(';').count()).sum();
    let commas: usize = head.iter().map(|l| l.matches(',').count()).sum();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// 导出结果表到 CSV (含表头)
pub fn write_table<W: Write>(table: &ResultTable, writer: W) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
