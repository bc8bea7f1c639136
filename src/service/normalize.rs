use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use regex::Regex;

use crate::config::{HeaderLocation, ReconConfig};
use crate::error::{ParseWarning, Result, Source};
use crate::models::{Cell, InvoiceRecord, LedgerLine, RawTable};
use crate::service::header::{self, ColumnBindings};

/// 明细账往来单位/摘要中嵌入的税号
const NIT_PATTERN: &str = r"Nit:\s*(\d+)";

/// 金额小数位 (指数) 上限; 超出的单元格按无法解析处理
const MAX_AMOUNT_EXPONENT: i64 = 18;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// 来源 A 规范化结果
#[derive(Debug, Clone, Default)]
pub struct InvoiceBatch {
    pub records: Vec<InvoiceRecord>,
    pub warnings: Vec<ParseWarning>,
    /// 本次输入中实际存在的列 (配置名)
    pub bindings: ColumnBindings,
    pub skipped_direction: usize,
    pub skipped_acknowledgements: usize,
}

/// 来源 B 规范化结果
#[derive(Debug, Clone, Default)]
pub struct LedgerBatch {
    pub lines: Vec<LedgerLine>,
    pub warnings: Vec<ParseWarning>,
    pub header_row: usize,
    /// 被摘要过滤器排除的行数
    pub filtered_out: usize,
}

/// 规范化税局发票导出 (表头在首行, 找不到时扫描)
pub fn normalize_invoices(table: &RawTable, config: &ReconConfig) -> Result<InvoiceBatch> {
    let cols = &config.invoices;
    let required = [
        cols.direction.as_str(),
        cols.document_type.as_str(),
        cols.document_number.as_str(),
        cols.issuer_tax_id.as_str(),
        cols.total.as_str(),
    ];
    let optional = [
        cols.prefix.as_str(),
        cols.issue_date.as_str(),
        cols.issuer_name.as_str(),
        cols.receiver_tax_id.as_str(),
        cols.currency.as_str(),
    ];

    let resolved = header::resolve(
        table,
        HeaderLocation::Fixed { row: 0, scan_fallback: true },
        config.header.scan_rows,
        &required,
        &optional,
        Source::Invoices,
    )?;

    let mut batch = InvoiceBatch {
        bindings: resolved.bindings.clone(),
        ..InvoiceBatch::default()
    };
    let b = &resolved.bindings;

    for (idx, row) in resolved.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let sheet_row = resolved.sheet_row(idx);

        if b.cell(row, &cols.direction).as_text() != cols.received_value {
            batch.skipped_direction += 1;
            continue;
        }

        let document_type = b.cell(row, &cols.document_type).as_text();
        if document_type == cols.acknowledgement_type {
            batch.skipped_acknowledgements += 1;
            continue;
        }

        let total_cell = b.cell(row, &cols.total);
        let total_amount = match parse_amount(total_cell) {
            Ok(v) => v,
            Err(()) => {
                batch.warnings.push(ParseWarning {
                    source: Source::Invoices,
                    row: sheet_row,
                    column: cols.total.clone(),
                    value: total_cell.as_text(),
                    reason: "not a number",
                });
                None
            }
        };

        let issue_date = if b.contains(&cols.issue_date) {
            let cell = b.cell(row, &cols.issue_date);
            match parse_date(cell) {
                Ok(d) => d,
                Err(()) => {
                    batch.warnings.push(ParseWarning {
                        source: Source::Invoices,
                        row: sheet_row,
                        column: cols.issue_date.clone(),
                        value: cell.as_text(),
                        reason: "not a date",
                    });
                    None
                }
            }
        } else {
            None
        };

        let currency = Some(b.cell(row, &cols.currency).as_text()).filter(|c| !c.is_empty());

        batch.records.push(InvoiceRecord {
            document_type,
            document_number: strip_credit_note_marker(
                &b.cell(row, &cols.document_number).as_text(),
                &cols.credit_note_marker,
            ),
            prefix: b.cell(row, &cols.prefix).as_text(),
            issue_date,
            issuer_tax_id: tax_id_digits(b.cell(row, &cols.issuer_tax_id)),
            issuer_name: b.cell(row, &cols.issuer_name).as_text(),
            receiver_tax_id: tax_id_digits(b.cell(row, &cols.receiver_tax_id)),
            total_amount,
            currency,
            source_row: sheet_row,
        });
    }

    for w in &batch.warnings {
        tracing::warn!("{}", w);
    }
    tracing::info!(
        "invoices: {} records kept, {} other direction, {} acknowledgements dropped",
        batch.records.len(),
        batch.skipped_direction,
        batch.skipped_acknowledgements
    );

    Ok(batch)
}

/// 规范化明细账 (表头位置按配置, 可回退扫描)
pub fn normalize_ledger(table: &RawTable, config: &ReconConfig) -> Result<LedgerBatch> {
    let cols = &config.ledger;
    let required = [
        cols.counterparty.as_str(),
        cols.note.as_str(),
        cols.document_number.as_str(),
        cols.debit.as_str(),
        cols.credit.as_str(),
        cols.date.as_str(),
    ];

    let resolved = header::resolve(
        table,
        config.header.location(),
        config.header.scan_rows,
        &required,
        &[],
        Source::Ledger,
    )?;
    let b = &resolved.bindings;
    let nit_re = Regex::new(NIT_PATTERN).expect("NIT pattern is valid");

    let mut batch = LedgerBatch {
        header_row: resolved.header_row,
        ..LedgerBatch::default()
    };

    for (idx, row) in resolved.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let sheet_row = resolved.sheet_row(idx);

        let note_text = b.cell(row, &cols.note).as_text();
        if let Some(filter) = &config.note_filter {
            if !filter.accepts(&note_text) {
                batch.filtered_out += 1;
                continue;
            }
        }

        let counterparty_name = b.cell(row, &cols.counterparty).as_text();
        let extracted_tax_id = extract_tax_id(&nit_re, &counterparty_name)
            .or_else(|| extract_tax_id(&nit_re, &note_text));

        let debit_amount = ledger_amount(b, row, &cols.debit, sheet_row, &mut batch.warnings);
        let credit_amount = ledger_amount(b, row, &cols.credit, sheet_row, &mut batch.warnings);

        let date_cell = b.cell(row, &cols.date);
        let transaction_date = match parse_date(date_cell) {
            Ok(d) => d,
            Err(()) => {
                batch.warnings.push(ParseWarning {
                    source: Source::Ledger,
                    row: sheet_row,
                    column: cols.date.clone(),
                    value: date_cell.as_text(),
                    reason: "not a date",
                });
                None
            }
        };

        batch.lines.push(LedgerLine {
            transaction_date,
            transaction_date_text: date_cell.as_text(),
            note_text,
            document_number: b.cell(row, &cols.document_number).as_text(),
            counterparty_name,
            debit_amount,
            credit_amount,
            extracted_tax_id,
            source_row: sheet_row,
        });
    }

    for w in &batch.warnings {
        tracing::warn!("{}", w);
    }
    tracing::info!(
        "ledger: header at row {}, {} lines kept, {} filtered by note",
        batch.header_row,
        batch.lines.len(),
        batch.filtered_out
    );

    Ok(batch)
}

/// 借贷金额: 空白为 0; 无法解析也按 0 汇总, 但记录警告
fn ledger_amount(
    bindings: &ColumnBindings,
    row: &[Cell],
    column: &str,
    sheet_row: usize,
    warnings: &mut Vec<ParseWarning>,
) -> BigDecimal {
    let cell = bindings.cell(row, column);
    match parse_amount(cell) {
        Ok(v) => v.unwrap_or_else(BigDecimal::zero),
        Err(()) => {
            warnings.push(ParseWarning {
                source: Source::Ledger,
                row: sheet_row,
                column: column.to_string(),
                value: cell.as_text(),
                reason: "not a number, counted as zero",
            });
            BigDecimal::zero()
        }
    }
}

/// 去掉来源 A 特有的贷项通知单前缀 ("NC00123" -> "00123")
pub fn strip_credit_note_marker(folio: &str, marker: &str) -> String {
    match folio.strip_prefix(marker) {
        Some(rest) if !marker.is_empty() => rest.to_string(),
        _ => folio.to_string(),
    }
}

pub fn extract_tax_id(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 税号统一为数字字符串: 数字单元格去掉小数部分, 文本去掉前导 '+' 和千分位/空格
pub fn tax_id_digits(cell: &Cell) -> String {
    let text = cell.as_text();
    let text = text.trim_start_matches('+');
    text.chars()
        .filter(|c| !matches!(c, '.' | ',' | ' ' | '\u{a0}'))
        .collect()
}

/// 金额解析: Ok(None) = 空白, Err = 无法解析
pub fn parse_amount(cell: &Cell) -> std::result::Result<Option<BigDecimal>, ()> {
    let text = match cell {
        Cell::Empty => return Ok(None),
        Cell::Number(n) if n.is_finite() => n.to_string(),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.to_string()
        }
        _ => return Err(()),
    };
    let value = BigDecimal::from_str(&text).map_err(|_| ())?;
    let (_, exponent) = value.as_bigint_and_exponent();
    if exponent.abs() > MAX_AMOUNT_EXPONENT {
        return Err(());
    }
    Ok(Some(value))
}

/// 日期解析: Ok(None) = 空白, Err = 无法解析
pub fn parse_date(cell: &Cell) -> std::result::Result<Option<NaiveDate>, ()> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Date(dt) => Ok(Some(dt.date())),
        Cell::Number(n) => crate::models::table::excel_serial_to_datetime(*n)
            .map(|dt| Some(dt.date()))
            .ok_or(()),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|f| chrono::NaiveDateTime::parse_from_str(s, f).ok())
                        .map(|dt| dt.date())
                })
                .map(Some)
                .ok_or(())
        }
        Cell::Bool(_) => Err(()),
    }
}
