use std::cmp::Ordering;

use bigdecimal::BigDecimal;

use crate::config::{InvoiceColumns, ReconConfig};
use crate::models::{InvoiceRecord, MatchResult, MatchTier, ReconciledRow, ResultTable};
use crate::service::header::ColumnBindings;

pub const COL_MATCHED_DOCUMENT: &str = "Doc_Num_Encontrado";
pub const COL_LEDGER_NOTE: &str = "Nota_Libro";
pub const COL_LEDGER_DEBIT: &str = "Debito_Libro";
pub const COL_DIFFERENCE: &str = "Diferencia_Total";

/// 默认输出列 (前 8 列来自发票导出, 后 4 列为匹配结果)
pub const DEFAULT_COLUMNS: [&str; 12] = [
    "Tipo de documento",
    "Folio",
    "Prefijo",
    "Fecha Emisión",
    "NIT Emisor",
    "Nombre Emisor",
    "NIT Receptor",
    "Total",
    COL_MATCHED_DOCUMENT,
    COL_LEDGER_NOTE,
    COL_LEDGER_DEBIT,
    COL_DIFFERENCE,
];

/// 匹配结果列, 报表发布时表头高亮
pub const MATCH_COLUMNS: [&str; 4] = [
    COL_MATCHED_DOCUMENT,
    COL_LEDGER_NOTE,
    COL_LEDGER_DEBIT,
    COL_DIFFERENCE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    DocumentType,
    DocumentNumber,
    Prefix,
    IssueDate,
    IssuerTaxId,
    IssuerName,
    ReceiverTaxId,
    Total,
    Currency,
    MatchedDocument,
    LedgerNote,
    LedgerDebit,
    Difference,
}

impl Field {
    /// 报表列名 -> 字段; 发票列只有在本次输入中存在时才输出
    fn resolve(name: &str, cols: &InvoiceColumns, present: &ColumnBindings) -> Option<Field> {
        let matched = match name {
            COL_MATCHED_DOCUMENT => Some(Field::MatchedDocument),
            COL_LEDGER_NOTE => Some(Field::LedgerNote),
            COL_LEDGER_DEBIT => Some(Field::LedgerDebit),
            COL_DIFFERENCE => Some(Field::Difference),
            _ => None,
        };
        if matched.is_some() {
            return matched;
        }

        let invoice_fields = [
            (&cols.document_type, Field::DocumentType),
            (&cols.document_number, Field::DocumentNumber),
            (&cols.prefix, Field::Prefix),
            (&cols.issue_date, Field::IssueDate),
            (&cols.issuer_tax_id, Field::IssuerTaxId),
            (&cols.issuer_name, Field::IssuerName),
            (&cols.receiver_tax_id, Field::ReceiverTaxId),
            (&cols.total, Field::Total),
            (&cols.currency, Field::Currency),
        ];
        invoice_fields
            .into_iter()
            .find(|(col, _)| col.as_str() == name && present.contains(name))
            .map(|(_, field)| field)
    }
}

/// 汇总结果: 金额取整, 排序, 投影为固定列
pub fn assemble(
    invoices: &[InvoiceRecord],
    results: Vec<MatchResult>,
    present: &ColumnBindings,
    config: &ReconConfig,
) -> (Vec<ReconciledRow>, ResultTable) {
    let scale = config.report.scale;

    let mut rows: Vec<ReconciledRow> = invoices
        .iter()
        .zip(results)
        .map(|(invoice, result)| {
            let mut invoice = invoice.clone();
            invoice.total_amount = invoice.total_amount.map(|v| round_to(&v, scale));
            let result = MatchResult {
                matched_debit: result.matched_debit.map(|v| round_to(&v, scale)),
                difference: result.difference.map(|v| round_to(&v, scale)),
                ..result
            };
            ReconciledRow { invoice, result }
        })
        .collect();

    rows.sort_by(|a, b| {
        compare_difference_desc(&a.result, &b.result)
            .then_with(|| compare_document_desc(&a.result, &b.result))
    });

    let fields: Vec<(String, Field)> = config
        .report
        .columns
        .iter()
        .filter_map(|name| {
            Field::resolve(name, &config.invoices, present).map(|f| (name.clone(), f))
        })
        .collect();

    let table = ResultTable {
        columns: fields.iter().map(|(name, _)| name.clone()).collect(),
        rows: rows
            .iter()
            .map(|row| fields.iter().map(|(_, f)| render(row, *f)).collect())
            .collect(),
    };

    (rows, table)
}

/// 四舍五入 (远离零) 并固定小数位
pub fn round_to(value: &BigDecimal, scale: i64) -> BigDecimal {
    value.round(scale).with_scale(scale)
}

fn render(row: &ReconciledRow, field: Field) -> String {
    let inv = &row.invoice;
    let res = &row.result;
    let amount = |v: &Option<BigDecimal>| v.as_ref().map(|d| d.to_string()).unwrap_or_default();
    match field {
        Field::DocumentType => inv.document_type.clone(),
        Field::DocumentNumber => inv.document_number.clone(),
        Field::Prefix => inv.prefix.clone(),
        Field::IssueDate => inv
            .issue_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
        Field::IssuerTaxId => inv.issuer_tax_id.clone(),
        Field::IssuerName => inv.issuer_name.clone(),
        Field::ReceiverTaxId => inv.receiver_tax_id.clone(),
        Field::Total => amount(&inv.total_amount),
        Field::Currency => inv.currency.clone().unwrap_or_default(),
        Field::MatchedDocument => res.matched_document_number.clone(),
        Field::LedgerNote => res.matched_note.clone().unwrap_or_default(),
        Field::LedgerDebit => amount(&res.matched_debit),
        Field::Difference => amount(&res.difference),
    }
}

/// 差额降序, 无差额的排最后
fn compare_difference_desc(a: &MatchResult, b: &MatchResult) -> Ordering {
    match (&a.difference, &b.difference) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 单号降序 (都是整数时按数值), 未匹配的排最后
fn compare_document_desc(a: &MatchResult, b: &MatchResult) -> Ordering {
    let blank = |r: &MatchResult| r.tier == MatchTier::Manual || r.matched_document_number.is_empty();
    match (blank(a), blank(b)) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => {
            let (x, y) = (&a.matched_document_number, &b.matched_document_number);
            match (x.parse::<i128>(), y.parse::<i128>()) {
                (Ok(nx), Ok(ny)) => ny.cmp(&nx),
                _ => y.cmp(x),
            }
        }
    }
}
