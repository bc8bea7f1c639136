use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 明细账单行 (来源 B, 聚合前)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub transaction_date: Option<NaiveDate>,
    /// 日期原文, 日期无法解析时仍用于分组
    pub transaction_date_text: String,
    pub note_text: String,
    pub document_number: String,
    pub counterparty_name: String,
    pub debit_amount: BigDecimal,
    pub credit_amount: BigDecimal,
    /// 从 "Nit: <digits>" 提取的税号
    pub extracted_tax_id: Option<String>,
    pub source_row: usize,
}

/// 分组键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub document_number: String,
    pub note_text: Option<String>,
    pub transaction_date: Option<String>,
    pub counterparty_name: Option<String>,
}

/// 按单据聚合后的账簿分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerGroup {
    pub key: GroupKey,
    pub document_number: String,
    pub total_debit: BigDecimal,
    pub total_credit: BigDecimal,
    pub representative_counterparty: String,
    pub representative_tax_id: Option<String>,
    pub representative_note: String,
    pub line_count: usize,
    /// 首行在工作表中的行号
    pub first_row: usize,
}
