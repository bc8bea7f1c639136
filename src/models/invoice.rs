use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 税局发票记录 (来源 A, 规范化后不可变)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub document_type: String,
    /// 已去除贷项通知单前缀的 Folio
    pub document_number: String,
    pub prefix: String,
    pub issue_date: Option<NaiveDate>,
    pub issuer_tax_id: String,
    pub issuer_name: String,
    pub receiver_tax_id: String,
    /// None = 缺失或无法解析
    pub total_amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub source_row: usize,
}
