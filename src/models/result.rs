use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::InvoiceRecord;

/// 未匹配时写入 Doc_Num_Encontrado 的标记
pub const MANUAL_REVIEW: &str = "Validar Manualmente";

/// 命中的匹配层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// 税号 + 金额 + 摘要包含单号
    Strict,
    /// 税号 + 摘要包含单号
    Relaxed,
    /// 需人工核对
    Manual,
}

/// 单张发票的匹配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub tier: MatchTier,
    pub matched_document_number: String,
    pub matched_note: Option<String>,
    pub matched_debit: Option<BigDecimal>,
    pub difference: Option<BigDecimal>,
}

impl MatchResult {
    pub fn manual() -> Self {
        Self {
            tier: MatchTier::Manual,
            matched_document_number: MANUAL_REVIEW.to_string(),
            matched_note: None,
            matched_debit: None,
            difference: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.tier != MatchTier::Manual
    }
}

/// 发票 + 对应匹配结果 (报表的一行, 已取整)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub invoice: InvoiceRecord,
    pub result: MatchResult,
}

/// 投影后的结果表: 全部为字符串, 缺失值为空串
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// 对账统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total_invoices: usize,
    pub strict_matches: usize,
    pub relaxed_matches: usize,
    pub manual_review: usize,
    pub ledger_lines: usize,
    pub ledger_groups: usize,
    pub warnings: usize,
}
