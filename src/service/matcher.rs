use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::models::{InvoiceRecord, LedgerGroup, MatchResult, MatchTier};

/// 分层匹配引擎
///
/// 每张发票依次尝试:
/// 1. 严格: 税号相同 + 借方合计与发票总额 (按 amount_scale 取整后) 相等 + 摘要包含单号
/// 2. 宽松: 税号相同 + 摘要包含单号
///
/// 多个候选时取分组顺序 (文件顺序) 中的第一个, 不做进一步区分。
/// 一个分组可以被多张发票命中。
pub struct MatchingEngine<'a> {
    groups: &'a [LedgerGroup],
    /// 倒排索引: 税号 -> 分组下标 (升序)
    by_tax_id: HashMap<&'a str, Vec<usize>>,
    amount_scale: i64,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(groups: &'a [LedgerGroup], amount_scale: i64) -> Self {
        let mut by_tax_id: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, group) in groups.iter().enumerate() {
            if let Some(tax_id) = group.representative_tax_id.as_deref() {
                by_tax_id.entry(tax_id).or_default().push(idx);
            }
        }
        Self {
            groups,
            by_tax_id,
            amount_scale,
        }
    }

    /// 匹配全部发票, 结果与输入一一对应
    pub fn match_all(&self, invoices: &[InvoiceRecord]) -> Vec<MatchResult> {
        invoices.iter().map(|inv| self.match_invoice(inv)).collect()
    }

    /// 单张发票匹配; 从不失败, 找不到时返回人工核对标记
    pub fn match_invoice(&self, invoice: &InvoiceRecord) -> MatchResult {
        if invoice.issuer_tax_id.is_empty() || invoice.document_number.is_empty() {
            tracing::debug!(
                "invoice row {}: missing tax id or document number, manual review",
                invoice.source_row
            );
            return MatchResult::manual();
        }

        let candidates: Vec<&LedgerGroup> = self
            .by_tax_id
            .get(invoice.issuer_tax_id.as_str())
            .map(|idxs| {
                idxs.iter()
                    .map(|&i| &self.groups[i])
                    .filter(|g| g.representative_note.contains(&invoice.document_number))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(total) = &invoice.total_amount {
            let target = total.round(self.amount_scale);
            if let Some(group) = candidates
                .iter()
                .find(|g| g.total_debit.round(self.amount_scale) == target)
            {
                tracing::debug!(
                    "invoice {} matched strictly to document {}",
                    invoice.document_number,
                    group.document_number
                );
                return Self::matched(MatchTier::Strict, invoice, group);
            }
        }

        match candidates.first() {
            Some(group) => {
                tracing::debug!(
                    "invoice {} matched by tax id and note to document {}",
                    invoice.document_number,
                    group.document_number
                );
                Self::matched(MatchTier::Relaxed, invoice, group)
            }
            None => MatchResult::manual(),
        }
    }

    fn matched(tier: MatchTier, invoice: &InvoiceRecord, group: &LedgerGroup) -> MatchResult {
        let difference: Option<BigDecimal> = invoice
            .total_amount
            .as_ref()
            .map(|total| total - &group.total_debit);
        MatchResult {
            tier,
            matched_document_number: group.document_number.clone(),
            matched_note: Some(group.representative_note.clone()),
            matched_debit: Some(group.total_debit.clone()),
            difference,
        }
    }
}
