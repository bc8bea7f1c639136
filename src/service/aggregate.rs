use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;

use crate::config::GroupingKey;
use crate::models::{GroupKey, LedgerGroup, LedgerLine};

/// 按单据聚合明细账行
///
/// 分组顺序 = 首次出现顺序, "首行" = 文件中最早的行。单号为空的分组被丢弃。
pub fn aggregate_lines(lines: &[LedgerLine], grouping: GroupingKey) -> Vec<LedgerGroup> {
    let mut groups: IndexMap<GroupKey, LedgerGroup> = IndexMap::new();

    for line in lines {
        let key = group_key(line, grouping);
        let group = groups.entry(key.clone()).or_insert_with(|| LedgerGroup {
            key,
            document_number: line.document_number.trim().to_string(),
            total_debit: BigDecimal::zero(),
            total_credit: BigDecimal::zero(),
            representative_counterparty: line.counterparty_name.clone(),
            representative_tax_id: line.extracted_tax_id.clone(),
            representative_note: line.note_text.clone(),
            line_count: 0,
            first_row: line.source_row,
        });
        group.total_debit += &line.debit_amount;
        group.total_credit += &line.credit_amount;
        group.line_count += 1;
    }

    let total = groups.len();
    let kept: Vec<LedgerGroup> = groups
        .into_values()
        .filter(|g| !g.document_number.is_empty())
        .collect();

    tracing::info!(
        "ledger: {} lines aggregated into {} groups ({} without document number dropped)",
        lines.len(),
        kept.len(),
        total - kept.len()
    );
    kept
}

fn group_key(line: &LedgerLine, grouping: GroupingKey) -> GroupKey {
    let document_number = line.document_number.trim().to_string();
    match grouping {
        GroupingKey::Document => GroupKey {
            document_number,
            note_text: None,
            transaction_date: None,
            counterparty_name: None,
        },
        GroupingKey::DocumentAndNote => GroupKey {
            document_number,
            note_text: Some(line.note_text.clone()),
            transaction_date: None,
            counterparty_name: None,
        },
        GroupingKey::DocumentNoteDateCounterparty => GroupKey {
            document_number,
            note_text: Some(line.note_text.clone()),
            transaction_date: Some(
                line.transaction_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| line.transaction_date_text.clone()),
            ),
            counterparty_name: Some(line.counterparty_name.clone()),
        },
    }
}
