pub mod aggregate;
pub mod assemble;
pub mod header;
pub mod matcher;
pub mod normalize;

use serde::Serialize;

use crate::config::ReconConfig;
use crate::error::{ParseWarning, Result, Source};
use crate::models::{MatchSummary, MatchTier, RawTable, ReconciledRow, ResultTable};
use crate::sheet;

pub use matcher::MatchingEngine;

/// 一次对账的完整输出
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutput {
    pub table: ResultTable,
    pub rows: Vec<ReconciledRow>,
    pub summary: MatchSummary,
    pub warnings: Vec<ParseWarning>,
}

/// 对账流程: 规范化 -> 聚合 -> 分层匹配 -> 汇总
///
/// 纯函数, 不做 IO; 同一输入重复调用结果相同。
pub fn reconcile(invoices: &RawTable, ledger: &RawTable, config: &ReconConfig) -> Result<ReconcileOutput> {
    let invoice_batch = normalize::normalize_invoices(invoices, config)?;
    let ledger_batch = normalize::normalize_ledger(ledger, config)?;

    let groups = aggregate::aggregate_lines(&ledger_batch.lines, config.grouping);

    let engine = MatchingEngine::new(&groups, config.matching.amount_scale);
    let results = engine.match_all(&invoice_batch.records);

    let mut summary = MatchSummary {
        total_invoices: results.len(),
        ledger_lines: ledger_batch.lines.len(),
        ledger_groups: groups.len(),
        ..MatchSummary::default()
    };
    for r in &results {
        match r.tier {
            MatchTier::Strict => summary.strict_matches += 1,
            MatchTier::Relaxed => summary.relaxed_matches += 1,
            MatchTier::Manual => summary.manual_review += 1,
        }
    }

    let (rows, table) =
        assemble::assemble(&invoice_batch.records, results, &invoice_batch.bindings, config);

    let mut warnings = invoice_batch.warnings;
    warnings.extend(ledger_batch.warnings);
    summary.warnings = warnings.len();

    tracing::info!(
        "对账完成: 发票 {}, 严格匹配 {}, 宽松匹配 {}, 人工核对 {}, 账簿分组 {}, 警告 {}",
        summary.total_invoices,
        summary.strict_matches,
        summary.relaxed_matches,
        summary.manual_review,
        summary.ledger_groups,
        summary.warnings
    );

    Ok(ReconcileOutput {
        table,
        rows,
        summary,
        warnings,
    })
}

/// 对账服务: 持有引擎配置, 接收上传的原始字节
pub struct ReconcileService {
    config: ReconConfig,
}

impl ReconcileService {
    pub fn new(config: ReconConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// 解码两份文件并对账; 文件名仅用于判断格式
    pub fn reconcile_bytes(
        &self,
        invoices: &[u8],
        invoices_name: Option<&str>,
        ledger: &[u8],
        ledger_name: Option<&str>,
    ) -> Result<ReconcileOutput> {
        let invoice_table = sheet::load_table(invoices, invoices_name, Source::Invoices)?;
        let ledger_table = sheet::load_table(ledger, ledger_name, Source::Ledger)?;
        tracing::info!(
            "loaded {} invoice rows and {} ledger rows",
            invoice_table.len(),
            ledger_table.len()
        );
        reconcile(&invoice_table, &ledger_table, &self.config)
    }
}
