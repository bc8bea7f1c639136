//! 端到端: 原始字节 -> 结果表

mod common;

use tax_recon_rust::config::{GroupingKey, NoteFilter};
use tax_recon_rust::error::Source;
use tax_recon_rust::models::{MatchTier, ResultTable, MANUAL_REVIEW};
use tax_recon_rust::service::assemble::{
    COL_DIFFERENCE, COL_LEDGER_DEBIT, COL_LEDGER_NOTE, COL_MATCHED_DOCUMENT, DEFAULT_COLUMNS,
};
use tax_recon_rust::{ReconConfig, ReconError, ReconcileOutput, ReconcileService};

fn run_csv(config: ReconConfig, ledger: &str) -> ReconcileOutput {
    ReconcileService::new(config)
        .reconcile_bytes(
            common::invoices_csv().as_bytes(),
            Some("token_dian.csv"),
            ledger.as_bytes(),
            Some("libro_auxiliar.csv"),
        )
        .unwrap()
}

fn column<'a>(table: &'a ResultTable, row: usize, name: &str) -> &'a str {
    let idx = table.column_index(name).unwrap();
    &table.rows[row][idx]
}

#[test]
fn reconciles_csv_exports() {
    let output = run_csv(ReconConfig::default(), &common::ledger_csv(3));
    let table = &output.table;

    assert_eq!(table.columns, DEFAULT_COLUMNS.to_vec());
    assert_eq!(table.rows.len(), 3);

    // 差额降序: 551 (50.0), 550 (0.0), 700 (无)
    assert_eq!(column(table, 0, "Folio"), "551");
    assert_eq!(column(table, 0, COL_MATCHED_DOCUMENT), "D-101");
    assert_eq!(column(table, 0, COL_LEDGER_DEBIT), "950.0");
    assert_eq!(column(table, 0, COL_DIFFERENCE), "50.0");

    assert_eq!(column(table, 1, "Folio"), "550");
    assert_eq!(column(table, 1, COL_MATCHED_DOCUMENT), "D-100");
    assert_eq!(column(table, 1, COL_LEDGER_NOTE), "Pago FC-550 enero");
    assert_eq!(column(table, 1, COL_LEDGER_DEBIT), "1000.0");
    assert_eq!(column(table, 1, COL_DIFFERENCE), "0.0");
    assert_eq!(column(table, 1, "Total"), "1000.0");
    assert_eq!(column(table, 1, "Fecha Emisión"), "15/01/2024");

    assert_eq!(column(table, 2, "Folio"), "700");
    assert_eq!(column(table, 2, COL_MATCHED_DOCUMENT), MANUAL_REVIEW);
    assert_eq!(column(table, 2, COL_LEDGER_NOTE), "");
    assert_eq!(column(table, 2, COL_LEDGER_DEBIT), "");
    assert_eq!(column(table, 2, COL_DIFFERENCE), "");

    let summary = &output.summary;
    assert_eq!(summary.total_invoices, 3);
    assert_eq!(summary.strict_matches, 1);
    assert_eq!(summary.relaxed_matches, 1);
    assert_eq!(summary.manual_review, 1);
    assert_eq!(summary.ledger_lines, 4);
    assert_eq!(summary.ledger_groups, 3);
    assert_eq!(summary.warnings, 0);

    let tiers: Vec<MatchTier> = output.rows.iter().map(|r| r.result.tier).collect();
    assert_eq!(tiers, vec![MatchTier::Relaxed, MatchTier::Strict, MatchTier::Manual]);
}

#[test]
fn acknowledgements_and_issued_invoices_never_reach_results() {
    let output = run_csv(ReconConfig::default(), &common::ledger_csv(3));
    let folio = output.table.column_index("Folio").unwrap();
    let kind = output.table.column_index("Tipo de documento").unwrap();

    assert!(output.table.rows.iter().all(|r| r[kind] != "Application response"));
    assert!(output.table.rows.iter().all(|r| r[folio] != "999"));
}

#[test]
fn ledger_header_found_at_any_template_offset() {
    let baseline = run_csv(ReconConfig::default(), &common::ledger_csv(3));
    for preamble in [2, 4] {
        let output = run_csv(ReconConfig::default(), &common::ledger_csv(preamble));
        assert_eq!(output.table, baseline.table, "preamble of {preamble} lines");
    }
}

#[test]
fn fixed_header_without_fallback_reports_missing_column() {
    let mut config = ReconConfig::default();
    config.header.scan_fallback = false;

    let err = ReconcileService::new(config)
        .reconcile_bytes(
            common::invoices_csv().as_bytes(),
            None,
            common::ledger_csv(2).as_bytes(),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ReconError::Schema { origin: Source::Ledger, .. }));
}

#[test]
fn missing_ledger_column_is_a_schema_error() {
    let ledger = common::ledger_csv(3).replace("Debitos", "Importe");
    let err = ReconcileService::new(ReconConfig::default())
        .reconcile_bytes(common::invoices_csv().as_bytes(), None, ledger.as_bytes(), None)
        .unwrap_err();

    match err {
        ReconError::Schema { origin, column } => {
            assert_eq!(origin, Source::Ledger);
            assert_eq!(column, "Debitos");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_invoice_column_is_a_schema_error() {
    let invoices = common::invoices_csv().replace("NIT Emisor", "Emisor");
    let err = ReconcileService::new(ReconConfig::default())
        .reconcile_bytes(invoices.as_bytes(), None, common::ledger_csv(3).as_bytes(), None)
        .unwrap_err();
    assert!(matches!(err, ReconError::Schema { origin: Source::Invoices, .. }));
}

#[test]
fn workbooks_and_csv_give_the_same_table() {
    let from_csv = run_csv(ReconConfig::default(), &common::ledger_csv(3));
    let from_xlsx = ReconcileService::new(ReconConfig::default())
        .reconcile_bytes(
            &common::invoices_xlsx(),
            Some("token_dian.xlsx"),
            &common::ledger_xlsx(),
            Some("libro_auxiliar.xlsx"),
        )
        .unwrap();

    let folio = from_xlsx.table.column_index("Folio").unwrap();
    let matched = from_xlsx.table.column_index(COL_MATCHED_DOCUMENT).unwrap();
    let diff = from_xlsx.table.column_index(COL_DIFFERENCE).unwrap();
    let project = |t: &ResultTable| -> Vec<(String, String, String)> {
        t.rows
            .iter()
            .map(|r| (r[folio].clone(), r[matched].clone(), r[diff].clone()))
            .collect()
    };
    assert_eq!(project(&from_xlsx.table), project(&from_csv.table));
}

#[test]
fn note_filter_drops_unrelated_ledger_lines() {
    let config = ReconConfig {
        note_filter: Some(NoteFilter {
            prefixes: vec!["Pago".into()],
            tags: vec![],
        }),
        ..ReconConfig::default()
    };
    let output = run_csv(config, &common::ledger_csv(3));
    assert_eq!(output.summary.ledger_lines, 3);
    assert_eq!(output.summary.ledger_groups, 2);
    assert_eq!(output.summary.strict_matches, 1);
}

#[test]
fn document_grouping_merges_lines_across_notes() {
    let mut ledger = common::ledger_csv(3);
    ledger.push_str("\n2024-01-23,Ajuste FC-551,D-101,Proveedor Uno Nit: 900123456,50.00,0");

    // 按单号+摘要分组: 551 仍只命中 950
    let output = run_csv(ReconConfig::default(), &ledger);
    assert_eq!(output.summary.relaxed_matches, 1);

    // 按单号分组: D-101 合计 1000, 551 变成严格匹配
    let config = ReconConfig {
        grouping: GroupingKey::Document,
        ..ReconConfig::default()
    };
    let output = run_csv(config, &ledger);
    assert_eq!(output.summary.strict_matches, 2);
    assert_eq!(output.summary.ledger_groups, 3);
}

#[test]
fn unparseable_amounts_become_warnings() {
    let ledger = common::ledger_csv(3).replace("950.00", "n/a");
    let output = run_csv(ReconConfig::default(), &ledger);

    assert_eq!(output.summary.warnings, 1);
    assert_eq!(output.warnings[0].source, Source::Ledger);
    assert_eq!(output.warnings[0].column, "Debitos");
    let row = output.table.rows.iter().position(|r| r.contains(&"551".to_string())).unwrap();
    assert_eq!(column(&output.table, row, COL_LEDGER_DEBIT), "0.0");
    assert_eq!(column(&output.table, row, COL_DIFFERENCE), "1000.0");
}

#[test]
fn repeated_runs_are_identical() {
    let a = run_csv(ReconConfig::default(), &common::ledger_csv(3));
    let b = run_csv(ReconConfig::default(), &common::ledger_csv(3));
    assert_eq!(a.table, b.table);
}

#[test]
fn extreme_exponent_amounts_degrade_to_warnings() {
    let ledger = common::ledger_csv(3).replace("950.00", "1e-30000000");
    let invoices = common::invoices_csv().replace(",300,COP", ",1e30000000,COP");
    let output = ReconcileService::new(ReconConfig::default())
        .reconcile_bytes(invoices.as_bytes(), None, ledger.as_bytes(), None)
        .unwrap();

    assert_eq!(output.summary.warnings, 2);
    let row = output.table.rows.iter().position(|r| r.contains(&"551".to_string())).unwrap();
    assert_eq!(column(&output.table, row, COL_LEDGER_DEBIT), "0.0");
    let row = output.table.rows.iter().position(|r| r.contains(&"700".to_string())).unwrap();
    assert_eq!(column(&output.table, row, "Total"), "");
}
