use indexmap::IndexMap;

use crate::config::HeaderLocation;
use crate::error::{ReconError, Result, Source};
use crate::models::{Cell, RawTable};

/// 列名 -> 列位置 (键为配置中的列名)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnBindings {
    positions: IndexMap<String, usize>,
}

impl ColumnBindings {
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// 读取某行中绑定列的单元格; 列未绑定或行过短时返回 Empty
    pub fn cell<'a>(&self, row: &'a [Cell], name: &str) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        self.position(name)
            .and_then(|idx| row.get(idx))
            .unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// 表头解析结果
#[derive(Debug, Clone)]
pub struct ResolvedTable<'a> {
    pub header_row: usize,
    pub bindings: ColumnBindings,
    /// 表头之后的数据行
    pub rows: &'a [Vec<Cell>],
}

impl ResolvedTable<'_> {
    /// 数据行 idx 对应的工作表绝对行号
    pub fn sheet_row(&self, idx: usize) -> usize {
        self.header_row + 1 + idx
    }
}

/// 定位表头并绑定列
///
/// 先精确匹配 (忽略大小写和多余空白), 再按包含关系匹配; 同一列不会绑定两次。
pub fn resolve<'a>(
    table: &'a RawTable,
    location: HeaderLocation,
    scan_rows: usize,
    required: &[&str],
    optional: &[&str],
    origin: Source,
) -> Result<ResolvedTable<'a>> {
    let attempt = |row: usize| -> std::result::Result<ResolvedTable<'a>, Vec<String>> {
        let header = table.rows.get(row).ok_or_else(|| {
            required.iter().map(|c| c.to_string()).collect::<Vec<_>>()
        })?;
        let bindings = bind_row(header, required, optional)?;
        Ok(ResolvedTable {
            header_row: row,
            bindings,
            rows: &table.rows[row + 1..],
        })
    };

    let mut best_missing: Option<Vec<String>> = None;
    let mut keep_best = |missing: Vec<String>| {
        if best_missing.as_ref().map_or(true, |b| missing.len() < b.len()) {
            best_missing = Some(missing);
        }
    };

    if let HeaderLocation::Fixed { row, scan_fallback } = location {
        match attempt(row) {
            Ok(resolved) => return Ok(resolved),
            Err(missing) if !scan_fallback => {
                return Err(schema_error(origin, missing, required));
            }
            Err(missing) => {
                tracing::warn!(
                    "{}: header not found at row {} (missing {:?}), scanning first {} rows",
                    origin,
                    row,
                    missing,
                    scan_rows
                );
                keep_best(missing);
            }
        }
    }

    for row in 0..scan_rows.min(table.len()) {
        match attempt(row) {
            Ok(resolved) => {
                tracing::info!("{}: header row detected at {}", origin, row);
                return Ok(resolved);
            }
            Err(missing) => keep_best(missing),
        }
    }

    Err(schema_error(origin, best_missing.unwrap_or_default(), required))
}

fn schema_error(origin: Source, missing: Vec<String>, required: &[&str]) -> ReconError {
    let column = missing
        .into_iter()
        .next()
        .or_else(|| required.first().map(|c| c.to_string()))
        .unwrap_or_default();
    ReconError::Schema { origin, column }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 绑定一行表头; 失败时返回缺失的必需列
fn bind_row(
    header: &[Cell],
    required: &[&str],
    optional: &[&str],
) -> std::result::Result<ColumnBindings, Vec<String>> {
    let labels: Vec<String> = header.iter().map(|c| normalize_name(&c.as_text())).collect();
    let wanted: Vec<&str> = required.iter().chain(optional.iter()).copied().collect();

    let mut positions: IndexMap<String, usize> = IndexMap::new();
    let mut used = vec![false; labels.len()];

    // 第一轮: 精确匹配
    for name in &wanted {
        let target = normalize_name(name);
        if let Some(idx) =
            (0..labels.len()).find(|&i| !used[i] && !labels[i].is_empty() && labels[i] == target)
        {
            used[idx] = true;
            positions.insert(name.to_string(), idx);
        }
    }

    // 第二轮: 包含匹配
    for name in &wanted {
        if positions.contains_key(*name) {
            continue;
        }
        let target = normalize_name(name);
        if target.is_empty() {
            continue;
        }
        if let Some(idx) = (0..labels.len()).find(|&i| !used[i] && labels[i].contains(&target)) {
            used[idx] = true;
            positions.insert(name.to_string(), idx);
        }
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !positions.contains_key(**c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(ColumnBindings { positions })
    } else {
        Err(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[&str] = &["Fecha", "Nota", "Doc Num", "Tercero", "Debitos", "Creditos"];

    fn ledger_with_title_rows(title_rows: usize) -> RawTable {
        let mut rows: Vec<Vec<&str>> = Vec::new();
        rows.push(vec!["Libro auxiliar"]);
        for _ in 1..title_rows {
            rows.push(vec!["Empresa XYZ", "Periodo 2024-01"]);
        }
        rows.push(vec!["Fecha", "Nota", "Doc Num", "Tercero", "Debitos", "Creditos"]);
        rows.push(vec!["2024-01-15", "Pago FC-550", "550", "ACME Nit: 900123456", "1000", "0"]);
        RawTable::from_text_rows(rows)
    }

    #[test]
    fn fixed_row_resolves() {
        let table = ledger_with_title_rows(3);
        let resolved = resolve(
            &table,
            HeaderLocation::Fixed { row: 3, scan_fallback: false },
            10,
            REQUIRED,
            &[],
            Source::Ledger,
        )
        .unwrap();
        assert_eq!(resolved.header_row, 3);
        assert_eq!(resolved.bindings.position("Doc Num"), Some(2));
        assert_eq!(resolved.rows.len(), 1);
        assert_eq!(resolved.sheet_row(0), 4);
    }

    #[test]
    fn wrong_fixed_row_falls_back_to_scan() {
        for title_rows in [2, 3, 4] {
            let table = ledger_with_title_rows(title_rows);
            let resolved = resolve(
                &table,
                HeaderLocation::Fixed { row: 3, scan_fallback: true },
                10,
                REQUIRED,
                &[],
                Source::Ledger,
            )
            .unwrap();
            assert_eq!(resolved.header_row, title_rows);
        }
    }

    #[test]
    fn wrong_fixed_row_without_fallback_is_schema_error() {
        let table = ledger_with_title_rows(2);
        let err = resolve(
            &table,
            HeaderLocation::Fixed { row: 3, scan_fallback: false },
            10,
            REQUIRED,
            &[],
            Source::Ledger,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Schema { origin: Source::Ledger, .. }));
    }

    #[test]
    fn missing_column_is_named() {
        let table = RawTable::from_text_rows(vec![
            vec!["Fecha", "Nota", "Doc Num", "Tercero", "Debitos"],
            vec!["2024-01-15", "x", "1", "y", "2"],
        ]);
        let err = resolve(&table, HeaderLocation::Scan, 10, REQUIRED, &[], Source::Ledger)
            .unwrap_err();
        match err {
            ReconError::Schema { column, .. } => assert_eq!(column, "Creditos"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn substring_match_after_exact() {
        let table = RawTable::from_text_rows(vec![vec![
            "Fecha Emisión",
            "  nota  contable ",
            "Doc Num",
            "Tercero (Nit)",
            "Total Debitos",
            "Total Creditos",
            "Fecha",
        ]]);
        let resolved = resolve(&table, HeaderLocation::Scan, 5, REQUIRED, &[], Source::Ledger)
            .unwrap();
        assert_eq!(resolved.bindings.position("Fecha"), Some(6));
        assert_eq!(resolved.bindings.position("Nota"), Some(1));
        assert_eq!(resolved.bindings.position("Debitos"), Some(4));
        assert_eq!(resolved.bindings.position("Creditos"), Some(5));
        assert!(resolved.rows.is_empty());
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let table = RawTable::from_text_rows(vec![vec!["Folio", "Total"]]);
        let resolved = resolve(
            &table,
            HeaderLocation::Fixed { row: 0, scan_fallback: true },
            5,
            &["Folio", "Total"],
            &["Prefijo"],
            Source::Invoices,
        )
        .unwrap();
        assert!(!resolved.bindings.contains("Prefijo"));
        assert_eq!(resolved.bindings.len(), 2);
    }
}
