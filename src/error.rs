use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 数据来源: A = 税局发票导出 (Token DIAN), B = 明细账 (Libro Auxiliar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Invoices,
    Ledger,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoices => write!(f, "invoices"),
            Self::Ledger => write!(f, "ledger"),
        }
    }
}

/// 对账错误 (整批中止)
#[derive(Debug, Error)]
pub enum ReconError {
    /// 必需列缺失
    #[error("{origin}: required column '{column}' not found")]
    Schema { origin: Source, column: String },

    /// 表格文件无法解析
    #[error("{origin}: cannot decode table: {message}")]
    Load { origin: Source, message: String },

    #[error("{origin}: workbook contains no worksheets")]
    EmptyWorkbook { origin: Source },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("publish failed: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, ReconError>;

/// 单元格转换失败 - 不中止，只记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub source: Source,
    /// 工作表中的绝对行号 (0 起)
    pub row: usize,
    pub column: String,
    pub value: String,
    pub reason: &'static str,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {} column '{}': {} ('{}')",
            self.source, self.row, self.column, self.reason, self.value
        )
    }
}
