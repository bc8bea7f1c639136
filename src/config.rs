use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub recon: ReconConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 上传文件大小上限 (两份文件合计)
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

/// 报表发布配置; output_dir 为空时不发布
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub output_dir: Option<String>,
}

impl AppConfig {
    /// 加载顺序: 默认值 -> 配置文件 (RECON_CONFIG, 默认 recon.toml, 可缺省) -> RECON_* 环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("RECON_CONFIG").unwrap_or_else(|_| "recon.toml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("RECON")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

// ---------------------------------------------------------------------------
// 对账引擎配置
// ---------------------------------------------------------------------------

/// 对账引擎配置 (纯数据, 不含会话/IO)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub invoices: InvoiceColumns,
    pub ledger: LedgerColumns,
    pub header: HeaderConfig,
    pub note_filter: Option<NoteFilter>,
    pub grouping: GroupingKey,
    pub matching: MatchingConfig,
    pub report: ReportConfig,
}

/// 来源 A 的列名与过滤值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceColumns {
    pub direction: String,
    pub document_type: String,
    pub document_number: String,
    pub prefix: String,
    pub issue_date: String,
    pub issuer_tax_id: String,
    pub issuer_name: String,
    pub receiver_tax_id: String,
    pub total: String,
    pub currency: String,
    /// 只保留该流向 (已收到)
    pub received_value: String,
    /// 技术回执类单据, 不是真实发票
    pub acknowledgement_type: String,
    /// 只出现在来源 A 的贷项通知单前缀
    pub credit_note_marker: String,
}

impl Default for InvoiceColumns {
    fn default() -> Self {
        Self {
            direction: "Grupo".to_string(),
            document_type: "Tipo de documento".to_string(),
            document_number: "Folio".to_string(),
            prefix: "Prefijo".to_string(),
            issue_date: "Fecha Emisión".to_string(),
            issuer_tax_id: "NIT Emisor".to_string(),
            issuer_name: "Nombre Emisor".to_string(),
            receiver_tax_id: "NIT Receptor".to_string(),
            total: "Total".to_string(),
            currency: "Divisa".to_string(),
            received_value: "Recibido".to_string(),
            acknowledgement_type: "Application response".to_string(),
            credit_note_marker: "NC".to_string(),
        }
    }
}

/// 来源 B 的列名
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerColumns {
    pub date: String,
    pub note: String,
    pub document_number: String,
    /// 带 "Nit: <digits>" 的往来单位列
    pub counterparty: String,
    pub debit: String,
    pub credit: String,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        Self {
            date: "Fecha".to_string(),
            note: "Nota".to_string(),
            document_number: "Doc Num".to_string(),
            counterparty: "Tercero".to_string(),
            debit: "Debitos".to_string(),
            credit: "Creditos".to_string(),
        }
    }
}

/// 来源 B 表头位置
///
/// `row` 为工作表绝对行号 (0 起)。导出模板在表头前插入 2~4 行标题,
/// 旧版固定取第 3 行 (第一行之后的第 2 行)。`row = None` 表示直接按内容扫描。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub row: Option<usize>,
    /// 固定行解析失败时扫描前 scan_rows 行
    pub scan_fallback: bool,
    pub scan_rows: usize,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            row: Some(3),
            scan_fallback: true,
            scan_rows: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLocation {
    Fixed { row: usize, scan_fallback: bool },
    Scan,
}

impl HeaderConfig {
    pub fn location(&self) -> HeaderLocation {
        match self.row {
            Some(row) => HeaderLocation::Fixed {
                row,
                scan_fallback: self.scan_fallback,
            },
            None => HeaderLocation::Scan,
        }
    }
}

/// 摘要过滤: 只保留以单据代码开头或含特殊标记的行 (排除工资、税金、转账等)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFilter {
    pub prefixes: Vec<String>,
    pub tags: Vec<String>,
}

impl NoteFilter {
    pub fn accepts(&self, note: &str) -> bool {
        let note = note.trim().to_lowercase();
        self.prefixes
            .iter()
            .any(|p| !p.is_empty() && note.starts_with(&p.to_lowercase()))
            || self
                .tags
                .iter()
                .any(|t| !t.is_empty() && note.contains(&t.to_lowercase()))
    }
}

/// 明细账分组粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKey {
    Document,
    #[default]
    DocumentAndNote,
    DocumentNoteDateCounterparty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// 金额比较前四舍五入的小数位数
    pub amount_scale: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { amount_scale: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub scale: i64,
    /// 输出列顺序; 本次输入中不存在的列静默忽略
    pub columns: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            columns: crate::service::assemble::DEFAULT_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}
