pub mod xlsx;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::error::Result;
use crate::models::ResultTable;

pub use xlsx::XlsxPublisher;

/// 发布请求: 报表名称 + 授权的收件人
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub display_name: String,
    pub recipient: String,
}

/// 已发布报表的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedReport {
    pub display_name: String,
    pub location: String,
    pub shared_with: Vec<String>,
}

/// 报表发布 (在线表格服务等外部协作方实现此接口)
///
/// 约定: 冻结首行, 匹配结果列的表头浅绿色高亮, 收件人获得写权限。
pub trait ReportPublisher: Send + Sync {
    fn publish(&self, table: &ResultTable, request: &PublishRequest) -> Result<PublishedReport>;
}

/// 报表名称: "{公司}_{YYYYMMDD}_{4位随机数}"
///
/// 公司名来自客户端, 只保留字母数字、空格、'_'、'.'、'-', 其余替换为 '_';
/// 去掉开头的 '.', 结果为空时用 "report"。
pub fn display_name_for(company: &str, date: NaiveDate, suffix: u16) -> String {
    format!("{}_{}_{}", sanitize_company(company), date.format("%Y%m%d"), suffix)
}

fn sanitize_company(company: &str) -> String {
    let mapped: String = company
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = mapped.trim_start_matches('.').trim();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 以今天日期和随机后缀生成报表名称
pub fn display_name_today(company: &str) -> String {
    let suffix = rand::thread_rng().gen_range(1000..=9999);
    display_name_for(company, chrono::Local::now().date_naive(), suffix)
}
