use std::path::{Component, Path, PathBuf};

use rust_xlsxwriter::{Color, DocProperties, Format, Workbook};

use crate::error::{ReconError, Result};
use crate::models::ResultTable;
use crate::service::assemble::MATCH_COLUMNS;

use super::{PublishRequest, PublishedReport, ReportPublisher};

/// 浅绿色 (0.85, 0.92, 0.85)
const MATCH_HEADER_COLOR: u32 = 0xD9EBD9;

/// 把结果表写成本地 xlsx 文件
///
/// 收件人写入文档属性, 实际的共享授权由文件所在的存储负责。
pub struct XlsxPublisher {
    output_dir: PathBuf,
}

impl XlsxPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 生成工作簿字节
    pub fn render(table: &ResultTable, request: &PublishRequest) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let properties = DocProperties::new()
            .set_title(&request.display_name)
            .set_author(&request.recipient);
        workbook.set_properties(&properties);

        let header = Format::new().set_bold();
        let highlighted = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(MATCH_HEADER_COLOR));

        let sheet = workbook.add_worksheet();
        sheet.set_name("Sheet1").map_err(publish_error)?;

        for (col, name) in table.columns.iter().enumerate() {
            let format = if MATCH_COLUMNS.contains(&name.as_str()) {
                &highlighted
            } else {
                &header
            };
            sheet
                .write_string_with_format(0, col as u16, name, format)
                .map_err(publish_error)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                sheet
                    .write_string((row_idx + 1) as u32, col as u16, value)
                    .map_err(publish_error)?;
            }
        }

        sheet.set_freeze_panes(1, 0).map_err(publish_error)?;
        workbook.save_to_buffer().map_err(publish_error)
    }
}

impl ReportPublisher for XlsxPublisher {
    fn publish(&self, table: &ResultTable, request: &PublishRequest) -> Result<PublishedReport> {
        let file_name = format!("{}.xlsx", request.display_name);
        let mut components = Path::new(&file_name).components();
        if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
            return Err(ReconError::Publish(format!(
                "invalid report name '{}'",
                request.display_name
            )));
        }

        let bytes = Self::render(table, request)?;

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ReconError::Publish(format!("{}: {e}", self.output_dir.display())))?;
        let path = self.output_dir.join(&file_name);
        std::fs::write(&path, bytes)
            .map_err(|e| ReconError::Publish(format!("{}: {e}", path.display())))?;

        tracing::info!(
            "report '{}' written to {} for {}",
            request.display_name,
            path.display(),
            request.recipient
        );

        Ok(PublishedReport {
            display_name: request.display_name.clone(),
            location: path.display().to_string(),
            shared_with: vec![request.recipient.clone()],
        })
    }
}

fn publish_error(e: rust_xlsxwriter::XlsxError) -> ReconError {
    ReconError::Publish(e.to_string())
}
