pub mod delimited;
pub mod workbook;

use crate::error::{Result, Source};
use crate::models::RawTable;

pub use delimited::write_table;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// 把上传的字节解码为原始行
///
/// 工作簿 (zip / OLE 文件头) 交给 calamine, 其余按 CSV 处理。
pub fn load_table(bytes: &[u8], name_hint: Option<&str>, origin: Source) -> Result<RawTable> {
    let is_csv_name = name_hint
        .map(|n| n.to_ascii_lowercase().ends_with(".csv"))
        .unwrap_or(false);

    if !is_csv_name && (bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC)) {
        workbook::read_first_sheet(bytes, origin)
    } else {
        delimited::read_csv(bytes, origin)
    }
}
