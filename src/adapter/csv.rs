// ==========================================
// 表格数据导入引擎 - CSV 数据源
// ==========================================
// 职责: CSV 文件 → 文本网格;表头解析与定型交给适配器,
//       因此不消费首行表头
// ==========================================

use crate::adapter::source::{GridSheet, RawCell};
use crate::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// 读取 CSV 文件为内存网格(首行保留,由适配器按 row_start 解析表头)
pub fn load_csv<P: AsRef<Path>>(file_path: P) -> ImportResult<GridSheet> {
    let path = file_path.as_ref();

    // 检查文件存在
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    // 检查扩展名
    if let Some(ext) = path.extension() {
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(
                ext.to_string_lossy().to_string(),
            ));
        }
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let mut sheet = GridSheet::default();
    for result in reader.records() {
        let record = result?;
        let row: Vec<RawCell> = record
            .iter()
            .map(|field| {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(trimmed.to_string())
                }
            })
            .collect();
        sheet.push_row(row);
    }
    Ok(sheet)
}
