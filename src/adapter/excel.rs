// ==========================================
// 表格数据导入引擎 - Excel 数据源
// ==========================================
// 支持: .xlsx / .xls 扩展名检查,读取首个工作表
// 命名引用: 工作簿定义名称(透视模式) + A1 地址兜底
// ==========================================

use crate::adapter::source::{parse_a1, RawCell, SheetExtent, SheetSource};
use crate::adapter::coerce::datetime_from_serial;
use crate::error::{ImportError, ImportResult};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// ExcelSheet
// ==========================================
pub struct ExcelSheet {
    range: Range<Data>,
    defined_names: HashMap<String, (u32, u32)>,
}

impl ExcelSheet {
    /// 打开工作簿并读取首个工作表
    pub fn open<P: AsRef<Path>>(file_path: P) -> ImportResult<Self> {
        let path = file_path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext.to_string()));
        }

        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::EmptySheet);
        }

        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 工作簿定义名称: "Sheet1!$B$2" → 坐标
        let mut defined_names = HashMap::new();
        for (name, formula) in workbook.defined_names() {
            if let Some(coords) = parse_defined_name(formula) {
                defined_names.insert(name.to_lowercase(), coords);
            }
        }

        Ok(Self {
            range,
            defined_names,
        })
    }
}

/// 定义名称公式 → 1 基坐标(仅支持单单元格引用)
fn parse_defined_name(formula: &str) -> Option<(u32, u32)> {
    let reference = formula.rsplit('!').next().unwrap_or(formula);
    if reference.contains(':') {
        return None;
    }
    parse_a1(reference.trim_matches('\''))
}

fn convert_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => match datetime_from_serial(dt.as_f64()) {
            Some(ndt) => RawCell::DateTime(ndt),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(e) => RawCell::Text(format!("{:?}", e)),
    }
}

impl SheetSource for ExcelSheet {
    fn extent(&self) -> Option<SheetExtent> {
        let start = self.range.start()?;
        let end = self.range.end()?;
        Some(SheetExtent {
            first_row: start.0 + 1,
            last_row: end.0 + 1,
            first_col: start.1 + 1,
            last_col: end.1 + 1,
        })
    }

    fn cell(&self, row: u32, col: u32) -> RawCell {
        if row == 0 || col == 0 {
            return RawCell::Empty;
        }
        match self.range.get_value((row - 1, col - 1)) {
            Some(data) => convert_cell(data),
            None => RawCell::Empty,
        }
    }

    fn resolve_reference(&self, reference: &str) -> Option<(u32, u32)> {
        self.defined_names
            .get(&reference.to_lowercase())
            .copied()
            .or_else(|| parse_a1(reference))
    }
}
