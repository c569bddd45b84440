// ==========================================
// 表格数据导入引擎 - 表格适配器
// ==========================================
// 职责: 物理数据源 → 中间缓冲
//       列模式: 表头解析(占位/去重后缀) + 缺列聚合检查 + 整表定型
//       透视模式: 命名单元格 → 单行缓冲
// ==========================================

use crate::adapter::buffer::{Column, TabularBuffer};
use crate::adapter::coerce::coerce;
use crate::adapter::source::{cell_address, SheetSource};
use crate::binding::field::BindingSet;
use crate::binding::metadata::MetadataMap;
use crate::domain::types::ImportConfig;
use crate::domain::value::Value;
use crate::error::{ImportError, ImportResult};
use tracing::debug;

// ==========================================
// TabularAdapter
// ==========================================
pub struct TabularAdapter<'a, D, C> {
    bindings: &'a BindingSet<D, C>,
    config: &'a ImportConfig,
}

impl<'a, D, C> TabularAdapter<'a, D, C> {
    pub fn new(bindings: &'a BindingSet<D, C>, config: &'a ImportConfig) -> Self {
        Self { bindings, config }
    }

    // ==========================================
    // 列模式
    // ==========================================

    /// 整表读入缓冲
    ///
    /// # 流程
    /// 1. row_start 行解析表头: 空白格 → `Header_<列号>` 占位,
    ///    重名列追加 `_<出现次数>` 后缀
    /// 2. 所有描述符列名必须在表头出现,缺失的聚合为一个错误上抛
    /// 3. 逐行按列类型定型;单元格错误带 A1 地址聚合,整表失败
    /// 4. wants_metadata 时表头下一行作为元数据行读出,不进入数据
    pub fn buffer_from_sheet(
        &self,
        sheet: &dyn SheetSource,
        wants_metadata: bool,
    ) -> ImportResult<(TabularBuffer, Option<MetadataMap>)> {
        let Some(extent) = sheet.extent() else {
            // 完全空白的数据源: 零列零行,管线产出空批次
            return Ok((TabularBuffer::new(Vec::new()), None));
        };

        let header_row = self.config.row_start;
        let columns = self.resolve_headers(sheet, header_row, extent.last_col);
        debug!(columns = columns.len(), header_row, "表头解析完成");

        // 缺列检查: 在读取数据行之前聚合上抛
        let mut missing = Vec::new();
        for binding in self.bindings.iter() {
            let found = columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(binding.column()));
            if !found {
                missing.push(ImportError::ColumnMissing {
                    column: binding.column().to_string(),
                });
            }
        }
        if let Some(err) = ImportError::aggregate(missing) {
            return Err(err);
        }

        let metadata = if wants_metadata {
            Some(self.read_metadata(sheet, header_row + 1, &columns))
        } else {
            None
        };

        let mut buffer = TabularBuffer::new(columns);
        let mut errors = Vec::new();

        let first_data = header_row + 1 + if wants_metadata { 1 } else { 0 };
        let last_data = match self.config.row_end {
            Some(end) => end.min(extent.last_row),
            None => extent.last_row,
        };

        for row in first_data..=last_data {
            let mut cells = Vec::with_capacity(buffer.column_count());
            for (i, column) in buffer.columns().iter().enumerate() {
                let col = i as u32 + 1;
                let raw = sheet.cell(row, col);
                match coerce(&raw, column.value_type) {
                    Ok(value) => cells.push(value),
                    Err(message) => {
                        errors.push(ImportError::CellParse {
                            address: cell_address(row, col),
                            type_name: column
                                .value_type
                                .map(|t| t.name())
                                .unwrap_or("Text")
                                .to_string(),
                            message,
                        });
                        // 占位保持行形状,整表最终仍会失败
                        cells.push(Value::Empty);
                    }
                }
            }
            buffer.push_row(cells);
        }

        if let Some(err) = ImportError::aggregate(errors) {
            return Err(err);
        }
        Ok((buffer, metadata))
    }

    /// 表头解析: 占位与去重后缀
    fn resolve_headers(
        &self,
        sheet: &dyn SheetSource,
        header_row: u32,
        last_col: u32,
    ) -> Vec<Column> {
        let mut raw_names: Vec<String> = Vec::new();
        let mut columns = Vec::new();

        for col in 1..=last_col {
            let text = sheet.cell(header_row, col).to_text().trim().to_string();
            let name = if text.is_empty() {
                format!("Header_{}", col)
            } else {
                text
            };
            raw_names.push(name.clone());

            // 第 n 次出现(n >= 2)的重名列追加 _n 后缀
            let occurrences = raw_names
                .iter()
                .filter(|n| n.eq_ignore_ascii_case(&name))
                .count();
            let resolved = if occurrences > 1 {
                format!("{}_{}", name, occurrences)
            } else {
                name
            };

            let value_type = self
                .bindings
                .find_by_column(&resolved)
                .map(|b| b.value_type());
            columns.push(Column::new(resolved, value_type));
        }
        columns
    }

    /// 元数据行: 与描述符列对齐的说明文本
    fn read_metadata(
        &self,
        sheet: &dyn SheetSource,
        meta_row: u32,
        columns: &[Column],
    ) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        for (i, column) in columns.iter().enumerate() {
            let Some(binding) = self.bindings.find_by_column(&column.name) else {
                continue;
            };
            let caption = sheet.cell(meta_row, i as u32 + 1).to_text();
            let caption = caption.trim();
            if !caption.is_empty() {
                metadata.insert(binding.key().clone(), caption.to_string());
            }
        }
        metadata
    }

    // ==========================================
    // 透视模式
    // ==========================================

    /// 单记录读入: 每个描述符的列名作为命名单元格引用解析
    ///
    /// 产出恰好一行的缓冲;引用缺失或定型失败以描述符列名定位,聚合上抛
    pub fn buffer_from_sheet_pivot(&self, sheet: &dyn SheetSource) -> ImportResult<TabularBuffer> {
        let mut columns = Vec::new();
        let mut cells = Vec::new();
        let mut errors = Vec::new();

        for binding in self.bindings.iter() {
            columns.push(Column::new(binding.column(), Some(binding.value_type())));
            match sheet.resolve_reference(binding.column()) {
                Some((row, col)) => {
                    let raw = sheet.cell(row, col);
                    match coerce(&raw, Some(binding.value_type())) {
                        Ok(value) => cells.push(value),
                        Err(message) => {
                            errors.push(ImportError::CellParse {
                                address: binding.column().to_string(),
                                type_name: binding.value_type().name().to_string(),
                                message,
                            });
                            cells.push(Value::Empty);
                        }
                    }
                }
                None => {
                    errors.push(ImportError::CellParse {
                        address: binding.column().to_string(),
                        type_name: binding.value_type().name().to_string(),
                        message: "命名引用不存在".to_string(),
                    });
                    cells.push(Value::Empty);
                }
            }
        }

        if let Some(err) = ImportError::aggregate(errors) {
            return Err(err);
        }
        let mut buffer = TabularBuffer::new(columns);
        buffer.push_row(cells);
        Ok(buffer)
    }
}
