// ==========================================
// 表格数据导入引擎 - 中间表格缓冲
// ==========================================
// 职责: 列定义 + 已定型的行数据;管道阶段统一从这里取值,
//       不再接触物理数据源
// ==========================================

use crate::domain::value::{Value, ValueType};
use crate::error::{ImportError, ImportResult};
use std::collections::HashMap;

// ==========================================
// Column - 列定义
// ==========================================
// value_type 为 None 表示非描述符列,按文本保留
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub value_type: Option<ValueType>,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: Option<ValueType>) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

// ==========================================
// TabularBuffer - 列定义 + 行数据
// ==========================================
#[derive(Debug, Default)]
pub struct TabularBuffer {
    columns: Vec<Column>,
    // 列名(小写) → 下标;重名时保留首个
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl TabularBuffer {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut index = HashMap::new();
        for (i, col) in columns.iter().enumerate() {
            index.entry(col.name.to_lowercase()).or_insert(i);
        }
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// 按 (列名, 类型) 构造（测试与手工构表用）
    pub fn with_columns(columns: &[(&str, Option<ValueType>)]) -> Self {
        Self::new(
            columns
                .iter()
                .map(|(name, ty)| Column::new(*name, *ty))
                .collect(),
        )
    }

    /// 追加一行;短行以 Empty 补齐,超长部分丢弃
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    /// 列名查找（忽略大小写）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// 按列名读取单元格;列不存在报 ColumnMissing
    pub fn value(&self, row: usize, column: &str) -> ImportResult<&Value> {
        let col = self
            .column_index(column)
            .ok_or_else(|| ImportError::ColumnMissing {
                column: column.to_string(),
            })?;
        Ok(&self.rows[row][col])
    }

    /// 整行皆空视为空白行
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.row(row).iter().all(|v| v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TabularBuffer {
        let mut buffer = TabularBuffer::with_columns(&[
            ("Code", Some(ValueType::Text)),
            ("Qty", Some(ValueType::Int)),
        ]);
        buffer.push_row(vec![Value::Text("M1".into()), Value::Int(3)]);
        buffer.push_row(vec![Value::Empty, Value::Empty]);
        buffer
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let buffer = sample();
        assert_eq!(buffer.column_index("code"), Some(0));
        assert_eq!(buffer.column_index("QTY"), Some(1));
        assert_eq!(buffer.column_index("Nope"), None);
    }

    #[test]
    fn test_missing_column_is_error() {
        let buffer = sample();
        let err = buffer.value(0, "Nope").unwrap_err();
        assert!(matches!(err, ImportError::ColumnMissing { .. }));
    }

    #[test]
    fn test_short_row_padded_with_empty() {
        let mut buffer = TabularBuffer::with_columns(&[("A", None), ("B", None)]);
        buffer.push_row(vec![Value::Text("x".into())]);
        assert_eq!(buffer.value(0, "B").unwrap(), &Value::Empty);
        assert_eq!(
            buffer.row(0),
            &[Value::Text("x".into()), Value::Empty]
        );
    }

    #[test]
    fn test_blank_row_detection() {
        let buffer = sample();
        assert!(!buffer.is_blank_row(0));
        assert!(buffer.is_blank_row(1));
    }
}
