// ==========================================
// 表格数据导入引擎 - 领域层
// ==========================================
// 职责: 单元格值模型与批次产出结构
// ==========================================

pub mod types;
pub mod value;

pub use types::{ImportConfig, ImportMode, ImportOutcome, ImportSummary, ImportedRecord};
pub use value::{FieldValue, Value, ValueType};
