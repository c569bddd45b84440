// ==========================================
// 表格数据导入引擎 - 核心库
// ==========================================
// 定位: 声明式表格数据导入 - 字段绑定 / 批量校验 / 创建更新
// 技术栈: calamine + csv + chrono + rust_decimal
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值模型与批次类型
pub mod domain;

// 绑定层 - 字段描述符与行值包
pub mod binding;

// 适配层 - 物理数据源与表格缓冲
pub mod adapter;

// 管线层 - 导入定义与批次运行器
pub mod pipeline;

// 错误类型
pub mod error;

// 日志初始化
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 错误
pub use error::{ImportError, ImportResult};

// 领域
pub use domain::types::{
    ImportConfig, ImportMode, ImportOutcome, ImportSummary, ImportedRecord,
};
pub use domain::value::{FieldValue, Value, ValueType};

// 绑定
pub use binding::{
    AccessPath, BindingKey, BindingSet, FieldBinding, FieldBuilder, MetadataMap, RowValueBag,
};

// 适配
pub use adapter::{
    load_csv, Column, ExcelSheet, GridSheet, RawCell, SheetExtent, SheetSource, TabularAdapter,
    TabularBuffer,
};

// 管线
pub use pipeline::{from_lookup, from_map, import_from_buffer, import_from_sheet, ImportDefinition};

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 库名称
pub const APP_NAME: &str = "表格数据导入引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
