// ==========================================
// 表格数据导入引擎 - 导入管线
// ==========================================
// 职责: 导入定义 trait、批次运行器与引用数据解析辅助
// ==========================================

pub mod definition;
pub mod lookup;
pub mod runner;

pub use definition::ImportDefinition;
pub use lookup::{from_lookup, from_map};
pub use runner::{import_from_buffer, import_from_sheet};
