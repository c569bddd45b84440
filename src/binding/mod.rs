// ==========================================
// 表格数据导入引擎 - 字段绑定层
// ==========================================
// 职责: 描述符模型(键/约束/钩子)、行值包与元数据表
// ==========================================

pub mod builder;
pub mod field;
pub mod key;
pub mod metadata;
pub mod value_bag;

pub use builder::FieldBuilder;
pub use field::{BindingSet, FieldBinding};
pub use key::{AccessPath, BindingKey, PathSegment};
pub use metadata::MetadataMap;
pub use value_bag::RowValueBag;
