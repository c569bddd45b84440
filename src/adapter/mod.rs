// ==========================================
// 表格数据导入引擎 - 数据源适配层
// ==========================================
// 职责: 物理数据源(Excel/CSV/内存网格) → 中间表格缓冲
// ==========================================

pub mod buffer;
pub mod coerce;
pub mod csv;
pub mod excel;
pub mod source;
pub mod tabular_adapter;

pub use buffer::{Column, TabularBuffer};
pub use csv::load_csv;
pub use excel::ExcelSheet;
pub use source::{cell_address, GridSheet, RawCell, SheetExtent, SheetSource};
pub use tabular_adapter::TabularAdapter;
