// ==========================================
// 表格数据导入引擎 - 导入定义
// ==========================================
// 职责: 用户实现的定制表面;描述符注册表、记录定位与生命周期钩子
//       在一个 trait 内集中声明
// ==========================================

use crate::adapter::buffer::TabularBuffer;
use crate::binding::field::BindingSet;
use crate::binding::metadata::MetadataMap;
use crate::binding::value_bag::RowValueBag;
use crate::domain::types::{ImportConfig, ImportOutcome};
use crate::domain::value::FieldValue;
use crate::error::ImportResult;

// ==========================================
// ImportDefinition Trait
// ==========================================
// 运行器对每个批次按固定顺序调用:
//   config → bindings → (on_metadata) → sort → before_import
//   → 每行: before_process_record → 字段变更 → validate_record
//   → 整批零错误时 after_import
pub trait ImportDefinition {
    /// 目标记录类型
    type Record;
    /// 标识类型;默认值(如 0、空串)视为"无标识"
    type Id: FieldValue + Default + PartialEq;
    /// 变更器与访问器共享的外部上下文(仓储、缓存等)
    type Context;

    fn config(&self) -> ImportConfig {
        ImportConfig::default()
    }

    fn context(&self) -> &Self::Context;

    fn bindings(&self) -> &BindingSet<Self::Record, Self::Context>;

    /// 读取记录当前标识(判定 is_new)
    fn record_id(&self, record: &Self::Record) -> Self::Id;

    /// 按标识定位既有记录;None 视为该行错误
    fn find_by_id(&self, id: &Self::Id) -> Option<Self::Record>;

    /// 构造空白新记录(行值包可用于预填充)
    fn create_record(&self, values: &RowValueBag) -> Self::Record;

    /// 表头下一行是否为元数据说明行
    fn has_metadata_row(&self) -> bool {
        false
    }

    /// 元数据行读取完成(仅列模式、has_metadata_row 为真时调用)
    fn on_metadata(&mut self, _metadata: MetadataMap) {}

    /// 行处理顺序(返回缓冲区行下标的排列;行号始终按缓冲区位置计算)
    fn sort(&self, buffer: &TabularBuffer) -> Vec<usize> {
        (0..buffer.row_count()).collect()
    }

    /// 全部行解析完成、尚未处理任何记录时调用(可预加载引用数据)
    fn before_import(&mut self, _rows: &[RowValueBag]) {}

    /// 单行记录解析定位后、字段变更前调用
    fn before_process_record(&self, _record: &mut Self::Record) {}

    /// 字段变更完成后的记录级校验;Err 使该行失败并被排除出产出
    fn validate_record(&self, _record: &Self::Record) -> ImportResult<()> {
        Ok(())
    }

    /// 整批零错误提交后调用
    fn after_import(&mut self, _outcome: &ImportOutcome<Self::Record>) {}
}
