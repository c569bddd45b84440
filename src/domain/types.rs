// ==========================================
// 表格数据导入引擎 - 领域类型定义
// ==========================================
// 职责: 导入模式、管线配置、批次产出结构
// ==========================================

use crate::binding::value_bag::RowValueBag;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// 导入模式 (Import Mode)
// ==========================================
// 整批策略: 仅更新 / 仅新建 / 两者皆可
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportMode {
    Update, // 仅更新既有记录
    Create, // 仅新建记录
    Full,   // 新建 + 更新
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Update => write!(f, "UPDATE"),
            ImportMode::Create => write!(f, "CREATE"),
            ImportMode::Full => write!(f, "FULL"),
        }
    }
}

// ==========================================
// 管线配置 (Import Config)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 是否支持更新（需要标识描述符）
    pub supports_update: bool,
    /// 单记录透视模式（按命名单元格寻址,而非按列）
    pub by_cell_reference: bool,
    /// 表头所在行（1 基）
    pub row_start: u32,
    /// 数据截止行（None = 工作表末行）
    pub row_end: Option<u32>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            supports_update: true,
            by_cell_reference: false,
            row_start: 1,
            row_end: None,
        }
    }
}

// ==========================================
// ImportedRecord - 单行提交产物
// ==========================================
// 提交后不可变; is_new 在解析阶段一次性判定,之后不再改变
#[derive(Debug)]
pub struct ImportedRecord<D> {
    pub record: D,
    pub values: RowValueBag,
    pub is_new: bool,
}

// ==========================================
// ImportSummary - 批次统计
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,    // 缓冲区行数（含空白行）
    pub imported: usize,      // 提交记录数
    pub created: usize,       // 其中新建
    pub updated: usize,       // 其中更新
    pub skipped_blank: usize, // 跳过的全空白行
    pub elapsed_ms: u64,
}

// ==========================================
// ImportOutcome - 批次产出
// ==========================================
// 仅在整批零错误时构造;任何错误都会导致整批失败并聚合上抛
#[derive(Debug)]
pub struct ImportOutcome<D> {
    pub batch_id: Uuid,
    pub mode: ImportMode,
    pub records: Vec<ImportedRecord<D>>,
    pub summary: ImportSummary,
}

impl<D> ImportOutcome<D> {
    /// 批次统计的 JSON 视图（用于日志与报表）
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "batch_id": self.batch_id,
            "mode": self.mode,
            "summary": &self.summary,
        })
    }
}
