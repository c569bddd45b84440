// ==========================================
// 表格数据导入引擎 - 元数据表
// ==========================================
// 职责: 元数据行(紧邻表头的说明行)按字段键保存自由文本说明
// ==========================================

use crate::binding::key::{AccessPath, BindingKey};
use std::collections::HashMap;

// ==========================================
// MetadataMap - 键 → 说明文本
// ==========================================
// 与 RowValueBag 不同,缺失的键不是错误,返回 None
#[derive(Debug, Default, Clone)]
pub struct MetadataMap {
    captions: HashMap<BindingKey, String>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: BindingKey, caption: String) {
        self.captions.insert(key, caption);
    }

    pub fn get(&self, key: &BindingKey) -> Option<&str> {
        self.captions.get(key).map(|s| s.as_str())
    }

    pub fn get_path(&self, path: impl Into<AccessPath>) -> Option<&str> {
        let key = path.into().resolve();
        self.captions.get(&key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }
}
