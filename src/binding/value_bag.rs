// ==========================================
// 表格数据导入引擎 - 行值包
// ==========================================
// 职责: 单行解析值的按键存取;行提交或失败后即丢弃,不跨行共享
// ==========================================

use crate::binding::key::{AccessPath, BindingKey};
use crate::domain::value::{FieldValue, Value};
use crate::error::{ImportError, ImportResult};
use std::collections::HashMap;

// ==========================================
// RowValueBag - 键 → 解析值
// ==========================================
// 只包含已注册描述符对应的键;查询未注册的键是编程错误
// (KeyNotFound),不是数据校验错误。
#[derive(Debug, Default)]
pub struct RowValueBag {
    values: HashMap<BindingKey, Value>,
}

impl RowValueBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: BindingKey, value: Value) {
        self.values.insert(key, value);
    }

    /// 按键取值
    pub fn get(&self, key: &BindingKey) -> ImportResult<&Value> {
        self.values.get(key).ok_or_else(|| ImportError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// 按访问路径取值（解析为与注册时相同的键）
    pub fn get_path(&self, path: impl Into<AccessPath>) -> ImportResult<&Value> {
        let key = path.into().resolve();
        self.get(&key)
    }

    /// 按访问路径取类型化值
    ///
    /// # 返回
    /// - Ok(Some(T)): 有值且类型匹配
    /// - Ok(None): 单元格为空
    /// - Err(KeyNotFound): 键未注册
    /// - Err(RowValidation): 值与请求类型不符
    pub fn get_as<T: FieldValue>(&self, path: impl Into<AccessPath>) -> ImportResult<Option<T>> {
        let key = path.into().resolve();
        let value = self.get(&key)?;
        Option::<T>::from_value(value).ok_or_else(|| ImportError::RowValidation {
            location: String::new(),
            message: format!("键 {} 的值 {:?} 与请求类型不符", key, value),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_path_matches_registration_key() {
        let mut bag = RowValueBag::new();
        bag.insert(AccessPath::from("code").resolve(), Value::Text("A1".into()));

        // 独立构造的访问路径解析到同一键
        let value = bag.get_path(AccessPath::field("code")).unwrap();
        assert_eq!(value, &Value::Text("A1".into()));
    }

    #[test]
    fn test_absent_key_is_programming_error() {
        let bag = RowValueBag::new();
        let err = bag.get_path("missing").unwrap_err();
        assert!(matches!(err, ImportError::KeyNotFound { .. }));
    }

    #[test]
    fn test_get_as_typed() {
        let mut bag = RowValueBag::new();
        bag.insert(AccessPath::from("qty").resolve(), Value::Int(5));
        bag.insert(AccessPath::from("note").resolve(), Value::Empty);

        assert_eq!(bag.get_as::<i32>("qty").unwrap(), Some(5));
        assert_eq!(bag.get_as::<String>("note").unwrap(), None);
        assert!(bag.get_as::<String>("qty").is_err()); // 类型不符
    }
}
