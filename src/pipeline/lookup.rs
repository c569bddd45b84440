// ==========================================
// 表格数据导入引擎 - 引用数据解析辅助
// ==========================================
// 职责: 变更器常用的"按外部标识找引用记录"模式;
//       零匹配与多匹配都是明确错误,不静默取首个
// ==========================================

use crate::error::{ImportError, ImportResult};
use std::collections::HashMap;

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// 多值查找表解析: 要求恰好一条匹配
///
/// # 返回
/// - Ok(None): key 为 None(字段未填,交由必填校验处理)
/// - Ok(Some): 恰好一条匹配
/// - Err(LookupResolution): 零匹配或多匹配
pub fn from_lookup<'a, T>(
    lookup: &'a HashMap<String, Vec<T>>,
    key: Option<&str>,
    error_prefix: Option<&str>,
) -> ImportResult<Option<&'a T>> {
    let Some(key) = key else {
        return Ok(None);
    };
    let prefix = error_prefix.unwrap_or("");
    let matches = lookup.get(key).map(|v| v.as_slice()).unwrap_or(&[]);
    match matches.len() {
        0 => Err(ImportError::LookupResolution {
            message: format!(
                "{}未找到标识为 '{}' 的 {} 记录",
                prefix,
                key,
                short_type_name::<T>()
            ),
        }),
        1 => Ok(Some(&matches[0])),
        n => Err(ImportError::LookupResolution {
            message: format!(
                "{}标识 '{}' 匹配到 {} 条 {} 记录",
                prefix,
                key,
                n,
                short_type_name::<T>()
            ),
        }),
    }
}

/// 单值字典解析: 键不存在即错误
pub fn from_map<'a, T>(
    map: &'a HashMap<String, T>,
    key: Option<&str>,
    error_prefix: Option<&str>,
) -> ImportResult<Option<&'a T>> {
    let Some(key) = key else {
        return Ok(None);
    };
    let prefix = error_prefix.unwrap_or("");
    match map.get(key) {
        Some(value) => Ok(Some(value)),
        None => Err(ImportError::LookupResolution {
            message: format!(
                "{}未找到标识为 '{}' 的 {} 记录",
                prefix,
                key,
                short_type_name::<T>()
            ),
        }),
    }
}
