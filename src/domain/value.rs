// ==========================================
// 表格数据导入引擎 - 单元格值模型
// ==========================================
// 职责: 类型化单元格值的统一表示与 Rust 类型的互转
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ValueType - 列类型
// ==========================================
// 缓冲区的列类型无法表达可空性,空值统一以 Value::Empty 哨兵表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Text,
    Int,      // 32 位整数
    Long,     // 64 位整数
    Decimal,  // 定点小数
    Float,    // 单精度浮点
    Double,   // 双精度浮点
    Bool,
    Date,     // 日历日期
    DateTime, // 日期时间
}

impl ValueType {
    /// 类型名称（用于单元格解析错误消息）
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Text => "Text",
            ValueType::Int => "Int",
            ValueType::Long => "Long",
            ValueType::Decimal => "Decimal",
            ValueType::Float => "Float",
            ValueType::Double => "Double",
            ValueType::Bool => "Bool",
            ValueType::Date => "Date",
            ValueType::DateTime => "DateTime",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ==========================================
// Value - 解析后的单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Text(String),
    Int(i32),
    Long(i64),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// 值的实际类型（Empty 无类型）
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Empty => None,
            Value::Text(_) => Some(ValueType::Text),
            Value::Int(_) => Some(ValueType::Int),
            Value::Long(_) => Some(ValueType::Long),
            Value::Decimal(_) => Some(ValueType::Decimal),
            Value::Float(_) => Some(ValueType::Float),
            Value::Double(_) => Some(ValueType::Double),
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Date(_) => Some(ValueType::Date),
            Value::DateTime(_) => Some(ValueType::DateTime),
        }
    }

    /// 文本渲染（用于正则校验）
    ///
    /// # 返回
    /// - Some(String): 非空值的文本形式
    /// - None: Empty
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Empty => None,
            Value::Text(s) => Some(s.clone()),
            Value::Int(v) => Some(v.to_string()),
            Value::Long(v) => Some(v.to_string()),
            Value::Decimal(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Double(v) => Some(v.to_string()),
            Value::Bool(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            Value::DateTime(v) => Some(v.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, ""),
        }
    }
}

// ==========================================
// FieldValue - 领域类型 ⇄ 单元格值
// ==========================================
// 用途: 描述符以静态类型注册,缓冲区以 Value 存储,由此 trait 桥接。
// 域内枚举可在其名字字面量上实现本 trait（TYPE = Text）。
pub trait FieldValue: Sized {
    /// 对应的列类型
    const TYPE: ValueType;

    /// 从单元格值还原（类型不符或 Empty → None;Option 实现除外）
    fn from_value(value: &Value) -> Option<Self>;

    /// 转为单元格值
    fn into_value(self) -> Value;
}

impl FieldValue for String {
    const TYPE: ValueType = ValueType::Text;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl FieldValue for i32 {
    const TYPE: ValueType = ValueType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FieldValue for i64 {
    const TYPE: ValueType = ValueType::Long;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(*v),
            // Int 列可安全放宽到 Long 字段
            Value::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Long(self)
    }
}

impl FieldValue for Decimal {
    const TYPE: ValueType = ValueType::Decimal;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Decimal(self)
    }
}

impl FieldValue for f32 {
    const TYPE: ValueType = ValueType::Float;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FieldValue for f64 {
    const TYPE: ValueType = ValueType::Double;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl FieldValue for bool {
    const TYPE: ValueType = ValueType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FieldValue for NaiveDate {
    const TYPE: ValueType = ValueType::Date;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

impl FieldValue for NaiveDateTime {
    const TYPE: ValueType = ValueType::DateTime;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::DateTime(self)
    }
}

// Option<T>: Empty ⇄ None,可空字段的标准形式
impl<T: FieldValue> FieldValue for Option<T> {
    const TYPE: ValueType = T::TYPE;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Empty => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_bridges_empty() {
        assert_eq!(Option::<i32>::from_value(&Value::Empty), Some(None));
        assert_eq!(Option::<i32>::from_value(&Value::Int(7)), Some(Some(7)));
        // 类型不符: 整体转换失败,而不是退化为 None
        assert_eq!(Option::<i32>::from_value(&Value::Text("x".into())), None);
    }

    #[test]
    fn test_scalar_strict_typing() {
        assert_eq!(i32::from_value(&Value::Long(5)), None);
        assert_eq!(i64::from_value(&Value::Int(5)), Some(5));
        assert_eq!(String::from_value(&Value::Int(5)), None);
    }

    #[test]
    fn test_render_for_regex() {
        assert_eq!(Value::Int(42).render().as_deref(), Some("42"));
        assert_eq!(Value::Empty.render(), None);
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap())
                .render()
                .as_deref(),
            Some("2026-01-20")
        );
    }
}
