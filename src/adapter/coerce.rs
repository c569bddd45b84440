// ==========================================
// 表格数据导入引擎 - 单元格类型强制转换
// ==========================================
// 职责: 原始单元格值 → 目标列类型;失败返回消息文本,
//       由适配层补充单元格地址后聚合上报
// ==========================================

use crate::adapter::source::RawCell;
use crate::domain::value::{Value, ValueType};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

// 序列号日期纪元(1900 日期系统,含闰年兼容偏移)
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 日期序列号 → 时间戳(整数部分为天,小数部分为当日秒数)
pub fn datetime_from_serial(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(SERIAL_EPOCH.0, SERIAL_EPOCH.1, SERIAL_EPOCH.2)?;
    let days = serial.floor() as i64;
    let secs = ((serial - serial.floor()) * 86_400.0).round() as i64;
    let date = epoch.checked_add_signed(Duration::days(days))?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(secs))
}

/// 按目标类型转换单元格
///
/// 规则:
/// - 无目标类型(非描述符列)按 Text 处理
/// - 空白单元格一律得到 Empty,不报错
/// - Yes/No 文本按布尔识别
pub fn coerce(raw: &RawCell, target: Option<ValueType>) -> Result<Value, String> {
    let Some(target) = target else {
        return coerce(raw, Some(ValueType::Text));
    };
    if raw.is_blank() {
        return Ok(Value::Empty);
    }

    match target {
        ValueType::Text => Ok(Value::Text(raw.to_text())),

        ValueType::Date => match raw {
            RawCell::DateTime(dt) => Ok(Value::Date(dt.date())),
            RawCell::Number(serial) => datetime_from_serial(*serial)
                .map(|dt| Value::Date(dt.date()))
                .ok_or_else(|| format!("序列号 {} 超出日期范围", serial)),
            RawCell::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| format!("'{}' 不是有效日期", s)),
            _ => Err("无法转换为日期".to_string()),
        },

        ValueType::DateTime => match raw {
            RawCell::DateTime(dt) => Ok(Value::DateTime(*dt)),
            RawCell::Number(serial) => datetime_from_serial(*serial)
                .map(Value::DateTime)
                .ok_or_else(|| format!("序列号 {} 超出日期范围", serial)),
            RawCell::Text(s) => parse_datetime_text(s.trim())
                .map(Value::DateTime)
                .ok_or_else(|| format!("'{}' 不是有效日期时间", s)),
            _ => Err("无法转换为日期时间".to_string()),
        },

        ValueType::Int => coerce_integer(raw, i64::from(i32::MIN), i64::from(i32::MAX))
            .map(|n| Value::Int(n as i32)),

        ValueType::Long => coerce_integer(raw, i64::MIN, i64::MAX).map(Value::Long),

        ValueType::Decimal => match raw {
            RawCell::Number(n) => Decimal::from_f64_retain(*n)
                .map(Value::Decimal)
                .ok_or_else(|| format!("{} 超出十进制数范围", n)),
            RawCell::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|_| format!("'{}' 不是有效数值", s)),
            _ => Err("无法转换为十进制数".to_string()),
        },

        ValueType::Float => match raw {
            RawCell::Number(n) => Ok(Value::Float(*n as f32)),
            RawCell::Text(s) => s
                .trim()
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|_| format!("'{}' 不是有效数值", s)),
            _ => Err("无法转换为浮点数".to_string()),
        },

        ValueType::Double => match raw {
            RawCell::Number(n) => Ok(Value::Double(*n)),
            RawCell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| format!("'{}' 不是有效数值", s)),
            _ => Err("无法转换为浮点数".to_string()),
        },

        ValueType::Bool => match raw {
            RawCell::Bool(b) => Ok(Value::Bool(*b)),
            RawCell::Number(n) => Ok(Value::Bool(*n != 0.0)),
            RawCell::Text(s) => match s.trim() {
                t if t.eq_ignore_ascii_case("yes") => Ok(Value::Bool(true)),
                t if t.eq_ignore_ascii_case("no") => Ok(Value::Bool(false)),
                t if t.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                t if t.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                t => Err(format!("'{}' 不是有效布尔值", t)),
            },
            _ => Err("无法转换为布尔值".to_string()),
        },
    }
}

fn coerce_integer(raw: &RawCell, min: i64, max: i64) -> Result<i64, String> {
    let n = match raw {
        RawCell::Number(n) => {
            if n.fract() != 0.0 {
                return Err(format!("{} 不是整数", n));
            }
            *n as i64
        }
        RawCell::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{}' 不是有效整数", s))?,
        _ => return Err("无法转换为整数".to_string()),
    };
    if n < min || n > max {
        return Err(format!("{} 超出整数范围", n));
    }
    Ok(n)
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
