// ==========================================
// 表格数据导入引擎 - 表格数据源接口
// ==========================================
// 职责: 定义适配层消费的最小数据源表面:
//       二维可寻址单元格 + 范围报告 + 命名引用解析
// ==========================================

use chrono::NaiveDateTime;
use std::collections::HashMap;

// ==========================================
// RawCell - 源单元格原始值
// ==========================================
// 物理格式解码由数据源实现负责,适配层只见这几种形态
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// 文本渲染（表头解析与 Text 列直通用）
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Number(n) => n.to_string(),
            RawCell::Bool(b) => b.to_string(),
            RawCell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

// ==========================================
// SheetExtent - 数据源范围（1 基,含端点）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetExtent {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

// ==========================================
// SheetSource Trait
// ==========================================
// 实现者: ExcelSheet（calamine）、GridSheet（内存/CSV/测试）
pub trait SheetSource {
    /// 数据范围;None 表示完全空白的数据源
    fn extent(&self) -> Option<SheetExtent>;

    /// 读取单元格（1 基坐标;范围外返回 Empty）
    fn cell(&self, row: u32, col: u32) -> RawCell;

    /// 解析命名引用（透视模式）: 命名单元格或 A1 地址 → 坐标
    fn resolve_reference(&self, reference: &str) -> Option<(u32, u32)>;
}

/// A1 风格单元格地址（错误消息用）: (3, 2) → "B3"
pub fn cell_address(row: u32, col: u32) -> String {
    let mut letters = String::new();
    let mut c = col;
    while c > 0 {
        let rem = ((c - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        c = (c - 1) / 26;
    }
    format!("{}{}", letters, row)
}

/// 解析 A1 风格地址（忽略 '$' 前缀）
pub fn parse_a1(reference: &str) -> Option<(u32, u32)> {
    let cleaned: String = reference.chars().filter(|c| *c != '$').collect();
    let letters: String = cleaned
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let digits: String = cleaned
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic())
        .collect();

    if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut col: u32 = 0;
    for ch in letters.chars() {
        col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 || col == 0 {
        return None;
    }
    Some((row, col))
}

// ==========================================
// GridSheet - 内存数据源
// ==========================================
// 用途: 测试夹具、CSV 加载结果
#[derive(Debug, Default)]
pub struct GridSheet {
    rows: Vec<Vec<RawCell>>,
    names: HashMap<String, (u32, u32)>,
}

impl GridSheet {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self {
            rows,
            names: HashMap::new(),
        }
    }

    /// 注册命名引用（透视模式测试用）
    pub fn with_name(mut self, name: impl Into<String>, row: u32, col: u32) -> Self {
        self.names.insert(name.into().to_lowercase(), (row, col));
        self
    }

    /// 从文本行构造（空字符串 → Empty）
    pub fn from_text_rows(rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|s| {
                            if s.trim().is_empty() {
                                RawCell::Empty
                            } else {
                                RawCell::Text(s.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    pub(crate) fn push_row(&mut self, row: Vec<RawCell>) {
        self.rows.push(row);
    }
}

impl SheetSource for GridSheet {
    fn extent(&self) -> Option<SheetExtent> {
        if self.rows.is_empty() {
            return None;
        }
        let last_col = self.rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if last_col == 0 {
            return None;
        }
        Some(SheetExtent {
            first_row: 1,
            last_row: self.rows.len() as u32,
            first_col: 1,
            last_col: last_col as u32,
        })
    }

    fn cell(&self, row: u32, col: u32) -> RawCell {
        if row == 0 || col == 0 {
            return RawCell::Empty;
        }
        self.rows
            .get((row - 1) as usize)
            .and_then(|r| r.get((col - 1) as usize))
            .cloned()
            .unwrap_or(RawCell::Empty)
    }

    fn resolve_reference(&self, reference: &str) -> Option<(u32, u32)> {
        self.names
            .get(&reference.to_lowercase())
            .copied()
            .or_else(|| parse_a1(reference))
    }
}
