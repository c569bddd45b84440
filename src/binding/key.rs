// ==========================================
// 表格数据导入引擎 - 绑定键解析
// ==========================================
// 职责: 为字段访问路径计算稳定的、与构造方式无关的标识键
// ==========================================
// 规则: 路径中的常量(下标/键名)按值渲染,因此两个独立构造、
//       仅捕获变量来源不同的等价路径必然解析为同一个键。
// ==========================================

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

// ==========================================
// BindingKey - 字段标识键
// ==========================================
// 在单个管线的描述符集合内唯一;值包与元数据表均以此为键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BindingKey(String);

impl BindingKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// PathSegment - 访问路径片段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// 字段/属性访问
    Field(Cow<'static, str>),
    /// 常量下标（按值序列化）
    Index(usize),
    /// 常量键名（按值序列化）
    Key(String),
}

// ==========================================
// AccessPath - 记录内字段的结构化访问路径
// ==========================================
// 示例: AccessPath::field("order").field("lines").index(i).field("qty")
//       解析为 "record.order.lines[3].qty"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPath {
    segments: Vec<PathSegment>,
}

impl AccessPath {
    /// 以字段访问开始一条路径
    pub fn field(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    /// 追加子字段访问
    pub fn then(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// 追加常量下标
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// 追加常量键名
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// 序列化为规范键
    ///
    /// 片段逐一渲染到以 "record" 为根的点号/下标链上。常量只保留值,
    /// 不保留来源,这正是两个独立构造的等价访问器获得同一标识的机制。
    pub fn resolve(&self) -> BindingKey {
        let mut out = String::from("record");
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                PathSegment::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
                PathSegment::Key(k) => {
                    out.push_str("[\"");
                    out.push_str(k);
                    out.push_str("\"]");
                }
            }
        }
        BindingKey(out)
    }
}

// 简写形式: "a.b" → record.a.b（程序员显式指定的符号键）
impl From<&'static str> for AccessPath {
    fn from(path: &'static str) -> Self {
        let mut parts = path.split('.');
        let mut ap = AccessPath::field(parts.next().unwrap_or_default().to_string());
        for part in parts {
            ap = ap.then(part.to_string());
        }
        ap
    }
}

impl From<AccessPath> for BindingKey {
    fn from(path: AccessPath) -> Self {
        path.resolve()
    }
}
