// ==========================================
// 表格数据导入引擎 - 错误类型
// ==========================================
// 职责: 定义导入全流程的错误分类与聚合
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入引擎错误类型
///
/// 行级错误（TypeMismatch / RowValidation / FieldMutation）在整批范围内
/// 收集，最终以 Aggregate 一次性上抛；配置类错误（Configuration /
/// ColumnMissing）在进入行处理之前立即失败。
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 配置错误（注册期） =====
    #[error("配置错误: {0}")]
    Configuration(String),

    // ===== 列解析错误（建表期） =====
    #[error("缺少列 \"{column}\"")]
    ColumnMissing { column: String },

    #[error("单元格 {address} 无法解析为 {type_name}: {message}")]
    CellParse {
        address: String,
        type_name: String,
        message: String,
    },

    #[error("工作表为空")]
    EmptySheet,

    // ===== 行级错误（批处理期） =====
    #[error("校验失败{location}: 导入模式为 {mode}，记录标识与模式不符")]
    TypeMismatch { location: String, mode: String },

    #[error("校验失败{location}: {message}")]
    RowValidation { location: String, message: String },

    #[error("导入失败{location}: {message}")]
    FieldMutation { location: String, message: String },

    #[error("引用解析失败: {message}")]
    LookupResolution { message: String },

    // ===== 程序性错误 =====
    #[error("绑定键未注册: {key}")]
    KeyNotFound { key: String },

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 聚合错误 =====
    #[error("导入批次失败，共 {} 个错误: {}", .0.len(), format_aggregate(.0))]
    Aggregate(Vec<ImportError>),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 将错误列表折叠为单一错误
    ///
    /// # 返回
    /// - None: 列表为空（无错误）
    /// - Some(Aggregate): 非空列表
    pub fn aggregate(errors: Vec<ImportError>) -> Option<ImportError> {
        if errors.is_empty() {
            None
        } else {
            Some(ImportError::Aggregate(errors))
        }
    }

    /// 展开聚合错误的叶子列表（非聚合错误返回单元素切片）
    pub fn leaves(&self) -> Vec<&ImportError> {
        match self {
            ImportError::Aggregate(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

fn format_aggregate(errors: &[ImportError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(ImportError::aggregate(vec![]).is_none());
    }

    #[test]
    fn test_aggregate_collects_all_leaves() {
        let agg = ImportError::aggregate(vec![
            ImportError::ColumnMissing {
                column: "Code".to_string(),
            },
            ImportError::RowValidation {
                location: " (行 3)".to_string(),
                message: "Qty 缺失".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(agg.leaves().len(), 2);
        let text = agg.to_string();
        assert!(text.contains("Code"));
        assert!(text.contains("Qty"));
    }

    #[test]
    fn test_anyhow_escape_hatch() {
        fn hook() -> ImportResult<()> {
            Err(anyhow::anyhow!("业务校验失败").into())
        }
        assert!(hook().is_err());
    }
}
