// ==========================================
// 表格数据导入引擎 - 字段配置构建器
// ==========================================
// 职责: 描述符的链式配置;配置期约束违规立即失败(Configuration),
//       绝不推迟到运行期
// ==========================================

use crate::binding::field::{FieldBinding, SetFailure};
use crate::binding::value_bag::RowValueBag;
use crate::domain::value::{FieldValue, Value};
use crate::error::{ImportError, ImportResult};
use regex::Regex;
use std::marker::PhantomData;

// required 与 ignore_if 互斥的约束文案（两个方向共用）
const REQUIRED_IGNORE_CONFLICT: &str = "required 与 ignore_if 不能同时配置: \
required 在记录处理前求值,而 ignore_if 在记录处理后求值,同时配置会导致\
应被忽略的字段仍被要求必填";

// ==========================================
// FieldBuilder - 链式配置入口
// ==========================================
// 由 BindingSet::prop 返回;T 仅用于恢复钩子的静态类型
pub struct FieldBuilder<'a, D, T, C> {
    binding: &'a mut FieldBinding<D, C>,
    _marker: PhantomData<T>,
}

impl<'a, D: 'static, T: FieldValue + 'static, C: 'static> FieldBuilder<'a, D, T, C> {
    pub(crate) fn new(binding: &'a mut FieldBinding<D, C>) -> Self {
        Self {
            binding,
            _marker: PhantomData,
        }
    }

    /// 标记必填（与 ignore_if 互斥）
    pub fn required(self) -> ImportResult<Self> {
        if self.binding.ignore_if.is_some() {
            return Err(ImportError::Configuration(
                REQUIRED_IGNORE_CONFLICT.to_string(),
            ));
        }
        self.binding.required = true;
        Ok(self)
    }

    /// 条件必填（针对已解析记录求值,在变更之后校验）
    pub fn required_if(self, pred: impl Fn(&D) -> bool + 'static) -> Self {
        self.binding.required_if = Some(Box::new(pred));
        self
    }

    /// 条件忽略（与 required 互斥）;命中时本行所有校验与变更阶段跳过该字段
    pub fn ignore_if(self, pred: impl Fn(&D) -> bool + 'static) -> ImportResult<Self> {
        if self.binding.required {
            return Err(ImportError::Configuration(
                REQUIRED_IGNORE_CONFLICT.to_string(),
            ));
        }
        self.binding.ignore_if = Some(Box::new(pred));
        Ok(self)
    }

    /// 正则校验（对值的文本渲染求值）
    pub fn validate(self, pattern: &str) -> ImportResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            ImportError::Configuration(format!("正则表达式无效 /{}/: {}", pattern, e))
        })?;
        self.binding.validate_regex = Some(regex);
        Ok(self)
    }

    /// 更新导入时不写入该字段（仅新建时写入）
    pub fn no_update(self) -> Self {
        self.binding.update = false;
        self
    }

    /// 仅用于导出,导入语义不变
    pub fn export_only(self) -> Self {
        self.binding.export_only = true;
        self
    }

    /// 人类可读说明（透视模式下代替行号出现在错误消息中）
    pub fn description(self, text: impl Into<String>) -> Self {
        self.binding.description = Some(text.into());
        self
    }

    /// 解析钩子（原始值 → 类型化值,构建行值包时调用）
    pub fn parse(self, f: impl Fn(T) -> T + 'static) -> Self {
        self.binding.parse_fn = Some(Box::new(move |value: Value| {
            match T::from_value(&value) {
                Some(t) => f(t).into_value(),
                // 类型不符的值原样传递,交由后续校验报告
                None => value,
            }
        }));
        self
    }

    /// 格式化钩子（读取时应用于访问器结果）
    pub fn format(self, f: impl Fn(T) -> T + 'static) -> Self {
        self.binding.format_fn = Some(Box::new(move |value: Value| {
            match T::from_value(&value) {
                Some(t) => f(t).into_value(),
                None => value,
            }
        }));
        self
    }

    /// 自定义变更器,替换默认的直接字段写入
    ///
    /// # 参数
    /// 闭包参数依次为: 记录、is_new、类型化值、上下文、本行值包
    pub fn set_value(
        self,
        f: impl Fn(&mut D, bool, T, &C, &RowValueBag) -> ImportResult<()> + 'static,
    ) -> Self {
        self.binding.setter = Box::new(move |record, is_new, value, ctx, bag| {
            match T::from_value(value) {
                Some(v) => f(record, is_new, v, ctx, bag).map_err(SetFailure::Failed),
                None => Err(SetFailure::Incompatible),
            }
        });
        self
    }

    /// 自定义读取器,替换默认访问器（此时不应用格式化钩子）
    pub fn get_value(self, f: impl Fn(&D, &C) -> Value + 'static) -> Self {
        self.binding.custom_getter = Some(Box::new(f));
        self
    }
}
