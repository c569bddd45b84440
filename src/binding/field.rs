// ==========================================
// 表格数据导入引擎 - 字段绑定描述符
// ==========================================
// 职责: 声明单个映射字段(外部列名/访问器/变更器/类型/约束/钩子)
//       以及管线的描述符注册表
// ==========================================
// 不变量: 绑定键在同一注册表内唯一;描述符注册后不可变
// ==========================================

use crate::binding::builder::FieldBuilder;
use crate::binding::key::{AccessPath, BindingKey};
use crate::binding::value_bag::RowValueBag;
use crate::domain::value::{FieldValue, Value, ValueType};
use crate::error::{ImportError, ImportResult};
use regex::Regex;
use std::collections::HashMap;

// 变更失败的内部分类: 值与目标类型不兼容(可能被静默吞掉)
// 与变更器本身的业务失败(总是上抛)
pub(crate) enum SetFailure {
    Incompatible,
    Failed(ImportError),
}

pub(crate) type SetFn<D, C> =
    Box<dyn Fn(&mut D, bool, &Value, &C, &RowValueBag) -> Result<(), SetFailure>>;
pub(crate) type GetFn<D, C> = Box<dyn Fn(&D, &C) -> Value>;
pub(crate) type PredFn<D> = Box<dyn Fn(&D) -> bool>;
pub(crate) type MapFn = Box<dyn Fn(Value) -> Value>;

// ==========================================
// FieldBinding - 单字段描述符
// ==========================================
pub struct FieldBinding<D, C> {
    pub(crate) key: BindingKey,
    pub(crate) column: String,
    pub(crate) value_type: ValueType,
    pub(crate) required: bool,
    pub(crate) update: bool,
    pub(crate) export_only: bool,
    pub(crate) description: Option<String>,
    pub(crate) validate_regex: Option<Regex>,
    pub(crate) required_if: Option<PredFn<D>>,
    pub(crate) ignore_if: Option<PredFn<D>>,
    pub(crate) parse_fn: Option<MapFn>,
    pub(crate) format_fn: Option<MapFn>,
    pub(crate) getter: GetFn<D, C>,
    pub(crate) custom_getter: Option<GetFn<D, C>>,
    pub(crate) setter: SetFn<D, C>,
}

impl<D: 'static, C: 'static> FieldBinding<D, C> {
    fn new<T: FieldValue + 'static>(
        key: BindingKey,
        column: String,
        get: impl Fn(&D) -> T + 'static,
        set: impl Fn(&mut D, T) + 'static,
    ) -> Self {
        Self {
            key,
            column,
            value_type: T::TYPE,
            required: false,
            update: true,
            export_only: false,
            description: None,
            validate_regex: None,
            required_if: None,
            ignore_if: None,
            parse_fn: None,
            format_fn: None,
            getter: Box::new(move |record, _ctx| get(record).into_value()),
            custom_getter: None,
            setter: Box::new(move |record, _is_new, value, _ctx, _bag| {
                match T::from_value(value) {
                    Some(v) => {
                        set(record, v);
                        Ok(())
                    }
                    None => Err(SetFailure::Incompatible),
                }
            }),
        }
    }
}

impl<D, C> FieldBinding<D, C> {
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    /// 外部列名
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// 更新导入时是否参与写入
    pub fn is_updatable(&self) -> bool {
        self.update
    }

    pub fn is_export_only(&self) -> bool {
        self.export_only
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn pattern(&self) -> Option<&Regex> {
        self.validate_regex.as_ref()
    }

    /// ignore_if 谓词命中时,该字段在本行的所有校验与变更阶段均被排除
    pub fn is_ignored_for(&self, record: &D) -> bool {
        match &self.ignore_if {
            Some(pred) => pred(record),
            None => false,
        }
    }

    pub(crate) fn is_required_for(&self, record: &D) -> bool {
        match &self.required_if {
            Some(pred) => pred(record),
            None => false,
        }
    }

    /// 应用解析钩子（原始值 → 类型化值）
    pub fn parse(&self, value: Value) -> Value {
        match &self.parse_fn {
            Some(f) => f(value),
            None => value,
        }
    }

    /// 通过访问器读取当前值,默认路径附加格式化钩子
    pub fn get_value(&self, record: &D, context: &C) -> Value {
        if let Some(custom) = &self.custom_getter {
            return custom(record, context);
        }
        let value = (self.getter)(record, context);
        match &self.format_fn {
            Some(f) => f(value),
            None => value,
        }
    }

    /// 写入解析值
    ///
    /// # 规则
    /// - 值为空且字段非必填: 静默跳过（保持默认/原值）
    /// - 值为空且字段必填: 字段级错误
    /// - 类型不兼容: 字段级错误
    /// - 变更器业务失败: 以字段名包装后上抛
    pub fn set_value(
        &self,
        record: &mut D,
        is_new: bool,
        value: &Value,
        context: &C,
        values: &RowValueBag,
    ) -> ImportResult<()> {
        match (self.setter)(record, is_new, value, context, values) {
            Ok(()) => Ok(()),
            Err(SetFailure::Incompatible) => {
                if value.is_empty() && !self.required {
                    Ok(())
                } else if value.is_empty() {
                    Err(ImportError::FieldMutation {
                        location: String::new(),
                        message: format!("{} 缺失", self.column),
                    })
                } else {
                    Err(ImportError::FieldMutation {
                        location: String::new(),
                        message: format!(
                            "{} 的值无法转换为 {}",
                            self.column, self.value_type
                        ),
                    })
                }
            }
            Err(SetFailure::Failed(err)) => Err(ImportError::FieldMutation {
                location: String::new(),
                message: format!("{}: {}", self.column, err),
            }),
        }
    }
}

// ==========================================
// BindingSet - 描述符注册表
// ==========================================
// 管线构造时注册一次,此后只读;支持更新的管线须恰好注册一个标识描述符
pub struct BindingSet<D, C> {
    bindings: Vec<FieldBinding<D, C>>,
    by_key: HashMap<BindingKey, usize>,
    id_key: Option<BindingKey>,
}

impl<D, C> Default for BindingSet<D, C> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            by_key: HashMap::new(),
            id_key: None,
        }
    }
}

impl<D: 'static, C: 'static> BindingSet<D, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册普通字段
    ///
    /// # 参数
    /// - path: 访问路径（决定绑定键）
    /// - column: 外部列名
    /// - get: 访问器（记录 → 字段值）
    /// - set: 默认变更器（直接字段写入）
    ///
    /// # 返回
    /// - Ok(FieldBuilder): 链式配置入口
    /// - Err(Configuration): 绑定键重复
    pub fn prop<T: FieldValue + 'static>(
        &mut self,
        path: impl Into<AccessPath>,
        column: impl Into<String>,
        get: impl Fn(&D) -> T + 'static,
        set: impl Fn(&mut D, T) + 'static,
    ) -> ImportResult<FieldBuilder<'_, D, T, C>> {
        let key = path.into().resolve();
        self.push(FieldBinding::new(key, column.into(), get, set))
    }

    /// 注册标识字段（支持更新的管线必须恰好注册一个）
    pub fn id_prop<T: FieldValue + 'static>(
        &mut self,
        path: impl Into<AccessPath>,
        column: impl Into<String>,
        get: impl Fn(&D) -> T + 'static,
        set: impl Fn(&mut D, T) + 'static,
    ) -> ImportResult<FieldBuilder<'_, D, T, C>> {
        let key = path.into().resolve();
        if self.id_key.is_some() {
            return Err(ImportError::Configuration(format!(
                "标识描述符重复注册: {}",
                key
            )));
        }
        self.id_key = Some(key.clone());
        self.push(FieldBinding::new(key, column.into(), get, set))
    }

    /// 注册嵌套子对象字段（描述符组合: 父访问器 + 子变更器）
    pub fn prop_nested<P: 'static, T: FieldValue + 'static>(
        &mut self,
        path: impl Into<AccessPath>,
        column: impl Into<String>,
        parent: impl Fn(&mut D) -> &mut P + 'static,
        get: impl Fn(&D) -> T + 'static,
        set: impl Fn(&mut P, T) + 'static,
    ) -> ImportResult<FieldBuilder<'_, D, T, C>> {
        let key = path.into().resolve();
        let composed = move |record: &mut D, value: T| set(parent(record), value);
        self.push(FieldBinding::new(key, column.into(), get, composed))
    }

    fn push<T: FieldValue + 'static>(
        &mut self,
        binding: FieldBinding<D, C>,
    ) -> ImportResult<FieldBuilder<'_, D, T, C>> {
        if self.by_key.contains_key(&binding.key) {
            return Err(ImportError::Configuration(format!(
                "绑定键重复: {}",
                binding.key
            )));
        }
        self.by_key.insert(binding.key.clone(), self.bindings.len());
        self.bindings.push(binding);
        let last = self.bindings.last_mut().expect("binding was just pushed");
        Ok(FieldBuilder::new(last))
    }
}

impl<D, C> BindingSet<D, C> {
    pub fn get(&self, key: &BindingKey) -> Option<&FieldBinding<D, C>> {
        self.by_key.get(key).map(|&i| &self.bindings[i])
    }

    /// 按外部列名查找（不区分大小写）
    pub fn find_by_column(&self, name: &str) -> Option<&FieldBinding<D, C>> {
        self.bindings
            .iter()
            .find(|b| b.column.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldBinding<D, C>> {
        self.bindings.iter()
    }

    pub fn id_key(&self) -> Option<&BindingKey> {
        self.id_key.as_ref()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
