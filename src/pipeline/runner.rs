// ==========================================
// 表格数据导入引擎 - 批次运行器
// ==========================================
// 职责: 缓冲区 → 记录批次的逐行状态机
//       解析 → 模式判定 → 记录定位 → 预校验 → 正则校验
//       → 字段变更 → 后校验 → 提交
// ==========================================
// 不变量: 错误按行隔离;任一行失败不阻止其余行走完全流程,
//         批次结束时统一聚合;有错误的批次不产出任何记录
// ==========================================

use crate::adapter::buffer::TabularBuffer;
use crate::adapter::source::SheetSource;
use crate::adapter::tabular_adapter::TabularAdapter;
use crate::binding::field::FieldBinding;
use crate::binding::value_bag::RowValueBag;
use crate::domain::types::{ImportConfig, ImportMode, ImportOutcome, ImportSummary, ImportedRecord};
use crate::domain::value::FieldValue;
use crate::error::{ImportError, ImportResult};
use crate::pipeline::definition::ImportDefinition;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 从物理数据源导入(列模式或透视模式由配置决定)
pub fn import_from_sheet<T: ImportDefinition>(
    def: &mut T,
    mode: ImportMode,
    sheet: &dyn SheetSource,
) -> ImportResult<ImportOutcome<T::Record>> {
    let config = def.config();
    let wants_metadata = def.has_metadata_row() && !config.by_cell_reference;

    let (buffer, metadata) = {
        let adapter = TabularAdapter::new(def.bindings(), &config);
        if config.by_cell_reference {
            (adapter.buffer_from_sheet_pivot(sheet)?, None)
        } else {
            adapter.buffer_from_sheet(sheet, wants_metadata)?
        }
    };
    if let Some(metadata) = metadata {
        def.on_metadata(metadata);
    }
    import_from_buffer(def, mode, buffer, true)
}

/// 从已构造的缓冲区导入(手工建表或测试场景, from_sheet 影响行号换算)
pub fn import_from_buffer<T: ImportDefinition>(
    def: &mut T,
    mode: ImportMode,
    buffer: TabularBuffer,
    from_sheet: bool,
) -> ImportResult<ImportOutcome<T::Record>> {
    let start = Instant::now();
    let batch_id = Uuid::new_v4();
    let config = def.config();
    let has_metadata = def.has_metadata_row() && !config.by_cell_reference;

    info!(
        %batch_id,
        mode = %mode,
        rows = buffer.row_count(),
        "开始导入批次"
    );

    if config.row_start < 1 {
        return Err(ImportError::Configuration(
            "row_start 必须从 1 开始".to_string(),
        ));
    }
    if config.supports_update && def.bindings().id_key().is_none() {
        return Err(ImportError::Configuration(
            "支持更新的管线必须注册标识描述符".to_string(),
        ));
    }

    // ===== 解析阶段: 整表 → 行值包 =====
    let mut bags: Vec<RowValueBag> = Vec::with_capacity(buffer.row_count());
    {
        let bindings = def.bindings();
        for row in 0..buffer.row_count() {
            let mut bag = RowValueBag::new();
            for binding in bindings.iter() {
                let value = buffer.value(row, binding.column())?.clone();
                bag.insert(binding.key().clone(), binding.parse(value));
            }
            bags.push(bag);
        }
    }
    debug!(rows = bags.len(), "解析阶段完成");

    let order = def.sort(&buffer);
    def.before_import(&bags);

    let bindings = def.bindings();
    let context = def.context();
    let mut errors: Vec<ImportError> = Vec::new();
    let mut records: Vec<ImportedRecord<T::Record>> = Vec::new();
    let mut skipped_blank = 0usize;
    let mut created = 0usize;
    let mut updated = 0usize;

    // ===== 逐行状态机 =====
    for &row_index in &order {
        if buffer.is_blank_row(row_index) {
            skipped_blank += 1;
            continue;
        }
        let row_loc = row_location(&config, from_sheet, has_metadata, row_index);
        let bag = &bags[row_index];
        let mut row_errors: Vec<ImportError> = Vec::new();

        // --- 标识提取 ---
        let id = if config.supports_update {
            match bindings.id_key().and_then(|k| bag.get(k).ok()) {
                Some(value) => match Option::<T::Id>::from_value(value) {
                    Some(id) => id.unwrap_or_default(),
                    None => {
                        row_errors.push(ImportError::RowValidation {
                            location: row_loc.clone(),
                            message: "标识值与标识类型不符".to_string(),
                        });
                        T::Id::default()
                    }
                },
                None => T::Id::default(),
            }
        } else {
            T::Id::default()
        };
        let id_is_default = id == T::Id::default();

        // --- 模式判定 ---
        if row_errors.is_empty() {
            let mismatch = (id_is_default && mode == ImportMode::Update)
                || (!id_is_default && mode == ImportMode::Create);
            if mismatch {
                row_errors.push(ImportError::TypeMismatch {
                    location: row_loc.clone(),
                    mode: mode.to_string(),
                });
            }
        }
        if !row_errors.is_empty() {
            errors.append(&mut row_errors);
            continue;
        }

        // --- 记录定位 ---
        let mut record = if id_is_default {
            def.create_record(bag)
        } else {
            match def.find_by_id(&id) {
                Some(existing) => existing,
                None => {
                    errors.push(ImportError::RowValidation {
                        location: row_loc,
                        message: "未找到既有记录".to_string(),
                    });
                    continue;
                }
            }
        };
        let is_new = def.record_id(&record) == T::Id::default();

        // --- 预校验: 必填 + 正则 ---
        for binding in bindings.iter() {
            if binding.is_ignored_for(&record) {
                continue;
            }
            let value = match bag.get(binding.key()) {
                Ok(v) => v,
                Err(e) => {
                    row_errors.push(e);
                    continue;
                }
            };
            // 更新导入中不可写的字段不要求必填
            if binding.is_required() && (is_new || binding.is_updatable()) && value.is_empty() {
                row_errors.push(ImportError::RowValidation {
                    location: binding_location(&config, description_location(binding), &row_loc),
                    message: format!("{} 缺失", binding.column()),
                });
            }
            if let Some(pattern) = binding.pattern() {
                if let Some(text) = value.render() {
                    if !pattern.is_match(&text) {
                        row_errors.push(ImportError::RowValidation {
                            location: binding_location(&config, description_location(binding), &row_loc),
                            message: format!(
                                "{} 的值 '{}' 不匹配 /{}/",
                                binding.column(),
                                text,
                                pattern
                            ),
                        });
                    }
                }
            }
        }
        if !row_errors.is_empty() {
            errors.append(&mut row_errors);
            continue;
        }

        // --- 字段变更 ---
        def.before_process_record(&mut record);
        let mut field_errors: Vec<String> = Vec::new();
        for binding in bindings.iter() {
            if binding.is_ignored_for(&record) {
                continue;
            }
            // 标识字段不参与变更
            if Some(binding.key()) == bindings.id_key() {
                continue;
            }
            if !is_new && !binding.is_updatable() {
                continue;
            }
            let value = match bag.get(binding.key()) {
                Ok(v) => v,
                Err(e) => {
                    field_errors.push(e.to_string());
                    continue;
                }
            };
            if let Err(err) = binding.set_value(&mut record, is_new, value, context, bag) {
                field_errors.push(match err {
                    ImportError::FieldMutation { message, .. } => message,
                    other => other.to_string(),
                });
            }
        }
        if !field_errors.is_empty() {
            errors.push(ImportError::FieldMutation {
                location: row_loc,
                message: field_errors.join("; "),
            });
            continue;
        }

        // --- 后校验: 条件必填 + 记录级校验 ---
        for binding in bindings.iter() {
            if binding.is_ignored_for(&record) {
                continue;
            }
            if binding.is_required_for(&record) {
                let is_empty = match bag.get(binding.key()) {
                    Ok(v) => v.is_empty(),
                    Err(e) => {
                        row_errors.push(e);
                        continue;
                    }
                };
                if is_empty {
                    row_errors.push(ImportError::RowValidation {
                        location: binding_location(&config, description_location(binding), &row_loc),
                        message: format!("{} 缺失", binding.column()),
                    });
                }
            }
        }
        if let Err(err) = def.validate_record(&record) {
            row_errors.push(ImportError::RowValidation {
                location: row_loc.clone(),
                message: err.to_string(),
            });
        }
        if !row_errors.is_empty() {
            errors.append(&mut row_errors);
            continue;
        }

        // --- 提交 ---
        if is_new {
            created += 1;
        } else {
            updated += 1;
        }
        let values = std::mem::take(&mut bags[row_index]);
        records.push(ImportedRecord {
            record,
            values,
            is_new,
        });
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    if !errors.is_empty() {
        warn!(
            %batch_id,
            error_count = errors.len(),
            elapsed_ms,
            "导入批次失败"
        );
        return Err(ImportError::Aggregate(errors));
    }

    let summary = ImportSummary {
        total_rows: buffer.row_count(),
        imported: records.len(),
        created,
        updated,
        skipped_blank,
        elapsed_ms,
    };
    info!(
        %batch_id,
        imported = summary.imported,
        created = summary.created,
        updated = summary.updated,
        skipped_blank = summary.skipped_blank,
        elapsed_ms,
        "导入批次完成"
    );
    let outcome = ImportOutcome {
        batch_id,
        mode,
        records,
        summary,
    };
    def.after_import(&outcome);
    Ok(outcome)
}

/// 行定位文本: 列模式按源行号,缓冲直导按记录序号,透视模式无行号
fn row_location(
    config: &ImportConfig,
    from_sheet: bool,
    has_metadata: bool,
    row_index: usize,
) -> String {
    if config.by_cell_reference {
        return String::new();
    }
    if from_sheet {
        // 源行号 = 表头行 + 1 (+ 元数据行) + 数据行下标
        let mut number = config.row_start as usize + 1 + row_index;
        if has_metadata {
            number += 1;
        }
        format!(" (行 {})", number)
    } else {
        // 记录序号与列模式行号同构: 起始行 + 1 + 数据行下标
        format!(" (记录 {})", config.row_start as usize + 1 + row_index)
    }
}

/// 透视模式下以描述符说明定位
fn description_location<D, C>(binding: &FieldBinding<D, C>) -> Option<String> {
    binding.description().map(|d| format!(" ('{}')", d))
}

fn binding_location(config: &ImportConfig, described: Option<String>, row_loc: &str) -> String {
    if config.by_cell_reference {
        described.unwrap_or_default()
    } else {
        row_loc.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::field::BindingSet;
    use crate::domain::value::{Value, ValueType};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Material {
        id: i64,
        code: Option<String>,
        qty: Option<i32>,
    }

    struct MaterialImport {
        bindings: BindingSet<Material, ()>,
        existing: Vec<Material>,
    }

    impl MaterialImport {
        fn new(existing: Vec<Material>) -> Self {
            let mut bindings = BindingSet::new();
            bindings
                .id_prop("id", "Id", |r: &Material| r.id, |r, v| r.id = v)
                .unwrap();
            bindings
                .prop("code", "Code", |r: &Material| r.code.clone(), |r, v| {
                    r.code = v
                })
                .unwrap()
                .required()
                .unwrap();
            bindings
                .prop("qty", "Qty", |r: &Material| r.qty, |r, v| r.qty = v)
                .unwrap();
            Self { bindings, existing }
        }
    }

    impl ImportDefinition for MaterialImport {
        type Record = Material;
        type Id = i64;
        type Context = ();

        fn context(&self) -> &() {
            &()
        }

        fn bindings(&self) -> &BindingSet<Material, ()> {
            &self.bindings
        }

        fn record_id(&self, record: &Material) -> i64 {
            record.id
        }

        fn find_by_id(&self, id: &i64) -> Option<Material> {
            self.existing.iter().find(|m| m.id == *id).cloned()
        }

        fn create_record(&self, _values: &RowValueBag) -> Material {
            Material::default()
        }
    }

    fn buffer(rows: Vec<Vec<Value>>) -> TabularBuffer {
        let mut buffer = TabularBuffer::with_columns(&[
            ("Id", Some(ValueType::Long)),
            ("Code", Some(ValueType::Text)),
            ("Qty", Some(ValueType::Int)),
        ]);
        for row in rows {
            buffer.push_row(row);
        }
        buffer
    }

    #[test]
    fn test_create_mode_builds_new_records() {
        let mut def = MaterialImport::new(vec![]);
        let buf = buffer(vec![
            vec![Value::Empty, Value::Text("M1".into()), Value::Int(3)],
            vec![Value::Empty, Value::Text("M2".into()), Value::Empty],
        ]);

        let outcome = import_from_buffer(&mut def, ImportMode::Create, buf, false).unwrap();
        assert_eq!(outcome.summary.imported, 2);
        assert_eq!(outcome.summary.created, 2);
        assert!(outcome.records.iter().all(|r| r.is_new));
        assert_eq!(outcome.records[0].record.qty, Some(3));
        assert_eq!(outcome.records[1].record.qty, None);
    }

    #[test]
    fn test_blank_rows_yield_nothing() {
        let mut def = MaterialImport::new(vec![]);
        let buf = buffer(vec![
            vec![Value::Empty, Value::Text("M1".into()), Value::Int(3)],
            vec![Value::Empty, Value::Empty, Value::Empty],
        ]);

        let outcome = import_from_buffer(&mut def, ImportMode::Create, buf, false).unwrap();
        assert_eq!(outcome.summary.imported, 1);
        assert_eq!(outcome.summary.skipped_blank, 1);
    }

    #[test]
    fn test_update_mode_rejects_rows_without_id() {
        let mut def = MaterialImport::new(vec![]);
        let buf = buffer(vec![vec![
            Value::Empty,
            Value::Text("M1".into()),
            Value::Int(3),
        ]]);

        let err = import_from_buffer(&mut def, ImportMode::Update, buf, false).unwrap_err();
        assert!(matches!(
            err.leaves()[0],
            ImportError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_full_mode_updates_existing() {
        let mut def = MaterialImport::new(vec![Material {
            id: 7,
            code: Some("OLD".into()),
            qty: Some(1),
        }]);
        let buf = buffer(vec![vec![
            Value::Long(7),
            Value::Text("NEW".into()),
            Value::Int(9),
        ]]);

        let outcome = import_from_buffer(&mut def, ImportMode::Full, buf, false).unwrap();
        assert_eq!(outcome.summary.updated, 1);
        assert!(!outcome.records[0].is_new);
        assert_eq!(outcome.records[0].record.code.as_deref(), Some("NEW"));
        // 标识字段不参与变更,但保留原值
        assert_eq!(outcome.records[0].record.id, 7);
    }

    #[test]
    fn test_row_errors_do_not_starve_later_rows() {
        let mut def = MaterialImport::new(vec![]);
        let buf = buffer(vec![
            vec![Value::Empty, Value::Empty, Value::Int(1)], // Code 缺失
            vec![Value::Empty, Value::Empty, Value::Int(2)], // Code 缺失
            vec![Value::Empty, Value::Text("M3".into()), Value::Int(3)],
        ]);

        let err = import_from_buffer(&mut def, ImportMode::Create, buf, false).unwrap_err();
        // 两行错误都被报告,第三行未受影响(但整批失败)
        assert_eq!(err.leaves().len(), 2);
    }

    #[test]
    fn test_buffer_records_numbered_like_source_rows() {
        let mut def = MaterialImport::new(vec![]);
        let buf = buffer(vec![
            vec![Value::Empty, Value::Text("M1".into()), Value::Int(1)],
            vec![Value::Empty, Value::Empty, Value::Int(2)], // Code 缺失
        ]);

        let err = import_from_buffer(&mut def, ImportMode::Create, buf, false).unwrap_err();
        // 起始行 1 + 表头 1 + 下标 1 = 记录 3,与列模式行号换算一致
        assert!(err.to_string().contains("(记录 3)"));
    }

    #[test]
    fn test_unknown_id_is_row_error() {
        let mut def = MaterialImport::new(vec![]);
        let buf = buffer(vec![vec![
            Value::Long(99),
            Value::Text("M1".into()),
            Value::Int(3),
        ]]);

        let err = import_from_buffer(&mut def, ImportMode::Full, buf, false).unwrap_err();
        assert!(err.to_string().contains("未找到既有记录"));
    }

    #[test]
    fn test_missing_id_binding_is_configuration_error() {
        struct NoId {
            bindings: BindingSet<Material, ()>,
        }
        impl ImportDefinition for NoId {
            type Record = Material;
            type Id = i64;
            type Context = ();
            fn context(&self) -> &() {
                &()
            }
            fn bindings(&self) -> &BindingSet<Material, ()> {
                &self.bindings
            }
            fn record_id(&self, r: &Material) -> i64 {
                r.id
            }
            fn find_by_id(&self, _id: &i64) -> Option<Material> {
                None
            }
            fn create_record(&self, _values: &RowValueBag) -> Material {
                Material::default()
            }
        }

        let mut bindings = BindingSet::new();
        bindings
            .prop("code", "Code", |r: &Material| r.code.clone(), |r, v| {
                r.code = v
            })
            .unwrap();
        let mut def = NoId { bindings };
        let buf = buffer(vec![]);

        let err = import_from_buffer(&mut def, ImportMode::Full, buf, false).unwrap_err();
        assert!(matches!(err, ImportError::Configuration(_)));
    }
}
