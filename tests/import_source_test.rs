// ==========================================
// 文件数据源与字段门控集成测试
// ==========================================
// 场景: CSV 文件导入、缺列聚合、文件错误处理、
//       no_update / ignore_if 字段门控
// ==========================================

use std::io::Write;
use tabular_import::{
    import_from_sheet, load_csv, logging, BindingSet, GridSheet, ImportDefinition, ImportError,
    ImportMode, RowValueBag,
};
use tempfile::Builder;

// ==========================================
// 测试夹具
// ==========================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Part {
    id: i64,
    code: Option<String>,
    note: Option<String>,
    locked: Option<bool>,
}

struct PartImport {
    bindings: BindingSet<Part, ()>,
    existing: Vec<Part>,
}

impl PartImport {
    fn new(existing: Vec<Part>) -> Self {
        let mut bindings: BindingSet<Part, ()> = BindingSet::new();
        bindings
            .id_prop("id", "Id", |r: &Part| r.id, |r, v| r.id = v)
            .unwrap();
        // 锁定的记录不再接受编码变更
        bindings
            .prop("code", "Code", |r: &Part| r.code.clone(), |r, v| {
                r.code = v
            })
            .unwrap()
            .ignore_if(|r| r.locked == Some(true))
            .unwrap();
        // 备注仅在新建时写入
        bindings
            .prop("note", "Note", |r: &Part| r.note.clone(), |r, v| {
                r.note = v
            })
            .unwrap()
            .no_update();
        bindings
            .prop("locked", "Locked", |r: &Part| r.locked, |r, v| {
                r.locked = v
            })
            .unwrap()
            .no_update();
        Self { bindings, existing }
    }
}

impl ImportDefinition for PartImport {
    type Record = Part;
    type Id = i64;
    type Context = ();

    fn context(&self) -> &() {
        &()
    }

    fn bindings(&self) -> &BindingSet<Part, ()> {
        &self.bindings
    }

    fn record_id(&self, record: &Part) -> i64 {
        record.id
    }

    fn find_by_id(&self, id: &i64) -> Option<Part> {
        self.existing.iter().find(|p| p.id == *id).cloned()
    }

    fn create_record(&self, _values: &RowValueBag) -> Part {
        Part::default()
    }
}

// ==========================================
// CSV 文件导入
// ==========================================

#[test]
fn test_csv_file_import_end_to_end() {
    logging::init_test();
    let mut temp = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(temp, "Id,Code,Note,Locked").unwrap();
    writeln!(temp, ",P001,首批,No").unwrap();
    writeln!(temp, ",P002,,No").unwrap();

    let sheet = load_csv(temp.path()).unwrap();
    let mut def = PartImport::new(vec![]);
    let outcome = import_from_sheet(&mut def, ImportMode::Create, &sheet).unwrap();

    assert_eq!(outcome.summary.imported, 2);
    assert_eq!(outcome.records[0].record.code.as_deref(), Some("P001"));
    assert_eq!(outcome.records[0].record.note.as_deref(), Some("首批"));
    assert_eq!(outcome.records[0].record.locked, Some(false));
}

#[test]
fn test_csv_missing_columns_aggregate() {
    logging::init_test();
    let mut temp = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(temp, "Code").unwrap();
    writeln!(temp, "P001").unwrap();

    let sheet = load_csv(temp.path()).unwrap();
    let mut def = PartImport::new(vec![]);
    let err = import_from_sheet(&mut def, ImportMode::Create, &sheet).unwrap_err();

    // Id / Note / Locked 三列缺失一次性报告
    let leaves = err.leaves();
    assert_eq!(leaves.len(), 3);
    assert!(leaves
        .iter()
        .all(|e| matches!(e, ImportError::ColumnMissing { .. })));
}

#[test]
fn test_csv_bad_cells_reported_with_address() {
    logging::init_test();
    let mut temp = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(temp, "Id,Code,Note,Locked").unwrap();
    writeln!(temp, "abc,P001,,maybe").unwrap();

    let sheet = load_csv(temp.path()).unwrap();
    let mut def = PartImport::new(vec![]);
    let err = import_from_sheet(&mut def, ImportMode::Create, &sheet).unwrap_err();

    let text = err.to_string();
    // Id 与 Locked 两个坏单元格,各带 A1 地址
    assert_eq!(err.leaves().len(), 2);
    assert!(text.contains("A2"));
    assert!(text.contains("D2"));
}

#[test]
fn test_csv_file_not_found() {
    logging::init_test();
    let result = load_csv("does_not_exist.csv");
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}

// ==========================================
// 字段门控
// ==========================================

#[test]
fn test_no_update_field_preserved_on_update() {
    logging::init_test();
    let existing = Part {
        id: 5,
        code: Some("P-OLD".into()),
        note: Some("原始备注".into()),
        locked: Some(false),
    };
    let mut def = PartImport::new(vec![existing]);
    let sheet = GridSheet::from_text_rows(vec![
        vec!["Id", "Code", "Note", "Locked"],
        vec!["5", "P-NEW", "新备注", "Yes"],
    ]);

    let outcome = import_from_sheet(&mut def, ImportMode::Full, &sheet).unwrap();
    let record = &outcome.records[0].record;
    assert_eq!(record.code.as_deref(), Some("P-NEW"));
    // no_update 字段在更新导入中保持原值
    assert_eq!(record.note.as_deref(), Some("原始备注"));
    assert_eq!(record.locked, Some(false));
}

#[test]
fn test_ignored_field_skips_validation_and_mutation() {
    logging::init_test();
    let existing = Part {
        id: 5,
        code: Some("P-LOCKED".into()),
        note: None,
        locked: Some(true),
    };
    let mut def = PartImport::new(vec![existing]);
    let sheet = GridSheet::from_text_rows(vec![
        vec!["Id", "Code", "Note", "Locked"],
        vec!["5", "P-CHANGED", "", ""],
    ]);

    let outcome = import_from_sheet(&mut def, ImportMode::Full, &sheet).unwrap();
    // 锁定记录的编码不被覆盖
    assert_eq!(
        outcome.records[0].record.code.as_deref(),
        Some("P-LOCKED")
    );
}

#[test]
fn test_new_records_receive_no_update_fields() {
    logging::init_test();
    let mut def = PartImport::new(vec![]);
    let sheet = GridSheet::from_text_rows(vec![
        vec!["Id", "Code", "Note", "Locked"],
        vec!["", "P001", "首批", "No"],
    ]);

    let outcome = import_from_sheet(&mut def, ImportMode::Create, &sheet).unwrap();
    // 新建记录时 no_update 字段正常写入
    assert_eq!(outcome.records[0].record.note.as_deref(), Some("首批"));
}

// ==========================================
// 导出专用字段
// ==========================================
// export_only 只影响导出端;导入侧的必填校验与字段写入照常执行

struct TaggedPartImport {
    bindings: BindingSet<Part, ()>,
}

impl TaggedPartImport {
    fn new() -> Self {
        let mut bindings: BindingSet<Part, ()> = BindingSet::new();
        bindings
            .id_prop("id", "Id", |r: &Part| r.id, |r, v| r.id = v)
            .unwrap();
        bindings
            .prop("code", "Code", |r: &Part| r.code.clone(), |r, v| {
                r.code = v
            })
            .unwrap();
        bindings
            .prop("note", "Note", |r: &Part| r.note.clone(), |r, v| {
                r.note = v
            })
            .unwrap()
            .required()
            .unwrap()
            .export_only();
        Self { bindings }
    }
}

impl ImportDefinition for TaggedPartImport {
    type Record = Part;
    type Id = i64;
    type Context = ();

    fn context(&self) -> &() {
        &()
    }

    fn bindings(&self) -> &BindingSet<Part, ()> {
        &self.bindings
    }

    fn record_id(&self, record: &Part) -> i64 {
        record.id
    }

    fn find_by_id(&self, _id: &i64) -> Option<Part> {
        None
    }

    fn create_record(&self, _values: &RowValueBag) -> Part {
        Part::default()
    }
}

#[test]
fn test_export_only_field_still_written() {
    logging::init_test();
    let mut def = TaggedPartImport::new();
    let sheet = GridSheet::from_text_rows(vec![
        vec!["Id", "Code", "Note"],
        vec!["", "P001", "巡检备注"],
    ]);

    let outcome = import_from_sheet(&mut def, ImportMode::Create, &sheet).unwrap();
    assert_eq!(outcome.records[0].record.note.as_deref(), Some("巡检备注"));
}

#[test]
fn test_export_only_required_still_enforced() {
    logging::init_test();
    let mut def = TaggedPartImport::new();
    let sheet = GridSheet::from_text_rows(vec![
        vec!["Id", "Code", "Note"],
        vec!["", "P001", ""],
    ]);

    let err = import_from_sheet(&mut def, ImportMode::Create, &sheet).unwrap_err();
    assert!(err.to_string().contains("Note 缺失"));
}
