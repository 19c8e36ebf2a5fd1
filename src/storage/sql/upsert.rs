//! INSERT ... ON CONFLICT generation for persistable records.
//!
//! Conflict targets and update clauses are rendered in sorted column order so
//! the generated SQL is deterministic for a given record type.

use sea_query::{Alias, InsertStatement, OnConflict, Query, SimpleExpr};

use crate::model::{FieldValue, Persistable, Record};
use crate::storage::{ConflictMode, Result, StorageError};

fn sorted(mut fields: Vec<FieldValue>) -> Vec<FieldValue> {
    fields.sort_by(|a, b| a.column.cmp(&b.column));
    fields
}

fn column_names(fields: &[FieldValue]) -> Vec<String> {
    fields.iter().map(|f| f.column.clone()).collect()
}

fn aliases(columns: &[String]) -> Vec<Alias> {
    columns.iter().map(|c| Alias::new(c.as_str())).collect()
}

/// Build one (possibly multi-row) INSERT for a record.
///
/// Returns `None` for an empty collection. Every row of a collection must
/// target the same table with the same columns.
pub fn build_insert(record: &Record, mode: ConflictMode) -> Result<Option<InsertStatement>> {
    let rows = record.rows();
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let table = first.table();
    let keys = column_names(&sorted(first.key_fields()));
    let data = column_names(&sorted(first.data_fields()));

    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(table.as_str()))
        .columns(aliases(&keys).into_iter().chain(aliases(&data)));

    for (index, row) in rows.iter().enumerate() {
        stmt.values(row_values(row.as_ref(), &table, &keys, &data, index)?)?;
    }

    let mut on_conflict = OnConflict::columns(aliases(&keys));
    match mode {
        ConflictMode::Upsert if !data.is_empty() => on_conflict.update_columns(aliases(&data)),
        _ => on_conflict.do_nothing(),
    };
    stmt.on_conflict(on_conflict);

    Ok(Some(stmt))
}

fn row_values(
    row: &dyn Persistable,
    table: &str,
    keys: &[String],
    data: &[String],
    index: usize,
) -> Result<Vec<SimpleExpr>> {
    let row_keys = sorted(row.key_fields());
    let row_data = sorted(row.data_fields());

    if row.table() != table || column_names(&row_keys) != keys || column_names(&row_data) != data
    {
        return Err(StorageError::MixedCollection {
            table: table.to_string(),
            index,
        });
    }

    Ok(row_keys
        .into_iter()
        .chain(row_data)
        .map(|f| SimpleExpr::Value(f.value))
        .collect())
}

#[cfg(test)]
mod tests {
    use sea_query::SqliteQueryBuilder;

    use super::*;
    use crate::model::EpochChangeRecord;
    use crate::storage::schema::Col;

    #[derive(Debug)]
    struct KeyOnly {
        id: i64,
    }

    impl Persistable for KeyOnly {
        fn table(&self) -> String {
            "key_only".to_string()
        }

        fn key_fields(&self) -> Vec<FieldValue> {
            vec![FieldValue::new(Col::EventSeq, self.id)]
        }

        fn data_fields(&self) -> Vec<FieldValue> {
            Vec::new()
        }
    }

    fn epoch(seq: i64, epoch_id: i64) -> EpochChangeRecord {
        EpochChangeRecord {
            tx_digest: "abc".to_string(),
            event_seq: seq,
            timestamp: 100,
            epoch_id,
        }
    }

    fn render(record: &Record, mode: ConflictMode) -> String {
        build_insert(record, mode)
            .unwrap()
            .unwrap()
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_upsert_clause_sorted() {
        let sql = render(&Record::from(epoch(1, 7)), ConflictMode::Upsert);

        assert!(sql.starts_with(
            "INSERT INTO \"epoch_change_events\" (\"event_seq\", \"tx_digest\", \"epoch_id\", \"timestamp\")"
        ));
        assert!(sql.contains("VALUES (1, 'abc', 7, 100)"));
        assert!(sql.contains("ON CONFLICT (\"event_seq\", \"tx_digest\")"));
        assert!(sql.contains(
            "DO UPDATE SET \"epoch_id\" = \"excluded\".\"epoch_id\", \"timestamp\" = \"excluded\".\"timestamp\""
        ));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let record = Record::from(epoch(1, 7));
        assert_eq!(
            render(&record, ConflictMode::Upsert),
            render(&record, ConflictMode::Upsert)
        );
    }

    #[test]
    fn test_ignore_mode_does_nothing() {
        let sql = render(&Record::from(epoch(1, 7)), ConflictMode::Ignore);
        assert!(sql.ends_with("ON CONFLICT (\"event_seq\", \"tx_digest\") DO NOTHING"));
    }

    #[test]
    fn test_key_only_record_does_nothing_in_upsert_mode() {
        let sql = render(&Record::from(KeyOnly { id: 3 }), ConflictMode::Upsert);
        assert!(sql.contains("DO NOTHING"));
        assert!(!sql.contains("DO UPDATE"));
    }

    #[test]
    fn test_collection_renders_multi_row_insert() {
        let record = Record::Rows(vec![Box::new(epoch(1, 7)), Box::new(epoch(2, 8))]);
        let sql = render(&record, ConflictMode::Upsert);
        assert!(sql.contains("VALUES (1, 'abc', 7, 100), (2, 'abc', 8, 100)"));
    }

    #[test]
    fn test_empty_collection_skipped() {
        let stmt = build_insert(&Record::Rows(Vec::new()), ConflictMode::Upsert).unwrap();
        assert!(stmt.is_none());
    }

    #[test]
    fn test_mixed_collection_rejected() {
        let record = Record::Rows(vec![Box::new(epoch(1, 7)), Box::new(KeyOnly { id: 2 })]);
        let err = build_insert(&record, ConflictMode::Upsert).unwrap_err();
        assert!(matches!(err, StorageError::MixedCollection { index: 1, .. }));
    }
}
