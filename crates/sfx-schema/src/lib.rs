//! Schema Introspector (§4.1): the typed model of tables, columns and
//! foreign keys that the Relation Graph Builder and SQL Generator consume.

pub mod introspect;
pub mod model;

pub use introspect::{require_primary_keys, IntrospectError, Introspector};
pub use model::{Column, ForeignKey, SchemaSet, SqlType, Table};

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, ty: SqlType, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            sql_type: ty,
            nullable,
        }
    }

    #[test]
    fn schema_set_orders_tables_by_name() {
        let tables = vec![
            Table {
                qualified_name: "job_log".into(),
                columns: vec![col("id", SqlType::Integer, false)],
                primary_key: vec!["id".into()],
                foreign_keys: vec![],
            },
            Table {
                qualified_name: "job".into(),
                columns: vec![col("id", SqlType::Integer, false)],
                primary_key: vec!["id".into()],
                foreign_keys: vec![],
            },
        ];
        let set = SchemaSet::new(tables);
        let names: Vec<_> = set.tables().iter().map(|t| t.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["job", "job_log"]);
    }

    #[test]
    fn inbound_foreign_keys_finds_children() {
        let fk = ForeignKey {
            from_table: "job_log".into(),
            from_columns: vec!["job_id".into()],
            to_table: "job".into(),
            to_columns: vec!["id".into()],
        };
        let tables = vec![
            Table {
                qualified_name: "job".into(),
                columns: vec![col("id", SqlType::Integer, false)],
                primary_key: vec!["id".into()],
                foreign_keys: vec![],
            },
            Table {
                qualified_name: "job_log".into(),
                columns: vec![
                    col("id", SqlType::Integer, false),
                    col("job_id", SqlType::Integer, false),
                ],
                primary_key: vec!["id".into()],
                foreign_keys: vec![fk],
            },
        ];
        let set = SchemaSet::new(tables);
        let children: Vec<_> = set.inbound_foreign_keys("job").collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].0.qualified_name, "job_log");
    }

    #[test]
    fn require_primary_keys_rejects_keyless_table() {
        let table = Table {
            qualified_name: "job_log".into(),
            columns: vec![col("job_id", SqlType::Integer, false)],
            primary_key: vec![],
            foreign_keys: vec![],
        };
        let err = require_primary_keys(&SchemaSet::new(vec![]), &[&table]).unwrap_err();
        assert!(matches!(err, IntrospectError::AmbiguousKey(name) if name == "job_log"));
    }
}
