use sfx_schema::{Column, ForeignKey, IntrospectError, Introspector, SchemaSet, SqlType, Table};
use sqlx::PgPool;

/// Reads `information_schema` for every table in `schema_name` plus its
/// columns, primary key and foreign keys, producing the typed `SchemaSet`
/// the Relation Graph Builder consumes (§4.1). This is the only place a
/// concrete `sql_type` string gets classified into a `SqlType`.
pub struct PgIntrospector {
    pool: PgPool,
    schema_name: String,
}

impl PgIntrospector {
    pub fn new(pool: PgPool, schema_name: impl Into<String>) -> Self {
        Self {
            pool,
            schema_name: schema_name.into(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    data_type: String,
    is_nullable: String,
}

#[derive(sqlx::FromRow)]
struct PrimaryKeyRow {
    table_name: String,
    column_name: String,
}

#[derive(sqlx::FromRow)]
struct ForeignKeyRow {
    constraint_name: String,
    from_table: String,
    from_column: String,
    to_table: String,
    to_column: String,
}

fn classify_sql_type(data_type: &str) -> SqlType {
    match data_type {
        "boolean" => SqlType::Boolean,
        "smallint" | "integer" | "bigint" => SqlType::Integer,
        "numeric" | "real" | "double precision" | "decimal" => SqlType::Numeric,
        "timestamp without time zone" | "timestamp with time zone" | "date" => SqlType::Timestamp,
        "character varying" | "character" | "text" | "uuid" | "citext" => SqlType::Text,
        other => SqlType::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_postgres_types() {
        assert_eq!(classify_sql_type("integer"), SqlType::Integer);
        assert_eq!(classify_sql_type("bigint"), SqlType::Integer);
        assert_eq!(classify_sql_type("boolean"), SqlType::Boolean);
        assert_eq!(classify_sql_type("numeric"), SqlType::Numeric);
        assert_eq!(
            classify_sql_type("timestamp with time zone"),
            SqlType::Timestamp
        );
        assert_eq!(classify_sql_type("text"), SqlType::Text);
    }

    #[test]
    fn unknown_type_falls_back_to_other() {
        assert_eq!(classify_sql_type("interval"), SqlType::Other("interval".into()));
    }
}

#[async_trait::async_trait]
impl Introspector for PgIntrospector {
    async fn introspect(&self) -> Result<SchemaSet, IntrospectError> {
        let columns: Vec<ColumnRow> = sqlx::query_as(
            r#"
            SELECT table_name, column_name, data_type, is_nullable
            FROM information_schema.columns
            WHERE table_schema = $1
            ORDER BY table_name, ordinal_position
            "#,
        )
        .bind(&self.schema_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IntrospectError::SchemaUnavailable(e.into()))?;

        let primary_keys: Vec<PrimaryKeyRow> = sqlx::query_as(
            r#"
            SELECT tc.table_name, kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = $1
            ORDER BY tc.table_name, kcu.ordinal_position
            "#,
        )
        .bind(&self.schema_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IntrospectError::SchemaUnavailable(e.into()))?;

        let foreign_keys: Vec<ForeignKeyRow> = sqlx::query_as(
            r#"
            SELECT
                tc.constraint_name,
                tc.table_name AS from_table,
                kcu.column_name AS from_column,
                ccu.table_name AS to_table,
                ccu.column_name AS to_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
              ON tc.constraint_name = ccu.constraint_name
             AND tc.table_schema = ccu.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = $1
            ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position
            "#,
        )
        .bind(&self.schema_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IntrospectError::SchemaUnavailable(e.into()))?;

        let mut tables: std::collections::BTreeMap<String, Table> = std::collections::BTreeMap::new();
        for row in columns {
            let table = tables.entry(row.table_name.clone()).or_insert_with(|| Table {
                qualified_name: row.table_name.clone(),
                columns: Vec::new(),
                primary_key: Vec::new(),
                foreign_keys: Vec::new(),
            });
            table.columns.push(Column {
                name: row.column_name,
                sql_type: classify_sql_type(&row.data_type),
                nullable: row.is_nullable == "YES",
            });
        }

        for row in primary_keys {
            if let Some(table) = tables.get_mut(&row.table_name) {
                table.primary_key.push(row.column_name);
            }
        }

        // Foreign key rows are multi-column-key friendly: group consecutive
        // rows sharing `constraint_name` into one `ForeignKey` with ordered
        // column lists (the query above already orders by ordinal position).
        let mut fk_order: Vec<String> = Vec::new();
        let mut fk_groups: std::collections::HashMap<String, ForeignKey> = std::collections::HashMap::new();
        for row in foreign_keys {
            let entry = fk_groups.entry(row.constraint_name.clone()).or_insert_with(|| {
                fk_order.push(row.constraint_name.clone());
                ForeignKey {
                    from_table: row.from_table.clone(),
                    from_columns: Vec::new(),
                    to_table: row.to_table.clone(),
                    to_columns: Vec::new(),
                }
            });
            entry.from_columns.push(row.from_column);
            entry.to_columns.push(row.to_column);
        }
        for name in fk_order {
            let fk = fk_groups.remove(&name).expect("just inserted");
            if let Some(table) = tables.get_mut(&fk.from_table) {
                table.foreign_keys.push(fk);
            }
        }

        Ok(SchemaSet::new(tables.into_values().collect()))
    }
}
