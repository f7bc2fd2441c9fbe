/// A scalar column type as reported by the source's information schema.
/// The extractor only needs to distinguish enough to pick a type tag later
/// (§4.5); it doesn't attempt a full SQL type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    Boolean,
    Integer,
    Numeric,
    Text,
    Timestamp,
    /// Anything the introspector didn't recognize; treated as text.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

/// `qualified_name` is the table's name as it appears in the source (schema
/// and table, e.g. `"public.job"`); we treat it as an opaque identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub qualified_name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

/// The full, deterministically-ordered set of tables the introspector found.
/// §4.1's contract: tables sorted by name, columns by ordinal (introspector's
/// responsibility to have already ordered them), FKs by `(from_table, from_columns)`.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    tables: Vec<Table>,
}

impl SchemaSet {
    pub fn new(mut tables: Vec<Table>) -> Self {
        tables.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        for table in &mut tables {
            table.foreign_keys.sort_by(|a, b| {
                (&a.from_table, &a.from_columns).cmp(&(&b.from_table, &b.from_columns))
            });
        }
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, qualified_name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.qualified_name == qualified_name)
    }

    /// Foreign keys anywhere in the schema whose target is `qualified_name`,
    /// i.e. the *many*-edges a Relation Graph Builder would attach as
    /// children of that table.
    pub fn inbound_foreign_keys<'a>(
        &'a self,
        qualified_name: &'a str,
    ) -> impl Iterator<Item = (&'a Table, &'a ForeignKey)> + 'a {
        self.tables.iter().flat_map(move |t| {
            t.foreign_keys
                .iter()
                .filter(move |fk| fk.to_table == qualified_name)
                .map(move |fk| (t, fk))
        })
    }
}
