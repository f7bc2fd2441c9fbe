/// Identifier quoting is dialect-specific (§4.3: "backticks" in the
/// dialect-neutral description; the Postgres adapter quotes with `"`). The
/// generator itself only depends on this trait.
pub trait Dialect {
    fn quote_ident(&self, ident: &str) -> String;
}

/// The reference dialect: the one `sfx-postgres`'s adapter targets.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}
