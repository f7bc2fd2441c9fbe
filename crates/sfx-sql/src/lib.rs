//! SQL Generator (§4.3): synthesizes the canonical `UNION ALL` extraction
//! query from a schema graph, plus the shared Projection that the Document
//! Reconstructor and Typed Encoder need to interpret its result rows.

pub mod dialect;
pub mod generate;
pub mod plan;

pub use dialect::{Dialect, PostgresDialect};
pub use generate::{generate_sql, normalize_whitespace, CanonicalSql, Projection, Slot, FINGERPRINT_DRIVER};
pub use plan::{build_plan, Plan, PlanNode};

#[cfg(test)]
mod tests {
    use super::*;
    use sfx_graph::build_graph;
    use sfx_schema::{Column, ForeignKey, SchemaSet, SqlType, Table};

    fn col(name: &str) -> Column {
        Column {
            name: name.to_string(),
            sql_type: SqlType::Integer,
            nullable: false,
        }
    }

    fn fixture() -> SchemaSet {
        let job = Table {
            qualified_name: "job".into(),
            columns: vec![col("id"), col("last_modified"), col("machine_id")],
            primary_key: vec!["id".into()],
            foreign_keys: vec![ForeignKey {
                from_table: "job".into(),
                from_columns: vec!["machine_id".into()],
                to_table: "machine".into(),
                to_columns: vec!["id".into()],
            }],
        };
        let machine = Table {
            qualified_name: "machine".into(),
            columns: vec![col("id"), col("name")],
            primary_key: vec!["id".into()],
            foreign_keys: vec![],
        };
        let job_detail = Table {
            qualified_name: "job_detail".into(),
            columns: vec![col("id"), col("job_id"), col("title"), col("value")],
            primary_key: vec!["id".into()],
            foreign_keys: vec![ForeignKey {
                from_table: "job_detail".into(),
                from_columns: vec!["job_id".into()],
                to_table: "job".into(),
                to_columns: vec!["id".into()],
            }],
        };
        SchemaSet::new(vec![job, machine, job_detail])
    }

    #[test]
    fn determinism_invariant_1() {
        let schema = fixture();
        let include = vec!["job".into(), "machine".into(), "job_detail".into()];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        let (a, _) = generate_sql(&schema, &graph, &PostgresDialect);
        let (b, _) = generate_sql(&schema, &graph, &PostgresDialect);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn projection_width_matches_sum_of_columns() {
        let schema = fixture();
        let include = vec!["job".into(), "machine".into(), "job_detail".into()];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        let (_, projection) = generate_sql(&schema, &graph, &PostgresDialect);
        assert_eq!(projection.width(), 3 + 2 + 4);
    }

    #[test]
    fn every_branch_is_a_union_arm_with_one_inner_join_at_its_tail() {
        let schema = fixture();
        let include = vec!["job".into(), "machine".into(), "job_detail".into()];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        let (sql, _) = generate_sql(&schema, &graph, &PostgresDialect);
        let rendered = sql.render("SELECT 0 AS id");
        // Two branches: root-only, and job_detail.
        assert_eq!(rendered.matches("UNION ALL").count(), 1);
        // The job_detail branch's last segment is an inner JOIN (no "LEFT").
        assert!(rendered.contains(r#"JOIN "job_detail" AS t3 ON"#));
        assert!(!rendered.contains(r#"LEFT JOIN "job_detail""#));
    }

    #[test]
    fn fingerprint_is_stable_text() {
        let schema = fixture();
        let include = vec!["job".into(), "machine".into(), "job_detail".into()];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        let (sql, _) = generate_sql(&schema, &graph, &PostgresDialect);
        let fp1 = sql.fingerprint();
        let fp2 = sql.fingerprint();
        assert_eq!(fp1, fp2);
        assert!(fp1.contains("SELECT 0 AS id"));
    }

    /// E1: the fingerprint of the fixture schema (driver = `SELECT 0 AS id`)
    /// is a byte-stable literal; any change here is schema drift, not noise.
    /// Pinned inline with `insta` so the diff on a real change is readable.
    #[test]
    fn e1_fingerprint_is_pinned_by_snapshot() {
        let schema = fixture();
        let include = vec!["job".into(), "machine".into(), "job_detail".into()];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        let (sql, _) = generate_sql(&schema, &graph, &PostgresDialect);
        insta::assert_snapshot!(sql.fingerprint(), @r#"SELECT * FROM (SELECT t1."id" AS c0, t1."last_modified" AS c1, t1."machine_id" AS c2, t2."id" AS c3, t2."name" AS c4, NULL AS c5, NULL AS c6, NULL AS c7, NULL AS c8 FROM (SELECT 0 AS id) AS t0 LEFT JOIN "job" AS t1 ON t1."id" = t0."id" LEFT JOIN "machine" AS t2 ON t2."id" = t1."machine_id" UNION ALL SELECT t1."id" AS c0, t1."last_modified" AS c1, t1."machine_id" AS c2, t2."id" AS c3, t2."name" AS c4, t3."id" AS c5, t3."job_id" AS c6, t3."title" AS c7, t3."value" AS c8 FROM (SELECT 0 AS id) AS t0 LEFT JOIN "job" AS t1 ON t1."id" = t0."id" JOIN "job_detail" AS t3 ON t3."job_id" = t1."id" LEFT JOIN "machine" AS t2 ON t2."id" = t1."machine_id") AS u ORDER BY (u.c0 IS NOT NULL), u.c0, (u.c5 IS NOT NULL), u.c5"#);
    }

    /// A one-edge lookup's join must reference the *parent's* FK column on
    /// the parent alias and the lookup's own referenced column on the
    /// lookup's alias — not the other way around, which would reference a
    /// column that doesn't exist on the lookup table whenever the FK column
    /// name differs from the referenced primary key (the normal case, e.g.
    /// `job.machine_id` referencing `machine.id`).
    #[test]
    fn one_edge_lookup_joins_on_the_parents_fk_column() {
        let schema = fixture();
        let include = vec!["job".into(), "machine".into(), "job_detail".into()];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        let (sql, _) = generate_sql(&schema, &graph, &PostgresDialect);
        let rendered = sql.render("SELECT 0 AS id");
        assert!(rendered.contains(r#"LEFT JOIN "machine" AS t2 ON t2."id" = t1."machine_id""#));
        assert!(!rendered.contains(r#"t2."machine_id""#));
    }

    /// §8 invariant 1: `CanonicalSQL(schema) == CanonicalSQL(schema)` holds
    /// for every subset of the fixture's tables that still reaches the root.
    #[derive(Debug, Clone)]
    struct IncludeSubset(Vec<&'static str>);

    impl quickcheck::Arbitrary for IncludeSubset {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let mut tables = vec!["job"];
            if bool::arbitrary(g) {
                tables.push("machine");
            }
            if bool::arbitrary(g) {
                tables.push("job_detail");
            }
            IncludeSubset(tables)
        }
    }

    #[quickcheck_macros::quickcheck]
    fn determinism_holds_for_every_reachable_subset(subset: IncludeSubset) -> bool {
        let schema = fixture();
        let include: Vec<String> = subset.0.iter().map(|s| s.to_string()).collect();
        let graph = match build_graph(&schema, "job", &include, &[]) {
            Ok(graph) => graph,
            Err(_) => return true,
        };
        let (a, _) = generate_sql(&schema, &graph, &PostgresDialect);
        let (b, _) = generate_sql(&schema, &graph, &PostgresDialect);
        a.fingerprint() == b.fingerprint()
    }
}
