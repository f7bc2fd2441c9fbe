//! Document Reconstructor (§4.4): folds the SQL Generator's ordered,
//! NULL-padded row stream into the nested job documents the Typed Encoder
//! will flatten for the warehouse.

pub mod document;
pub mod reconstruct;

pub use document::{DocValue, Document};
pub use reconstruct::{ReconstructionError, Reconstructor};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sfx_core::RowValue;
    use sfx_graph::build_graph;
    use sfx_schema::{Column, ForeignKey, SchemaSet, SqlType, Table};
    use sfx_sql::build_plan;

    fn col(name: &str) -> Column {
        Column {
            name: name.to_string(),
            sql_type: SqlType::Integer,
            nullable: true,
        }
    }

    fn fixture_plan() -> sfx_sql::Plan {
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
        let job_log = Table {
            qualified_name: "job_log".into(),
            columns: vec![col("id"), col("job_id"), col("line_no")],
            primary_key: vec!["id".into()],
            foreign_keys: vec![ForeignKey {
                from_table: "job_log".into(),
                from_columns: vec!["job_id".into()],
                to_table: "job".into(),
                to_columns: vec!["id".into()],
            }],
        };
        let failure_line = Table {
            qualified_name: "failure_line".into(),
            columns: vec![col("id"), col("job_log_id"), col("message")],
            primary_key: vec!["id".into()],
            foreign_keys: vec![ForeignKey {
                from_table: "failure_line".into(),
                from_columns: vec!["job_log_id".into()],
                to_table: "job_log".into(),
                to_columns: vec!["id".into()],
            }],
        };
        let schema = SchemaSet::new(vec![job, machine, job_log, failure_line]);
        let include = vec![
            "job".into(),
            "machine".into(),
            "job_log".into(),
            "failure_line".into(),
        ];
        let graph = build_graph(&schema, "job", &include, &[]).unwrap();
        build_plan(&schema, &graph)
    }

    fn ts() -> RowValue {
        RowValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn int(v: i64) -> RowValue {
        RowValue::Int(v)
    }

    fn text(v: &str) -> RowValue {
        RowValue::Text(v.to_string())
    }

    const NULL: RowValue = RowValue::Null;

    #[test]
    fn reconstructs_nested_many_and_one_edges() {
        let plan = fixture_plan();
        // Slots: job[0..3), machine[3..5), job_log[5..8), failure_line[8..11).
        let rows: Vec<sfx_core::Row> = vec![
            // root-only row
            vec![int(1), ts(), int(10), int(10), text("m1"), NULL, NULL, NULL, NULL, NULL, NULL],
            // job_log id=100
            vec![
                int(1), ts(), int(10), int(10), text("m1"),
                int(100), int(1), int(1),
                NULL, NULL, NULL,
            ],
            // failure_line id=1000, child of job_log 100
            vec![
                int(1), ts(), int(10), int(10), text("m1"),
                int(100), int(1), int(1),
                int(1000), int(100), text("oops"),
            ],
            // job_log id=101, no failures
            vec![
                int(1), ts(), int(10), int(10), text("m1"),
                int(101), int(1), int(2),
                NULL, NULL, NULL,
            ],
        ];

        let mut recon = Reconstructor::new(&plan);
        let mut completed = Vec::new();
        for row in &rows {
            if let Some(doc) = recon.ingest_row(row).unwrap() {
                completed.push(doc);
            }
        }
        if let Some(doc) = recon.finish() {
            completed.push(doc);
        }

        assert_eq!(completed.len(), 1);
        let root = &completed[0];

        assert_eq!(root.get("id"), Some(&DocValue::Scalar(int(1))));
        match root.get("machine") {
            Some(DocValue::One(m)) => {
                assert_eq!(m.get("name"), Some(&DocValue::Scalar(text("m1"))));
            }
            other => panic!("expected nested machine lookup, got {other:?}"),
        }

        let logs = match root.get("job_log") {
            Some(DocValue::Many(children)) => children,
            other => panic!("expected job_log collection, got {other:?}"),
        };
        assert_eq!(logs.len(), 2);

        let (_, first_log) = &logs[0];
        assert_eq!(first_log.get("line_no"), Some(&DocValue::Scalar(int(1))));
        let failures = match first_log.get("failure_line") {
            Some(DocValue::Many(children)) => children,
            other => panic!("expected failure_line collection, got {other:?}"),
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].1.get("message"),
            Some(&DocValue::Scalar(text("oops")))
        );

        let (_, second_log) = &logs[1];
        match second_log.get("failure_line") {
            Some(DocValue::Many(children)) => assert!(children.is_empty()),
            other => panic!("expected empty failure_line collection, got {other:?}"),
        }
    }

    #[test]
    fn root_row_with_no_many_children_yields_one_document_with_empty_sequences() {
        let plan = fixture_plan();
        let row: sfx_core::Row = vec![
            int(2), ts(), NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL,
        ];
        let mut recon = Reconstructor::new(&plan);
        assert_eq!(recon.ingest_row(&row).unwrap(), None);
        let doc = recon.finish().expect("root document must be produced");
        assert_eq!(doc.get("machine"), None);
        match doc.get("job_log") {
            Some(DocValue::Many(children)) => assert!(children.is_empty()),
            other => panic!("expected empty job_log collection, got {other:?}"),
        }
    }

    #[test]
    fn stray_scalar_outside_the_open_chain_is_a_reconstruction_error() {
        let plan = fixture_plan();
        // failure_line columns populated without their job_log ancestor open.
        let row: sfx_core::Row = vec![
            int(1), ts(), int(10), int(10), text("m1"),
            NULL, NULL, NULL,
            int(1000), int(100), text("oops"),
        ];
        let mut recon = Reconstructor::new(&plan);
        assert!(recon.ingest_row(&row).is_err());
    }

    #[test]
    fn new_root_pk_flushes_the_prior_document() {
        let plan = fixture_plan();
        let row1: sfx_core::Row = vec![
            int(1), ts(), NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL,
        ];
        let row2: sfx_core::Row = vec![
            int(2), ts(), NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL,
        ];
        let mut recon = Reconstructor::new(&plan);
        assert!(recon.ingest_row(&row1).unwrap().is_none());
        let flushed = recon.ingest_row(&row2).unwrap().expect("job 1 must flush");
        assert_eq!(flushed.get("id"), Some(&DocValue::Scalar(int(1))));
        let last = recon.finish().expect("job 2 must flush at finish");
        assert_eq!(last.get("id"), Some(&DocValue::Scalar(int(2))));
    }
}
