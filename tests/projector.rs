mod common;

use std::fs;

use common::{EXPORT_HEADER, TestWorkspace, export_csv};
use encoding_rs::UTF_8;
use metering_csv::io_utils::{read_table, write_table};
use metering_csv::projector::{Projection, SchemaWarning, SourceTable, project};
use proptest::prelude::*;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn export_header_projects_to_mapping_order() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "input/B1能耗计量.csv",
        &export_csv(&[("AL1", "E-POWR"), ("lobby", "A-ANNO"), ("WM-03", "P-WATR")]),
    );
    let table = read_table(&input, UTF_8).expect("read export");
    assert_eq!(table.headers.len(), 23);

    let requested = strings(&["type", "color", "content", "layer", "x", "y", "z"]);
    let (projected, warnings) = project(&table, &requested);

    assert_eq!(projected.headers, requested);
    assert_eq!(projected.row_count(), table.rows.len());
    assert!(warnings.is_empty());
    assert_eq!(
        projected.rows[0],
        strings(&["TEXT", "256", "AL1", "E-POWR", "0.5", "0.25", "0"])
    );
}

#[test]
fn absent_column_is_omitted_with_warning() {
    let table = SourceTable {
        headers: strings(&EXPORT_HEADER),
        rows: vec![vec!["x".to_string(); 23]],
    };
    let (projected, warnings) = project(&table, &strings(&["content", "foo", "x"]));
    assert_eq!(projected.headers, strings(&["content", "x"]));
    assert_eq!(
        warnings,
        vec![SchemaWarning::ColumnNotFound {
            column: "foo".to_string()
        }]
    );
    assert!(warnings[0].to_string().contains("foo"));
}

#[test]
fn projection_output_is_byte_identical_across_runs() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "input/L1能耗计量.csv",
        &export_csv(&[("AL1", "E"), ("\"quoted, text\"", "A"), ("", "B")]),
    );
    let requested = strings(&["content", "layer", "x"]);

    let mut outputs = Vec::new();
    for run in 0..2 {
        let table = read_table(&input, UTF_8).expect("read input");
        let (projected, _) = project(&table, &requested);
        let path = workspace.path().join(format!("run{run}.csv"));
        write_table(&path, &projected.headers, &projected.rows).expect("write output");
        outputs.push(fs::read(&path).expect("read output"));
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn projected_output_reads_back_with_same_shape() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("input/a.csv", &export_csv(&[("AL1", "E"), ("AL2", "E")]));
    let table = read_table(&input, UTF_8).expect("read input");
    let (projected, _) = project(&table, &strings(&["z", "content"]));
    let output = workspace.path().join("out.csv");
    write_table(&output, &projected.headers, &projected.rows).expect("write output");

    let reread = read_table(&output, UTF_8).expect("reread output");
    assert_eq!(reread.headers, strings(&["z", "content"]));
    assert_eq!(reread.rows, projected.rows);
}

fn table_strategy() -> impl Strategy<Value = (Vec<String>, Vec<Vec<String>>)> {
    proptest::collection::hash_set("[a-e]{1,2}", 1..8).prop_flat_map(|headers| {
        let headers = headers.into_iter().collect::<Vec<_>>();
        let width = headers.len();
        let rows = proptest::collection::vec(
            proptest::collection::vec("[a-z0-9 ]{0,4}", 0..=width),
            0..20,
        );
        (Just(headers), rows)
    })
}

proptest! {
    #[test]
    fn projection_preserves_row_count_and_order(
        (headers, rows) in table_strategy(),
        requested in proptest::collection::vec("[a-f]{1,2}", 0..10),
    ) {
        let table = SourceTable { headers: headers.clone(), rows };
        let (projected, warnings) = project(&table, &requested);

        prop_assert_eq!(projected.rows.len(), table.rows.len());
        for row in &projected.rows {
            prop_assert_eq!(row.len(), projected.headers.len());
        }

        let mut expected = Vec::new();
        for name in &requested {
            if headers.contains(name) && !expected.contains(name) {
                expected.push(name.clone());
            }
        }
        prop_assert_eq!(&projected.headers, &expected);

        let plan = Projection::plan(&headers, &requested);
        prop_assert_eq!(warnings.len(), plan.missing().len());
        for missing in plan.missing() {
            prop_assert!(!headers.contains(missing));
        }
    }
}
