use std::path::Path;

use salesdw::{
    Warehouse,
    config::WarehouseConfig,
    models::{BatchStatus, StatisticsSnapshot, TableCounts},
};
use salesingest::{IngestConfig, IngestError, Pipeline};
use tempfile::TempDir;

struct Fixture {
    _temp_dir: TempDir,
    data_dir: std::path::PathBuf,
    pipeline: Pipeline,
}

fn fixture(files: &[(&str, &str)]) -> anyhow::Result<Fixture> {
    let temp_dir = tempfile::tempdir()?;
    let data_dir = temp_dir.path().join("data");
    std::fs::create_dir_all(&data_dir)?;
    for (name, body) in files {
        std::fs::write(data_dir.join(name), body)?;
    }
    let warehouse = Warehouse::open(WarehouseConfig::new(temp_dir.path().join("dw.sqlite")))?;
    let pipeline = Pipeline::new(warehouse, IngestConfig::new(&data_dir));
    Ok(Fixture {
        _temp_dir: temp_dir,
        data_dir,
        pipeline,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[test]
fn run_loads_regular_files_then_validation() -> anyhow::Result<()> {
    let mut fx = fixture(&[
        (
            "2012-1.csv",
            "timestamp,price,user_id\n1/1/2012,10,1\n7/1/2012,30,1\n1/1/2012,20,2\n",
        ),
        (
            "2012-2.csv",
            "timestamp,price,user_id\n2/1/2012,,3\n2/2/2012,40,3\n",
        ),
        ("validation.csv", "timestamp,price,user_id\n1/1/2012,50,4\n"),
    ])?;

    let report = fx.pipeline.run(None)?;

    let names: Vec<String> = report.files.iter().map(|f| file_name(&f.path)).collect();
    assert_eq!(names, vec!["2012-1.csv", "2012-2.csv"]);
    assert_eq!(report.files[1].rows_read, 2);
    assert_eq!(report.files[1].rows_dropped, 1);
    assert_eq!(
        report.files[0].file_statistics,
        StatisticsSnapshot {
            min: Some(10.0),
            max: Some(30.0),
            average: Some(20.0),
            record_count: 3
        }
    );

    assert_eq!(
        report.reconciled_before_validation,
        StatisticsSnapshot {
            min: Some(10.0),
            max: Some(40.0),
            average: Some(25.0),
            record_count: 4
        }
    );
    let validation = report.validation.as_ref().expect("validation report");
    assert_eq!(file_name(&validation.path), "validation.csv");
    assert_eq!(report.reconciled_final.record_count, 5);
    assert_eq!(report.reconciled_final.average, Some(30.0));
    assert_eq!(fx.pipeline.get_statistics(), report.reconciled_final);
    assert_eq!(fx.pipeline.reconcile_statistics()?, report.reconciled_final);

    assert_eq!(
        fx.pipeline.warehouse().table_counts()?,
        TableCounts {
            users: 4,
            time_buckets: 3,
            sales: 5
        }
    );
    let sources: Vec<String> = fx
        .pipeline
        .warehouse()
        .list_batches()?
        .iter()
        .map(|b| file_name(Path::new(&b.source)))
        .collect();
    assert_eq!(sources, vec!["2012-1.csv", "2012-2.csv", "validation.csv"]);
    Ok(())
}

#[test]
fn malformed_timestamp_stops_the_run_before_loading() -> anyhow::Result<()> {
    let mut fx = fixture(&[
        ("a.csv", "timestamp,price,user_id\n1/1/2012,10,1\n"),
        ("b.csv", "timestamp,price,user_id\n2012/01/02,10,1\n"),
        ("c.csv", "timestamp,price,user_id\n1/3/2012,10,1\n"),
    ])?;

    let err = fx.pipeline.run(None).unwrap_err();
    assert!(matches!(err, IngestError::Parse { line: 2, .. }));

    // a.csv is committed, b.csv never reached the warehouse, c.csv was not read.
    let batches = fx.pipeline.warehouse().list_batches()?;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].status, BatchStatus::Success);
    assert_eq!(fx.pipeline.warehouse().table_counts()?.sales, 1);
    Ok(())
}

#[test]
fn explicit_data_dir_overrides_config() -> anyhow::Result<()> {
    let mut fx = fixture(&[])?;
    let other = fx.data_dir.join("other");
    std::fs::create_dir_all(&other)?;
    std::fs::write(
        other.join("sales.csv"),
        "user_id,price,timestamp\n9,1.25,3/3/2013\n",
    )?;

    let report = fx.pipeline.run(Some(&other))?;
    assert_eq!(report.files.len(), 1);
    assert!(report.validation.is_none());
    assert_eq!(report.reconciled_final.min, Some(1.25));
    Ok(())
}

#[test]
fn missing_data_dir_is_rejected() -> anyhow::Result<()> {
    let mut fx = fixture(&[])?;
    let missing = fx.data_dir.join("nope");
    let err = fx.pipeline.run(Some(&missing)).unwrap_err();
    assert!(matches!(err, IngestError::InvalidParam(_)));
    Ok(())
}

#[test]
fn empty_directory_reports_empty_statistics() -> anyhow::Result<()> {
    let mut fx = fixture(&[])?;
    let report = fx.pipeline.run(None)?;
    assert!(report.files.is_empty());
    assert_eq!(report.reconciled_final, StatisticsSnapshot::default());
    assert_eq!(fx.pipeline.get_statistics(), StatisticsSnapshot::default());
    Ok(())
}
