use chrono::{NaiveDate, NaiveDateTime};
use salesdw::{
    Warehouse,
    config::{DimensionCommit, WarehouseConfig},
    models::CleanRecord,
};
use tempfile::TempDir;

#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: WarehouseConfig,
    pub warehouse: Warehouse,
}

pub fn init_test_context(mode: DimensionCommit) -> anyhow::Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let config =
        WarehouseConfig::new(temp_dir.path().join("warehouse.sqlite")).with_dimension_commit(mode);
    let warehouse = Warehouse::open(config.clone())?;
    Ok(TestContext {
        temp_dir,
        config,
        warehouse,
    })
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .expect("valid calendar date")
}

#[allow(dead_code)]
pub fn sale(user_id: i64, price: f64, at: NaiveDateTime) -> CleanRecord {
    CleanRecord::new(user_id, price, at)
}
