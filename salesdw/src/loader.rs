use crate::config::DimensionCommit;
use crate::dimension::{DimensionResolver, TimeDimension, UserDimension};
use crate::errors::{Result, WarehouseError};
use crate::fact::insert_fact;
use crate::models::{CleanRecord, LoadReport, TimeParts};
use crate::stats::StatisticsAccumulator;
use rusqlite::Connection;

/// Surrogate keys for every natural key of one batch.
struct BatchKeys {
    users: DimensionResolver<UserDimension>,
    times: DimensionResolver<TimeDimension>,
}

/// Loads batches of cleaned rows into the star schema in two phases.
///
/// Phase one walks the rows in order and resolves every dimension key,
/// creating the missing rows; the first occurrence of a natural key creates
/// it. Phase two walks the rows again, folds each price into the accumulator
/// and appends the fact. `DimensionCommit` decides whether phase one commits
/// on its own or together with the facts.
///
/// Any failure aborts the batch. Accumulator updates made before the failure
/// stay applied because the accumulator is not part of the transaction.
pub struct BatchLoader {
    mode: DimensionCommit,
}

impl BatchLoader {
    pub fn new(mode: DimensionCommit) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DimensionCommit {
        self.mode
    }

    pub fn load<'a, I>(
        &self,
        conn: &mut Connection,
        rows: I,
        stats: &mut StatisticsAccumulator,
    ) -> Result<LoadReport>
    where
        I: IntoIterator<Item = &'a CleanRecord>,
        I::IntoIter: Clone,
    {
        let rows = rows.into_iter();

        let (keys, facts_inserted) = match self.mode {
            DimensionCommit::WithFacts => {
                let tx = conn.transaction()?;
                let keys = resolve_dimensions(&tx, rows.clone())?;
                let facts = write_facts(&tx, rows, &keys, stats)?;
                tx.commit()?;
                (keys, facts)
            }
            DimensionCommit::BeforeFacts => {
                let tx = conn.transaction()?;
                let keys = resolve_dimensions(&tx, rows.clone())?;
                tx.commit()?;

                let tx = conn.transaction()?;
                let facts = write_facts(&tx, rows, &keys, stats)?;
                tx.commit()?;
                (keys, facts)
            }
        };

        Ok(LoadReport {
            rows: facts_inserted,
            users_created: keys.users.created(),
            time_buckets_created: keys.times.created(),
            facts_inserted,
        })
    }
}

fn check_record(row: usize, record: &CleanRecord) -> Result<()> {
    let derived = TimeParts::derive(&record.timestamp);
    if record.parts != derived {
        return Err(WarehouseError::InvalidRecord {
            row,
            reason: format!(
                "time parts {:?} disagree with timestamp {} (expected {:?})",
                record.parts, record.timestamp, derived
            ),
        });
    }
    Ok(())
}

fn resolve_dimensions<'a>(
    conn: &Connection,
    rows: impl Iterator<Item = &'a CleanRecord>,
) -> Result<BatchKeys> {
    let mut keys = BatchKeys {
        users: DimensionResolver::new(),
        times: DimensionResolver::new(),
    };
    for (row, record) in rows.enumerate() {
        check_record(row, record)?;
        keys.users.resolve(conn, &record.user_id, &())?;
        keys.times.resolve(conn, &record.timestamp, &record.parts)?;
    }
    Ok(keys)
}

fn write_facts<'a>(
    conn: &Connection,
    rows: impl Iterator<Item = &'a CleanRecord>,
    keys: &BatchKeys,
    stats: &mut StatisticsAccumulator,
) -> Result<usize> {
    let mut written = 0;
    for (row, record) in rows.enumerate() {
        stats.update(record.price);
        log::debug!("Add row {}, new stats: {:?}", row, stats.snapshot());

        let unresolved = || WarehouseError::InvalidRecord {
            row,
            reason: "dimension key changed between passes over the batch".to_string(),
        };
        let user_id = keys.users.cached(&record.user_id).ok_or_else(unresolved)?;
        let time_id = keys.times.cached(&record.timestamp).ok_or_else(unresolved)?;
        insert_fact(conn, user_id, time_id, record.price)?;
        written += 1;
    }
    Ok(written)
}
