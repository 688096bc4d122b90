use crate::errors::{Result, WarehouseError};
use crate::models::{TimeParts, TimeRow, UserRow};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A dimension table keyed by a natural key and referenced through a surrogate key.
pub trait Dimension {
    const TABLE: &'static str;
    const NATURAL_KEY: &'static str;
    type Key: Clone + Eq + Hash + Debug;
    type Attributes;

    /// The natural key as it is stored in the `NATURAL_KEY` column.
    fn key_value(key: &Self::Key) -> Value;

    /// Inserts a new row and returns the store-assigned surrogate key.
    fn insert(conn: &Connection, key: &Self::Key, attributes: &Self::Attributes) -> Result<i64>;

    fn find(conn: &Connection, key: &Self::Key) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1",
            Self::TABLE,
            Self::NATURAL_KEY
        );
        let id = conn
            .query_row(&sql, params![Self::key_value(key)], |row| row.get(0))
            .optional()?;
        Ok(id)
    }
}

pub struct UserDimension;

impl Dimension for UserDimension {
    const TABLE: &'static str = "dim_user";
    const NATURAL_KEY: &'static str = "user_key";
    type Key = i64;
    type Attributes = ();

    fn key_value(key: &i64) -> Value {
        Value::Integer(*key)
    }

    fn insert(conn: &Connection, key: &i64, _attributes: &()) -> Result<i64> {
        conn.execute("INSERT INTO dim_user (user_key) VALUES (?1)", params![key])?;
        Ok(conn.last_insert_rowid())
    }
}

impl UserDimension {
    pub fn get(conn: &Connection, user_key: i64) -> Result<Option<UserRow>> {
        let row = conn
            .query_row(
                "SELECT id, user_key FROM dim_user WHERE user_key = ?1",
                params![user_key],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        user_key: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

pub struct TimeDimension;

pub fn date_key(date: &NaiveDateTime) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

impl Dimension for TimeDimension {
    const TABLE: &'static str = "dim_time";
    const NATURAL_KEY: &'static str = "date";
    type Key = NaiveDateTime;
    type Attributes = TimeParts;

    fn key_value(key: &NaiveDateTime) -> Value {
        Value::Text(date_key(key))
    }

    fn insert(conn: &Connection, key: &NaiveDateTime, attributes: &TimeParts) -> Result<i64> {
        // Calendar parts are fixed at creation and must agree with the date.
        let derived = TimeParts::derive(key);
        if *attributes != derived {
            return Err(WarehouseError::InvalidArg(format!(
                "time parts {attributes:?} do not match date {key} (expected {derived:?})"
            )));
        }
        conn.execute(
            "INSERT INTO dim_time (date, year, semester, trimester, month) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                date_key(key),
                derived.year,
                derived.semester,
                derived.trimester,
                derived.month
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl TimeDimension {
    pub fn get(conn: &Connection, date: &NaiveDateTime) -> Result<Option<TimeRow>> {
        let row = conn
            .query_row(
                "SELECT id, date, year, semester, trimester, month FROM dim_time WHERE date = ?1",
                params![date_key(date)],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        TimeParts {
                            year: row.get(2)?,
                            semester: row.get(3)?,
                            trimester: row.get(4)?,
                            month: row.get(5)?,
                        },
                    ))
                },
            )
            .optional()?;

        row.map(|(id, raw_date, parts)| {
            let date = NaiveDateTime::parse_from_str(&raw_date, DATE_KEY_FORMAT).map_err(|e| {
                WarehouseError::InvalidArg(format!("stored date '{raw_date}' is unreadable: {e}"))
            })?;
            Ok(TimeRow { id, date, parts })
        })
        .transpose()
    }
}

/// Get-or-create over one dimension table.
///
/// The lookup and the insert are two statements, so the resolver assumes a
/// single writer per batch. The unique index on the natural key turns a
/// concurrent duplicate into a `ConstraintViolation` instead of a second row.
/// Existing rows are returned untouched; supplied attributes only matter on
/// creation. Keys resolved once are memoised for the resolver's lifetime.
pub struct DimensionResolver<D: Dimension> {
    cache: HashMap<D::Key, i64>,
    created: usize,
    _dimension: PhantomData<D>,
}

impl<D: Dimension> Default for DimensionResolver<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dimension> DimensionResolver<D> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            created: 0,
            _dimension: PhantomData,
        }
    }

    pub fn resolve(
        &mut self,
        conn: &Connection,
        key: &D::Key,
        attributes: &D::Attributes,
    ) -> Result<i64> {
        if let Some(id) = self.cache.get(key) {
            return Ok(*id);
        }

        let id = match D::find(conn, key)? {
            Some(id) => id,
            None => {
                let id = D::insert(conn, key, attributes)?;
                self.created += 1;
                log::debug!("Created {} row {} for key {:?}", D::TABLE, id, key);
                id
            }
        };
        self.cache.insert(key.clone(), id);
        Ok(id)
    }

    /// Surrogate key for a natural key this resolver has already resolved.
    pub fn cached(&self, key: &D::Key) -> Option<i64> {
        self.cache.get(key).copied()
    }

    /// Number of rows this resolver inserted.
    pub fn created(&self) -> usize {
        self.created
    }
}
