use crate::db::Database;
use crate::error::Result;
use crate::models::{RunLogEntry, TemperatureSample};
use chrono::NaiveDate;
use rusqlite::{params, Row};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(value: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

// Run Log Queries

impl Database {
    pub fn append_run_log(&self, entry: &RunLogEntry) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO run_log (run_date, temp_c, vpd_kpa, note, advisory)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    entry.run_date.format(DATE_FORMAT).to_string(),
                    entry.temp_c,
                    entry.vpd_kpa,
                    entry.note,
                    entry.advisory,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent entries first
    pub fn recent_run_logs(&self, limit: usize) -> Result<Vec<RunLogEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, run_date, temp_c, vpd_kpa, note, advisory
                FROM run_log
                ORDER BY run_date DESC, id DESC
                LIMIT ?1
                "#,
            )?;
            let rows = stmt.query_map([limit as i64], row_to_run_log)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(Into::into)
        })
    }
}

fn row_to_run_log(row: &Row) -> rusqlite::Result<RunLogEntry> {
    let run_date: String = row.get(1)?;
    Ok(RunLogEntry {
        id: Some(row.get(0)?),
        run_date: parse_date(&run_date, 1)?,
        temp_c: row.get(2)?,
        vpd_kpa: row.get(3)?,
        note: row.get(4)?,
        advisory: row.get(5)?,
    })
}

// Temperature History Queries

impl Database {
    /// Store a day's temperature; a later reading for the same date replaces it
    pub fn record_temperature(&self, sample: &TemperatureSample) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO temperature_history (date, temp_c, recorded_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(date) DO UPDATE SET
                    temp_c = excluded.temp_c,
                    recorded_at = excluded.recorded_at
                "#,
                params![sample.date.format(DATE_FORMAT).to_string(), sample.temp_c],
            )?;
            Ok(())
        })
    }

    /// Samples in `[from, to)`, oldest first
    pub fn temperature_history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TemperatureSample>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT date, temp_c FROM temperature_history
                WHERE date >= ?1 AND date < ?2
                ORDER BY date
                "#,
            )?;
            let rows = stmt.query_map(
                params![
                    from.format(DATE_FORMAT).to_string(),
                    to.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    let date: String = row.get(0)?;
                    Ok(TemperatureSample::new(parse_date(&date, 0)?, row.get(1)?))
                },
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(Into::into)
        })
    }
}

// Settings Queries

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                [key, value],
            )?;
            Ok(())
        })
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn run_log_round_trip_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let first = RunLogEntry::new(date(1), Some(21.5), Some(1.1), "", "Line one\nLine two");
        let second = RunLogEntry::new(date(2), None, None, "choveu", "Offline advice");

        let id = db.append_run_log(&first).unwrap();
        db.append_run_log(&second).unwrap();

        let logs = db.recent_run_logs(10).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].run_date, date(2));
        assert_eq!(logs[0].temp_c, None);
        assert_eq!(logs[1].id, Some(id));
        assert_eq!(logs[1].advisory, "Line one | Line two");

        assert_eq!(db.recent_run_logs(1).unwrap().len(), 1);
    }

    #[test]
    fn temperature_is_upserted_by_date() {
        let db = Database::open_in_memory().unwrap();
        db.record_temperature(&TemperatureSample::new(date(1), 18.0)).unwrap();
        db.record_temperature(&TemperatureSample::new(date(1), 22.5)).unwrap();
        db.record_temperature(&TemperatureSample::new(date(2), 19.0)).unwrap();

        let history = db.temperature_history(date(1), date(3)).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], TemperatureSample::new(date(1), 22.5));
    }

    #[test]
    fn temperature_history_excludes_end_date() {
        let db = Database::open_in_memory().unwrap();
        for d in 1..=5 {
            db.record_temperature(&TemperatureSample::new(date(d), 20.0)).unwrap();
        }
        let history = db.temperature_history(date(2), date(4)).unwrap();
        let dates: Vec<NaiveDate> = history.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2), date(3)]);
    }

    #[test]
    fn settings_round_trip() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_setting("stage").unwrap(), None);
        db.set_setting("stage", "Veraison").unwrap();
        assert_eq!(db.get_setting("stage").unwrap().as_deref(), Some("Veraison"));
        db.delete_setting("stage").unwrap();
        assert_eq!(db.get_setting("stage").unwrap(), None);
    }
}
