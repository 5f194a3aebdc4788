// SQLite persistence for athletes and trial records.

use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use trialstats_core::model::{
    Athlete, AthleteId, Domain, JumpMetrics, Metrics, Profile, ReactionKind, ReactionMetrics,
    RecordState, Role, ThrowMetrics, TrialId, TrialRecord,
};
use trialstats_core::source::{RecordFilter, RecordOrder, RecordSource};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// A trial to be stored as already finished (bulk import, direct entry).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrial {
    pub athlete_id: AthleteId,
    pub date: NaiveDate,
    pub metrics: Metrics,
}

/// SQLite-backed store for athletes, their profiles, and trial records.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS athletes (
                id    INTEGER PRIMARY KEY,
                name  TEXT NOT NULL,
                role  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                athlete_id INTEGER PRIMARY KEY REFERENCES athletes(id) ON DELETE CASCADE,
                track      TEXT,
                position   TEXT
            );

            CREATE TABLE IF NOT EXISTS trials (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                athlete_id      INTEGER NOT NULL REFERENCES athletes(id),
                domain          TEXT NOT NULL,
                date            TEXT NOT NULL,
                state           TEXT NOT NULL DEFAULT 'started',
                kind            TEXT,
                attempts        INTEGER,
                hits            INTEGER,
                misses          INTEGER,
                started_at      TEXT,
                finished_at     TEXT,
                flight_time     REAL,
                speed           REAL,
                power           REAL,
                distance        REAL,
                left_extension  REAL,
                right_extension REAL,
                movement        REAL
            );
            ",
        )
        .context("failed to create database schema")?;

        // Leaderboard and personal queries both filter on these columns.
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_trials_domain_state_date ON trials(domain, state, date);
             CREATE INDEX IF NOT EXISTS idx_trials_athlete ON trials(athlete_id);",
        )
        .context("failed to create trial indexes")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Athletes
    // ------------------------------------------------------------------

    /// Insert an athlete or overwrite the existing row with the same id.
    /// The profile row is replaced, or removed when `profile` is `None`.
    pub fn upsert_athlete(&self, athlete: &Athlete) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        upsert_athlete_in(&tx, athlete)?;
        tx.commit().context("failed to commit athlete upsert")?;
        Ok(())
    }

    /// Import a batch of athletes in a single transaction.
    pub fn import_athletes(&self, athletes: &[Athlete]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for athlete in athletes {
            upsert_athlete_in(&tx, athlete)?;
        }
        tx.commit().context("failed to commit athlete import")?;
        info!("imported {} athlete(s)", athletes.len());
        Ok(())
    }

    pub fn athlete(&self, id: AthleteId) -> Result<Option<Athlete>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT a.id, a.name, a.role, p.athlete_id, p.track, p.position
             FROM athletes a LEFT JOIN profiles p ON p.athlete_id = a.id
             WHERE a.id = ?1",
            params![id],
            |row| athlete_from_row(row, 0),
        )
        .optional()
        .context("failed to load athlete")
    }

    // ------------------------------------------------------------------
    // Trial lifecycle
    // ------------------------------------------------------------------

    /// Open a trial in the `started` state with no metrics. Reaction trials
    /// fix their kind here. Returns the new trial id.
    pub fn start_trial(
        &self,
        athlete_id: AthleteId,
        date: NaiveDate,
        domain: Domain,
        kind: Option<ReactionKind>,
    ) -> Result<TrialId> {
        if domain == Domain::Reaction && kind.is_none() {
            bail!("a reaction trial needs a kind when it is started");
        }
        let conn = self.conn();
        conn.execute(
            "INSERT INTO trials (athlete_id, domain, date, state, kind)
             VALUES (?1, ?2, ?3, 'started', ?4)",
            params![
                athlete_id,
                domain.as_str(),
                date.format(DATE_FORMAT).to_string(),
                kind.map(|k| k.as_str()),
            ],
        )
        .context("failed to start trial")?;
        let id = conn.last_insert_rowid();
        debug!(trial_id = id, athlete_id, %domain, "trial started");
        Ok(id)
    }

    /// Attach final metrics to a started trial.
    ///
    /// Fails with `StatsError::AlreadyFinished` (downcastable from the
    /// returned error) when the trial was already finished, and with
    /// `StatsError::DomainMismatch` when `metrics` belong to another domain.
    pub fn finish_trial(&self, id: TrialId, metrics: Metrics) -> Result<TrialRecord> {
        let current = self
            .trial(id)?
            .with_context(|| format!("trial {id} not found"))?;
        let finished = current.finish(metrics)?;

        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE trials SET
                    state = 'finished',
                    attempts = ?2, hits = ?3, misses = ?4,
                    started_at = ?5, finished_at = ?6,
                    flight_time = ?7, speed = ?8, power = ?9, distance = ?10,
                    left_extension = ?11, right_extension = ?12, movement = ?13
                 WHERE id = ?1 AND state = 'started'",
                params_from_iter(
                    std::iter::once(Value::Integer(id)).chain(metric_values(&finished.metrics)),
                ),
            )
            .context("failed to finish trial")?;
        if changed == 0 {
            // Finished concurrently between the read and the update.
            return Err(trialstats_core::StatsError::AlreadyFinished { id }.into());
        }
        debug!(trial_id = id, "trial finished");
        Ok(finished)
    }

    /// Store a trial directly in the `finished` state. Returns its id.
    pub fn insert_finished(
        &self,
        athlete_id: AthleteId,
        date: NaiveDate,
        metrics: Metrics,
    ) -> Result<TrialId> {
        let trial = NewTrial {
            athlete_id,
            date,
            metrics,
        };
        let conn = self.conn();
        insert_finished_in(&conn, &trial)
    }

    /// Import finished trials in a single transaction.
    pub fn import_trials(&self, trials: &[NewTrial]) -> Result<Vec<TrialId>> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        let mut ids = Vec::with_capacity(trials.len());
        for trial in trials {
            ids.push(insert_finished_in(&tx, trial)?);
        }
        tx.commit().context("failed to commit trial import")?;
        info!("imported {} trial(s)", trials.len());
        Ok(ids)
    }

    /// Load a single trial with its athlete embedded.
    pub fn trial(&self, id: TrialId) -> Result<Option<TrialRecord>> {
        let conn = self.conn();
        let sql = format!("{} WHERE t.id = ?1", select_trials("LEFT JOIN"));
        conn.query_row(&sql, params![id], trial_from_row)
            .optional()
            .context("failed to load trial")
    }

    // ------------------------------------------------------------------
    // Fetch
    // ------------------------------------------------------------------

    /// Load the trials matching `filter`, in insertion order.
    ///
    /// A profile filter turns the profile join into an inner join, so
    /// athletes without a profile are excluded.
    pub fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<TrialRecord>> {
        let (sql, values) = build_fetch_query(filter);
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&sql)
            .context("failed to prepare fetch query")?;
        let records = stmt
            .query_map(params_from_iter(values), trial_from_row)
            .context("failed to query trials")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map trial rows")?;
        debug!(domain = %filter.domain, "fetched {} trial(s)", records.len());
        Ok(records)
    }
}

#[async_trait]
impl RecordSource for Database {
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TrialRecord>> {
        self.fetch_records(filter)
    }
}

// ---------------------------------------------------------------------------
// SQL helpers
// ---------------------------------------------------------------------------

/// Trial columns with the athlete and profile columns in front, in the order
/// `trial_from_row` reads them. `profile_join` is `JOIN` or `LEFT JOIN`.
fn select_trials(profile_join: &str) -> String {
    format!(
        "SELECT a.id, a.name, a.role, p.athlete_id, p.track, p.position,
                t.id, t.domain, t.date, t.state, t.kind,
                t.attempts, t.hits, t.misses, t.started_at, t.finished_at,
                t.flight_time, t.speed, t.power, t.distance,
                t.left_extension, t.right_extension, t.movement
         FROM trials t
         JOIN athletes a ON a.id = t.athlete_id
         {profile_join} profiles p ON p.athlete_id = a.id"
    )
}

fn build_fetch_query(filter: &RecordFilter) -> (String, Vec<Value>) {
    let join = if filter.profile.is_some() { "JOIN" } else { "LEFT JOIN" };
    let mut sql = select_trials(join);

    let mut clauses = vec!["t.domain = ?".to_string(), "t.state = ?".to_string()];
    let mut values = vec![
        Value::Text(filter.domain.as_str().to_string()),
        Value::Text(filter.state.as_str().to_string()),
    ];

    if let Some(id) = filter.athlete_id {
        clauses.push("t.athlete_id = ?".into());
        values.push(Value::Integer(id));
    }
    if let Some(range) = filter.date_range {
        clauses.push("t.date BETWEEN ? AND ?".into());
        values.push(Value::Text(range.start.format(DATE_FORMAT).to_string()));
        values.push(Value::Text(range.end.format(DATE_FORMAT).to_string()));
    }
    if let Some(role) = filter.role {
        clauses.push("a.role = ?".into());
        values.push(Value::Text(role.as_str().to_string()));
    }
    if let Some(profile) = &filter.profile {
        if let Some(track) = &profile.track {
            clauses.push("p.track = ?".into());
            values.push(Value::Text(track.clone()));
        }
        if let Some(position) = &profile.position {
            clauses.push("p.position = ?".into());
            values.push(Value::Text(position.clone()));
        }
    }

    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
    sql.push_str(match filter.order {
        RecordOrder::Insertion => " ORDER BY t.id",
        RecordOrder::NewestFirst => " ORDER BY t.date DESC, t.id DESC",
    });
    (sql, values)
}

fn upsert_athlete_in(conn: &Connection, athlete: &Athlete) -> Result<()> {
    conn.execute(
        "INSERT INTO athletes (id, name, role) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, role = excluded.role",
        params![athlete.id, athlete.name, athlete.role.as_str()],
    )
    .context("failed to upsert athlete")?;

    match &athlete.profile {
        Some(profile) => {
            conn.execute(
                "INSERT OR REPLACE INTO profiles (athlete_id, track, position) VALUES (?1, ?2, ?3)",
                params![athlete.id, profile.track, profile.position],
            )
            .context("failed to upsert athlete profile")?;
        }
        None => {
            conn.execute("DELETE FROM profiles WHERE athlete_id = ?1", params![athlete.id])
                .context("failed to clear athlete profile")?;
        }
    }
    Ok(())
}

fn insert_finished_in(conn: &Connection, trial: &NewTrial) -> Result<TrialId> {
    let kind = match &trial.metrics {
        Metrics::Reaction(m) => Some(m.kind.as_str()),
        _ => None,
    };
    let mut values = vec![
        Value::Integer(trial.athlete_id),
        Value::Text(trial.metrics.domain().as_str().to_string()),
        Value::Text(trial.date.format(DATE_FORMAT).to_string()),
        kind.map_or(Value::Null, |k| Value::Text(k.to_string())),
    ];
    values.extend(metric_values(&trial.metrics));

    conn.execute(
        "INSERT INTO trials (
            athlete_id, domain, date, state, kind,
            attempts, hits, misses, started_at, finished_at,
            flight_time, speed, power, distance,
            left_extension, right_extension, movement)
         VALUES (?1, ?2, ?3, 'finished', ?4,
                 ?5, ?6, ?7, ?8, ?9,
                 ?10, ?11, ?12, ?13,
                 ?14, ?15, ?16)",
        params_from_iter(values),
    )
    .with_context(|| format!("failed to insert trial for athlete {}", trial.athlete_id))?;
    Ok(conn.last_insert_rowid())
}

/// The twelve metric columns, in schema order from `attempts` to `movement`.
fn metric_values(metrics: &Metrics) -> Vec<Value> {
    let int = |v: Option<u32>| v.map_or(Value::Null, |n| Value::Integer(i64::from(n)));
    let real = |v: Option<f64>| v.map_or(Value::Null, Value::Real);
    let time = |v: Option<NaiveTime>| {
        v.map_or(Value::Null, |t| Value::Text(t.format(TIME_FORMAT).to_string()))
    };

    let mut values = vec![Value::Null; 12];
    match metrics {
        Metrics::Reaction(m) => {
            values[0] = int(m.attempts);
            values[1] = int(m.hits);
            values[2] = int(m.misses);
            values[3] = time(m.started_at);
            values[4] = time(m.finished_at);
        }
        Metrics::Throw(m) => {
            values[5] = real(m.flight_time);
            values[6] = real(m.speed);
            values[7] = real(m.power);
            values[8] = real(m.distance);
        }
        Metrics::Jump(m) => {
            values[9] = real(m.left_extension);
            values[10] = real(m.right_extension);
            values[11] = real(m.movement);
        }
    }
    values
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_tag<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let tag: String = row.get(idx)?;
    parse(&tag).ok_or_else(|| conversion_error(idx, format!("unknown tag `{tag}`")))
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        NaiveTime::parse_from_str(&t, TIME_FORMAT)
            .map_err(|e| conversion_error(idx, format!("bad time `{t}`: {e}")))
    })
    .transpose()
}

/// Read an athlete from six columns starting at `offset`:
/// id, name, role, profile key, track, position.
fn athlete_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Athlete> {
    let profile_key: Option<i64> = row.get(offset + 3)?;
    let profile = match profile_key {
        Some(_) => Some(Profile {
            track: row.get(offset + 4)?,
            position: row.get(offset + 5)?,
        }),
        None => None,
    };
    Ok(Athlete {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        role: parse_tag(row, offset + 2, Role::from_tag)?,
        profile,
    })
}

fn trial_from_row(row: &Row<'_>) -> rusqlite::Result<TrialRecord> {
    let athlete = athlete_from_row(row, 0)?;
    let domain = parse_tag(row, 7, Domain::from_tag)?;
    let date_text: String = row.get(8)?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT)
        .map_err(|e| conversion_error(8, format!("bad date `{date_text}`: {e}")))?;

    let metrics = match domain {
        Domain::Reaction => Metrics::Reaction(ReactionMetrics {
            kind: parse_tag(row, 10, ReactionKind::from_tag)?,
            attempts: row.get(11)?,
            hits: row.get(12)?,
            misses: row.get(13)?,
            started_at: parse_time(row, 14)?,
            finished_at: parse_time(row, 15)?,
        }),
        Domain::Throw => Metrics::Throw(ThrowMetrics {
            flight_time: row.get(16)?,
            speed: row.get(17)?,
            power: row.get(18)?,
            distance: row.get(19)?,
        }),
        Domain::Jump => Metrics::Jump(JumpMetrics {
            left_extension: row.get(20)?,
            right_extension: row.get(21)?,
            movement: row.get(22)?,
        }),
    };

    Ok(TrialRecord {
        id: row.get(6)?,
        athlete,
        date,
        state: parse_tag(row, 9, RecordState::from_tag)?,
        metrics,
    })
}
