//! TATP transaction executor.
//!
//! Each transaction maps to the statements in [`crate::schema::tatp`]. Lookups
//! that match nothing come back as [`Outcome::Missing`]; an insert that hits an
//! existing key (or, with foreign keys on, a missing facility) comes back as
//! [`Outcome::Conflict`]. Every other SQLite error is returned as `Err`.

use crate::schema::tatp::*;
use crate::schema::{is_constraint_violation, sql_key};
use anyhow::{Context, Result};
use dbbench_core::tatp::{Procedure, ProcedureGenerator};
use dbbench_core::{Outcome, Worker};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

pub struct TatpWorker {
    conn: Connection,
    procedures: ProcedureGenerator,
}

impl TatpWorker {
    pub fn new(conn: Connection, procedures: ProcedureGenerator) -> Self {
        Self { conn, procedures }
    }

    /// Run one transaction against the database.
    pub fn execute(&mut self, procedure: &Procedure) -> Result<Outcome> {
        match procedure {
            Procedure::GetSubscriberData { s_id } => {
                let mut stmt = self.conn.prepare_cached(GET_SUBSCRIBER_DATA)?;
                let mut rows = stmt.query(params![sql_key(*s_id)?])?;
                let Some(row) = rows.next()? else {
                    return Ok(Outcome::Missing);
                };
                for i in 0..SUBSCRIBER_COLUMNS {
                    row.get_ref(i)?;
                }
                Ok(Outcome::Success)
            }

            Procedure::GetNewDestination {
                s_id,
                sf_type,
                start_time,
                end_time,
            } => {
                let mut stmt = self.conn.prepare_cached(GET_NEW_DESTINATION)?;
                let numbers = stmt
                    .query_map(
                        params![sql_key(*s_id)?, sf_type, start_time, end_time],
                        |row| row.get::<_, String>(0),
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(Outcome::hit_or_miss(!numbers.is_empty()))
            }

            Procedure::GetAccessData { s_id, ai_type } => {
                let data = self
                    .conn
                    .prepare_cached(GET_ACCESS_DATA)?
                    .query_row(params![sql_key(*s_id)?, ai_type], |row| {
                        Ok((
                            row.get::<_, u8>(0)?,
                            row.get::<_, u8>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    })
                    .optional()?;
                Ok(Outcome::hit_or_miss(data.is_some()))
            }

            Procedure::UpdateSubscriberData {
                s_id,
                sf_type,
                bit_1,
                data_a,
            } => {
                let tx = self
                    .conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.prepare_cached(UPDATE_SUBSCRIBER_BIT)?
                    .execute(params![bit_1, sql_key(*s_id)?])?;
                let changed = tx
                    .prepare_cached(UPDATE_FACILITY_DATA)?
                    .execute(params![data_a, sql_key(*s_id)?, sf_type])?;
                tx.commit()?;
                Ok(Outcome::hit_or_miss(changed > 0))
            }

            Procedure::UpdateLocation {
                sub_nbr,
                vlr_location,
            } => {
                let changed = self
                    .conn
                    .prepare_cached(UPDATE_LOCATION)?
                    .execute(params![vlr_location, sub_nbr])?;
                Ok(Outcome::hit_or_miss(changed > 0))
            }

            Procedure::InsertCallForwarding {
                sub_nbr,
                sf_type,
                start_time,
                end_time,
                numberx,
            } => {
                let tx = self
                    .conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)?;
                let s_id: Option<i64> = tx
                    .prepare_cached(SUBSCRIBER_ID_BY_NUMBER)?
                    .query_row(params![sub_nbr], |row| row.get(0))
                    .optional()?;
                let Some(s_id) = s_id else {
                    tx.commit()?;
                    return Ok(Outcome::Missing);
                };

                tx.prepare_cached(FACILITY_TYPES)?
                    .query_map(params![s_id], |row| row.get::<_, u8>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                let inserted = tx.prepare_cached(INSERT_CALL_FORWARDING)?.execute(params![
                    s_id, sf_type, start_time, end_time, numberx
                ]);
                let outcome = match inserted {
                    Ok(_) => Outcome::Success,
                    Err(e) if is_constraint_violation(&e) => Outcome::Conflict,
                    Err(e) => return Err(e.into()),
                };
                tx.commit()?;
                Ok(outcome)
            }

            Procedure::DeleteCallForwarding {
                sub_nbr,
                sf_type,
                start_time,
            } => {
                let tx = self
                    .conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)?;
                let s_id: Option<i64> = tx
                    .prepare_cached(SUBSCRIBER_ID_BY_NUMBER)?
                    .query_row(params![sub_nbr], |row| row.get(0))
                    .optional()?;
                let Some(s_id) = s_id else {
                    tx.commit()?;
                    return Ok(Outcome::Missing);
                };
                let deleted = tx
                    .prepare_cached(DELETE_CALL_FORWARDING)?
                    .execute(params![s_id, sf_type, start_time])?;
                tx.commit()?;
                Ok(Outcome::hit_or_miss(deleted > 0))
            }
        }
    }
}

impl Worker for TatpWorker {
    fn step(&mut self) -> Result<Outcome> {
        let kind = self.procedures.next_kind();
        let procedure = self.procedures.generate(kind);
        self.execute(&procedure)
            .with_context(|| format!("{kind:?} transaction"))
    }
}
