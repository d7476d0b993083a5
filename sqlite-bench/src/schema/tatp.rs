//! TATP tables and transaction statements.
//!
//! | Table              | Key                                | Rows per subscriber |
//! |--------------------|------------------------------------|---------------------|
//! | `subscriber`       | `s_id` (unique `sub_nbr`)          | 1                   |
//! | `access_info`      | `(s_id, ai_type)`                  | 1–4                 |
//! | `special_facility` | `(s_id, sf_type)`                  | 1–4                 |
//! | `call_forwarding`  | `(s_id, sf_type, start_time)`      | 0–3 per facility    |

use anyhow::Result;
use rusqlite::Connection;

/// Number of columns in `subscriber`.
pub const SUBSCRIBER_COLUMNS: usize = 34;

pub const GET_SUBSCRIBER_DATA: &str = "SELECT * FROM subscriber WHERE s_id = ?1";

pub const GET_NEW_DESTINATION: &str = "SELECT cf.numberx \
     FROM special_facility AS sf, call_forwarding AS cf \
     WHERE sf.s_id = ?1 AND sf.sf_type = ?2 AND sf.is_active = 1 \
       AND cf.s_id = sf.s_id AND cf.sf_type = sf.sf_type \
       AND cf.start_time <= ?3 AND ?4 < cf.end_time";

pub const GET_ACCESS_DATA: &str =
    "SELECT data1, data2, data3, data4 FROM access_info WHERE s_id = ?1 AND ai_type = ?2";

pub const UPDATE_SUBSCRIBER_BIT: &str = "UPDATE subscriber SET bit_1 = ?1 WHERE s_id = ?2";

pub const UPDATE_FACILITY_DATA: &str =
    "UPDATE special_facility SET data_a = ?1 WHERE s_id = ?2 AND sf_type = ?3";

pub const UPDATE_LOCATION: &str = "UPDATE subscriber SET vlr_location = ?1 WHERE sub_nbr = ?2";

pub const SUBSCRIBER_ID_BY_NUMBER: &str = "SELECT s_id FROM subscriber WHERE sub_nbr = ?1";

pub const FACILITY_TYPES: &str = "SELECT sf_type FROM special_facility WHERE s_id = ?1";

pub const INSERT_CALL_FORWARDING: &str =
    "INSERT INTO call_forwarding VALUES (?1, ?2, ?3, ?4, ?5)";

pub const DELETE_CALL_FORWARDING: &str =
    "DELETE FROM call_forwarding WHERE s_id = ?1 AND sf_type = ?2 AND start_time = ?3";

pub const INSERT_ACCESS_INFO: &str = "INSERT INTO access_info VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

pub const INSERT_SPECIAL_FACILITY: &str =
    "INSERT INTO special_facility VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// `INSERT INTO subscriber VALUES (?, ..., ?)` with one placeholder per column.
pub fn insert_subscriber_sql() -> String {
    format!(
        "INSERT INTO subscriber VALUES ({})",
        vec!["?"; SUBSCRIBER_COLUMNS].join(", ")
    )
}

fn numbered_columns(prefix: &str, sql_type: &str) -> String {
    (1..=10)
        .map(|i| format!("{prefix}_{i} {sql_type}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// DDL for all four tables, children after parents.
///
/// Foreign keys are always declared; SQLite only enforces them on connections
/// with `PRAGMA foreign_keys = ON`.
pub fn create_sql() -> Vec<String> {
    vec![
        "DROP TABLE IF EXISTS call_forwarding".to_string(),
        "DROP TABLE IF EXISTS special_facility".to_string(),
        "DROP TABLE IF EXISTS access_info".to_string(),
        "DROP TABLE IF EXISTS subscriber".to_string(),
        format!(
            "CREATE TABLE subscriber (\
                 s_id INTEGER, \
                 sub_nbr TEXT UNIQUE, \
                 {}, {}, {}, \
                 msc_location INTEGER, \
                 vlr_location INTEGER, \
                 PRIMARY KEY (s_id))",
            numbered_columns("bit", "INTEGER"),
            numbered_columns("hex", "INTEGER"),
            numbered_columns("byte2", "INTEGER"),
        ),
        "CREATE TABLE access_info (\
             s_id INTEGER, \
             ai_type INTEGER, \
             data1 INTEGER, \
             data2 INTEGER, \
             data3 TEXT, \
             data4 TEXT, \
             PRIMARY KEY (s_id, ai_type), \
             FOREIGN KEY (s_id) REFERENCES subscriber (s_id))"
            .to_string(),
        "CREATE TABLE special_facility (\
             s_id INTEGER, \
             sf_type INTEGER, \
             is_active INTEGER, \
             error_cntrl INTEGER, \
             data_a INTEGER, \
             data_b TEXT, \
             PRIMARY KEY (s_id, sf_type), \
             FOREIGN KEY (s_id) REFERENCES subscriber (s_id))"
            .to_string(),
        "CREATE TABLE call_forwarding (\
             s_id INTEGER, \
             sf_type INTEGER, \
             start_time INTEGER, \
             end_time INTEGER, \
             numberx TEXT, \
             PRIMARY KEY (s_id, sf_type, start_time), \
             FOREIGN KEY (s_id, sf_type) REFERENCES special_facility (s_id, sf_type))"
            .to_string(),
    ]
}

/// Drop and recreate the TATP tables.
pub fn create_tables(conn: &Connection) -> Result<()> {
    for sql in create_sql() {
        conn.execute(&sql, [])?;
    }
    Ok(())
}
