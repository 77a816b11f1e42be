use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use sqlx::{MySql, Transaction};

use crate::error::{AppError, AppResult};

/// Columns of `users` that profile edits may touch.
pub const USER_COLUMNS: &[&str] = &[
    "first_name",
    "middle_name",
    "last_name",
    "suffix_name",
    "phone_number",
];

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn to_sql_value(value: &Value) -> AppResult<SqlValue> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.trim().to_string())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(AppError::validation("Number out of range"));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => return Err(AppError::validation("Unsupported JSON value type")),
    })
}

/// Splits a JSON object into the keys in `columns` and the rest.
pub fn partition(payload: &Value, columns: &[&str]) -> AppResult<(Map<String, Value>, Map<String, Value>)> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::validation("Payload must be a JSON object"))?;

    Ok(obj
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(k, _)| columns.contains(&k.as_str())))
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear; they become column names, so
/// anything else is refused outright.
pub fn build_update_sql(
    table: &str,
    fields: &Map<String, Value>,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> AppResult<SqlUpdate> {
    if fields.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    if let Some(bad) = fields.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::validation(format!("Field '{bad}' cannot be updated")));
    }

    let set_clause = fields
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = fields
        .values()
        .map(to_sql_value)
        .collect::<AppResult<Vec<_>>>()?;

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    tx: &mut Transaction<'_, MySql>,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(&mut **tx).await?;
    Ok(result.rows_affected())
}

/// Applies a profile edit: name/phone keys go to `users`, the rest to
/// `table`. Returns false if the profile does not exist.
pub async fn update_profile(
    tx: &mut Transaction<'_, MySql>,
    table: &str,
    allowed: &[&str],
    profile_id: u64,
    payload: &Value,
) -> AppResult<bool> {
    let user_id = sqlx::query_scalar::<_, u64>(&format!("SELECT user_id FROM {table} WHERE id = ? FOR UPDATE"))
        .bind(profile_id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(user_id) = user_id else {
        return Ok(false);
    };

    let (user_fields, profile_fields) = partition(payload, USER_COLUMNS)?;

    if user_fields.is_empty() && profile_fields.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    if !user_fields.is_empty() {
        let update = build_update_sql("users", &user_fields, USER_COLUMNS, "id", user_id)?;
        execute_update(tx, update).await?;
    }

    if !profile_fields.is_empty() {
        let update = build_update_sql(table, &profile_fields, allowed, "id", profile_id)?;
        execute_update(tx, update).await?;
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_update_for_allowed_columns() {
        let payload = json!({"course": "BSCS", "ojt_hours_required": 600});
        let fields = payload.as_object().unwrap();
        let update =
            build_update_sql("interns", fields, &["course", "ojt_hours_required"], "id", 7).unwrap();

        assert!(update.sql.starts_with("UPDATE interns SET "));
        assert!(update.sql.contains("course = ?"));
        assert!(update.sql.ends_with("WHERE id = ?"));
        assert_eq!(update.values.len(), 3);
        assert_eq!(update.values.last(), Some(&SqlValue::I64(7)));
    }

    #[test]
    fn refuses_unlisted_columns() {
        let payload = json!({"status = 'Approved', course": "x"});
        let err = build_update_sql("interns", payload.as_object().unwrap(), &["course"], "id", 1)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn refuses_empty_updates() {
        let empty = Map::new();
        assert!(build_update_sql("interns", &empty, &["course"], "id", 1).is_err());
    }

    #[test]
    fn partitions_user_and_profile_fields() {
        let payload = json!({"first_name": "Ana", "course": "BSIT", "phone_number": "0917"});
        let (user, profile) = partition(&payload, USER_COLUMNS).unwrap();
        assert_eq!(user.len(), 2);
        assert!(profile.contains_key("course"));
        assert!(partition(&json!([1, 2]), USER_COLUMNS).is_err());
    }
}
