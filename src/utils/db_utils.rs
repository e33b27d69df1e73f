use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::{
    MySql, MySqlPool,
    mysql::MySqlArguments,
    query::{Query, QueryAs, QueryScalar},
};

/// A value bound into a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Builds `UPDATE <table> SET a = ?, b = ? WHERE <id_column> = ?` from a JSON
/// object. Only keys listed in `allowed` may appear; column names never come
/// from the request body verbatim.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".into()));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = allowed
            .iter()
            .find(|c| **c == key.as_str())
            .ok_or_else(|| AppError::BadRequest(format!("Field `{}` cannot be updated", key)))?;

        columns.push(format!("{} = ?", column));
        values.push(to_sql_value(value)?);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        columns.join(", "),
        id_column
    );

    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// `AND`-joined conditions for list queries, with their bind values in order.
#[derive(Debug, Default)]
pub struct Filters {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl Filters {
    pub fn push(&mut self, condition: &str, values: impl IntoIterator<Item = SqlValue>) {
        self.conditions.push(condition.to_string());
        self.values.extend(values);
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Binds [`SqlValue`]s onto any of sqlx's MySQL query builders.
pub trait BindValues: Sized {
    fn bind_value(self, value: SqlValue) -> Self;

    fn bind_all(self, values: &[SqlValue]) -> Self {
        values
            .iter()
            .cloned()
            .fold(self, |query, value| query.bind_value(value))
    }
}

macro_rules! impl_bind_values {
    ($([$($generics:tt)*] $ty:ty),* $(,)?) => {$(
        impl<$($generics)*> BindValues for $ty {
            fn bind_value(self, value: SqlValue) -> Self {
                match value {
                    SqlValue::String(v) => self.bind(v),
                    SqlValue::I64(v) => self.bind(v),
                    SqlValue::F64(v) => self.bind(v),
                    SqlValue::Bool(v) => self.bind(v),
                    SqlValue::Date(v) => self.bind(v),
                    SqlValue::DateTime(v) => self.bind(v),
                    SqlValue::Null => self.bind(None::<String>),
                }
            }
        }
    )*};
}

impl_bind_values!(
    ['q] Query<'q, MySql, MySqlArguments>,
    ['q, O] QueryAs<'q, MySql, O, MySqlArguments>,
    ['q, O] QueryScalar<'q, MySql, O, MySqlArguments>,
);

fn to_sql_value(value: &Value) -> Result<SqlValue, AppError> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                SqlValue::DateTime(dt.with_timezone(&Utc).naive_utc())
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(AppError::BadRequest("Unsupported number".into()));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => return Err(AppError::BadRequest("Unsupported JSON value type".into())),
    })
}

/// Runs the update and returns the number of rows it touched.
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    tracing::debug!(sql = %update.sql, values = ?update.values, "Executing dynamic update");

    let result = sqlx::query(&update.sql)
        .bind_all(&update.values)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EVENT_COLUMNS: &[&str] = &["title", "starts_at", "location"];

    #[test]
    fn builds_set_clause_for_whitelisted_columns() {
        let update = build_update_sql(
            "calendar_event",
            &json!({ "title": "Reunión de equipo", "location": null }),
            EVENT_COLUMNS,
            "id",
            7,
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE calendar_event SET "));
        assert!(update.sql.ends_with(" WHERE id = ?"));
        assert!(update.sql.contains("title = ?"));
        assert!(update.sql.contains("location = ?"));
        assert_eq!(update.values.len(), 3);
        assert_eq!(update.values.last(), Some(&SqlValue::I64(7)));
    }

    #[test]
    fn rejects_columns_outside_the_whitelist() {
        let err = build_update_sql(
            "calendar_event",
            &json!({ "created_by = 1, title": "x" }),
            EVENT_COLUMNS,
            "id",
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("t", &json!({}), EVENT_COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("t", &json!([1, 2]), EVENT_COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn filters_join_conditions_in_order() {
        let mut filters = Filters::default();
        assert_eq!(filters.where_clause(), "");

        filters.push("kind = ?", [SqlValue::String("protocol".into())]);
        filters.push(
            "(title LIKE ? OR description LIKE ?)",
            [SqlValue::String("%iaas%".into()), SqlValue::String("%iaas%".into())],
        );

        assert_eq!(
            filters.where_clause(),
            " WHERE kind = ? AND (title LIKE ? OR description LIKE ?)"
        );
        assert_eq!(filters.values().len(), 3);
        assert_eq!(filters.values()[0], SqlValue::String("protocol".into()));
    }

    #[test]
    fn strings_that_look_like_dates_bind_as_dates() {
        let update = build_update_sql(
            "calendar_event",
            &json!({ "starts_at": "2024-05-02T09:30:00Z" }),
            EVENT_COLUMNS,
            "id",
            1,
        )
        .unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(update.values[0], SqlValue::DateTime(expected));
    }
}
