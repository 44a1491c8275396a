use std::sync::Mutex;

use async_trait::async_trait;
use pagewalker::pagination::{ExecutionError, QueryExecutor, Row};
use pagewalker::query_tree::{HydrationMode, Parameters};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::Value;

/// Executes paginator SQL on an in-memory SQLite connection and records every
/// statement it was asked to run.
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
    executed: Mutex<Vec<(String, HydrationMode)>>,
}

impl SqliteExecutor {
    pub fn in_memory(schema: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema)?;
        Ok(Self {
            conn: Mutex::new(conn),
            executed: Mutex::new(Vec::new()),
        })
    }

    pub fn executed(&self) -> Vec<(String, HydrationMode)> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(
        &self,
        sql: &str,
        parameters: &Parameters,
        hydration: HydrationMode,
    ) -> Result<Vec<Row>, ExecutionError> {
        self.executed
            .lock()
            .map_err(|_| ExecutionError::backend("statement log mutex poisoned"))?
            .push((sql.to_string(), hydration));

        let conn = self
            .conn
            .lock()
            .map_err(|_| ExecutionError::backend("sqlite mutex poisoned"))?;
        let mut stmt = conn.prepare(sql).map_err(ExecutionError::backend)?;

        for (name, value) in parameters {
            let placeholder = format!(":{}", name);
            if let Some(index) = stmt
                .parameter_index(&placeholder)
                .map_err(ExecutionError::backend)?
            {
                stmt.raw_bind_parameter(index, to_sql_value(value))
                    .map_err(ExecutionError::backend)?;
            }
        }

        let columns = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        let mut rows = stmt.raw_query();
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(ExecutionError::backend)? {
            let mut mapped = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(ExecutionError::backend)?;
                mapped.insert(column.clone(), from_sql_value(value));
            }
            result.push(mapped);
        }
        Ok(result)
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(integer) => Value::from(integer),
        ValueRef::Real(real) => Value::from(real),
        ValueRef::Text(text) => Value::from(String::from_utf8_lossy(text).to_string()),
        ValueRef::Blob(blob) => Value::from(blob.to_vec()),
    }
}
