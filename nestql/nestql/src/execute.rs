//! Runs compiled statements against a relational driver.

use serde_json::Value;

use nestql_parser::{Error, Reason};

use crate::sql::Statement;
use crate::Result;

/// One flat result row, one dynamic cell per projected column.
pub type Row = Vec<Value>;

/// The seam to the relational driver: run one SELECT, hand back every row.
pub trait DbProtocol: Send {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>>;
}

impl Statement {
    /// Executes the statement's SQL, collecting the flat rows onto the
    /// statement. The first driver error propagates; there is no retry.
    pub fn execute<P: DbProtocol>(&mut self, conn: &mut P) -> Result<()> {
        let rows = conn.query(&self.query)?;
        for row in &rows {
            if row.len() != self.columns {
                return Err(Error::new(Reason::RowShape {
                    returned: row.len(),
                    expected: self.columns,
                }));
            }
        }
        log::debug!("statement returned {} row(s)", rows.len());
        self.data = rows;
        Ok(())
    }
}

#[cfg(feature = "test-dbs")]
impl DbProtocol for rusqlite::Connection {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        use rusqlite::types::ValueRef;

        fn driver_error(e: rusqlite::Error) -> Error {
            Error::execution(e.to_string())
        }

        let mut statement = self.prepare(sql).map_err(driver_error)?;
        let column_count = statement.column_count();
        let mut rows = statement.query([]).map_err(driver_error)?;

        let mut data = Vec::new();
        while let Some(row) = rows.next().map_err(driver_error)? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value = match row.get_ref(i).map_err(driver_error)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(v) => Value::from(v),
                    ValueRef::Real(v) => Value::from(v),
                    ValueRef::Text(v) => Value::from(String::from_utf8_lossy(v).into_owned()),
                    ValueRef::Blob(_) => Value::from("BLOB"),
                };
                cells.push(value);
            }
            data.push(cells);
        }
        Ok(data)
    }
}
