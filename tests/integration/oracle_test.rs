// Results checked against SQLite running the same query over the same
// fixture data. Queries order their output so both sides are comparable.

#[path = "../common/mod.rs"]
mod common;

use anyhow::{Context, Result};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection};

use common::{bindings, create_test_engine, run};
use dataselector::catalog::{DataValue, Table};

fn to_sqlite(value: &DataValue) -> SqliteValue {
    match value {
        DataValue::Null => SqliteValue::Null,
        DataValue::Number(n) => SqliteValue::Real(*n),
        DataValue::Text(s) => SqliteValue::Text(s.clone()),
        DataValue::Boolean(b) => SqliteValue::Integer(i64::from(*b)),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> DataValue {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => DataValue::Null,
        ValueRef::Integer(i) => DataValue::Number(i as f64),
        ValueRef::Real(f) => DataValue::Number(f),
        ValueRef::Text(t) => DataValue::from(String::from_utf8_lossy(t).into_owned()),
    }
}

fn load_table(conn: &Connection, table: &Table) -> Result<()> {
    // untyped columns keep every value in its own storage class
    conn.execute(&format!("create table {} ({})", table.name(), table.fields().join(", ")), [])?;

    let placeholders: Vec<String> = (1..=table.fields().len()).map(|i| format!("?{}", i)).collect();
    let insert = format!("insert into {} values ({})", table.name(), placeholders.join(", "));
    for row in table.iter() {
        conn.execute(&insert, params_from_iter(row.values().iter().map(to_sqlite)))?;
    }

    Ok(())
}

fn sqlite_with_fixtures() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    for (_, table) in bindings() {
        load_table(&conn, &table)?;
    }
    Ok(conn)
}

fn sqlite_rows(conn: &Connection, sql: &str) -> Result<Vec<Vec<DataValue>>> {
    let mut stmt = conn.prepare(sql).with_context(|| format!("sqlite rejected '{}'", sql))?;
    let width = stmt.column_count();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(from_sqlite))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

const QUERIES: &[&str] = &[
    "select field1 from test_collection where field1 > 6 order by field1",
    "select field1, field2 from filter_collection where field1 between 7 and 8 order by field2",
    "select field1 from test_collection where field1 not between 2 and 7 order by field1 desc",
    "select field1 * 2 + 1 d from test_collection where field1 in (6, 8) order by d",
    "select field1 from test_collection order by field1 limit 2 offset 1",
    "select case when field1 > 7 then 'big' else 'small' end size, field1 from filter_collection order by field1",
    "select field2 from filter_collection where field1 in (select field1 from test_collection) order by field2",
    "select field2 from filter_collection where field1 = (select field1 from test_collection where field1 > 7)",
    "select a.field1, b.field2 from test_collection a join filter_collection b on a.field1 = b.field1 \
     order by a.field1, b.field2",
    "select a.field1, b.field2 from test_collection a left join filter_collection b on a.field1 = b.field1 \
     order by a.field1",
    "select a.field1 x, b.field1 y from test_collection a cross join filter_collection b order by x, y",
    "select a.field1 x, b.field1 y from test_collection a, filter_collection b where a.field1 < b.field1 \
     order by y desc, x",
    "select field1, count(*) c, sum(field1) s, avg(field1) m from test_collection group by field1 order by field1",
    "select field1, count(*) c from test_collection group by field1 having count(*) > 1 order by field1",
    "select b.field2, count(*) c from test_collection a join filter_collection b on a.field1 = b.field1 \
     group by b.field2 order by c desc, field2",
    "select s.field1 from (select field1 from test_collection where field1 > 1) s order by s.field1 desc limit 3",
    "select field1, count(*) c from test_collection group by field1 having c > 1 order by field1",
    "select not (null > 1), not (null > 1 and true), case when null > 1 or 2 > 1 then 1 else 0 end, null > 1 and 2 > 1",
    "select a.field1 from test_collection a left join filter_collection b on a.field1 = b.field1 \
     where not (b.field1 > 6 and b.field1 < 100) order by a.field1",
    "select a.field1 from test_collection a left join filter_collection b on a.field1 = b.field1 \
     where b.field1 > 7 or not (b.field1 < 7) order by a.field1",
];

#[test]
fn test_results_match_sqlite() -> Result<()> {
    let conn = sqlite_with_fixtures()?;
    let mut engine = create_test_engine();

    for sql in QUERIES {
        let expected = sqlite_rows(&conn, sql)?;
        let actual = run(&mut engine, sql)?.value_rows();
        assert_eq!(actual, expected, "results differ for '{}'", sql);
    }

    Ok(())
}
