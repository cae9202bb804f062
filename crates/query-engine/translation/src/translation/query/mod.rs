//! Translate reads: filters, `find` and `count`.

pub mod filtering;
pub mod operators;
pub mod sorting;

use query_engine_metadata::metadata::Document;
use query_engine_sql::sql;
use serde::{Deserialize, Serialize};

use super::error::Error;
use super::helpers::{Env, State};

/// Options of a `find`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    #[serde(default)]
    pub sort: Option<Document>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    /// Applied when the rows are turned back into documents.
    #[serde(default)]
    pub projection: Option<Document>,
}

/// `SELECT * FROM table [WHERE ..] [ORDER BY ..] [LIMIT ..]`
pub fn translate_find(
    env: &Env,
    table: &str,
    filter: &Document,
    options: &FindOptions,
) -> Result<sql::ast::Select, Error> {
    let mut state = State::new();
    let mut select = sql::helpers::star_select(sql::helpers::table_from(sql::ast::TableName(
        table.to_string(),
    )));
    select.where_ = sql::ast::Where(filtering::translate_filter(env, &mut state, filter)?);
    if let Some(sort) = &options.sort {
        select.order_by = sorting::translate_order_by(env, sort)?;
    }
    select.limit = sql::ast::Limit {
        limit: options.limit,
        offset: options.skip.filter(|skip| *skip > 0),
    };
    Ok(select)
}

/// `SELECT COUNT(*) AS "count" FROM table [WHERE ..]`
pub fn translate_count(env: &Env, table: &str, filter: &Document) -> Result<sql::ast::Select, Error> {
    let mut state = State::new();
    let mut select = sql::helpers::simple_select(vec![(
        sql::helpers::make_column_alias("count".to_string()),
        sql::ast::Expression::Count(sql::ast::CountType::Star),
    )]);
    select.from = Some(sql::helpers::table_from(sql::ast::TableName(
        table.to_string(),
    )));
    select.where_ = sql::ast::Where(filtering::translate_filter(env, &mut state, filter)?);
    Ok(select)
}
