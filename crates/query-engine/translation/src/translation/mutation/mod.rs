//! Translate writes: inserts, updates and deletes.

pub mod delete;
pub mod insert;
pub mod update;

use query_engine_metadata::metadata::ID_FIELD;
use query_engine_sql::sql;
use serde::{Deserialize, Serialize};

use super::helpers::Env;

/// How many matching documents a mutation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationScope {
    One,
    Many,
}

/// Restrict a mutation's condition to its scope. Returns the condition and the `LIMIT` to render.
pub(crate) fn restrict_to_scope(
    env: &Env,
    table: &sql::ast::TableName,
    condition: sql::ast::Expression,
    scope: MutationScope,
) -> (sql::ast::Expression, Option<u32>) {
    match scope {
        MutationScope::Many => (condition, None),
        MutationScope::One if env.dialect.supports_mutation_limit() => (condition, Some(1)),
        MutationScope::One => {
            let mut first = sql::helpers::select_expression(
                sql::helpers::column(ID_FIELD),
                sql::helpers::table_from(table.clone()),
                condition,
            );
            first.limit.limit = Some(1);
            (
                sql::helpers::equals(
                    sql::helpers::column(ID_FIELD),
                    sql::ast::Expression::CorrelatedSubSelect(Box::new(first)),
                ),
                None,
            )
        }
    }
}
