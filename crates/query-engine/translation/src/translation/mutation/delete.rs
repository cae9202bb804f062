//! Translate `delete_one` and `delete_many`.

use query_engine_metadata::metadata::Document;
use query_engine_sql::sql;

use super::{restrict_to_scope, MutationScope};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State};
use crate::translation::query::filtering::translate_filter;

/// `DELETE FROM table [WHERE ..]`
pub fn translate_delete(
    env: &Env,
    table: &str,
    filter: &Document,
    scope: MutationScope,
) -> Result<sql::ast::Delete, Error> {
    let table = sql::ast::TableName(table.to_string());
    let condition = translate_filter(env, &mut State::new(), filter)?;
    let (condition, limit) = restrict_to_scope(env, &table, condition, scope);
    Ok(sql::ast::Delete {
        from: table,
        where_: sql::ast::Where(condition),
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::dialect;
    use crate::translation::helpers::TranslationOptions;
    use query_engine_sql::sql::dialect::Dialect;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn render(dialect: Dialect, filter: serde_json::Value, scope: MutationScope) -> String {
        let options = TranslationOptions::default();
        let env = Env::new(dialect::for_dialect(dialect), None, &options);
        let filter = filter.as_object().cloned().unwrap_or_default();
        let delete = translate_delete(&env, "users", &filter, scope).unwrap();
        sql::ast::Statement::Delete(delete).render(dialect).sql
    }

    #[test]
    fn delete_many_without_filter_deletes_everything() {
        assert_eq!(
            render(Dialect::Sqlite, json!({}), MutationScope::Many),
            r#"DELETE FROM "users""#
        );
    }

    #[test]
    fn delete_one_per_dialect() {
        assert_eq!(
            render(Dialect::Mysql, json!({"name": "a"}), MutationScope::One),
            "DELETE FROM `users` WHERE `name` = ? LIMIT 1"
        );
        assert_eq!(
            render(Dialect::Postgres, json!({"name": "a"}), MutationScope::One),
            r#"DELETE FROM "users" WHERE "_id" = (SELECT "_id" FROM "users" WHERE "name" = $1 LIMIT 1)"#
        );
    }
}
