//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::dialect::Dialect;
use super::helpers;
use super::string::SQL;

// Convert to SQL strings

impl Statement {
    /// Render the statement for a dialect.
    pub fn render(&self, dialect: Dialect) -> SQL {
        let mut sql = SQL::new(dialect);
        self.to_sql(&mut sql);
        sql
    }

    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Statement::Select(select) => select.to_sql(sql),
            Statement::Insert(insert) => insert.to_sql(sql),
            Statement::Update(update) => update.to_sql(sql),
            Statement::Delete(delete) => delete.to_sql(sql),
            Statement::CreateTable(create_table) => create_table.to_sql(sql),
            Statement::CreateIndex(create_index) => create_index.to_sql(sql),
            Statement::DropTable(drop_table) => drop_table.to_sql(sql),
        }
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            SelectList::SelectList(select_list) => {
                for (index, (col, expr)) in select_list.iter().enumerate() {
                    expr.to_sql(sql);
                    sql.append_syntax(" AS ");
                    col.to_sql(sql);
                    if index < (select_list.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
            }
            SelectList::Expression(expression) => expression.to_sql(sql),
            SelectList::SelectStar => sql.append_syntax("*"),
            SelectList::Select1 => sql.append_syntax("1"),
        }
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" FROM ");
            from.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl Insert {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("INSERT INTO ");
        self.table.to_sql(sql);

        sql.append_syntax(" (");
        for (index, column) in self.columns.iter().enumerate() {
            column.to_sql(sql);
            if index < (self.columns.len() - 1) {
                sql.append_syntax(", ");
            }
        }
        sql.append_syntax(") VALUES ");

        for (row_index, row) in self.values.iter().enumerate() {
            sql.append_syntax("(");
            for (index, value) in row.iter().enumerate() {
                value.to_sql(sql);
                if index < (row.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
            sql.append_syntax(")");
            if row_index < (self.values.len() - 1) {
                sql.append_syntax(", ");
            }
        }
    }
}

impl Update {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("UPDATE ");
        self.table.to_sql(sql);
        sql.append_syntax(" SET ");

        for (index, (column, value)) in self.set.iter().enumerate() {
            column.to_sql(sql);
            sql.append_syntax(" = ");
            value.to_sql(sql);
            if index < (self.set.len() - 1) {
                sql.append_syntax(", ");
            }
        }

        self.where_.to_sql(sql);

        if let Some(limit) = self.limit {
            sql.append_syntax(&format!(" LIMIT {limit}"));
        }
    }
}

impl Delete {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("DELETE FROM ");
        self.from.to_sql(sql);

        self.where_.to_sql(sql);

        if let Some(limit) = self.limit {
            sql.append_syntax(&format!(" LIMIT {limit}"));
        }
    }
}

impl CreateTable {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("CREATE TABLE ");
        if self.if_not_exists {
            sql.append_syntax("IF NOT EXISTS ");
        }
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        for (index, column) in self.columns.iter().enumerate() {
            column.to_sql(sql);
            if index < (self.columns.len() - 1) {
                sql.append_syntax(", ");
            }
        }
        sql.append_syntax(")");
    }
}

impl ColumnDefinition {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.name.to_sql(sql);
        sql.append_syntax(" ");
        self.r#type.to_sql(sql);
        if self.primary_key {
            sql.append_syntax(" PRIMARY KEY");
        } else if self.not_null {
            sql.append_syntax(" NOT NULL");
        }
    }
}

impl CreateIndex {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("CREATE ");
        if self.unique {
            sql.append_syntax("UNIQUE ");
        }
        sql.append_syntax("INDEX ");
        // MySQL has no IF NOT EXISTS for indexes.
        if self.if_not_exists && sql.dialect != Dialect::Mysql {
            sql.append_syntax("IF NOT EXISTS ");
        }
        sql.append_identifier(&self.name.0);
        sql.append_syntax(" ON ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        for (index, element) in self.elements.iter().enumerate() {
            element.to_sql(sql);
            if index < (self.elements.len() - 1) {
                sql.append_syntax(", ");
            }
        }
        sql.append_syntax(")");
        if let Some(where_) = &self.where_ {
            where_.to_sql(sql);
        }
    }
}

impl IndexElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self.target {
            Expression::ColumnReference(column) => column.to_sql(sql),
            expression => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                sql.append_syntax(")");
            }
        }
        self.direction.to_sql(sql);
    }
}

impl DropTable {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("DROP TABLE ");
        if self.if_exists {
            sql.append_syntax("IF EXISTS ");
        }
        self.table.to_sql(sql);
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                if let Some(alias) = alias {
                    sql.append_syntax(" AS ");
                    alias.to_sql(sql);
                }
            }
            From::JsonEach { expression, alias } => {
                sql.append_syntax("json_each(");
                expression.to_sql(sql);
                sql.append_syntax(") AS ");
                alias.to_sql(sql);
            }
            From::JsonbArrayElements {
                expression,
                alias,
                column,
            } => {
                sql.append_syntax("jsonb_array_elements(");
                expression.to_sql(sql);
                sql.append_syntax(") AS ");
                alias.to_sql(sql);
                sql.append_syntax("(");
                column.to_sql(sql);
                sql.append_syntax(")");
            }
            From::JsonTable {
                expression,
                alias,
                column,
            } => {
                sql.append_syntax("JSON_TABLE(");
                expression.to_sql(sql);
                sql.append_syntax(", '$[*]' COLUMNS (");
                column.to_sql(sql);
                sql.append_syntax(" JSON PATH '$')) AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::Cast { expression, r#type } => {
                sql.append_syntax("CAST(");
                expression.to_sql(sql);
                sql.append_syntax(" AS ");
                r#type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Or { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Not(expr) => {
                sql.append_syntax("NOT (");
                expr.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                // comparisons bind looser than everything we nest inside them
                let parenthesize = !operator.is_comparison();
                if parenthesize {
                    sql.append_syntax("(");
                }
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                if parenthesize {
                    sql.append_syntax(")");
                }
            }
            Expression::BinaryArrayOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax("(");
                for (index, item) in right.iter().enumerate() {
                    item.to_sql(sql);
                    if index < (right.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
                sql.append_syntax(")");
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                expression.to_sql(sql);
                operator.to_sql(sql);
            }
            Expression::Like {
                expression,
                pattern,
                escape,
            } => {
                expression.to_sql(sql);
                sql.append_syntax(" LIKE ");
                pattern.to_sql(sql);
                if let Some(escape) = escape {
                    sql.append_syntax(" ESCAPE ");
                    sql.append_string_literal(&escape.to_string());
                }
            }
            Expression::Glob {
                expression,
                pattern,
            } => {
                expression.to_sql(sql);
                sql.append_syntax(" GLOB ");
                pattern.to_sql(sql);
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                for (index, arg) in args.iter().enumerate() {
                    arg.to_sql(sql);
                    if index < (args.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
                sql.append_syntax(")");
            }
            Expression::Exists { select } => {
                sql.append_syntax("EXISTS (");
                select.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Case { cases, otherwise } => {
                sql.append_syntax("CASE");
                for (condition, result) in cases {
                    sql.append_syntax(" WHEN ");
                    condition.to_sql(sql);
                    sql.append_syntax(" THEN ");
                    result.to_sql(sql);
                }
                sql.append_syntax(" ELSE ");
                otherwise.to_sql(sql);
                sql.append_syntax(" END");
            }
            Expression::Count(count_type) => {
                sql.append_syntax("COUNT");
                sql.append_syntax("(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::CorrelatedSubSelect(select) => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

impl UnaryOperator {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            UnaryOperator::IsNull => sql.append_syntax(" IS NULL"),
            UnaryOperator::IsNotNull => sql.append_syntax(" IS NOT NULL"),
        }
    }
}

impl BinaryOperator {
    /// Comparison operators produce booleans and are rendered without parentheses.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqualTo
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqualTo
                | BinaryOperator::Regex
                | BinaryOperator::CaseInsensitiveRegex
        )
    }

    pub fn to_sql(self, sql: &mut SQL) {
        let operator = match self {
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqualTo => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqualTo => ">=",
            BinaryOperator::Regex => "~",
            BinaryOperator::CaseInsensitiveRegex => "~*",
            BinaryOperator::Plus => "+",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Concatenate => "||",
            BinaryOperator::JsonPathGet => "#>",
            BinaryOperator::JsonPathGetText => "#>>",
            BinaryOperator::JsonPathRemove => "#-",
        };
        sql.append_syntax(" ");
        sql.append_syntax(operator);
        sql.append_syntax(" ");
    }
}

impl BinaryArrayOperator {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            BinaryArrayOperator::In => sql.append_syntax(" IN "),
            BinaryArrayOperator::NotIn => sql.append_syntax(" NOT IN "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        let name = match self {
            Function::Coalesce => "COALESCE",
            Function::If => "IF",
            Function::Json => "json",
            Function::JsonExtract => match sql.dialect {
                Dialect::Mysql => "JSON_EXTRACT",
                Dialect::Sqlite | Dialect::Postgres => "json_extract",
            },
            Function::JsonSet => match sql.dialect {
                Dialect::Mysql => "JSON_SET",
                Dialect::Sqlite | Dialect::Postgres => "json_set",
            },
            Function::JsonInsert => "json_insert",
            Function::JsonRemove => match sql.dialect {
                Dialect::Mysql => "JSON_REMOVE",
                Dialect::Sqlite | Dialect::Postgres => "json_remove",
            },
            Function::JsonArray => match sql.dialect {
                Dialect::Mysql => "JSON_ARRAY",
                Dialect::Sqlite | Dialect::Postgres => "json_array",
            },
            Function::JsonArrayLength => "json_array_length",
            Function::JsonGroupArray => "json_group_array",
            Function::JsonbSet => "jsonb_set",
            Function::JsonbBuildArray => "jsonb_build_array",
            Function::JsonbArrayLength => "jsonb_array_length",
            Function::JsonbAgg => "jsonb_agg",
            Function::ToJsonb => "to_jsonb",
            Function::JsonUnquote => "JSON_UNQUOTE",
            Function::JsonArrayAppend => "JSON_ARRAY_APPEND",
            Function::JsonLength => "JSON_LENGTH",
            Function::JsonArrayAgg => "JSON_ARRAYAGG",
            Function::JsonObject => "JSON_OBJECT",
            Function::RegexpLike => "REGEXP_LIKE",
            Function::Unknown(name) => name,
        };
        sql.append_syntax(name);
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("*"),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Null => sql.append_syntax("NULL"),
            Value::Bool(true) => sql.append_syntax("TRUE"),
            Value::Bool(false) => sql.append_syntax("FALSE"),
            Value::Int(i) => sql.append_syntax(&i.to_string()),
            Value::String(s) => sql.append_string_literal(s),
            Value::Parameter(param) => sql.append_param(param.clone()),
        }
    }
}

impl ScalarType {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax(&self.0);
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, order_by_item) in self.elements.iter().enumerate() {
                order_by_item.to_sql(sql);
                if index < (self.elements.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        match (self.limit, self.offset) {
            (None, None) => {}
            (Some(limit), None) => sql.append_syntax(&format!(" LIMIT {limit}")),
            (Some(limit), Some(offset)) => {
                sql.append_syntax(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            // An offset on its own needs a limit on SQLite and MySQL.
            (None, Some(offset)) => match sql.dialect {
                Dialect::Postgres => sql.append_syntax(&format!(" OFFSET {offset}")),
                Dialect::Sqlite => sql.append_syntax(&format!(" LIMIT -1 OFFSET {offset}")),
                Dialect::Mysql => {
                    sql.append_syntax(&format!(" LIMIT 18446744073709551615 OFFSET {offset}"));
                }
            },
        }
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable(table) => table.to_sql(sql),
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        }
    }
}

impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        let name = format!("{}_{}", self.name, self.unique_index);
        sql.append_identifier(&name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::Column(name) => name.to_sql(sql),
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
            ColumnReference::AliasedColumn { table, column } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                column.to_sql(sql);
            }
        }
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::string::Param;
    use similar_asserts::assert_eq;

    fn users() -> TableName {
        TableName("users".to_string())
    }

    fn column(name: &str) -> Expression {
        helpers::column(name)
    }

    #[test]
    fn select_without_filter_has_no_where() {
        let select = helpers::star_select(helpers::table_from(users()));
        let sql = Statement::Select(select).render(Dialect::Sqlite);
        assert_eq!(sql.sql, "SELECT * FROM \"users\"");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn offset_without_limit_per_dialect() {
        let mut select = helpers::star_select(helpers::table_from(users()));
        select.limit.offset = Some(10);
        let statement = Statement::Select(select);
        assert_eq!(
            statement.render(Dialect::Sqlite).sql,
            "SELECT * FROM \"users\" LIMIT -1 OFFSET 10"
        );
        assert_eq!(
            statement.render(Dialect::Postgres).sql,
            "SELECT * FROM \"users\" OFFSET 10"
        );
        assert_eq!(
            statement.render(Dialect::Mysql).sql,
            "SELECT * FROM `users` LIMIT 18446744073709551615 OFFSET 10"
        );
    }

    #[test]
    fn update_renders_assignments_in_order() {
        let update = Update {
            table: users(),
            set: vec![
                (
                    ColumnName("name".to_string()),
                    helpers::param(Param::String("Ann".to_string())),
                ),
                (
                    ColumnName("age".to_string()),
                    Expression::BinaryOperation {
                        left: Box::new(column("age")),
                        operator: BinaryOperator::Plus,
                        right: Box::new(helpers::param(Param::Integer(1))),
                    },
                ),
            ],
            where_: Where(helpers::equals(
                column("_id"),
                helpers::param(Param::String("u1".to_string())),
            )),
            limit: None,
        };
        let sql = Statement::Update(update).render(Dialect::Postgres);
        assert_eq!(
            sql.sql,
            "UPDATE \"users\" SET \"name\" = $1, \"age\" = (\"age\" + $2) WHERE \"_id\" = $3"
        );
        assert_eq!(
            sql.params,
            vec![
                Param::String("Ann".to_string()),
                Param::Integer(1),
                Param::String("u1".to_string())
            ]
        );
    }

    #[test]
    fn mysql_indexes_skip_if_not_exists() {
        let index = CreateIndex {
            name: IndexName("users_age".to_string()),
            table: users(),
            unique: true,
            if_not_exists: true,
            elements: vec![IndexElement {
                target: column("age"),
                direction: OrderByDirection::Desc,
            }],
            where_: None,
        };
        let statement = Statement::CreateIndex(index);
        assert_eq!(
            statement.render(Dialect::Mysql).sql,
            "CREATE UNIQUE INDEX `users_age` ON `users` (`age` DESC)"
        );
        assert_eq!(
            statement.render(Dialect::Sqlite).sql,
            "CREATE UNIQUE INDEX IF NOT EXISTS \"users_age\" ON \"users\" (\"age\" DESC)"
        );
    }

    #[test]
    fn element_sources_per_dialect() {
        let alias = helpers::make_table_alias(0, "elem");
        let column = helpers::make_column_alias("value".to_string());
        let mut sql = SQL::new(Dialect::Mysql);
        From::JsonTable {
            expression: Expression::ColumnReference(ColumnReference::Column(ColumnName(
                "tags".to_string(),
            ))),
            alias: alias.clone(),
            column: column.clone(),
        }
        .to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "JSON_TABLE(`tags`, '$[*]' COLUMNS (`value` JSON PATH '$')) AS `elem_0`"
        );

        let mut sql = SQL::new(Dialect::Postgres);
        From::JsonbArrayElements {
            expression: helpers::column("tags"),
            alias,
            column,
        }
        .to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "jsonb_array_elements(\"tags\") AS \"elem_0\"(\"value\")"
        );
    }
}
