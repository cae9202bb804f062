//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;
use super::string::Param;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    true_expr()
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// A `false` expression.
pub fn false_expr() -> Expression {
    Expression::Value(Value::Bool(false))
}

// Aliasing //

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(unique_index: u64, name: &str) -> TableAlias {
    TableAlias {
        unique_index,
        name: name.to_string(),
    }
}

// Names and values //

/// An unqualified column.
pub fn column(name: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::Column(ColumnName(name.to_string())))
}

/// A column of an aliased relation, such as the `value` column of an array expansion.
pub fn aliased_column(table: &TableAlias, column: &str) -> Expression {
    Expression::ColumnReference(ColumnReference::AliasedColumn {
        table: TableReference::AliasedTable(table.clone()),
        column: make_column_alias(column.to_string()),
    })
}

/// A bound parameter.
pub fn param(param: Param) -> Expression {
    Expression::Value(Value::Parameter(param))
}

/// A constant string literal.
pub fn string_literal(value: &str) -> Expression {
    Expression::Value(Value::String(value.to_string()))
}

pub fn int_literal(value: i64) -> Expression {
    Expression::Value(Value::Int(value))
}

pub fn null() -> Expression {
    Expression::Value(Value::Null)
}

// Expressions //

pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

pub fn equals(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::Equals, right)
}

pub fn function(function: Function, args: Vec<Expression>) -> Expression {
    Expression::FunctionCall { function, args }
}

pub fn coalesce(expression: Expression, fallback: Expression) -> Expression {
    function(Function::Coalesce, vec![expression, fallback])
}

pub fn cast(expression: Expression, type_name: &str) -> Expression {
    Expression::Cast {
        expression: Box::new(expression),
        r#type: ScalarType(type_name.to_string()),
    }
}

pub fn is_null(expression: Expression) -> Expression {
    Expression::UnaryOperation {
        expression: Box::new(expression),
        operator: UnaryOperator::IsNull,
    }
}

pub fn is_not_null(expression: Expression) -> Expression {
    Expression::UnaryOperation {
        expression: Box::new(expression),
        operator: UnaryOperator::IsNotNull,
    }
}

pub fn not(expression: Expression) -> Expression {
    Expression::Not(Box::new(expression))
}

pub fn or(left: Expression, right: Expression) -> Expression {
    Expression::Or {
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::And {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Conjunction of all expressions. An empty list is `true`; `true` operands are dropped.
pub fn and_all(expressions: Vec<Expression>) -> Expression {
    expressions
        .into_iter()
        .filter(|expression| *expression != true_expr())
        .reduce(and)
        .unwrap_or_else(true_expr)
}

/// Disjunction of all expressions. An empty list is `false`; `false` operands are dropped.
pub fn or_all(expressions: Vec<Expression>) -> Expression {
    expressions
        .into_iter()
        .filter(|expression| *expression != false_expr())
        .reduce(or)
        .unwrap_or_else(false_expr)
}

/// `CASE WHEN condition THEN then ELSE otherwise END`
pub fn case_when(condition: Expression, then: Expression, otherwise: Expression) -> Expression {
    Expression::Case {
        cases: vec![(condition, then)],
        otherwise: Box::new(otherwise),
    }
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>) -> Select {
    Select {
        select_list: SelectList::SelectList(select_list),
        from: None,
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build a simple select *
pub fn star_select(from: From) -> Select {
    Select {
        select_list: SelectList::SelectStar,
        from: Some(from),
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// `SELECT 1 FROM .. WHERE ..`, the body of an EXISTS.
pub fn select_one(from: From, where_: Expression) -> Select {
    Select {
        select_list: SelectList::Select1,
        from: Some(from),
        where_: Where(where_),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// `SELECT expression FROM .. WHERE ..`, a scalar subquery.
pub fn select_expression(expression: Expression, from: From, where_: Expression) -> Select {
    Select {
        select_list: SelectList::Expression(Box::new(expression)),
        from: Some(from),
        where_: Where(where_),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

pub fn exists(select: Select) -> Expression {
    Expression::Exists {
        select: Box::new(select),
    }
}

/// Select from a database table without an alias.
pub fn table_from(table: TableName) -> From {
    From::Table {
        reference: TableReference::DBTable(table),
        alias: None,
    }
}
