//! Type definitions of a SQL AST representation.

use super::string::Param;

/// Any statement we know how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    DropTable(DropTable),
}

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: Option<From>,
    pub where_: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// An INSERT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    pub values: Vec<Vec<Expression>>,
}

/// A DELETE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub from: TableName,
    pub where_: Where,
    /// Only rendered by dialects that accept `DELETE ... LIMIT`.
    pub limit: Option<u32>,
}

/// An UPDATE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableName,
    /// Assignments, in the order they are rendered. A column appears at most once.
    pub set: Vec<(ColumnName, Expression)>,
    pub where_: Where,
    /// Only rendered by dialects that accept `UPDATE ... LIMIT`.
    pub limit: Option<u32>,
}

/// A CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: TableName,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
}

/// A single column in a CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: ColumnName,
    pub r#type: ScalarType,
    pub primary_key: bool,
    pub not_null: bool,
}

/// A CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: IndexName,
    pub table: TableName,
    pub unique: bool,
    pub if_not_exists: bool,
    pub elements: Vec<IndexElement>,
    /// Turns the index into a partial index.
    pub where_: Option<Where>,
}

/// One indexed column or expression
#[derive(Debug, Clone, PartialEq)]
pub struct IndexElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub table: TableName,
    pub if_exists: bool,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    SelectList(Vec<(ColumnAlias, Expression)>),
    /// A single unaliased expression, as used by scalar subqueries.
    Expression(Box<Expression>),
    SelectStar,
    Select1,
}

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    /// Select from a table
    Table {
        reference: TableReference,
        alias: Option<TableAlias>,
    },
    /// SQLite's `json_each`, one row per array element with a `value` column.
    JsonEach {
        expression: Expression,
        alias: TableAlias,
    },
    /// Postgres' `jsonb_array_elements`.
    JsonbArrayElements {
        expression: Expression,
        alias: TableAlias,
        column: ColumnAlias,
    },
    /// MySQL's `JSON_TABLE`, projecting each array element into a single JSON column.
    JsonTable {
        expression: Expression,
        alias: TableAlias,
        column: ColumnAlias,
    },
}

/// A WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// LIMIT and OFFSET clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// OR clause
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// NOT clause
    Not(Box<Expression>),
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A binary operation on a scalar expression and an array of scalar expressions
    BinaryArrayOperation {
        left: Box<Expression>,
        operator: BinaryArrayOperator,
        right: Vec<Expression>,
    },
    /// An unary operation on a scalar expression
    UnaryOperation {
        expression: Box<Expression>,
        operator: UnaryOperator,
    },
    /// `expression LIKE pattern [ESCAPE 'c']`
    Like {
        expression: Box<Expression>,
        pattern: Box<Expression>,
        escape: Option<char>,
    },
    /// `expression GLOB pattern`, SQLite's case-sensitive match
    Glob {
        expression: Box<Expression>,
        pattern: Box<Expression>,
    },
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// An EXISTS clause
    Exists {
        select: Box<Select>,
    },
    /// `CASE WHEN .. THEN .. ELSE .. END`
    Case {
        cases: Vec<(Expression, Expression)>,
        otherwise: Box<Expression>,
    },
    /// A column reference
    ColumnReference(ColumnReference),
    /// An irreducible value
    Value(Value),
    Cast {
        expression: Box<Expression>,
        r#type: ScalarType,
    },
    /// A COUNT clause
    Count(CountType),
    /// A subquery returning a single value
    CorrelatedSubSelect(Box<Select>),
}

/// An unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    IsNull,
    IsNotNull,
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    /// Postgres' `~`
    Regex,
    /// Postgres' `~*`
    CaseInsensitiveRegex,
    Plus,
    Multiply,
    /// Postgres' jsonb `||`
    Concatenate,
    /// Postgres' `#>`
    JsonPathGet,
    /// Postgres' `#>>`
    JsonPathGetText,
    /// Postgres' `#-`
    JsonPathRemove,
}

/// A binary operator when the rhs is an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryArrayOperator {
    In,
    NotIn,
}

/// A scalar function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Coalesce,
    If,
    // sqlite
    Json,
    JsonExtract,
    JsonSet,
    JsonInsert,
    JsonRemove,
    JsonArray,
    JsonArrayLength,
    JsonGroupArray,
    // postgres
    JsonbSet,
    JsonbBuildArray,
    JsonbArrayLength,
    JsonbAgg,
    ToJsonb,
    // mysql
    JsonUnquote,
    JsonArrayAppend,
    JsonLength,
    JsonArrayAgg,
    JsonObject,
    RegexpLike,
    Unknown(String),
}

/// COUNT clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountType {
    Star,
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// An integer constant we produced ourselves, such as an array index.
    Int(i64),
    /// A string constant we produced ourselves. Rendered as an escaped literal.
    String(String),
    /// A bound parameter.
    Parameter(Param),
}

/// The name of a type. Always one of the fixed type names produced by a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType(pub String);

/// A database table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// An index name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexName(pub String);

/// A reference to a table. Used when we want to query it,
/// for example in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableReference {
    /// refers to a db table object name
    DBTable(TableName),
    /// refers to an alias we created
    AliasedTable(TableAlias),
}

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnName(pub String);

/// A reference to a column. Used when we want to query it,
/// for example in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnReference {
    /// an unqualified db column
    Column(ColumnName),
    /// refers to a db column object name
    TableColumn {
        table: TableReference,
        name: ColumnName,
    },
    /// refers to an alias we created
    AliasedColumn {
        table: TableReference,
        column: ColumnAlias,
    },
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub unique_index: u64,
    pub name: String,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}
