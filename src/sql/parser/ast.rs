use std::collections::BTreeMap;

/// Abstract Syntax Tree (AST) node definitions for the emitted SQL dialect
#[derive(Debug, PartialEq)]
pub enum Statement {
    /// SELECT statement
    Select {
        columns: Vec<SelectItem>,
        from: FromItem,
        filter: Option<Expression>,
        order_by: Vec<(String, OrderDirection)>,
    },
    /// INSERT statement
    Insert {
        table_name: String,
        columns: Vec<String>,
        values: Vec<Vec<Expression>>,
    },
    /// UPDATE statement
    Update {
        table_name: String,
        columns: BTreeMap<String, Expression>,
        filter: Option<Expression>,
    },
    /// DELETE statement
    Delete {
        table_name: String,
        filter: Option<Expression>,
    },
}

/// One entry of a SELECT field list
#[derive(Debug, PartialEq)]
pub enum SelectItem {
    /// `*`
    All,
    /// `table.*`
    TableAll(String),
    /// A single column, optionally qualified
    Column(ColumnRef),
}

/// FROM clause item - a table or a single left join
#[derive(Debug, PartialEq)]
pub enum FromItem {
    Table {
        name: String,
    },
    /// `left LEFT JOIN right ON <col> = <col>`
    Join {
        left: String,
        right: String,
        on: (ColumnRef, ColumnRef),
    },
}

/// A column reference, optionally qualified with a table name
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

/// Sort direction (ascending or descending)
#[derive(Debug, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Expression types (column refs, constants, placeholders, operations)
#[derive(Debug, PartialEq)]
pub enum Expression {
    /// Column reference
    Column(ColumnRef),
    /// Constant value
    Consts(Consts),
    /// Positional `?` placeholder; the index counts placeholders in
    /// statement text order
    Placeholder(usize),
    /// SQL function applied to a nested expression
    Function(Function, Box<Expression>),
    /// Comparison or boolean operation
    Operation(Operation),
}

impl From<Consts> for Expression {
    fn from(value: Consts) -> Self {
        Self::Consts(value)
    }
}

impl From<Operation> for Expression {
    fn from(value: Operation) -> Self {
        Self::Operation(value)
    }
}

/// Supported SQL functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Function {
    Lower,
    Upper,
}

/// Constant values in SQL expressions
#[derive(Debug, PartialEq)]
pub enum Consts {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Comparison and boolean operations
#[derive(Debug, PartialEq)]
pub enum Operation {
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    LessThan(Box<Expression>, Box<Expression>),
    LessThanOrEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    Like(Box<Expression>, Box<Expression>),
    IsNull(Box<Expression>),
    IsNotNull(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}
