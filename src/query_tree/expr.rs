use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),

    /// Raw SQL fragment, emitted verbatim
    Raw(String),

    /// Named bound parameter, rendered as `:name`
    Parameter(String),

    /// `alias.property`, resolved to `alias.column` through the entity catalog
    PropertyAccess(PropertyAccess),

    /// Reference to an alias declared in the projection (ORDER BY by result variable)
    ResultVariable(ColumnAlias),

    List(Vec<Expr>),

    ScalarFnCall(FnCall),

    AggregateFnCall(FnCall),

    OperatorApplication(OperatorApplication),
}

impl Expr {
    pub fn property(alias: impl Into<String>, property: impl Into<String>) -> Self {
        Expr::PropertyAccess(PropertyAccess {
            table_alias: TableAlias(alias.into()),
            property: property.into(),
        })
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    pub fn result_variable(alias: impl Into<String>) -> Self {
        Expr::ResultVariable(ColumnAlias(alias.into()))
    }

    pub fn apply(operator: Operator, operands: Vec<Expr>) -> Self {
        Expr::OperatorApplication(OperatorApplication { operator, operands })
    }

    /// Conjunction of `left` and `right`, flattening nested ANDs.
    pub fn and(left: Expr, right: Expr) -> Self {
        let mut operands = Vec::new();
        for side in [left, right] {
            match side {
                Expr::OperatorApplication(op) if op.operator == Operator::And => {
                    operands.extend(op.operands)
                }
                other => operands.push(other),
            }
        }
        Expr::apply(Operator::And, operands)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct TableAlias(pub String);

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct ColumnAlias(pub String);

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PropertyAccess {
    pub table_alias: TableAlias,
    pub property: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FnCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum Operator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Like,
    And,
    Or,
    In,
    NotIn,
    Not,
    IsNull,
    IsNotNull,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<Expr>,
}
