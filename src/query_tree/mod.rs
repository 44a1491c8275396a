//! ORM query tree consumed by the rewriter
//!
//! A [`SelectQuery`] is the already-parsed form of an entity query: a projection,
//! one or more root entities with their joins, an optional filter, ordering and
//! the named parameters bound to the filter. It is plain data; every pass in this
//! crate clones it before changing anything, so one tree can back several
//! sub-queries (and several concurrent pagination calls) safely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod expr;

pub use expr::{
    ColumnAlias, Expr, FnCall, Literal, Operator, OperatorApplication, PropertyAccess, TableAlias,
};

/// Named parameter values bound to a query, in binding order.
pub type Parameters = Map<String, Value>;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SelectQuery {
    pub projection: Projection,
    pub from: FromClause,
    #[serde(default)]
    pub filter: Option<Expr>,
    #[serde(default)]
    pub order_by: Vec<OrderByItem>,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub hydration: HydrationMode,
}

impl SelectQuery {
    /// Single-root query selecting the whole `entity` under `alias`.
    pub fn from_entity(entity: impl Into<String>, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            projection: Projection {
                items: vec![SelectItem::Entity(TableAlias(alias.clone()))],
                distinct: false,
            },
            from: FromClause {
                roots: vec![RootSource {
                    entity: entity.into(),
                    alias: TableAlias(alias),
                    joins: Vec::new(),
                }],
            },
            filter: None,
            order_by: Vec::new(),
            parameters: Parameters::new(),
            hydration: HydrationMode::default(),
        }
    }

    /// The only root source, or `None` when the FROM clause lists zero or several.
    pub fn single_root(&self) -> Option<&RootSource> {
        match self.from.roots.as_slice() {
            [root] => Some(root),
            _ => None,
        }
    }

    pub fn has_collection_join(&self) -> bool {
        self.from
            .roots
            .iter()
            .flat_map(|root| root.joins.iter())
            .any(|join| join.collection)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub items: Vec<SelectItem>,
    #[serde(default)]
    pub distinct: bool,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum SelectItem {
    /// `SELECT u`: every mapped column of the entity behind the alias
    Entity(TableAlias),
    Expression {
        expression: Expr,
        #[serde(default)]
        alias: Option<ColumnAlias>,
    },
}

impl SelectItem {
    pub fn expression(expression: Expr) -> Self {
        SelectItem::Expression {
            expression,
            alias: None,
        }
    }

    pub fn aliased(expression: Expr, alias: impl Into<String>) -> Self {
        SelectItem::Expression {
            expression,
            alias: Some(ColumnAlias(alias.into())),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FromClause {
    pub roots: Vec<RootSource>,
}

impl FromClause {
    /// Entity name declared for `alias`, searching roots and their joins.
    pub fn entity_for_alias(&self, alias: &str) -> Option<&str> {
        for root in &self.roots {
            if root.alias.0 == alias {
                return Some(&root.entity);
            }
            if let Some(join) = root.joins.iter().find(|j| j.alias.0 == alias) {
                return Some(&join.entity);
            }
        }
        None
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RootSource {
    pub entity: String,
    pub alias: TableAlias,
    #[serde(default)]
    pub joins: Vec<Join>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Join {
    pub join_type: JoinType,
    pub entity: String,
    pub alias: TableAlias,
    #[serde(default)]
    pub joining_on: Option<Expr>,
    /// One-to-many or many-to-many: joined rows multiply root rows
    #[serde(default)]
    pub collection: bool,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: Expr,
    pub order: OrderByOrder,
}

impl OrderByItem {
    pub fn asc(expression: Expr) -> Self {
        Self {
            expression,
            order: OrderByOrder::Asc,
        }
    }

    pub fn desc(expression: Expr) -> Self {
        Self {
            expression,
            order: OrderByOrder::Desc,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum OrderByOrder {
    Asc,
    Desc,
}

impl OrderByOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderByOrder::Asc => "ASC",
            OrderByOrder::Desc => "DESC",
        }
    }
}

/// How the execution collaborator should shape returned rows. Passed through untouched.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum HydrationMode {
    #[default]
    Object,
    Array,
    Scalar,
}
