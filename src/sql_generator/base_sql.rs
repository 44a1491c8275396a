//! Clause-by-clause rendering of a [`SelectQuery`](crate::query_tree::SelectQuery) into plain SQL
//!
//! This is the ordinary query compiler that the rewriter wraps. Besides the SQL
//! text, projection rendering returns structured bindings (rendered expression ->
//! output alias) so later stages can find the alias of an ORDER BY term without
//! scanning generated text.

use std::collections::HashSet;

use crate::metadata::{resolve_alias, MetadataError, MetadataLookup};
use crate::query_tree::{
    Expr, FromClause, JoinType, Operator, OperatorApplication, Projection, PropertyAccess,
    SelectItem,
};

use super::common::{qualified_column, quote_identifier, quote_table_name, render_literal};
use super::distinct_partitioner::DISTINCT_ROW_ALIAS;
use super::errors::RewriteError;
use super::ROW_NUMBER_ALIAS;

/// One projected output column: the rendered expression and the alias it is exposed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionBinding {
    pub expression_sql: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedProjection {
    pub bindings: Vec<ProjectionBinding>,
}

impl RenderedProjection {
    /// `SELECT` followed by the leading columns (if any) and every binding.
    pub fn to_sql(&self, leading: &[String]) -> String {
        let columns: Vec<String> = leading
            .iter()
            .cloned()
            .chain(self.bindings.iter().map(|b| {
                format!("{} AS {}", b.expression_sql, quote_identifier(&b.alias))
            }))
            .collect();
        format!("SELECT {}", columns.join(", "))
    }

    pub fn alias_for_expression(&self, expression_sql: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.expression_sql == expression_sql)
            .map(|b| b.alias.as_str())
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.bindings.iter().any(|b| b.alias == alias)
    }
}

/// Output aliases the wrapping queries add next to the projected columns.
const RESERVED_ALIASES: &[&str] = &[ROW_NUMBER_ALIAS, DISTINCT_ROW_ALIAS];

const COMPARISON: u8 = 3;

/// Binding strength of `operator` in the target dialect; higher binds tighter.
fn precedence(operator: Operator) -> u8 {
    match operator {
        Operator::Multiplication | Operator::Division => 5,
        Operator::Addition | Operator::Subtraction => 4,
        Operator::Equal
        | Operator::NotEqual
        | Operator::LessThan
        | Operator::GreaterThan
        | Operator::LessThanEqual
        | Operator::GreaterThanEqual
        | Operator::Like
        | Operator::In
        | Operator::NotIn
        | Operator::IsNull
        | Operator::IsNotNull => COMPARISON,
        Operator::Not => 2,
        Operator::And => 1,
        Operator::Or => 0,
    }
}

pub struct BaseSqlBuilder<'a> {
    metadata: &'a dyn MetadataLookup,
    from: &'a FromClause,
}

impl<'a> BaseSqlBuilder<'a> {
    pub fn new(metadata: &'a dyn MetadataLookup, from: &'a FromClause) -> Self {
        Self { metadata, from }
    }

    /// Render every projected column with a unique alias. Unaliased columns get
    /// `<column>_<n>` (property access) or `sclr_<n>` (anything else), where `n` is
    /// the column's position in the projection.
    pub fn render_projection(
        &self,
        projection: &Projection,
    ) -> Result<RenderedProjection, RewriteError> {
        if projection.items.is_empty() {
            return Err(RewriteError::unsupported("projection selects no columns"));
        }

        let mut rendered = RenderedProjection::default();
        let mut seen = HashSet::new();
        let mut push = |rendered: &mut RenderedProjection, expression_sql: String, alias: String| {
            if RESERVED_ALIASES
                .iter()
                .any(|reserved| reserved.eq_ignore_ascii_case(&alias))
            {
                return Err(RewriteError::unsupported(format!(
                    "projection alias `{}` collides with a pagination column",
                    alias
                )));
            }
            if !seen.insert(alias.clone()) {
                return Err(RewriteError::unsupported(format!(
                    "projection alias `{}` is declared twice",
                    alias
                )));
            }
            rendered.bindings.push(ProjectionBinding {
                expression_sql,
                alias,
            });
            Ok(())
        };

        for item in &projection.items {
            match item {
                SelectItem::Entity(alias) => {
                    let metadata = resolve_alias(self.metadata, self.from, &alias.0)?;
                    for (_, column) in metadata.ordered_columns() {
                        let position = rendered.bindings.len();
                        push(
                            &mut rendered,
                            qualified_column(&alias.0, column),
                            format!("{}_{}", column, position),
                        )?;
                    }
                }
                SelectItem::Expression { expression, alias } => {
                    let expression_sql = self.render_expr(expression)?;
                    let position = rendered.bindings.len();
                    let alias = match (alias, expression) {
                        (Some(alias), _) => alias.0.clone(),
                        (None, Expr::PropertyAccess(pa)) => {
                            format!("{}_{}", self.column_for(pa)?, position)
                        }
                        (None, _) => format!("sclr_{}", position),
                    };
                    push(&mut rendered, expression_sql, alias)?;
                }
            }
        }

        Ok(rendered)
    }

    /// `FROM` clause with every root and its joins.
    pub fn render_from(&self) -> Result<String, RewriteError> {
        if self.from.roots.is_empty() {
            return Err(RewriteError::unsupported("query has no FROM source"));
        }

        let mut roots = Vec::with_capacity(self.from.roots.len());
        for root in &self.from.roots {
            let metadata = resolve_alias(self.metadata, self.from, &root.alias.0)?;
            let mut sql = format!(
                "{} AS {}",
                quote_table_name(&metadata.table_name),
                quote_identifier(&root.alias.0)
            );

            for join in &root.joins {
                let joined = resolve_alias(self.metadata, self.from, &join.alias.0)?;
                let table = format!(
                    "{} AS {}",
                    quote_table_name(&joined.table_name),
                    quote_identifier(&join.alias.0)
                );
                match (&join.joining_on, join.join_type) {
                    (Some(on), JoinType::Inner) => {
                        sql.push_str(&format!(" INNER JOIN {} ON {}", table, self.render_expr(on)?))
                    }
                    (Some(on), JoinType::Left) => {
                        sql.push_str(&format!(" LEFT JOIN {} ON {}", table, self.render_expr(on)?))
                    }
                    (None, JoinType::Inner) => sql.push_str(&format!(" CROSS JOIN {}", table)),
                    (None, JoinType::Left) => {
                        return Err(RewriteError::unsupported(format!(
                            "LEFT JOIN of `{}` has no join condition",
                            join.alias.0
                        )))
                    }
                }
            }
            roots.push(sql);
        }

        Ok(format!("FROM {}", roots.join(", ")))
    }

    /// `WHERE` clause, or `None` when the query is unfiltered.
    pub fn render_filter(&self, filter: Option<&Expr>) -> Result<Option<String>, RewriteError> {
        filter
            .map(|expr| Ok(format!("WHERE {}", self.render_expr(expr)?)))
            .transpose()
    }

    pub fn render_expr(&self, expr: &Expr) -> Result<String, RewriteError> {
        let sql = match expr {
            Expr::Literal(literal) => render_literal(literal)?,
            Expr::Raw(raw) => raw.clone(),
            Expr::Parameter(name) => format!(":{}", name),
            Expr::PropertyAccess(pa) => qualified_column(&pa.table_alias.0, self.column_for(pa)?),
            Expr::ResultVariable(alias) => {
                return Err(RewriteError::unsupported(format!(
                    "result variable `{}` can only be referenced from ORDER BY",
                    alias.0
                )))
            }
            Expr::List(items) => format!("({})", self.render_list(items)?),
            Expr::ScalarFnCall(call) | Expr::AggregateFnCall(call) => {
                format!("{}({})", call.name, self.render_list(&call.args)?)
            }
            Expr::OperatorApplication(op) => self.render_operator(op)?,
        };
        Ok(sql)
    }

    fn render_list(&self, items: &[Expr]) -> Result<String, RewriteError> {
        let rendered = items
            .iter()
            .map(|item| self.render_expr(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(", "))
    }

    fn column_for(&self, pa: &PropertyAccess) -> Result<&'a str, RewriteError> {
        let metadata = resolve_alias(self.metadata, self.from, &pa.table_alias.0)?;
        metadata.column_for(&pa.property).ok_or_else(|| {
            MetadataError::UnknownProperty {
                entity: self
                    .from
                    .entity_for_alias(&pa.table_alias.0)
                    .unwrap_or_default()
                    .to_string(),
                property: pa.property.clone(),
            }
            .into()
        })
    }

    fn render_operator(&self, op: &OperatorApplication) -> Result<String, RewriteError> {
        fn op_str(o: Operator) -> &'static str {
            match o {
                Operator::Addition => "+",
                Operator::Subtraction => "-",
                Operator::Multiplication => "*",
                Operator::Division => "/",
                Operator::Equal => "=",
                Operator::NotEqual => "<>",
                Operator::LessThan => "<",
                Operator::GreaterThan => ">",
                Operator::LessThanEqual => "<=",
                Operator::GreaterThanEqual => ">=",
                Operator::Like => "LIKE",
                Operator::And => "AND",
                Operator::Or => "OR",
                Operator::In => "IN",
                Operator::NotIn => "NOT IN",
                Operator::Not => "NOT",
                Operator::IsNull => "IS NULL",
                Operator::IsNotNull => "IS NOT NULL",
            }
        }

        // Nested connectives and raw fragments are always parenthesized. Other
        // operands are parenthesized when they bind looser than `op`, or equally
        // loose on the right-hand side or under a comparison.
        let operand_sql = |expr: &Expr, right: bool| -> Result<String, RewriteError> {
            let sql = self.render_expr(expr)?;
            let wrap = match expr {
                Expr::Raw(_) => true,
                Expr::OperatorApplication(inner) => {
                    let (outer, inner_prec) = (precedence(op.operator), precedence(inner.operator));
                    matches!(inner.operator, Operator::And | Operator::Or)
                        || inner_prec < outer
                        || (inner_prec == outer && (right || outer == COMPARISON))
                }
                _ => false,
            };
            Ok(if wrap { format!("({})", sql) } else { sql })
        };

        let sql_op = op_str(op.operator);
        match (op.operator, op.operands.as_slice()) {
            (Operator::IsNull | Operator::IsNotNull, [operand]) => {
                Ok(format!("{} {}", operand_sql(operand, false)?, sql_op))
            }
            (Operator::Not, [operand]) => Ok(format!("NOT ({})", self.render_expr(operand)?)),
            (Operator::In | Operator::NotIn, [lhs, rhs]) => {
                let list = match rhs {
                    Expr::List(items) if items.is_empty() => {
                        return Err(RewriteError::unsupported("IN list is empty"))
                    }
                    Expr::List(_) => self.render_expr(rhs)?,
                    other => format!("({})", self.render_expr(other)?),
                };
                Ok(format!("{} {} {}", operand_sql(lhs, false)?, sql_op, list))
            }
            (Operator::And | Operator::Or, operands) if !operands.is_empty() => {
                let rendered = operands
                    .iter()
                    .map(|o| operand_sql(o, false))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rendered.join(&format!(" {} ", sql_op)))
            }
            (_, [lhs, rhs]) => Ok(format!(
                "{} {} {}",
                operand_sql(lhs, false)?,
                sql_op,
                operand_sql(rhs, true)?
            )),
            (operator, operands) => Err(RewriteError::unsupported(format!(
                "operator {:?} cannot take {} operand(s)",
                operator,
                operands.len()
            ))),
        }
    }
}
