//! Identifier quoting and literal rendering shared by the SQL renderers

use crate::query_tree::Literal;

use super::errors::RewriteError;

/// Quote an identifier with square brackets if it is not a plain word.
///
/// # Examples
/// ```
/// use pagewalker::sql_generator::common::quote_identifier;
/// assert_eq!(quote_identifier("user_id"), "user_id");
/// assert_eq!(quote_identifier("first name"), "[first name]");
/// assert_eq!(quote_identifier("id.orig"), "[id.orig]");
/// ```
pub fn quote_identifier(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("[{}]", name.replace(']', "]]"))
    }
}

/// Quote a possibly schema-qualified table name one dot-separated part at a time.
///
/// # Examples
/// ```
/// use pagewalker::sql_generator::common::quote_table_name;
/// assert_eq!(quote_table_name("dbo.users"), "dbo.users");
/// assert_eq!(quote_table_name("sales.order lines"), "sales.[order lines]");
/// ```
pub fn quote_table_name(name: &str) -> String {
    name.split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Format a qualified column reference: table_alias.column_name
///
/// # Examples
/// ```
/// use pagewalker::sql_generator::common::qualified_column;
/// assert_eq!(qualified_column("u", "user_id"), "u.user_id");
/// assert_eq!(qualified_column("u", "e-mail"), "u.[e-mail]");
/// ```
pub fn qualified_column(table_alias: &str, column_name: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(table_alias),
        quote_identifier(column_name)
    )
}

pub fn render_literal(literal: &Literal) -> Result<String, RewriteError> {
    let sql = match literal {
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) if !f.is_finite() => {
            return Err(RewriteError::unsupported(format!(
                "float literal {} has no SQL form",
                f
            )))
        }
        Literal::Float(f) => f.to_string(),
        Literal::Boolean(b) => {
            // no boolean literals in T-SQL
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        Literal::Null => "NULL".to_string(),
    };
    Ok(sql)
}
