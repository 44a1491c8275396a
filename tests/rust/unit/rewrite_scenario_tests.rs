use pagewalker::metadata::{EntityCatalog, EntityMetadata};
use pagewalker::query_tree::{Expr, OrderByItem, SelectItem, SelectQuery};
use pagewalker::sql_generator::{rewrite, PaginationParams, RewriteError};
use test_case::test_case;

fn create_test_catalog() -> EntityCatalog {
    EntityCatalog::new().with_entity(
        "User",
        EntityMetadata::new("users")
            .with_id("id", "id")
            .with_column("name", "name")
            .with_column("age", "age"),
    )
}

fn id_and_name_query() -> SelectQuery {
    let mut query = SelectQuery::from_entity("User", "u");
    query.projection.items = vec![
        SelectItem::aliased(Expr::property("u", "id"), "id"),
        SelectItem::aliased(Expr::property("u", "name"), "name"),
    ];
    query
}

#[test]
fn test_unordered_page_uses_no_op_window_order() {
    let catalog = create_test_catalog();
    let mut query = SelectQuery::from_entity("User", "u");
    query.projection.items = vec![
        SelectItem::expression(Expr::property("u", "id")),
        SelectItem::expression(Expr::property("u", "name")),
    ];

    let sql = rewrite(&query, &catalog, &PaginationParams::new().with_limit(10)).unwrap();

    assert_eq!(
        sql,
        "SELECT * FROM (SELECT ROW_NUMBER() OVER (ORDER BY (SELECT 0)) AS rownumber, * FROM (SELECT u.id AS id_0, u.name AS name_1\nFROM users AS u) AS outer_table) AS paged_result WHERE rownumber BETWEEN 1 AND 10"
    );
    assert_eq!(sql.matches("ROW_NUMBER()").count(), 1);
}

#[test]
fn test_ordered_distinct_page() {
    let catalog = create_test_catalog();
    let mut query = id_and_name_query();
    query.projection.distinct = true;
    query.order_by.push(OrderByItem::asc(Expr::property("u", "name")));

    let sql = rewrite(
        &query,
        &catalog,
        &PaginationParams::new().with_offset(20).with_limit(5),
    )
    .unwrap();

    assert!(sql.contains(
        "ROW_NUMBER() OVER (PARTITION BY u.id ORDER BY (SELECT 0)) AS distinct_row"
    ));
    assert!(sql.contains("WHERE distinct_row = 1"));
    assert!(sql.contains("ROW_NUMBER() OVER (ORDER BY outer_table.name ASC) AS rownumber"));
    assert!(sql.contains("WHERE rownumber BETWEEN 21 AND 25"));
    assert!(sql.ends_with(" ORDER BY rownumber"));
    // Ordering never appears inside a derived table
    assert!(!sql.contains("\nORDER BY"));
    assert!(!sql.contains("DISTINCT"));
}

#[test]
fn test_ordering_by_unprojected_expression_fails() {
    let catalog = create_test_catalog();
    let mut query = id_and_name_query();
    query.order_by.push(OrderByItem::desc(Expr::property("u", "age")));

    let err = rewrite(&query, &catalog, &PaginationParams::new().with_limit(5)).unwrap_err();
    assert!(matches!(
        err,
        RewriteError::AliasResolutionFailure { ref expression } if expression == "u.age"
    ));
}

#[test]
fn test_ordering_by_result_variable() {
    let catalog = create_test_catalog();
    let mut query = id_and_name_query();
    query
        .projection
        .items
        .push(SelectItem::aliased(Expr::property("u", "age"), "years"));
    query.order_by = vec![
        OrderByItem::desc(Expr::result_variable("years")),
        OrderByItem::asc(Expr::property("u", "id")),
    ];

    let sql = rewrite(&query, &catalog, &PaginationParams::new()).unwrap();
    assert!(sql.contains("OVER (ORDER BY outer_table.years DESC, outer_table.id ASC)"));
}

#[test]
fn test_rewrite_is_idempotent_and_leaves_tree_untouched() {
    let catalog = create_test_catalog();
    let mut query = id_and_name_query();
    query.projection.distinct = true;
    query.order_by.push(OrderByItem::desc(Expr::property("u", "name")));
    let before = query.clone();
    let pagination = PaginationParams::new().with_offset(3).with_limit(4);

    let first = rewrite(&query, &catalog, &pagination).unwrap();
    let second = rewrite(&query, &catalog, &pagination).unwrap();

    assert_eq!(first, second);
    assert_eq!(query, before);
}

#[test_case(0, 10, 1, 10 ; "first page")]
#[test_case(20, 5, 21, 25 ; "later page")]
#[test_case(0, 1, 1, 1 ; "single row")]
#[test_case(99, 1, 100, 100 ; "single row at an offset")]
fn test_window_bounds(offset: u64, limit: u64, start: u64, end: u64) {
    let catalog = create_test_catalog();
    let query = id_and_name_query();
    let sql = rewrite(
        &query,
        &catalog,
        &PaginationParams::new().with_offset(offset).with_limit(limit),
    )
    .unwrap();
    assert!(sql.ends_with(&format!("rownumber BETWEEN {} AND {}", start, end)));
}

#[test_case(PaginationParams::new().with_offset(5) ; "offset without limit")]
#[test_case(PaginationParams::new().with_limit(0) ; "zero limit")]
#[test_case(PaginationParams::new().with_offset(u64::MAX).with_limit(1) ; "offset overflow")]
#[test_case(PaginationParams::new().with_offset(u64::MAX - 1).with_limit(3) ; "end overflow")]
fn test_invalid_pagination_is_rejected(pagination: PaginationParams) {
    let catalog = create_test_catalog();
    let query = id_and_name_query();
    let err = rewrite(&query, &catalog, &pagination).unwrap_err();
    assert!(matches!(err, RewriteError::UnsupportedQueryShape(_)));
}

#[test]
fn test_unbounded_query_has_no_paged_result_level() {
    let catalog = create_test_catalog();
    let query = id_and_name_query();
    let sql = rewrite(&query, &catalog, &PaginationParams::new().with_offset(0)).unwrap();
    assert!(!sql.contains("paged_result"));
    assert!(!sql.contains("BETWEEN"));
}
