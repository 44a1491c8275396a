use std::io::Write;

use pagewalker::metadata::{EntityCatalog, MetadataError, MetadataLookup};
use pagewalker::pagination::Paginator;
use pagewalker::query_tree::SelectQuery;
use pagewalker::sql_generator::PaginationParams;

const CATALOG_YAML: &str = r#"
entities:
  User:
    table_name: users
    identifier: [id]
    columns:
      id: user_id
      name: full_name
  Group:
    table_name: user_groups
    identifier: [id]
    columns:
      id: group_id
      user: user_id
      title: title
"#;

const QUERY_YAML: &str = r#"
projection:
  items:
    - Entity: u
    - Entity: g
from:
  roots:
    - entity: User
      alias: u
      joins:
        - join_type: Left
          entity: Group
          alias: g
          collection: true
          joining_on:
            OperatorApplication:
              operator: Equal
              operands:
                - PropertyAccess:
                    table_alias: g
                    property: user
                - PropertyAccess:
                    table_alias: u
                    property: id
order_by:
  - expression:
      PropertyAccess:
        table_alias: u
        property: name
    order: Desc
"#;

#[test]
fn test_catalog_file_loads_into_lookup() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG_YAML.as_bytes()).unwrap();

    let catalog = EntityCatalog::from_yaml_file(file.path()).unwrap();
    let group = catalog.entity("Group").unwrap();
    assert_eq!(group.table_name, "user_groups");
    assert_eq!(group.column_for("user"), Some("user_id"));
}

#[test]
fn test_catalog_with_unmapped_identity_is_rejected() {
    let yaml = "entities:\n  User:\n    table_name: users\n    identifier: [id]\n    columns:\n      name: full_name\n";
    let err = EntityCatalog::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, MetadataError::UnknownProperty { .. }));
}

#[test]
fn test_missing_catalog_file_is_a_read_error() {
    let err = EntityCatalog::from_yaml_file("/nonexistent/catalog.yaml").unwrap_err();
    assert!(matches!(err, MetadataError::CatalogRead { .. }));
}

#[test]
fn test_query_file_with_collection_join_plans_two_phases() {
    let catalog = EntityCatalog::from_yaml_str(CATALOG_YAML).unwrap();
    let query: SelectQuery = serde_yaml::from_str(QUERY_YAML).unwrap();

    let paginator = Paginator::new(&query, &catalog);
    assert!(paginator.fetch_join_collection());

    let identifier_sql = paginator
        .preflight(&PaginationParams::new().with_limit(20))
        .unwrap();
    assert!(identifier_sql.contains("u.user_id AS root_id_0"));
    assert!(identifier_sql.contains("u.full_name AS full_name_1"));
    assert!(identifier_sql.contains("OVER (ORDER BY outer_table.full_name_1 DESC)"));
    assert!(identifier_sql.contains("LEFT JOIN user_groups AS g ON g.user_id = u.user_id"));
    assert!(!identifier_sql.contains("g.title"));

    let count_sql = paginator.count_sql().unwrap();
    assert!(count_sql.starts_with(
        "SELECT COUNT(*) AS row_count FROM (SELECT ROW_NUMBER() OVER (ORDER BY (SELECT 0))"
    ));
    assert!(!count_sql.contains("full_name"));
}
