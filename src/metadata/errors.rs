use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetadataError {
    #[error("Alias `{alias}` is not declared in the FROM clause")]
    UnknownAlias { alias: String },
    #[error("No entity metadata found for `{entity}`")]
    UnknownEntity { entity: String },
    #[error("Entity `{entity}` has no mapped property `{property}`")]
    UnknownProperty { entity: String, property: String },
    #[error("Entity `{entity}` declares no identifier properties")]
    MissingIdentifier { entity: String },
    #[error("Failed to read entity catalog: {error}")]
    CatalogRead { error: String },
    #[error("Failed to parse entity catalog: {error}")]
    CatalogParse { error: String },
}
