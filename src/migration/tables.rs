// ABOUTME: The fixed, ordered set of catalog attribute value tables
// ABOUTME: Category tables first, then product tables, alphabetical by value type

/// Catalog EAV tables collapsed onto the default store, in processing order
pub const CATALOG_EAV_TABLES: [&str; 11] = [
    "catalog_category_entity_datetime",
    "catalog_category_entity_decimal",
    "catalog_category_entity_int",
    "catalog_category_entity_text",
    "catalog_category_entity_varchar",
    "catalog_product_entity_datetime",
    "catalog_product_entity_decimal",
    "catalog_product_entity_gallery",
    "catalog_product_entity_int",
    "catalog_product_entity_text",
    "catalog_product_entity_varchar",
];

/// Column holding the primary key of an attribute value row
pub const VALUE_ID_COLUMN: &str = "value_id";
/// Column holding the EAV attribute id
pub const ATTRIBUTE_ID_COLUMN: &str = "attribute_id";
/// Column holding the store scope of a value
pub const STORE_ID_COLUMN: &str = "store_id";
