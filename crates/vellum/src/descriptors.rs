//! Repository descriptors.
//!
//! Descriptors are key/value metadata about the repository implementation.
//! Keys follow the content repository API naming; most values are single
//! strings, a few are lists.

use std::collections::BTreeMap;

pub const REP_NAME_DESC: &str = "jcr.repository.name";
pub const REP_VENDOR_DESC: &str = "jcr.repository.vendor";
pub const REP_VENDOR_URL_DESC: &str = "jcr.repository.vendor.url";
pub const REP_VERSION_DESC: &str = "jcr.repository.version";
pub const SPEC_NAME_DESC: &str = "jcr.specification.name";
pub const SPEC_VERSION_DESC: &str = "jcr.specification.version";
pub const OPTION_TRANSACTIONS_SUPPORTED: &str = "option.transactions.supported";
pub const OPTION_VERSIONING_SUPPORTED: &str = "option.versioning.supported";
pub const OPTION_OBSERVATION_SUPPORTED: &str = "option.observation.supported";
pub const OPTION_LOCKING_SUPPORTED: &str = "option.locking.supported";
pub const QUERY_LANGUAGES: &str = "query.languages";
pub const QUERY_STORED_QUERIES_SUPPORTED: &str = "query.stored.queries.supported";
pub const QUERY_JOINS: &str = "query.joins";

/// Keys defined by the content repository API.
pub const STANDARD_DESCRIPTORS: &[&str] = &[
    REP_NAME_DESC,
    REP_VENDOR_DESC,
    REP_VENDOR_URL_DESC,
    REP_VERSION_DESC,
    SPEC_NAME_DESC,
    SPEC_VERSION_DESC,
    OPTION_TRANSACTIONS_SUPPORTED,
    OPTION_VERSIONING_SUPPORTED,
    OPTION_OBSERVATION_SUPPORTED,
    OPTION_LOCKING_SUPPORTED,
    QUERY_LANGUAGES,
    QUERY_STORED_QUERIES_SUPPORTED,
    QUERY_JOINS,
];

/// Value of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorValue {
    Single(String),
    Multi(Vec<String>),
}

impl DescriptorValue {
    fn flag(value: bool) -> Self {
        DescriptorValue::Single(value.to_string())
    }

    /// Get the value if it is single-valued.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            DescriptorValue::Single(value) => Some(value),
            DescriptorValue::Multi(_) => None,
        }
    }

    /// Get all values.
    pub fn values(&self) -> Vec<&str> {
        match self {
            DescriptorValue::Single(value) => vec![value.as_str()],
            DescriptorValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Descriptor table of one repository.
#[derive(Debug, Clone)]
pub struct Descriptors {
    values: BTreeMap<String, DescriptorValue>,
}

impl Descriptors {
    /// Build the descriptor table for a repository.
    pub fn for_repository(name: &str) -> Self {
        let mut values = BTreeMap::new();
        let mut single = |key: &str, value: &str| {
            values.insert(key.to_string(), DescriptorValue::Single(value.to_string()));
        };

        single(REP_NAME_DESC, name);
        single(REP_VENDOR_DESC, "Vellum");
        single(REP_VENDOR_URL_DESC, env!("CARGO_PKG_REPOSITORY"));
        single(REP_VERSION_DESC, env!("CARGO_PKG_VERSION"));
        single(SPEC_NAME_DESC, "Content Repository API");
        single(SPEC_VERSION_DESC, "2.0");
        single(QUERY_JOINS, "query.joins.none");

        values.insert(OPTION_TRANSACTIONS_SUPPORTED.to_string(), DescriptorValue::flag(false));
        values.insert(OPTION_VERSIONING_SUPPORTED.to_string(), DescriptorValue::flag(false));
        values.insert(OPTION_OBSERVATION_SUPPORTED.to_string(), DescriptorValue::flag(true));
        values.insert(OPTION_LOCKING_SUPPORTED.to_string(), DescriptorValue::flag(false));
        values.insert(QUERY_STORED_QUERIES_SUPPORTED.to_string(), DescriptorValue::flag(false));
        values.insert(QUERY_LANGUAGES.to_string(), DescriptorValue::Multi(Vec::new()));

        Self { values }
    }

    /// Get a descriptor value.
    pub fn get(&self, key: &str) -> Option<&DescriptorValue> {
        self.values.get(key)
    }

    /// Get a single-valued descriptor as a string.
    pub fn descriptor(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DescriptorValue::as_single)
    }

    /// Get all descriptor keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Check whether a key is defined by the content repository API.
    pub fn is_standard_descriptor(key: &str) -> bool {
        STANDARD_DESCRIPTORS.contains(&key)
    }

    /// Check whether a key exists and holds a single value.
    pub fn is_single_value_descriptor(&self, key: &str) -> bool {
        matches!(self.get(key), Some(DescriptorValue::Single(_)))
    }
}
