// Reference catalogs
//
// Immutable lookup tables queried by the cascade resolver and the loader:
// the administrative-region hierarchy (province > district > division >
// locality) and the category taxonomy. Loaded once per session through a
// provider and injected into the engine; nothing here mutates after
// construction, so index maps are built eagerly in the constructors.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// One node of the administrative-region tree.
#[derive(Debug, Clone)]
pub struct RegionNode {
    pub code: String,
    pub name: String,
    pub children: Vec<RegionNode>,
}

impl RegionNode {
    pub fn new(code: impl Into<String>, name: impl Into<String>, children: Vec<RegionNode>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            children,
        }
    }
}

/// Indexed view over the region tree.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    names: HashMap<String, String>,
    parent_of: HashMap<String, String>,
    children_of: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl RegionCatalog {
    pub fn new(tree: &[RegionNode]) -> Self {
        let mut catalog = Self::default();
        for node in tree {
            catalog.roots.push(node.code.clone());
            catalog.index(node, None);
        }
        catalog
    }

    fn index(&mut self, node: &RegionNode, parent: Option<&str>) {
        self.names.insert(node.code.clone(), node.name.clone());
        if let Some(parent) = parent {
            self.parent_of.insert(node.code.clone(), parent.to_string());
        }
        let child_codes = node.children.iter().map(|c| c.code.clone()).collect();
        self.children_of.insert(node.code.clone(), child_codes);
        for child in &node.children {
            self.index(child, Some(&node.code));
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn children_of(&self, code: &str) -> &[String] {
        self.children_of.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct parent/child relation.
    pub fn is_child_of(&self, child: &str, parent: &str) -> bool {
        self.parent_of.get(child).map(String::as_str) == Some(parent)
    }
}

/// Auxiliary record a category may carry: a default responsible officer whose
/// details auto-fill display-only fields, plus the officer's own sub-category.
#[derive(Debug, Clone)]
pub struct ResponsibleOfficer {
    /// Field name -> value pairs written over the declared auto-fill fields.
    pub fields: Vec<(String, String)>,
    pub sub_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub code: String,
    pub name: String,
    /// (code, name) pairs permitted under this category.
    pub sub_categories: Vec<(String, String)>,
    pub officer: Option<ResponsibleOfficer>,
}

/// Indexed category -> sub-category taxonomy.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    entries: Vec<CategoryEntry>,
    by_code: HashMap<String, usize>,
}

impl CategoryCatalog {
    pub fn new(entries: Vec<CategoryEntry>) -> Self {
        let by_code = entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.code.clone(), idx))
            .collect();
        Self { entries, by_code }
    }

    pub fn entry(&self, code: &str) -> Option<&CategoryEntry> {
        self.by_code.get(code).map(|idx| &self.entries[*idx])
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn sub_categories(&self, code: &str) -> &[(String, String)] {
        self.entry(code)
            .map(|e| e.sub_categories.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_sub_category(&self, category: &str, sub_category: &str) -> bool {
        self.sub_categories(category)
            .iter()
            .any(|(code, _)| code == sub_category)
    }

    pub fn sub_category_name(&self, category: &str, sub_category: &str) -> Option<&str> {
        self.sub_categories(category)
            .iter()
            .find(|(code, _)| code == sub_category)
            .map(|(_, name)| name.as_str())
    }

    pub fn officer(&self, code: &str) -> Option<&ResponsibleOfficer> {
        self.entry(code).and_then(|e| e.officer.as_ref())
    }
}

/// Everything the engine reads from reference data.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalogs {
    pub regions: RegionCatalog,
    pub categories: CategoryCatalog,
}

/// Read-only catalog source, resolved once at session start. No update
/// operations are exposed to the engine.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn load(&self) -> Result<ReferenceCatalogs>;
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn region_index_resolves_names_and_parents() {
        let catalog = RegionCatalog::new(&fixtures::region_tree());
        assert_eq!(catalog.name_of("D1"), Some("Colombo"));
        assert!(catalog.is_child_of("D1", "P1"));
        assert!(!catalog.is_child_of("D1", "P2"));
        assert_eq!(catalog.children_of("P2"), &["D2".to_string()]);
        assert_eq!(catalog.roots(), &["P1".to_string(), "P2".to_string()]);
    }

    #[test]
    fn unknown_region_code_is_absent_not_a_panic() {
        let catalog = RegionCatalog::new(&fixtures::region_tree());
        assert!(!catalog.contains("ZZ"));
        assert!(catalog.name_of("ZZ").is_none());
        assert!(catalog.children_of("ZZ").is_empty());
    }

    #[test]
    fn category_sub_membership() {
        let catalog = fixtures::categories();
        assert!(catalog.has_sub_category("TEMPLE", "SHRINE"));
        assert!(!catalog.has_sub_category("CHURCH", "SHRINE"));
        assert_eq!(
            catalog.sub_category_name("TEMPLE", "MONASTERY"),
            Some("Monastery")
        );
    }

    #[test]
    fn officer_lookup() {
        let catalog = fixtures::categories();
        assert!(catalog.officer("TEMPLE").is_some());
        assert!(catalog.officer("KOVIL").is_none());
    }
}
