// Cascading selection resolver
//
// Dependent-field rules over the reference catalogs: the administrative
// region chain (province > district > division > locality) and the
// category > sub-category pair with officer auto-fill. A parent change
// produces a patch the store applies atomically via `set_many` semantics.
//
// Auto-fill from the catalog's officer record overwrites the dependent
// fields unconditionally on every parent change, even over manual edits.
// That is the observed production behavior and is reproduced as-is.

use log::debug;
use std::sync::Arc;

use crate::catalog::ReferenceCatalogs;
use crate::models::{DisplayShadow, FieldValue, FormValues};

/// Declared parent -> child dependency.
#[derive(Debug, Clone)]
pub enum CascadeRule {
    /// Ordered chain of region fields, coarsest first. Any field but the last
    /// acts as a parent for the fields after it.
    RegionChain { fields: Vec<String> },
    /// Category picker with a dependent sub-category and officer auto-fill
    /// targets (display-only fields overwritten from the catalog record).
    CategoryPair {
        parent: String,
        child: String,
        autofill: Vec<String>,
    },
}

/// Value/shadow updates produced by one parent change. Shadows set to `None`
/// are cleared alongside their values.
#[derive(Debug, Clone, Default)]
pub struct CascadePatch {
    pub values: Vec<(String, FieldValue)>,
    pub shadows: Vec<(String, Option<String>)>,
}

impl CascadePatch {
    fn set(&mut self, name: &str, value: &str, shadow: Option<&str>) {
        self.values.push((name.to_string(), FieldValue::text(value)));
        self.shadows
            .push((name.to_string(), shadow.map(str::to_string)));
    }

    fn clear(&mut self, name: &str) {
        self.set(name, "", None);
    }
}

pub struct CascadeResolver {
    catalogs: Arc<ReferenceCatalogs>,
    rules: Vec<CascadeRule>,
}

impl CascadeResolver {
    pub fn new(catalogs: Arc<ReferenceCatalogs>, rules: Vec<CascadeRule>) -> Self {
        Self { catalogs, rules }
    }

    pub fn rules(&self) -> &[CascadeRule] {
        &self.rules
    }

    /// Compute the patch for `field` changing to `new_value`. Returns `None`
    /// when no rule treats `field` as a parent.
    pub fn on_parent_change(
        &self,
        field: &str,
        new_value: &str,
        current: &FormValues,
    ) -> Option<CascadePatch> {
        for rule in &self.rules {
            match rule {
                CascadeRule::RegionChain { fields } => {
                    let Some(position) = fields.iter().position(|f| f == field) else {
                        continue;
                    };
                    if position == fields.len() - 1 {
                        // The finest-grain field has no dependents.
                        continue;
                    }
                    return Some(self.region_change(fields, position, new_value, current));
                }
                CascadeRule::CategoryPair {
                    parent,
                    child,
                    autofill,
                } => {
                    if parent != field {
                        continue;
                    }
                    return Some(self.category_change(parent, child, autofill, new_value, current));
                }
            }
        }
        None
    }

    fn region_change(
        &self,
        fields: &[String],
        position: usize,
        new_value: &str,
        current: &FormValues,
    ) -> CascadePatch {
        let regions = &self.catalogs.regions;
        let mut patch = CascadePatch::default();
        patch.set(&fields[position], new_value, regions.name_of(new_value));

        // Walk the tail: keep a child only while the parent chain stays
        // intact; once one link breaks, everything finer is cleared too.
        let mut expected_parent = new_value.to_string();
        let mut broken = new_value.trim().is_empty();
        for child_field in &fields[position + 1..] {
            let child_code = current
                .get(child_field)
                .map(|v| v.as_text().to_string())
                .unwrap_or_default();
            if !broken && !child_code.is_empty() && regions.is_child_of(&child_code, &expected_parent)
            {
                expected_parent = child_code;
                continue;
            }
            broken = true;
            patch.clear(child_field);
        }
        debug!(
            "[PHASE: cascade] [STEP: region] {} -> {} ({} dependent field(s) touched)",
            fields[position],
            new_value,
            patch.values.len() - 1
        );
        patch
    }

    fn category_change(
        &self,
        parent: &str,
        child: &str,
        autofill: &[String],
        new_value: &str,
        current: &FormValues,
    ) -> CascadePatch {
        let categories = &self.catalogs.categories;
        let mut patch = CascadePatch::default();
        patch.set(
            parent,
            new_value,
            categories.entry(new_value).map(|e| e.name.as_str()),
        );

        if let Some(officer) = categories.officer(new_value) {
            // Unconditional overwrite of the display-only officer fields,
            // even if the user had hand-edited them.
            for target in autofill {
                let value = officer
                    .fields
                    .iter()
                    .find(|(name, _)| name == target)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("");
                patch.set(target, value, None);
            }
            match officer.sub_category.as_deref() {
                Some(sub) if categories.has_sub_category(new_value, sub) => {
                    patch.set(child, sub, categories.sub_category_name(new_value, sub));
                }
                _ => patch.clear(child),
            }
        } else {
            // No auxiliary record: keep the child only if still permitted.
            let child_code = current
                .get(child)
                .map(|v| v.as_text().to_string())
                .unwrap_or_default();
            if child_code.is_empty() || !categories.has_sub_category(new_value, &child_code) {
                patch.clear(child);
            }
        }
        patch
    }

    /// Seed display shadows for catalog-backed fields from already-loaded
    /// values (used when an existing record is opened for editing).
    pub fn seed_shadows(&self, values: &FormValues) -> DisplayShadow {
        let mut shadows = DisplayShadow::new();
        for rule in &self.rules {
            match rule {
                CascadeRule::RegionChain { fields } => {
                    for field in fields {
                        let code = values.get(field).map(|v| v.as_text()).unwrap_or("");
                        if let Some(name) = self.catalogs.regions.name_of(code) {
                            shadows.insert(field.clone(), name.to_string());
                        }
                    }
                }
                CascadeRule::CategoryPair { parent, child, .. } => {
                    let parent_code = values.get(parent).map(|v| v.as_text()).unwrap_or("");
                    if let Some(entry) = self.catalogs.categories.entry(parent_code) {
                        shadows.insert(parent.clone(), entry.name.clone());
                        let child_code = values.get(child).map(|v| v.as_text()).unwrap_or("");
                        if let Some(name) = self
                            .catalogs
                            .categories
                            .sub_category_name(parent_code, child_code)
                        {
                            shadows.insert(child.clone(), name.to_string());
                        }
                    }
                }
            }
        }
        shadows
    }
}
