// src/seq/category.rs

//! Block category vocabulary.
//!
//! Display names for blocks are resolved from their first member task. When
//! the collaborator supplies no explicit group label, the task name is
//! matched against this table; the matched category's display name becomes
//! the block name used for saved-order replay.

use crate::types::TaskName;

/// A known block category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCategory {
    Hospital,
    Bridge,
    Snap,
    Dovetail,
    Wheel,
    Triangle,
    Museum,
    Inspection,
    /// Category added through configuration.
    Other(String),
}

impl BlockCategory {
    pub fn display_name(&self) -> &str {
        match self {
            BlockCategory::Hospital => "Hospital",
            BlockCategory::Bridge => "Bridge",
            BlockCategory::Snap => "Snap",
            BlockCategory::Dovetail => "Dovetail",
            BlockCategory::Wheel => "Wheel",
            BlockCategory::Triangle => "Triangle",
            BlockCategory::Museum => "Museum",
            BlockCategory::Inspection => "Inspection",
            BlockCategory::Other(name) => name,
        }
    }
}

/// Keyword lookup table mapping task names to block categories.
///
/// Entries are tried in order; the keyword matches as a case-insensitive
/// substring of the task name. The table is injectable so the vocabulary can
/// be extended from configuration and swapped in tests.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<(String, BlockCategory)>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ("hospital".to_string(), BlockCategory::Hospital),
                ("bridge".to_string(), BlockCategory::Bridge),
                ("snap".to_string(), BlockCategory::Snap),
                ("dovetail".to_string(), BlockCategory::Dovetail),
                ("wheel".to_string(), BlockCategory::Wheel),
                ("triangle".to_string(), BlockCategory::Triangle),
                ("museum".to_string(), BlockCategory::Museum),
                ("inspection".to_string(), BlockCategory::Inspection),
            ],
        }
    }
}

impl CategoryTable {
    /// Default vocabulary extended with configured keyword/display pairs.
    pub fn with_extra(extra: &[(String, String)]) -> Self {
        let mut table = Self::default();
        for (keyword, display) in extra {
            table.entries.push((
                keyword.trim().to_lowercase(),
                BlockCategory::Other(display.clone()),
            ));
        }
        table
    }

    /// Look up the category for a task name, if any keyword matches.
    pub fn category_for(&self, task_name: &str) -> Option<&BlockCategory> {
        let lowered = task_name.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, category)| category)
    }

    /// Display name for a task name: matched category, else the raw name.
    pub fn display_for(&self, task_name: &TaskName) -> String {
        self.category_for(task_name)
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| task_name.clone())
    }
}
