//! Project loading and evaluation settings.

/// Configuration for loading a project and evaluating its conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// File name (without extension) `Project::from_path` looks for.
    pub project_file_stem: String,

    /// Reject projects in which two entity types share an entity id.
    pub unique_entity_ids: bool,

    /// Fail with a circular condition error when an `enabled` condition
    /// depends on itself.
    pub detect_condition_cycles: bool,

    /// Maximum nesting of condition properties evaluated through each other.
    pub max_condition_depth: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_file_stem: "llm-gamebook".to_string(),
            unique_entity_ids: true,
            detect_condition_cycles: true,
            max_condition_depth: 64,
        }
    }
}

impl ProjectConfig {
    pub fn with_project_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.project_file_stem = stem.into();
        self
    }

    pub fn with_unique_entity_ids(mut self, unique: bool) -> Self {
        self.unique_entity_ids = unique;
        self
    }

    pub fn with_condition_cycle_detection(mut self, detect: bool) -> Self {
        self.detect_condition_cycles = detect;
        self
    }

    pub fn with_max_condition_depth(mut self, depth: usize) -> Self {
        self.max_condition_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.project_file_stem, "llm-gamebook");
        assert!(config.unique_entity_ids);
        assert!(config.detect_condition_cycles);
        assert_eq!(config.max_condition_depth, 64);
    }

    #[test]
    fn test_builders() {
        let config = ProjectConfig::default()
            .with_project_file_stem("story")
            .with_unique_entity_ids(false)
            .with_condition_cycle_detection(false)
            .with_max_condition_depth(8);
        assert_eq!(config.project_file_stem, "story");
        assert!(!config.unique_entity_ids);
        assert!(!config.detect_condition_cycles);
        assert_eq!(config.max_condition_depth, 8);
    }
}
