use crate::config::ScanSettings;

/// Name-prefix rules for entries that are neither walked nor counted.
///
/// Directories matching a rule are pruned before descent; files matching a
/// rule are skipped. The starting root of a walk is never subject to them.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    dir_prefixes: Vec<String>,
    file_prefixes: Vec<String>,
}

impl IgnoreRules {
    pub fn new(dir_prefixes: Vec<String>, file_prefixes: Vec<String>) -> Self {
        let clean = |prefixes: Vec<String>| -> Vec<String> {
            prefixes
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            dir_prefixes: clean(dir_prefixes),
            file_prefixes: clean(file_prefixes),
        }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(
            settings.hidden_dir_prefixes.clone(),
            settings.hidden_file_prefixes.clone(),
        )
    }

    pub fn is_hidden_dir(&self, name: &str) -> bool {
        self.dir_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn is_hidden_file(&self, name: &str) -> bool {
        self.file_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::from_settings(&ScanSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_hide_dot_and_dollar_dirs() {
        let rules = IgnoreRules::default();
        assert!(rules.is_hidden_dir(".git"));
        assert!(rules.is_hidden_dir("$Recycle.Bin"));
        assert!(!rules.is_hidden_dir("src"));
    }

    #[test]
    fn test_default_rules_only_hide_dot_files() {
        let rules = IgnoreRules::default();
        assert!(rules.is_hidden_file(".bashrc"));
        assert!(!rules.is_hidden_file("$report.txt"));
        assert!(!rules.is_hidden_file("notes.txt"));
    }

    #[test]
    fn test_blank_prefixes_are_dropped() {
        let rules = IgnoreRules::new(vec!["  ".to_string()], vec![String::new()]);
        assert!(!rules.is_hidden_dir("anything"));
        assert!(!rules.is_hidden_file("anything"));
    }
}
