use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ChangelogErrors, ChangelogResult};

pub const DEFAULT_SETTINGS_FILE: &str = "gitchanges.toml";

/// Controls which commits end up in which change group.
///
/// Empty strings are treated the same as absent values.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct GroupingSettings {
    /// Only changes made after this tag are included. The tag's own group is excluded.
    pub since_tag: Option<String>,

    /// Only changes made at or before this tag are included.
    pub until_tag: Option<String>,

    /// Regex whose first capture group becomes the label of a change.
    pub group_by: Option<String>,

    /// Regex matched against the full commit message. Matching commits are dropped.
    pub skip: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl GroupingSettings {
    pub fn since_tag(&self) -> Option<&str> {
        non_empty(&self.since_tag)
    }

    pub fn until_tag(&self) -> Option<&str> {
        non_empty(&self.until_tag)
    }

    pub fn group_by(&self) -> Option<&str> {
        non_empty(&self.group_by)
    }

    pub fn skip(&self) -> Option<&str> {
        non_empty(&self.skip)
    }

    /// Describes the effective tag range in prose when since/until filtering is active.
    pub fn filter_declaration(&self) -> Option<String> {
        if self.since_tag().is_none() && self.until_tag().is_none() {
            return None;
        }

        Some(format!(
            "Changes have been filtered from {} to {}.",
            self.since_tag().unwrap_or("earliest"),
            self.until_tag().unwrap_or("latest")
        ))
    }

    /// Returns these settings with every value set in `overrides` replacing the current one.
    pub fn merge(self, overrides: GroupingSettings) -> Self {
        Self {
            since_tag: overrides.since_tag.or(self.since_tag),
            until_tag: overrides.until_tag.or(self.until_tag),
            group_by: overrides.group_by.or(self.group_by),
            skip: overrides.skip.or(self.skip),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ChangelogSettings {
    /// Project name shown in the changelog title. Defaults to the repository directory name.
    pub name: Option<String>,

    /// Path to a template replacing the built in Keep a Changelog template.
    pub template: Option<PathBuf>,

    #[serde(flatten)]
    pub grouping: GroupingSettings,
}

impl ChangelogSettings {
    /// Reads settings from a TOML file.
    pub fn from_path(path: &Path) -> ChangelogResult<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| ChangelogErrors::InvalidSettings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads settings from a TOML file, falling back to defaults when the file does not exist.
    pub fn from_path_or_default(path: &Path) -> ChangelogResult<Self> {
        match Self::from_path(path) {
            Err(ChangelogErrors::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("no settings found at {}, using defaults", path.display());
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Returns these settings with every value set in `overrides` replacing the current one.
    pub fn merge(self, overrides: ChangelogSettings) -> Self {
        Self {
            name: overrides.name.or(self.name),
            template: overrides.template.or(self.template),
            grouping: self.grouping.merge(overrides.grouping),
        }
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;
    use test_case::test_case;

    use crate::errors::ChangelogErrors;
    use crate::settings::{ChangelogSettings, GroupingSettings};

    fn grouping(since_tag: Option<&str>, until_tag: Option<&str>) -> GroupingSettings {
        GroupingSettings {
            since_tag: since_tag.map(String::from),
            until_tag: until_tag.map(String::from),
            ..Default::default()
        }
    }

    #[test_case(None, None => None; "no filters")]
    #[test_case(Some(""), Some("") => None; "empty filters")]
    #[test_case(Some("v1.0"), None => Some("Changes have been filtered from v1.0 to latest.".to_string()); "since only")]
    #[test_case(None, Some("v2.0") => Some("Changes have been filtered from earliest to v2.0.".to_string()); "until only")]
    #[test_case(Some("v1.0"), Some("v2.0") => Some("Changes have been filtered from v1.0 to v2.0.".to_string()); "since and until")]
    fn filter_declaration(since_tag: Option<&str>, until_tag: Option<&str>) -> Option<String> {
        grouping(since_tag, until_tag).filter_declaration()
    }

    #[test]
    fn should_treat_empty_values_as_unset() {
        let settings = GroupingSettings {
            since_tag: Some(String::new()),
            until_tag: Some(String::new()),
            group_by: Some(String::new()),
            skip: Some(String::new()),
        };

        assert_eq!(None, settings.since_tag());
        assert_eq!(None, settings.until_tag());
        assert_eq!(None, settings.group_by());
        assert_eq!(None, settings.skip());
    }

    #[test]
    fn should_load_settings_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gitchanges.toml");
        fs::write(
            &path,
            r###"
name = "Demo"
template = "changelog.jinja"
since_tag = "v1.0.0"
group_by = '^(\w+):'
skip = "^chore"
"###,
        )
        .unwrap();

        let settings = ChangelogSettings::from_path(&path).unwrap();

        assert_eq!(Some("Demo"), settings.name());
        assert_eq!(Some(PathBuf::from("changelog.jinja")), settings.template);
        assert_eq!(Some("v1.0.0"), settings.grouping.since_tag());
        assert_eq!(None, settings.grouping.until_tag());
        assert_eq!(Some(r"^(\w+):"), settings.grouping.group_by());
        assert_eq!(Some("^chore"), settings.grouping.skip());
    }

    #[test]
    fn should_default_when_settings_file_missing() {
        let dir = TempDir::new().unwrap();
        let settings =
            ChangelogSettings::from_path_or_default(&dir.path().join("gitchanges.toml")).unwrap();
        assert_eq!(ChangelogSettings::default(), settings);
    }

    #[test]
    fn should_fail_on_missing_explicit_settings_file() {
        let dir = TempDir::new().unwrap();
        let result = ChangelogSettings::from_path(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ChangelogErrors::IoError(_))));
    }

    #[test]
    fn should_fail_on_invalid_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gitchanges.toml");
        fs::write(&path, "since_tag = [").unwrap();

        let result = ChangelogSettings::from_path_or_default(&path);
        assert!(matches!(result, Err(ChangelogErrors::InvalidSettings { .. })));
    }

    #[test]
    fn should_prefer_overrides_when_merging() {
        let file = ChangelogSettings {
            name: Some("From File".to_string()),
            template: None,
            grouping: GroupingSettings {
                since_tag: Some("v1".to_string()),
                skip: Some("^chore".to_string()),
                ..Default::default()
            },
        };
        let cli = ChangelogSettings {
            name: None,
            template: Some(PathBuf::from("custom.jinja")),
            grouping: GroupingSettings {
                since_tag: Some("v2".to_string()),
                group_by: Some(r"^(\w+):".to_string()),
                ..Default::default()
            },
        };

        let merged = file.merge(cli);

        assert_eq!(Some("From File"), merged.name());
        assert_eq!(Some(PathBuf::from("custom.jinja")), merged.template);
        assert_eq!(Some("v2"), merged.grouping.since_tag());
        assert_eq!(Some(r"^(\w+):"), merged.grouping.group_by());
        assert_eq!(Some("^chore"), merged.grouping.skip());
        assert_eq!(None, merged.grouping.until_tag());
    }
}
