use crate::source::SourceDefaults;
use crate::CoreError;
use packwright_schema::{validate_install_path, validate_maintainer};
use packwright_store::PackageLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "packwright.toml";

fn default_base_install() -> String {
    "Apps.Games".to_owned()
}

fn default_section() -> String {
    "Misc".to_owned()
}

fn default_licence() -> String {
    "Non free".to_owned()
}

/// Settings for a publishing run, read from `packwright.toml`.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    /// Root holding the `release` and `beta` archive directories.
    pub packages_dir: PathBuf,
    /// Directory catalogue rows name their package directories in.
    pub sources_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue: Option<PathBuf>,
    #[serde(default)]
    pub catalogue_header_lines: usize,
    /// Standard copyright text appended to every catalogue package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_file: Option<PathBuf>,
    /// Where run summaries are written; none are written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<PathBuf>,
    pub maintainer: String,
    #[serde(default = "default_base_install")]
    pub base_install: String,
    #[serde(default = "default_section")]
    pub default_section: String,
    #[serde(default = "default_licence")]
    pub default_licence: String,
}

impl PublisherConfig {
    pub fn new(
        packages_dir: impl Into<PathBuf>,
        sources_dir: impl Into<PathBuf>,
        maintainer: &str,
    ) -> Self {
        Self {
            packages_dir: packages_dir.into(),
            sources_dir: sources_dir.into(),
            extras_dir: None,
            catalogue: None,
            catalogue_header_lines: 0,
            copyright_file: None,
            logs_dir: None,
            maintainer: maintainer.to_owned(),
            base_install: default_base_install(),
            default_section: default_section(),
            default_licence: default_licence(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("invalid config {}: {e}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.packages_dir);
        resolve(&mut self.sources_dir);
        for p in [
            &mut self.extras_dir,
            &mut self.catalogue,
            &mut self.copyright_file,
            &mut self.logs_dir,
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_maintainer(&self.maintainer)
            .map_err(|e| CoreError::Config(format!("maintainer {e}")))?;
        validate_install_path(&self.base_install)
            .map_err(|e| CoreError::Config(format!("base_install {e}")))?;
        Ok(())
    }

    pub fn layout(&self) -> PackageLayout {
        PackageLayout::new(&self.packages_dir)
    }

    /// Fallback values for package sources, including the standard
    /// copyright text when a copyright file is configured.
    pub fn source_defaults(&self) -> Result<SourceDefaults, CoreError> {
        let standard_copyright = match &self.copyright_file {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                CoreError::Config(format!(
                    "failed to load copyright text {}: {e}",
                    path.display()
                ))
            })?),
            None => None,
        };
        Ok(SourceDefaults {
            maintainer: self.maintainer.clone(),
            base_install: self.base_install.clone(),
            section: self.default_section.clone(),
            licence: self.default_licence.clone(),
            standard_copyright,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let mut config = PublisherConfig::new(
            dir.path().join("packages"),
            dir.path().join("games"),
            "Jo Bloggs <jo@example.com>",
        );
        config.catalogue = Some(dir.path().join("catalogue.csv"));
        config.catalogue_header_lines = 5;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = PublisherConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn relative_paths_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "packages_dir = \"Packages\"\nsources_dir = \"/srv/games\"\nextras_dir = \"Extras\"\nmaintainer = \"Jo <jo@example.com>\"\n",
        )
        .unwrap();

        let config = PublisherConfig::load(&path).unwrap();
        assert_eq!(config.packages_dir, dir.path().join("Packages"));
        assert_eq!(config.sources_dir, PathBuf::from("/srv/games"));
        assert_eq!(config.extras_dir, Some(dir.path().join("Extras")));
        assert_eq!(config.base_install, "Apps.Games");
        assert_eq!(config.default_section, "Misc");
        assert_eq!(config.default_licence, "Non free");
        assert_eq!(config.catalogue_header_lines, 0);
        assert_eq!(config.layout().release_dir(), dir.path().join("Packages").join("release"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "packages_dir = \"p\"\nsources_dir = \"s\"\nmaintainer = \"Jo <jo@x>\"\ngames_dir = \"g\"\n",
        )
        .unwrap();
        let err = PublisherConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("games_dir"));
    }

    #[test]
    fn invalid_maintainer_and_base_install_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "packages_dir = \"p\"\nsources_dir = \"s\"\nmaintainer = \"Jo\"\n").unwrap();
        let err = PublisherConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("maintainer Email address must be included"));

        let mut config = PublisherConfig::new("p", "s", "Jo <jo@x>");
        config.base_install = "Games.".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn source_defaults_read_copyright_text() {
        let dir = tempfile::tempdir().unwrap();
        let copyright = dir.path().join("Copyright");
        std::fs::write(&copyright, "All rights reserved.").unwrap();

        let mut config = PublisherConfig::new("p", "s", "Jo <jo@x>");
        assert!(config.source_defaults().unwrap().standard_copyright.is_none());

        config.copyright_file = Some(copyright);
        let defaults = config.source_defaults().unwrap();
        assert_eq!(defaults.standard_copyright.as_deref(), Some("All rights reserved."));
        assert_eq!(defaults.section, "Misc");

        config.copyright_file = Some(dir.path().join("missing"));
        assert!(matches!(config.source_defaults(), Err(CoreError::Config(_))));
    }
}
