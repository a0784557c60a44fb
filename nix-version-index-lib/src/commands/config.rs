use crate::Result;
use crate::eval::Evaluator;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the base directory when no configuration path is given
pub const CONFIG_FILE_NAME: &str = "nix-version-index.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The nix executable used to evaluate revisions
    #[serde(default = "default_nix")]
    pub nix: String,

    /// Expression file passed to `nix eval --file`
    #[serde(default = "default_expression")]
    pub expression: Utf8PathBuf,

    /// Directory holding cached evaluator output
    #[serde(default = "default_packages_dir")]
    pub packages_dir: Utf8PathBuf,

    /// Where nixpkgs is cloned from
    #[serde(default = "default_nixpkgs_url")]
    pub nixpkgs_url: Url,

    /// Branch whose history is indexed
    #[serde(default = "default_nixpkgs_branch")]
    pub nixpkgs_branch: String,

    /// Maximum duration of a single evaluation
    #[serde(default = "default_eval_timeout", with = "humantime_serde")]
    pub eval_timeout: Duration,

    /// Maximum duration of a single git operation
    #[serde(default = "default_git_timeout", with = "humantime_serde")]
    pub git_timeout: Duration,
}

fn default_nix() -> String {
    "nix".to_string()
}

fn default_expression() -> Utf8PathBuf {
    Utf8PathBuf::from("default.nix")
}

fn default_packages_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("packages")
}

fn default_nixpkgs_url() -> Url {
    Url::parse("https://github.com/NixOS/nixpkgs.git").expect("default nixpkgs URL should be valid")
}

fn default_nixpkgs_branch() -> String {
    "master".to_string()
}

const fn default_eval_timeout() -> Duration {
    Duration::from_mins(30)
}

const fn default_git_timeout() -> Duration {
    Duration::from_mins(10)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(base_path: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading nix-version-index configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_path.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading nix-version-index configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!("Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Build the evaluator described by this configuration
    #[must_use]
    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(
            &self.nix,
            self.expression.as_std_path(),
            self.packages_dir.as_std_path(),
            self.eval_timeout,
        )
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is empty or a timeout is zero
    fn validate(&self) -> Result<()> {
        if self.nix.trim().is_empty() {
            return Err(app_err!("nix must name an executable"));
        }

        if self.nixpkgs_branch.trim().is_empty() || self.nixpkgs_branch.contains(char::is_whitespace) {
            return Err(app_err!("nixpkgs_branch must be a branch name, got '{}'", self.nixpkgs_branch));
        }

        if self.eval_timeout.is_zero() {
            return Err(app_err!("eval_timeout must be greater than zero"));
        }

        if self.git_timeout.is_zero() {
            return Err(app_err!("git_timeout must be greater than zero"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
    }

    #[test]
    fn test_default_config_matches_field_defaults() {
        let from_fields: Config = toml::from_str("").unwrap();
        assert_eq!(from_fields, Config::default());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.nix, "nix");
        assert_eq!(config.expression, "default.nix");
        assert_eq!(config.packages_dir, "packages");
        assert_eq!(config.nixpkgs_url.as_str(), "https://github.com/NixOS/nixpkgs.git");
        assert_eq!(config.nixpkgs_branch, "master");
        assert_eq!(config.eval_timeout, Duration::from_mins(30));
        assert_eq!(config.git_timeout, Duration::from_mins(10));
    }

    #[test]
    fn test_validate_empty_nix() {
        let config = Config { nix: " ".to_string(), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_branch() {
        let config = Config { nixpkgs_branch: String::new(), ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { nixpkgs_branch: "release 23.11".to_string(), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let config = Config { eval_timeout: Duration::ZERO, ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { git_timeout: Duration::ZERO, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_overrides() {
        let config: Config = toml::from_str(
            r#"
packages_dir = "/var/cache/nvi"
nixpkgs_branch = "nixos-unstable"
eval_timeout = "2h"
"#,
        )
        .unwrap();

        assert_eq!(config.packages_dir, "/var/cache/nvi");
        assert_eq!(config.nixpkgs_branch, "nixos-unstable");
        assert_eq!(config.eval_timeout, Duration::from_hours(2));
        assert_eq!(config.git_timeout, Duration::from_mins(10));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<Config, _> = toml::from_str("unknown_field = 1\n");
        assert!(result.is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let output_path = Utf8PathBuf::try_from(tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        Config::save_default(&output_path).unwrap();

        let loaded = Config::load(&Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap(), Some(&output_path)).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_discovers_file_in_base_path() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(base.join(CONFIG_FILE_NAME), "nixpkgs_branch = \"staging\"\n").unwrap();

        let loaded = Config::load(&base, None).unwrap();
        assert_eq!(loaded.nixpkgs_branch, "staging");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        assert_eq!(Config::load(&base, None).unwrap(), Config::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_invalid_values_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("bad.toml")).unwrap();
        fs::write(&path, "git_timeout = \"0s\"\n").unwrap();

        let err = Config::load(&path, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("git_timeout"), "{err}");
    }

    #[test]
    fn test_default_config_toml_is_not_empty() {
        assert!(!DEFAULT_CONFIG_TOML.is_empty());
    }
}
