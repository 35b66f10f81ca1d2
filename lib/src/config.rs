//! Guard configuration.
//!
//! Everything the guard checks is injected through [`GuardConfig`]. When the
//! `OOB_GUARD_CONFIG` environment variable names a YAML file, sections present
//! there replace the built-in defaults; otherwise the defaults describe the
//! stock OOB update bundle.
//!
//! Command lines and the fallback directory may use the placeholders
//! `{base_dir}`, `{fallback_dir}` and `{dependency}`; they are expanded once
//! when the configuration is finalized.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;
use serde::Deserialize;

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV: &str = "OOB_GUARD_CONFIG";

const BASE_DIR_PLACEHOLDER: &str = "{base_dir}";
const FALLBACK_DIR_PLACEHOLDER: &str = "{fallback_dir}";
const DEPENDENCY_PLACEHOLDER: &str = "{dependency}";

/// A tool which must be present on the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolRequirement {
    /// Name reported when the tool is missing.
    pub name: String,
    /// Command whose successful exit proves the tool is usable.
    pub probe: Vec<String>,
}

impl ToolRequirement {
    fn new(name: &str, probe: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            probe: probe.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Minimum free space on a scratch filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceRequirement {
    /// Path on the filesystem to measure.
    pub path: Utf8PathBuf,
    /// Required available space, in MiB.
    pub threshold_mb: u64,
}

impl Default for SpaceRequirement {
    fn default() -> Self {
        Self {
            path: "/tmp".into(),
            threshold_mb: 500,
        }
    }
}

/// One way of installing the dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallStrategy {
    /// Short name used in log messages, e.g. `online`.
    pub label: String,
    /// Command performing the installation.
    pub command: Vec<String>,
}

/// A package the delegate program imports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    /// Package name.
    pub name: String,
    /// Command whose successful exit means the package is installed.
    pub probe: Vec<String>,
    /// Directory holding bundled packages for offline installation.
    pub fallback_dir: String,
    /// Install strategies, tried in order until one succeeds.
    pub install: Vec<InstallStrategy>,
    /// Fail the guard when every install strategy fails.
    #[serde(default)]
    pub required: bool,
}

fn argv(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

impl Default for DependencySpec {
    fn default() -> Self {
        Self {
            name: "requests".into(),
            probe: argv(&["python3", "-m", "pip", "show", DEPENDENCY_PLACEHOLDER]),
            fallback_dir: format!("{BASE_DIR_PLACEHOLDER}/packages"),
            install: vec![
                InstallStrategy {
                    label: "online".into(),
                    command: argv(&["python3", "-m", "pip", "install", DEPENDENCY_PLACEHOLDER]),
                },
                InstallStrategy {
                    label: "offline".into(),
                    command: argv(&[
                        "python3",
                        "-m",
                        "pip",
                        "install",
                        "--no-index",
                        "--find-links",
                        FALLBACK_DIR_PLACEHOLDER,
                        DEPENDENCY_PLACEHOLDER,
                    ]),
                },
            ],
            required: false,
        }
    }
}

/// The program which does the real work once all checks pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegateSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments placed before the forwarded ones.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for DelegateSpec {
    fn default() -> Self {
        Self {
            program: "python3".into(),
            args: vec![format!("{BASE_DIR_PLACEHOLDER}/OobUpdate.py")],
        }
    }
}

fn default_tools() -> Vec<ToolRequirement> {
    vec![
        ToolRequirement::new("python3", &["python3", "--version"]),
        ToolRequirement::new("curl", &["curl", "--version"]),
        ToolRequirement::new("sshpass", &["sshpass", "-V"]),
        ToolRequirement::new("ssh", &["ssh", "-V"]),
    ]
}

/// Full guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    /// Directory the wrapper is installed in; defaults to the directory
    /// of the running executable.
    #[serde(default)]
    pub base_dir: Option<Utf8PathBuf>,
    /// Tools probed before anything else.
    #[serde(default = "default_tools")]
    pub tools: Vec<ToolRequirement>,
    /// Scratch space requirement.
    #[serde(default)]
    pub space: SpaceRequirement,
    /// Dependency of the delegate program.
    #[serde(default)]
    pub dependency: DependencySpec,
    /// The delegate program.
    #[serde(default)]
    pub delegate: DelegateSpec,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            tools: default_tools(),
            space: SpaceRequirement::default(),
            dependency: DependencySpec::default(),
            delegate: DelegateSpec::default(),
        }
    }
}

/// Values substituted for placeholders.
struct Placeholders<'a> {
    base_dir: &'a str,
    fallback_dir: &'a str,
    dependency: &'a str,
}

impl Placeholders<'_> {
    fn expand(&self, s: &str) -> String {
        s.replace(BASE_DIR_PLACEHOLDER, self.base_dir)
            .replace(FALLBACK_DIR_PLACEHOLDER, self.fallback_dir)
            .replace(DEPENDENCY_PLACEHOLDER, self.dependency)
    }

    fn expand_all(&self, v: &mut [String]) {
        for s in v.iter_mut() {
            *s = self.expand(s);
        }
    }
}

/// The directory containing the running executable.
fn executable_dir() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().context("Finding current executable")?;
    let exe = Utf8PathBuf::try_from(exe)?;
    exe.parent()
        .map(Utf8Path::to_owned)
        .with_context(|| format!("Executable {exe} has no parent directory"))
}

impl GuardConfig {
    /// Load the configuration named by `OOB_GUARD_CONFIG`, or the defaults,
    /// and finalize it.
    pub fn load() -> Result<Self> {
        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = Utf8PathBuf::try_from(PathBuf::from(path))
                    .with_context(|| format!("{CONFIG_ENV} is not valid UTF-8"))?;
                Self::from_yaml_file(&path)?
            }
            None => Self::default(),
        };
        config.finalize(executable_dir)
    }

    /// Parse a configuration file; the result is not yet finalized.
    #[context("Reading {CONFIG_ENV} file {path}")]
    pub fn from_yaml_file(path: &Utf8Path) -> Result<Self> {
        let buf = std::fs::read(path)?;
        serde_yaml::from_slice(&buf).context("Parsing YAML")
    }

    /// Parse a configuration from YAML text; the result is not yet finalized.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("Parsing guard configuration")
    }

    /// Resolve the base directory, expand placeholders and validate.
    /// `default_base_dir` is only consulted when no base directory is set.
    #[context("Finalizing guard configuration")]
    pub fn finalize<F>(mut self, default_base_dir: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Utf8PathBuf>,
    {
        let base_dir = match self.base_dir.take() {
            Some(d) => d,
            None => default_base_dir()?,
        };
        let dependency = self.dependency.name.clone();
        let fallback_dir = Placeholders {
            base_dir: base_dir.as_str(),
            fallback_dir: "",
            dependency: &dependency,
        }
        .expand(&self.dependency.fallback_dir);
        let p = Placeholders {
            base_dir: base_dir.as_str(),
            fallback_dir: &fallback_dir,
            dependency: &dependency,
        };
        for tool in self.tools.iter_mut() {
            p.expand_all(&mut tool.probe);
        }
        p.expand_all(&mut self.dependency.probe);
        for strategy in self.dependency.install.iter_mut() {
            p.expand_all(&mut strategy.command);
        }
        self.delegate.program = p.expand(&self.delegate.program);
        p.expand_all(&mut self.delegate.args);
        self.dependency.fallback_dir = fallback_dir;
        self.base_dir = Some(base_dir);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for tool in &self.tools {
            ensure!(
                names.insert(tool.name.as_str()),
                "Duplicate tool name {}",
                tool.name
            );
            ensure!(!tool.probe.is_empty(), "Empty probe for tool {}", tool.name);
        }
        ensure!(
            !self.dependency.probe.is_empty(),
            "Empty probe for dependency {}",
            self.dependency.name
        );
        for strategy in &self.dependency.install {
            ensure!(
                !strategy.command.is_empty(),
                "Empty command for install strategy {}",
                strategy.label
            );
        }
        ensure!(!self.delegate.program.is_empty(), "Empty delegate program");
        Ok(())
    }
}
