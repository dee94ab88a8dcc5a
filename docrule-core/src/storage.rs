use crate::error::DocruleError;
use crate::ruleset::Ruleset;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const BASELINE_YAML: &str = include_str!("../rulesets/baseline.yaml");

/// On-disk shape of a ruleset file: a keyed sequence of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesetFile {
    #[serde(default)]
    pub rulesets: Vec<Ruleset>,
}

/// Where ruleset records come from.
pub trait RulesetSource {
    fn load(&self) -> Result<Vec<Ruleset>>;
    fn describe(&self) -> String;
}

/// Records compiled into the binary.
pub struct BundledRulesets;

impl RulesetSource for BundledRulesets {
    fn load(&self) -> Result<Vec<Ruleset>> {
        parse_rulesets(BASELINE_YAML, Path::new("<bundled baseline>"))
    }

    fn describe(&self) -> String {
        "bundled baseline".to_string()
    }
}

/// A YAML file of records. A missing file holds no records.
pub struct FileRulesets {
    path: PathBuf,
}

impl FileRulesets {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/docrule/rulesets.yaml`
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("docrule").join("rulesets.yaml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RulesetSource for FileRulesets {
    fn load(&self) -> Result<Vec<Ruleset>> {
        if !self.path.exists() {
            log::debug!("no ruleset overlay at {}", self.path.display());
            return Ok(Vec::new());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| DocruleError::io(&self.path, e))?;
        parse_rulesets(&content, &self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// No-op source that holds no records
pub struct NoOverlay;

impl RulesetSource for NoOverlay {
    fn load(&self) -> Result<Vec<Ruleset>> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        "no overlay".to_string()
    }
}

fn parse_rulesets(content: &str, path: &Path) -> Result<Vec<Ruleset>> {
    let file: RulesetFile =
        serde_yaml::from_str(content).map_err(|source| DocruleError::RulesetParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.rulesets)
}

/// Baseline records overlaid by an external store, keyed by id. An overlay
/// record replaces the baseline record with the same id as a whole.
#[derive(Debug, Clone, Default)]
pub struct RulesetStore {
    records: Vec<Ruleset>,
}

impl RulesetStore {
    pub fn load(baseline: &dyn RulesetSource, overlay: &dyn RulesetSource) -> Result<Self> {
        let mut store = Self::default();
        for ruleset in baseline.load()? {
            store.upsert(ruleset);
        }
        let base_count = store.records.len();

        let overlay_records = overlay.load()?;
        let overlay_count = overlay_records.len();
        for ruleset in overlay_records {
            store.upsert(ruleset);
        }

        log::info!(
            "loaded {} rulesets ({} from {}, {} from {})",
            store.records.len(),
            base_count,
            baseline.describe(),
            overlay_count,
            overlay.describe()
        );
        Ok(store)
    }

    /// Bundled baseline plus the overlay at `path`, or at the default location.
    pub fn with_overlay(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(&BundledRulesets, &FileRulesets::new(path)),
            None => match FileRulesets::default_location() {
                Some(overlay) => Self::load(&BundledRulesets, &overlay),
                None => Self::load(&BundledRulesets, &NoOverlay),
            },
        }
    }

    pub fn upsert(&mut self, ruleset: Ruleset) {
        match self.records.iter_mut().find(|r| r.id == ruleset.id) {
            Some(existing) => *existing = ruleset,
            None => self.records.push(ruleset),
        }
    }

    pub fn resolve(&self, id: &str) -> Result<&Ruleset, DocruleError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DocruleError::UnknownRuleset(id.to_string()))
    }

    pub fn list(&self) -> &[Ruleset] {
        &self.records
    }
}

/// SHA-256 of a byte slice as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
