use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;

/// Layered key/value settings: defaults, then the rc file, then environment.
#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
}

impl Config {
    /// Load from the default rc location; a missing file is fine.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path(), false)
    }

    /// Load from an explicit rc file, which must exist.
    pub fn load_explicit(path: impl Into<PathBuf>) -> Result<Self> {
        Self::load_from(path.into(), true)
    }

    fn load_from(config_path: PathBuf, required: bool) -> Result<Self> {
        let mut map = default_map();

        if config_path.exists() {
            let file = fs::File::open(&config_path)
                .with_context(|| format!("opening config file: {}", config_path.display()))?;
            let reader = BufReader::new(file);
            for line in reader.lines() {
                let line = line
                    .with_context(|| format!("reading config file: {}", config_path.display()))?;
                if let Some((k, v)) = parse_line(&line) {
                    map.insert(k, v);
                }
            }
        } else if required {
            bail!("config file not found: {}", config_path.display());
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Ok(Self { inner: map })
    }

    /// Build settings from explicit pairs on top of the defaults, ignoring the environment.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut map = default_map();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        Self { inner: map }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve into the typed configuration the pipeline runs on.
    pub fn pipeline(&self) -> Result<PipelineConfig> {
        let path = |key: &str| {
            self.get_path(key)
                .filter(|p| !p.as_os_str().is_empty())
                .with_context(|| format!("missing setting: {}", key))
        };
        let text = |key: &str| {
            self.get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("missing setting: {}", key))
        };

        Ok(PipelineConfig {
            workbook_path: path("CELLEXEC_WORKBOOK_PATH")?,
            sheets: self.get_list("CELLEXEC_SHEETS"),
            columns: Columns {
                id: text("CELLEXEC_ID_COLUMN")?,
                code: text("CELLEXEC_CODE_COLUMN")?,
                filename: text("CELLEXEC_FILENAME_COLUMN")?,
            },
            datasets_dir: path("CELLEXEC_DATASETS_PATH")?,
            scripts_dir: path("CELLEXEC_SCRIPTS_PATH")?,
            images_dir: path("CELLEXEC_IMAGES_PATH")?,
            outputs_dir: path("CELLEXEC_OUTPUTS_PATH")?,
            errors_dir: path("CELLEXEC_ERRORS_PATH")?,
            dataset_extension: text("CELLEXEC_DATASET_EXTENSION")?,
            python: text("CELLEXEC_PYTHON")?,
            preview_rows: self.get_usize("CELLEXEC_PREVIEW_ROWS").unwrap_or(20),
            color: self.get_bool("CELLEXEC_COLOR"),
        })
    }
}

/// Header names of the three columns a sheet must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub id: String,
    pub code: String,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workbook_path: PathBuf,
    /// Empty means every sheet, in workbook order.
    pub sheets: Vec<String>,
    pub columns: Columns,
    pub datasets_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub images_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub errors_dir: PathBuf,
    pub dataset_extension: String,
    pub python: String,
    pub preview_rows: usize,
    pub color: bool,
}

impl PipelineConfig {
    /// Create every artifact directory. The datasets directory is input and left alone.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.scripts_dir, &self.images_dir, &self.outputs_dir, &self.errors_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
}

fn is_config_key(k: &str) -> bool {
    k.starts_with("CELLEXEC_")
}

pub fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("cellexec").join("cellexec.rc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let rel = |p: &str| Path::new(p).to_string_lossy().into_owned();

    // Inputs
    m.insert("CELLEXEC_WORKBOOK_PATH".into(), rel("workbook.xlsx"));
    m.insert("CELLEXEC_SHEETS".into(), String::new());
    m.insert("CELLEXEC_ID_COLUMN".into(), "id".into());
    m.insert("CELLEXEC_CODE_COLUMN".into(), "response".into());
    m.insert("CELLEXEC_FILENAME_COLUMN".into(), "dataset".into());
    m.insert("CELLEXEC_DATASETS_PATH".into(), rel("datasets"));

    // Artifacts
    m.insert("CELLEXEC_SCRIPTS_PATH".into(), rel("scripts"));
    m.insert("CELLEXEC_IMAGES_PATH".into(), rel("images"));
    m.insert("CELLEXEC_OUTPUTS_PATH".into(), rel("outputs"));
    m.insert("CELLEXEC_ERRORS_PATH".into(), rel("errors"));

    // Behaviour
    m.insert("CELLEXEC_DATASET_EXTENSION".into(), ".csv".into());
    m.insert("CELLEXEC_PYTHON".into(), "python3".into());
    m.insert("CELLEXEC_PREVIEW_ROWS".into(), "20".into());
    m.insert("CELLEXEC_COLOR".into(), "true".into());

    m
}
