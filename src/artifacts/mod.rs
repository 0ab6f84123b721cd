//! On-disk artifact layout, one file per row identifier and artifact kind.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::PipelineConfig;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    scripts_dir: PathBuf,
    images_dir: PathBuf,
    outputs_dir: PathBuf,
    errors_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(
        scripts_dir: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
        outputs_dir: impl Into<PathBuf>,
        errors_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            images_dir: images_dir.into(),
            outputs_dir: outputs_dir.into(),
            errors_dir: errors_dir.into(),
        }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(&cfg.scripts_dir, &cfg.images_dir, &cfg.outputs_dir, &cfg.errors_dir)
    }

    pub fn script_path(&self, id: &str) -> PathBuf {
        self.scripts_dir.join(format!("{id}.py"))
    }

    pub fn image_path(&self, id: &str) -> PathBuf {
        self.images_dir.join(format!("{id}.png"))
    }

    pub fn output_path(&self, id: &str) -> PathBuf {
        self.outputs_dir.join(format!("{id}_output.txt"))
    }

    pub fn error_path(&self, id: &str) -> PathBuf {
        self.errors_dir.join(format!("{id}_error.txt"))
    }

    pub fn save_script(&self, id: &str, code: &str) -> Result<PathBuf> {
        let p = self.script_path(id);
        write(&p, code)?;
        Ok(p)
    }

    /// Remove any previous output and error for `id`. Missing files are fine.
    pub fn clear_results(&self, id: &str) -> Result<()> {
        remove_if_exists(&self.error_path(id))?;
        remove_if_exists(&self.output_path(id))?;
        Ok(())
    }

    pub fn write_output(&self, id: &str, output: &str) -> Result<PathBuf> {
        let p = self.output_path(id);
        write(&p, output)?;
        Ok(p)
    }

    pub fn write_error(&self, id: &str, description: &str) -> Result<PathBuf> {
        let p = self.error_path(id);
        write(&p, description)?;
        Ok(p)
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("removing {}", path.display()))
        }
        _ => Ok(()),
    }
}
