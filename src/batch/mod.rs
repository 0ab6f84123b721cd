//! Batch driver: every configured sheet, every row, one pipeline pass each.

use anyhow::Result;

use crate::{
    artifacts::ArtifactStore,
    config::PipelineConfig,
    execution::{ExecutionOutcome, Executor, Interpreter},
    extract::extract_code,
    patch::{replace_show_with_savefig, rewrite_dataset_path},
    printer::TextPrinter,
    workbook::{Row, Workbook},
};

/// What happened to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    EmptyCell,
    NoCode,
    Executed(ExecutionOutcome),
}

pub struct BatchRunner<'a> {
    cfg: &'a PipelineConfig,
    executor: Executor,
    printer: TextPrinter,
}

impl<'a> BatchRunner<'a> {
    pub fn new(cfg: &'a PipelineConfig) -> Self {
        let store = ArtifactStore::from_config(cfg);
        Self {
            cfg,
            executor: Executor::new(Interpreter::new(&cfg.python), store),
            printer: TextPrinter::new(cfg.color),
        }
    }

    /// Process every configured sheet, in order.
    pub fn run(&self) -> Result<()> {
        self.cfg.ensure_dirs()?;
        let mut workbook = Workbook::open(&self.cfg.workbook_path)?;
        let sheets = if self.cfg.sheets.is_empty() {
            workbook.sheet_names()
        } else {
            self.cfg.sheets.clone()
        };

        for name in &sheets {
            let table = workbook.table(name)?;
            let rows = table.rows(&self.cfg.columns)?;
            self.printer.sheet(name, rows.len());
            self.printer.preview(&table, self.cfg.preview_rows);
            for row in &rows {
                self.process_row(row)?;
            }
        }
        Ok(())
    }

    /// Extract, patch, persist and run one row's code.
    pub fn process_row(&self, row: &Row) -> Result<RowStatus> {
        if row.response.is_empty() {
            self.printer.skip(row.number, "no code");
            return Ok(RowStatus::EmptyCell);
        }

        let code = prepare_code(self.cfg, self.executor.store(), row);
        if code.is_empty() {
            self.printer.skip(row.number, "no fenced code block");
            return Ok(RowStatus::NoCode);
        }

        let script = self.executor.store().save_script(&row.id, &code)?;
        self.printer.running(&row.id);
        let outcome = self.executor.run_script(&script, &row.id, true)?;
        self.printer.outcome(&row.id, &outcome);
        Ok(RowStatus::Executed(outcome))
    }
}

/// Code extraction, dataset path rewrite and display substitution for a row.
pub fn prepare_code(cfg: &PipelineConfig, store: &ArtifactStore, row: &Row) -> String {
    let code = extract_code(&row.response);
    if code.is_empty() {
        return code;
    }
    let local = cfg.datasets_dir.join(&row.dataset);
    let code = rewrite_dataset_path(&code, &cfg.dataset_extension, &local);
    replace_show_with_savefig(&code, &store.image_path(&row.id))
}
