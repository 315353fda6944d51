//! `curbside import` - non-interactive provisioning from a flat field map

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

use crate::core::record::FieldMap;
use crate::core::store::ScheduleStore;
use crate::flow::form::NonInteractiveForm;
use crate::flow::SetupFlow;

pub fn run(source: &Path, file: Option<PathBuf>) -> Result<()> {
    let contents = std::fs::read_to_string(source)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", source.display()))?;
    let fields: FieldMap = serde_yml::from_str(&contents)
        .into_diagnostic()
        .wrap_err("import file must be a flat YAML mapping of field values")?;

    let path = ScheduleStore::locate(file).into_diagnostic()?;
    let mut store = ScheduleStore::open(&path).into_diagnostic()?;

    let entry = SetupFlow::with_import(NonInteractiveForm, fields)
        .run()
        .into_diagnostic()?;
    let title = entry.title.clone();
    let id = store.create(entry.title, entry.data).into_diagnostic()?;

    println!(
        "{} Imported schedule {} ({})",
        style("✓").green(),
        style(&title).bold(),
        id
    );
    Ok(())
}
