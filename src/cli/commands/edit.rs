//! `curbside edit` - revise a stored schedule

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::store::ScheduleStore;
use crate::flow::form::ConsoleForm;
use crate::flow::EditFlow;

pub fn run(id: &str, file: Option<PathBuf>) -> Result<()> {
    let path = ScheduleStore::locate(file).into_diagnostic()?;
    let mut store = ScheduleStore::open(&path).into_diagnostic()?;

    let stored = store
        .get(id)
        .ok_or_else(|| miette::miette!("no schedule with id '{}'", id))?;

    let flow = EditFlow::new(ConsoleForm::new(), stored.data.clone()).into_diagnostic()?;
    let entry = flow.run().into_diagnostic()?;
    store.update(id, entry.data).into_diagnostic()?;

    println!();
    println!("{} Updated schedule {}", style("✓").green(), style(id).bold());
    Ok(())
}
