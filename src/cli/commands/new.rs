//! `curbside new` - interactive schedule creation

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::store::ScheduleStore;
use crate::flow::form::ConsoleForm;
use crate::flow::SetupFlow;

pub fn run(file: Option<PathBuf>) -> Result<()> {
    let path = ScheduleStore::locate(file).into_diagnostic()?;
    let mut store = ScheduleStore::open(&path).into_diagnostic()?;

    let entry = SetupFlow::new(ConsoleForm::new()).run().into_diagnostic()?;
    let title = entry.title.clone();
    let id = store.create(entry.title, entry.data).into_diagnostic()?;

    println!();
    println!(
        "{} Created schedule {} ({})",
        style("✓").green(),
        style(&title).bold(),
        id
    );
    Ok(())
}
