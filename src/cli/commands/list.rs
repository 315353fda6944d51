//! `curbside list` - show stored schedules

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::store::ScheduleStore;

pub fn run(file: Option<PathBuf>) -> Result<()> {
    let path = ScheduleStore::locate(file).into_diagnostic()?;
    let store = ScheduleStore::open(&path).into_diagnostic()?;

    if store.is_empty() {
        println!("No schedules configured.");
        return Ok(());
    }

    for (id, entry) in store.iter() {
        let frequency = entry
            .data
            .get("frequency")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        println!(
            "{}  {}  {}",
            style(id).dim(),
            style(&entry.title).bold(),
            frequency
        );
    }
    Ok(())
}
