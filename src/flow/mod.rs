//! Flow orchestrators - the step graph around the controller
//!
//! Two thin drivers: `SetupFlow` creates a new schedule, `EditFlow` revises a
//! stored one. Both walk the same frequency-dependent graph:
//! general → {annual/group | days → final | final}.

pub mod controller;
pub mod form;

use serde_json::Value;
use thiserror::Error;

use crate::core::frequency::FrequencyCategory;
use crate::core::record::{FieldMap, ScheduleRecord};
use controller::{StepController, StepOutcome};
use form::{FormError, FormRenderer, StepId};

pub use controller::ErrorKind;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("this entry has no stable identifier and cannot be edited")]
    NotEditable,
}

/// The finished handoff to the persistence layer.
#[derive(Debug)]
pub struct NewEntry {
    pub title: String,
    pub data: FieldMap,
}

type StepFn = fn(&mut StepController, Option<&FieldMap>, Option<&FieldMap>) -> StepOutcome;

/// Drive one step to completion: feed it the seed input (import data, if
/// any), then keep re-rendering the form until the controller advances.
fn drive_step<R: FormRenderer>(
    controller: &mut StepController,
    renderer: &mut R,
    step_id: StepId,
    step: StepFn,
    seed: Option<&FieldMap>,
    defaults: Option<&FieldMap>,
) -> Result<(), FlowError> {
    let mut input: Option<FieldMap> = seed.cloned();
    loop {
        match step(controller, input.as_ref(), defaults) {
            StepOutcome::Advanced => return Ok(()),
            StepOutcome::ShowForm { schema, error } => {
                input = Some(renderer.render(step_id, &schema, error)?);
            }
        }
    }
}

/// Walk the step graph from the post-general branch point to the terminal
/// step.
fn drive_tail<R: FormRenderer>(
    controller: &mut StepController,
    renderer: &mut R,
    seed: Option<&FieldMap>,
    defaults: Option<&FieldMap>,
) -> Result<(), FlowError> {
    match controller.category() {
        Some(FrequencyCategory::Annual) | Some(FrequencyCategory::Group) => drive_step(
            controller,
            renderer,
            StepId::AnnualGroup,
            StepController::step_annual_group,
            seed,
            defaults,
        ),
        Some(FrequencyCategory::DailyBlank) => drive_step(
            controller,
            renderer,
            StepId::Final,
            StepController::step_final,
            seed,
            defaults,
        ),
        _ => {
            drive_step(
                controller,
                renderer,
                StepId::Detail,
                StepController::step_days,
                seed,
                defaults,
            )?;
            drive_step(
                controller,
                renderer,
                StepId::Final,
                StepController::step_final,
                seed,
                defaults,
            )
        }
    }
}

/// Initial setup: a fresh session with a newly assigned identifier.
///
/// An import map, when given, is fed as the first input to every step so a
/// complete flat field map provisions an entry without any prompting.
pub struct SetupFlow<R: FormRenderer> {
    controller: StepController,
    renderer: R,
    import: FieldMap,
}

impl<R: FormRenderer> SetupFlow<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            controller: StepController::new(),
            renderer,
            import: FieldMap::new(),
        }
    }

    pub fn with_import(renderer: R, import: FieldMap) -> Self {
        Self {
            controller: StepController::new(),
            renderer,
            import,
        }
    }

    pub fn run(mut self) -> Result<NewEntry, FlowError> {
        let seed = if self.import.is_empty() {
            None
        } else {
            Some(self.import.clone())
        };

        drive_step(
            &mut self.controller,
            &mut self.renderer,
            StepId::General,
            StepController::step_general,
            seed.as_ref(),
            None,
        )?;
        drive_tail(&mut self.controller, &mut self.renderer, seed.as_ref(), None)?;

        let title = self.controller.name().unwrap_or_default().to_string();
        Ok(NewEntry {
            title,
            data: self.controller.into_data(),
        })
    }
}

/// Post-creation edit: every step's defaults come from the stored entry, the
/// name is immutable, and the handoff carries an empty title.
///
/// Precondition: the stored data must carry a `unique_id`; entries without
/// one cannot be edited.
pub struct EditFlow<R: FormRenderer> {
    controller: StepController,
    renderer: R,
    stored: FieldMap,
}

impl<R: FormRenderer> EditFlow<R> {
    pub fn new(renderer: R, stored: FieldMap) -> Result<Self, FlowError> {
        let unique_id = match stored.get("unique_id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => return Err(FlowError::NotEditable),
        };
        Ok(Self {
            controller: StepController::resume(ScheduleRecord::with_id(unique_id)),
            renderer,
            stored,
        })
    }

    pub fn run(mut self) -> Result<NewEntry, FlowError> {
        let stored = self.stored.clone();
        drive_step(
            &mut self.controller,
            &mut self.renderer,
            StepId::General,
            StepController::step_general,
            None,
            Some(&stored),
        )?;
        drive_tail(&mut self.controller, &mut self.renderer, None, Some(&stored))?;

        Ok(NewEntry {
            title: String::new(),
            data: self.controller.into_data(),
        })
    }
}
