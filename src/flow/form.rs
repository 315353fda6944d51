//! Form rendering seam
//!
//! The wizard core never draws UI itself; it hands a display schema to a
//! `FormRenderer` and gets a flat field map back. The interactive
//! implementation prompts on the terminal; non-interactive callers (imports,
//! tests) plug in their own renderer.

use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use serde_json::Value;
use thiserror::Error;

use crate::core::record::FieldMap;
use crate::flow::controller::ErrorKind;
use crate::schema::registry::{DisplaySchema, Widget};

/// Wizard step identifiers, for prompts and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepId {
    General,
    AnnualGroup,
    Detail,
    Final,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::General => "general",
            StepId::AnnualGroup => "annual_group",
            StepId::Detail => "detail",
            StepId::Final => "final",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            StepId::General => "General setup",
            StepId::AnnualGroup => "Annual date / group members",
            StepId::Detail => "Collection days",
            StepId::Final => "Final parameters",
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("step '{step}' needs interactive input{}", .error.map_or(String::new(), |e| format!(" (rejected: {e})")))]
    NonInteractive {
        step: &'static str,
        error: Option<ErrorKind>,
    },
}

/// Renders one step's form and returns the user's input.
pub trait FormRenderer {
    fn render(
        &mut self,
        step: StepId,
        schema: &DisplaySchema,
        error: Option<ErrorKind>,
    ) -> Result<FieldMap, FormError>;
}

/// Interactive terminal form built on dialoguer prompts.
pub struct ConsoleForm {
    theme: ColorfulTheme,
}

impl ConsoleForm {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn prompt_label(name: &str) -> String {
        let spaced = name.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// List defaults render as comma text; everything else as-is.
    fn default_text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_string(),
        }
    }
}

impl Default for ConsoleForm {
    fn default() -> Self {
        Self::new()
    }
}

impl FormRenderer for ConsoleForm {
    fn render(
        &mut self,
        step: StepId,
        schema: &DisplaySchema,
        error: Option<ErrorKind>,
    ) -> Result<FieldMap, FormError> {
        println!();
        println!("{} {}", style("◆").cyan(), style(step.title()).bold());
        println!("{}", style("─".repeat(50)).dim());
        if let Some(kind) = error {
            println!(
                "{} {}",
                style("✗").red(),
                style(format!("invalid input: {}", kind)).red()
            );
        }
        println!();

        let mut values = FieldMap::new();
        for field in &schema.fields {
            let prompt = Self::prompt_label(&field.name);
            let value = match &field.widget {
                Widget::Checkbox => {
                    let default_idx = if field.default.as_bool().unwrap_or(false) {
                        0
                    } else {
                        1
                    };
                    let selection = Select::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .items(&["Yes", "No"])
                        .default(default_idx)
                        .interact()?;
                    Value::Bool(selection == 0)
                }
                Widget::Select(options) => {
                    let default_text = Self::default_text(&field.default);
                    let default_idx = options
                        .iter()
                        .position(|o| *o == default_text)
                        .unwrap_or(0);
                    let selection = Select::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .items(options)
                        .default(default_idx)
                        .interact()?;
                    Value::String(options[selection].clone())
                }
                Widget::Number => {
                    let text: String = Input::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .default(Self::default_text(&field.default))
                        .interact_text()?;
                    // Pass the raw text through; the ruleset coerces and
                    // classifies, so a typo re-prompts instead of panicking.
                    Value::String(text)
                }
                Widget::Text => {
                    let text: String = Input::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .default(Self::default_text(&field.default))
                        .allow_empty(!field.required)
                        .interact_text()?;
                    Value::String(text)
                }
            };
            values.insert(field.name.clone(), value);
        }
        Ok(values)
    }
}

/// Renderer for non-interactive flows: any attempt to show a form is a
/// failure carrying the step and the classified error, so an incomplete
/// import aborts with a useful message instead of hanging on a prompt.
pub struct NonInteractiveForm;

impl FormRenderer for NonInteractiveForm {
    fn render(
        &mut self,
        step: StepId,
        _schema: &DisplaySchema,
        error: Option<ErrorKind>,
    ) -> Result<FieldMap, FormError> {
        Err(FormError::NonInteractive {
            step: step.as_str(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_label() {
        assert_eq!(ConsoleForm::prompt_label("icon_today"), "Icon today");
        assert_eq!(ConsoleForm::prompt_label("name"), "Name");
    }

    #[test]
    fn test_default_text_joins_lists() {
        assert_eq!(
            ConsoleForm::default_text(&serde_json::json!(["a", "b"])),
            "a,b"
        );
        assert_eq!(ConsoleForm::default_text(&serde_json::json!("x")), "x");
        assert_eq!(ConsoleForm::default_text(&serde_json::json!(2)), "2");
    }

    #[test]
    fn test_non_interactive_renderer_fails() {
        let mut form = NonInteractiveForm;
        let result = form.render(StepId::Detail, &DisplaySchema::default(), None);
        assert!(matches!(
            result,
            Err(FormError::NonInteractive { step: "detail", .. })
        ));
    }
}
