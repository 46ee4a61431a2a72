//! Declared forms.
//!
//! A [`FormSpec`] is an ordered list of named fields, each with a kind and
//! a locator. [`FormSpec::fill`] walks the list against a data row: a field
//! whose value is absent or `NULL` is skipped, and a field that fails is
//! recorded and the walk continues.
//!
//! ```yaml
//! fields:
//!   - name: supplier
//!     kind: type-and-select
//!     locator: "#supplier"
//!   - name: approved
//!     kind: checkbox
//!     locator: "//input[@name='approved']"
//!     before_click: "#show-advanced"
//! ```

use crate::driver::Driver;
use crate::engine::InteractionEngine;
use crate::result::{SteadyError, SteadyResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Widget family of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Single-line text input
    TextBox,
    /// Multi-line text input
    TextArea,
    /// Autocomplete input with a suggestion list
    TypeAndSelect,
    /// Date input fed a spreadsheet day serial
    DatePicker,
    /// Native `<select>`
    Dropdown,
    /// Checkbox; value parsed as a boolean
    Checkbox,
    /// Radio button; any non-null value selects it
    Radio,
}

impl FieldKind {
    /// Canonical name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TextBox => "textbox",
            Self::TextArea => "textarea",
            Self::TypeAndSelect => "type-and-select",
            Self::DatePicker => "datepicker",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = SteadyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "textbox" | "text" => Ok(Self::TextBox),
            "textarea" => Ok(Self::TextArea),
            "typeandselect" | "typeahead" => Ok(Self::TypeAndSelect),
            "datepicker" | "date" => Ok(Self::DatePicker),
            "dropdown" | "select" => Ok(Self::Dropdown),
            "checkbox" => Ok(Self::Checkbox),
            "radio" => Ok(Self::Radio),
            _ => Err(SteadyError::config(format!("unknown field kind '{}'", s.trim()))),
        }
    }
}

/// How one field is filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    /// Widget family
    pub kind: FieldKind,
    /// Locator of the field
    pub locator: String,
    /// Element clicked before filling (reveals hidden sections)
    pub before_click: Option<String>,
    /// Element clicked after filling
    pub after_click: Option<String>,
}

impl FieldConfig {
    /// Field without hooks
    #[must_use]
    pub fn new(kind: FieldKind, locator: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.into(),
            before_click: None,
            after_click: None,
        }
    }

    /// Click `locator` before filling
    #[must_use]
    pub fn before_click(mut self, locator: impl Into<String>) -> Self {
        self.before_click = Some(locator.into());
        self
    }

    /// Click `locator` after filling
    #[must_use]
    pub fn after_click(mut self, locator: impl Into<String>) -> Self {
        self.after_click = Some(locator.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct RawForm {
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    kind: String,
    locator: String,
    #[serde(default)]
    before_click: Option<String>,
    #[serde(default)]
    after_click: Option<String>,
}

/// Ordered field declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSpec {
    fields: Vec<(String, FieldConfig)>,
}

impl FormSpec {
    /// Empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.push((name.into(), config));
        self
    }

    /// Parse a YAML form; field kinds are validated here
    pub fn from_yaml(yaml: &str) -> SteadyResult<Self> {
        let raw: RawForm = serde_yaml_ng::from_str(yaml)?;
        let mut form = Self::new();
        for field in raw.fields {
            let kind = field.kind.parse::<FieldKind>().map_err(|_| {
                SteadyError::config(format!(
                    "field '{}' has unknown kind '{}'",
                    field.name, field.kind
                ))
            })?;
            form.fields.push((
                field.name,
                FieldConfig {
                    kind,
                    locator: field.locator,
                    before_click: field.before_click,
                    after_click: field.after_click,
                },
            ));
        }
        Ok(form)
    }

    /// Declared fields in fill order
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldConfig)] {
        &self.fields
    }

    /// Number of declared fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fill every declared field from `data`, in declaration order
    pub async fn fill<D: Driver + ?Sized>(
        &self,
        engine: &mut InteractionEngine<D>,
        data: &HashMap<String, String>,
    ) -> FillReport {
        let mut report = FillReport::default();
        if self.fields.is_empty() {
            warn!("form declares no fields, nothing to fill");
            return report;
        }

        for (name, config) in &self.fields {
            let status = match data.get(name) {
                None => FieldStatus::Skipped,
                Some(value) if value.trim().eq_ignore_ascii_case("NULL") => FieldStatus::Skipped,
                Some(value) => match fill_field(engine, config, value).await {
                    Ok(status) => status,
                    Err(err) => {
                        warn!(field = %name, error = %err, "field failed, continuing");
                        FieldStatus::Failed {
                            message: err.chain(),
                        }
                    }
                },
            };
            if status == FieldStatus::Skipped {
                info!(field = %name, "no value, field skipped");
            }
            report.fields.push(FieldResult {
                name: name.clone(),
                status,
            });
        }
        report
    }
}

async fn fill_field<D: Driver + ?Sized>(
    engine: &mut InteractionEngine<D>,
    config: &FieldConfig,
    value: &str,
) -> SteadyResult<FieldStatus> {
    if let Some(hook) = &config.before_click {
        click_hook(engine, hook).await?;
    }

    let locator = config.locator.as_str();
    let status = match config.kind {
        FieldKind::TextBox | FieldKind::TextArea => {
            engine.type_text(locator, value).await?;
            FieldStatus::Filled
        }
        FieldKind::TypeAndSelect => {
            if engine.type_and_select_option(locator, value).await?.is_success() {
                FieldStatus::Filled
            } else {
                FieldStatus::SoftFailed
            }
        }
        FieldKind::DatePicker => {
            engine.select_date_from_calendar(locator, value).await?;
            FieldStatus::Filled
        }
        FieldKind::Dropdown => {
            engine.select_dropdown_by_text(locator, value).await?;
            FieldStatus::Filled
        }
        FieldKind::Checkbox => {
            let desired = value.trim().eq_ignore_ascii_case("true");
            engine.set_checkbox_state(locator, desired).await?;
            FieldStatus::Filled
        }
        FieldKind::Radio => {
            engine.select_radio(locator).await?;
            FieldStatus::Filled
        }
    };

    if let Some(hook) = &config.after_click {
        click_hook(engine, hook).await?;
    }
    Ok(status)
}

async fn click_hook<D: Driver + ?Sized>(
    engine: &mut InteractionEngine<D>,
    locator: &str,
) -> SteadyResult<()> {
    if engine.click(locator).await?.is_clicked() {
        Ok(())
    } else {
        Err(SteadyError::InvalidState {
            message: format!("hook click on '{locator}' timed out"),
        })
    }
}

/// Result of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    /// Value entered
    Filled,
    /// Entered but unverified (autocomplete committed with Tab)
    SoftFailed,
    /// No value or `NULL`
    Skipped,
    /// Filling raised an error
    Failed {
        /// Rendered error chain
        message: String,
    },
}

/// Named field result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldResult {
    /// Field name
    pub name: String,
    /// What happened
    #[serde(flatten)]
    pub status: FieldStatus,
}

/// Per-field results of [`FormSpec::fill`], in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// One entry per declared field
    pub fields: Vec<FieldResult>,
}

impl FillReport {
    /// Status of `name`
    #[must_use]
    pub fn status(&self, name: &str) -> Option<&FieldStatus> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.status)
    }

    /// Names of fields that raised errors
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| matches!(f.status, FieldStatus::Failed { .. }))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Whether no field failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed().is_empty()
    }
}
