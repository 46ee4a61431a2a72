//! Command execution against an attached session

use crate::commands::{Commands, UploadMode};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Printer;
use serde_yaml_ng::Value;
use std::collections::HashMap;
use std::path::Path;
use steadyhand::{
    default_dropdown_xpath, ClickOutcome, Driver, FormSpec, InteractionEngine, MatchMode,
    RetryPolicy, Settings, TypeaheadOutcome,
};
use tokio::time::Duration;
use tracing::info;

/// Load settings from `path`, or defaults when none is given
pub fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    match path {
        Some(path) => Settings::load(path).map_err(|e| {
            CliError::config(format!("cannot load settings '{}': {e}", path.display()))
        }),
        None => Ok(Settings::default()),
    }
}

/// Print the effective settings
pub fn show_settings(printer: &Printer, settings: &Settings, debugger: &str) -> CliResult<()> {
    let policy = RetryPolicy::from_settings(settings)?;
    printer.success("effective settings");
    printer.field("debugger", debugger);
    printer.field("wait.timeout", &format!("{}s", policy.timeout().as_secs()));
    printer.field(
        "wait.poll_interval_ms",
        &policy.poll_interval().as_millis().to_string(),
    );
    printer.field(
        "checkbox.uncheck",
        &settings
            .get_str("checkbox.uncheck")
            .unwrap_or_else(|| "log-only".to_string()),
    );
    printer.field("report.dir", &settings.report_dir().display().to_string());
    printer.field("report.name", &settings.report_name());
    printer.field("report.title", &settings.report_title());
    Ok(())
}

/// Parse a data row; scalars become strings and `null` becomes `NULL`
pub fn parse_data_row(text: &str) -> CliResult<HashMap<String, String>> {
    let root: Value = serde_yaml_ng::from_str(text)?;
    let Value::Mapping(map) = root else {
        return Err(CliError::invalid_argument(
            "data file must be a mapping of field name to value",
        ));
    };
    let mut row = HashMap::with_capacity(map.len());
    for (key, value) in map {
        let Some(key) = scalar(&key) else {
            return Err(CliError::invalid_argument("data keys must be scalars"));
        };
        let value = if value.is_null() {
            "NULL".to_string()
        } else {
            scalar(&value).ok_or_else(|| {
                CliError::invalid_argument(format!("value of '{key}' must be a scalar"))
            })?
        };
        row.insert(key, value);
    }
    Ok(row)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Run one command on `engine`.
///
/// `default_screenshot` is used when `screenshot` gets no path.
pub async fn execute<D: Driver + ?Sized>(
    engine: &mut InteractionEngine<D>,
    command: &Commands,
    default_screenshot: &Path,
    printer: &Printer,
) -> CliResult<()> {
    match command {
        Commands::Click(args) => match engine.click(&args.locator).await? {
            ClickOutcome::Clicked { index } => {
                printer.success(&format!("clicked {} (match #{index})", args.locator));
                Ok(())
            }
            ClickOutcome::TimedOut { elapsed } => Err(CliError::incomplete(format!(
                "nothing clickable at {} after {}ms",
                args.locator,
                elapsed.as_millis()
            ))),
        },
        Commands::Type(args) => {
            engine.type_text(&args.locator, &args.text).await?;
            printer.success(&format!("typed into {}", args.locator));
            Ok(())
        }
        Commands::Select(args) => {
            engine
                .select_dropdown_by_text(&args.locator, &args.value)
                .await?;
            printer.success(&format!("selected '{}' in {}", args.value, args.locator));
            Ok(())
        }
        Commands::Typeahead(args) => {
            let dropdown = args
                .dropdown
                .clone()
                .unwrap_or_else(|| default_dropdown_xpath(&args.text));
            let mode = if args.first_visible {
                MatchMode::FirstVisible
            } else {
                MatchMode::MatchAll
            };
            let outcome = engine
                .type_and_select(
                    &args.locator,
                    &args.text,
                    &dropdown,
                    Duration::from_millis(args.settle_ms),
                    mode,
                )
                .await?;
            match outcome {
                TypeaheadOutcome::Selected { text, attempt, .. } => {
                    printer.success(&format!("selected '{text}' on attempt {attempt}"));
                    Ok(())
                }
                TypeaheadOutcome::Accepted { attempt } => {
                    printer.success(&format!("field accepted '{}' on attempt {attempt}", args.text));
                    Ok(())
                }
                TypeaheadOutcome::CommittedWithTab { final_value } => {
                    printer.warn(&format!("committed '{final_value}' with Tab"));
                    Err(CliError::incomplete(format!(
                        "no suggestion matched '{}'",
                        args.text
                    )))
                }
            }
        }
        Commands::Scroll(args) => {
            engine.scroll_to(&args.locator).await?;
            printer.success(&format!("scrolled {} into view", args.locator));
            Ok(())
        }
        Commands::Upload(args) => {
            match args.mode {
                UploadMode::Visible => engine.upload_file(&args.locator, &args.path).await?,
                UploadMode::Hidden => {
                    engine
                        .upload_hidden_file(&args.locator, &args.path)
                        .await?;
                }
                UploadMode::Drop => {
                    engine
                        .upload_file_via_drag_and_drop(&args.locator, &args.path)
                        .await?;
                }
            }
            printer.success(&format!("uploaded {}", args.path.display()));
            Ok(())
        }
        Commands::Fill(args) => {
            let form = FormSpec::from_yaml(&tokio::fs::read_to_string(&args.form).await?)?;
            let row = parse_data_row(&tokio::fs::read_to_string(&args.data).await?)?;
            let report = form.fill(engine, &row).await;
            printer.fill_report(&report);
            if report.is_clean() {
                printer.success(&format!("filled {} field(s)", form.len()));
                Ok(())
            } else {
                Err(CliError::incomplete(format!(
                    "fields failed: {}",
                    report.failed().join(", ")
                )))
            }
        }
        Commands::Screenshot(args) => {
            let target = args
                .path
                .clone()
                .unwrap_or_else(|| default_screenshot.to_path_buf());
            let saved = engine.save_screenshot(&target).await?;
            printer.success(&format!("screenshot saved to {}", saved.display()));
            Ok(())
        }
        // Needs no session; handled by `run`
        Commands::Config => Ok(()),
    }
}

/// Parse-independent entry point used by `main`
pub async fn run(config: &CliConfig, command: &Commands) -> CliResult<()> {
    let printer = Printer::new(config.color.should_color(), config.verbosity.is_quiet());
    let settings = load_settings(config.settings_path.as_deref())?;
    let address = config
        .debugger
        .clone()
        .unwrap_or_else(|| settings.debugger_address());

    if matches!(command, Commands::Config) {
        return show_settings(&printer, &settings, &address);
    }
    attach_and_execute(settings, &address, command, &printer).await
}

#[cfg(feature = "browser")]
async fn attach_and_execute(
    settings: Settings,
    address: &str,
    command: &Commands,
    printer: &Printer,
) -> CliResult<()> {
    use std::sync::Arc;
    use steadyhand::driver::cdp::CdpSession;
    use steadyhand::{RunContext, TracingSink};

    let session = Arc::new(CdpSession::attach(address).await?);
    let run = RunContext::acquire(settings, session)
        .await?
        .with_sink(Arc::new(TracingSink));
    let mut engine = run.engine().await?;
    let default_screenshot = run.screenshot_path("screenshot");

    let result = execute(&mut engine, command, &default_screenshot, printer).await;
    let summary = run.release().await?;
    info!(report_dir = %summary.report_dir.display(), "run released");
    if printer.quiet || result.is_err() {
        return result;
    }
    printer.field("report", &summary.report_dir.display().to_string());
    result
}

#[cfg(not(feature = "browser"))]
async fn attach_and_execute(
    _settings: Settings,
    address: &str,
    _command: &Commands,
    _printer: &Printer,
) -> CliResult<()> {
    info!(address, "browser support not compiled in");
    Err(CliError::config(
        "built without browser support; rebuild with --features browser",
    ))
}
