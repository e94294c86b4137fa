use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use fitfeast_application::{FlowError, LogFlowUseCase, Screen};
use fitfeast_core::summary::DailySummary;
use fitfeast_core::user::{Gender, Goal, UserProfile};
use fitfeast_infrastructure::{
    FitfeastPaths, JsonLogRepository, JsonProfileRepository,
};
use fitfeast_interaction::GeminiFoodAnalyzer;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/scan".to_string(),
                "/capture".to_string(),
                "/weight".to_string(),
                "/save".to_string(),
                "/cancel".to_string(),
                "/back".to_string(),
                "/history".to_string(),
                "/delete".to_string(),
                "/profile".to_string(),
                "/set".to_string(),
                "/help".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// The main entry point for the FitFeast REPL application.
///
/// Sets up logging, bootstraps the secret file, wires the stores and the
/// Gemini analyzer into the flow use case, and runs a rustyline loop that
/// maps slash commands onto flow transitions.
#[tokio::main]
async fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fitfeast=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // ===== Backend Initialization =====
    let secret_path = FitfeastPaths::ensure_secret_file()
        .context("Failed to prepare the secret file")?;

    let analyzer = match GeminiFoodAnalyzer::try_from_secrets().await {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("{}", format!("{}", e).red());
            eprintln!(
                "{}",
                format!("Add your Gemini API key to {}", secret_path.display()).yellow()
            );
            return Ok(());
        }
    };

    let log_repository = Arc::new(JsonLogRepository::new()?);
    let profile_repository = Arc::new(JsonProfileRepository::new()?);
    let flow = LogFlowUseCase::new(
        log_repository,
        profile_repository,
        Arc::new(analyzer),
        Arc::new(fitfeast_core::id::UuidIdGenerator),
    );

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== FitFeast ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/scan' to log a meal, '/history' to browse entries, '/help' for all commands, or 'quit' to exit."
            .bright_black()
    );
    println!();
    render_home(&flow).await;

    // Profile draft being edited while on the profile screen.
    let mut profile_draft: Option<UserProfile> = None;

    // ===== Main REPL Loop =====
    loop {
        let prompt = format!("{} >> ", flow.screen().await);
        let readline = rl.readline(&prompt);

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                handle_command(&flow, &mut profile_draft, trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

/// Dispatches one slash command against the flow.
async fn handle_command(
    flow: &LogFlowUseCase,
    profile_draft: &mut Option<UserProfile>,
    input: &str,
) {
    let mut parts = input.splitn(2, ' ');
    let command = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();
    let screen = flow.screen().await;

    let result = match command {
        "/help" => {
            print_help();
            Ok(())
        }
        "/scan" => {
            let result = flow.start_scanning().await;
            if result.is_ok() {
                println!(
                    "{}",
                    "Point at your meal: '/capture <path-to-jpeg>', or '/cancel'.".bright_black()
                );
            }
            result
        }
        "/capture" => capture(flow, argument).await,
        "/weight" => match argument.parse::<f64>() {
            Ok(grams) => {
                let result = flow.set_weight(grams).await;
                if result.is_ok() {
                    render_result(flow).await;
                }
                result
            }
            Err(_) => {
                println!("{}", "Usage: /weight <grams>".yellow());
                Ok(())
            }
        },
        "/save" => match screen {
            Screen::Result => {
                let result = flow.save_entry().await;
                if result.is_ok() {
                    println!("{}", "Logged.".green());
                    render_home(flow).await;
                }
                result
            }
            Screen::Profile => match profile_draft.take() {
                Some(draft) => {
                    let result = flow.save_profile(draft).await;
                    if result.is_ok() {
                        println!("{}", "Profile saved.".green());
                        render_home(flow).await;
                    }
                    result
                }
                None => Ok(()),
            },
            other => Err(FlowError::WrongScreen(other)),
        },
        "/cancel" => match screen {
            Screen::Scanning => {
                let result = flow.cancel_scanning().await;
                if result.is_ok() {
                    render_home(flow).await;
                }
                result
            }
            Screen::Result => {
                let result = flow.discard_result().await;
                if result.is_ok() {
                    println!("{}", "Discarded. Back to scanning.".bright_black());
                }
                result
            }
            other => Err(FlowError::WrongScreen(other)),
        },
        "/back" => match screen {
            Screen::Profile => {
                *profile_draft = None;
                let result = flow.back_home().await;
                if result.is_ok() {
                    render_home(flow).await;
                }
                result
            }
            Screen::History => {
                let result = flow.close_history().await;
                if result.is_ok() {
                    render_home(flow).await;
                }
                result
            }
            other => Err(FlowError::WrongScreen(other)),
        },
        "/history" => {
            let result = flow.open_history().await;
            if result.is_ok() {
                render_history(flow).await;
            }
            result
        }
        "/delete" => {
            if argument.is_empty() {
                println!("{}", "Usage: /delete <entry-id>".yellow());
                Ok(())
            } else {
                let result = flow.delete_entry(argument).await;
                if result.is_ok() {
                    render_history(flow).await;
                }
                result
            }
        }
        "/profile" => {
            let result = flow.open_profile().await;
            if result.is_ok() {
                *profile_draft = Some(flow.profile().await);
                render_profile(profile_draft.as_ref().unwrap());
            }
            result
        }
        "/set" => {
            match profile_draft.as_mut() {
                Some(draft) => {
                    if set_profile_field(draft, argument) {
                        render_profile(draft);
                    }
                    Ok(())
                }
                None => Err(FlowError::WrongScreen(screen)),
            }
        }
        _ => {
            println!("{}", "Unknown command. Try /help.".bright_black());
            Ok(())
        }
    };

    if let Err(e) = result {
        println!("{}", format!("{}", e).yellow());
    }
}

/// Reads a JPEG from disk, encodes it, and runs the analysis to completion.
async fn capture(flow: &LogFlowUseCase, path: &str) -> Result<(), FlowError> {
    if path.is_empty() {
        println!("{}", "Usage: /capture <path-to-jpeg>".yellow());
        return Ok(());
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("{}", format!("Cannot read {}: {}", path, e).red());
            return Ok(());
        }
    };
    let image_base64 = BASE64_STANDARD.encode(bytes);

    println!("{}", "Analyzing food...".bright_black());
    let result = flow.capture(image_base64).await;

    if result.is_ok() {
        match flow.screen().await {
            Screen::Result => render_result(flow).await,
            Screen::Scanning => {
                if let Some(banner) = flow.banner().await {
                    println!("{}", banner.yellow());
                }
            }
            _ => {}
        }
    }
    result
}

async fn render_home(flow: &LogFlowUseCase) {
    let logs = flow.logs().await;
    let profile = flow.profile().await;
    let today = DailySummary::today(&logs);
    let target = profile.daily_calorie_target();

    println!("{}", "-- Today --".bright_magenta());
    println!(
        "{}",
        format!(
            "{} / {} kcal ({} entr{})",
            today.calories,
            target,
            today.entries,
            if today.entries == 1 { "y" } else { "ies" }
        )
        .bold()
    );
    println!(
        "{}",
        format!(
            "protein {:.1}g · carbs {:.1}g · fat {:.1}g",
            today.protein, today.carbs, today.fat
        )
        .bright_black()
    );
}

async fn render_result(flow: &LogFlowUseCase) {
    let Some(item) = flow.pending_item().await else {
        return;
    };
    let weight = flow.chosen_weight().await;
    let Ok(preview) = flow.portion_preview().await else {
        return;
    };

    println!("{}", format!("{} ({:.0} g)", item.name, weight).bold());
    println!(
        "{}",
        format!(
            "{} kcal · protein {:.1}g · carbs {:.1}g · fat {:.1}g",
            preview.calories, preview.protein, preview.carbs, preview.fat
        )
        .bright_blue()
    );
    println!(
        "{}",
        "Adjust with '/weight <grams>' (10-1000, steps of 5), then '/save' or '/cancel'."
            .bright_black()
    );
}

async fn render_history(flow: &LogFlowUseCase) {
    let logs = flow.logs().await;
    if logs.is_empty() {
        println!("{}", "No entries yet.".bright_black());
        return;
    }
    for log in logs {
        println!(
            "{} {} {}",
            log.logged_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            format!("{} ({:.0} g, {} kcal)", log.food_name, log.weight_grams, log.nutrients.calories)
                .bold(),
            format!("[{}]", log.id).bright_black()
        );
    }
    println!("{}", "Delete with '/delete <entry-id>', go back with '/back'.".bright_black());
}

fn render_profile(profile: &UserProfile) {
    let gender = match profile.gender {
        Gender::Male => "male",
        Gender::Female => "female",
    };
    let goal = match profile.goal {
        Goal::Lose => "lose",
        Goal::Maintain => "maintain",
        Goal::Gain => "gain",
    };
    println!("{}", "-- Profile --".bright_magenta());
    println!(
        "{}",
        format!(
            "height {:.0} cm · weight {:.1} kg · target {:.1} kg",
            profile.height_cm, profile.weight_kg, profile.target_weight_kg
        )
    );
    println!(
        "{}",
        format!(
            "{} · {} years · activity {:.3} · goal {}",
            gender, profile.age, profile.activity_level, goal
        )
    );
    println!(
        "{}",
        format!("daily target {} kcal", profile.daily_calorie_target()).bright_blue()
    );
    println!(
        "{}",
        "Edit with '/set <height|weight|target|age|activity|gender|goal> <value>', then '/save' or '/back'."
            .bright_black()
    );
}

/// Applies one `/set field value` edit to the profile draft.
fn set_profile_field(draft: &mut UserProfile, argument: &str) -> bool {
    let mut parts = argument.splitn(2, ' ');
    let field = parts.next().unwrap_or_default();
    let value = parts.next().map(str::trim).unwrap_or_default();

    let applied = match field {
        "height" => value.parse().map(|v: f64| draft.height_cm = v).is_ok(),
        "weight" => value.parse().map(|v: f64| draft.weight_kg = v).is_ok(),
        "target" => value.parse().map(|v: f64| draft.target_weight_kg = v).is_ok(),
        "age" => value.parse().map(|v: u32| draft.age = v).is_ok(),
        "activity" => value.parse().map(|v: f64| draft.activity_level = v).is_ok(),
        "gender" => match value {
            "male" => {
                draft.gender = Gender::Male;
                true
            }
            "female" => {
                draft.gender = Gender::Female;
                true
            }
            _ => false,
        },
        "goal" => match value {
            "lose" => {
                draft.goal = Goal::Lose;
                true
            }
            "maintain" => {
                draft.goal = Goal::Maintain;
                true
            }
            "gain" => {
                draft.goal = Goal::Gain;
                true
            }
            _ => false,
        },
        _ => false,
    };

    if !applied {
        println!(
            "{}",
            "Usage: /set <height|weight|target|age|activity|gender|goal> <value>".yellow()
        );
    }
    applied
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /scan                start a capture session");
    println!("  /capture <path>      analyze a JPEG photo of your meal");
    println!("  /weight <grams>      adjust the portion weight on the result screen");
    println!("  /save                log the result, or save the edited profile");
    println!("  /cancel              leave scanning, or discard the current result");
    println!("  /history             browse logged entries");
    println!("  /delete <entry-id>   delete one entry from history");
    println!("  /profile             view and edit your profile");
    println!("  /set <field> <value> edit a profile field");
    println!("  /back                return to the home screen");
    println!("  quit                 exit");
}
