use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::generator::gemini::KNOWN_MODELS;

pub struct ModelCommand;

#[async_trait]
impl Command for ModelCommand {
    fn name(&self) -> &str {
        "/model"
    }

    fn usage(&self) -> &str {
        "[id]"
    }

    fn description(&self) -> &str {
        "list and switch the image model"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let current = info.model;

        // Any id is accepted; new models ship faster than this list.
        if !args.is_empty() {
            return select(args, current);
        }

        let current_idx = KNOWN_MODELS
            .iter()
            .position(|m| *m == current)
            .map(|i| i + 1);

        println!("  Available models for {}:\n", info.provider);
        for (i, model) in KNOWN_MODELS.iter().enumerate() {
            let marker = if *model == current { " ← current" } else { "" };
            println!("  {}. {}{}", i + 1, model, marker);
        }
        if current_idx.is_none() {
            println!("\n  current: {current}");
        }

        let default_label = match current_idx {
            Some(idx) => format!(" [{idx}]"),
            None => String::new(),
        };
        print!("\n  Select model{default_label}: ");
        if std::io::Write::flush(&mut std::io::stdout()).is_err() {
            return CommandResult::Handled;
        }

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() {
            eprintln!("  ✗ failed to read input");
            return CommandResult::Handled;
        }
        let input = input.trim();

        // Empty input = keep current
        if input.is_empty() {
            return CommandResult::Handled;
        }

        match input.parse::<usize>() {
            Ok(n) if (1..=KNOWN_MODELS.len()).contains(&n) => select(KNOWN_MODELS[n - 1], current),
            _ => {
                eprintln!("  ✗ invalid selection: {input}");
                CommandResult::Handled
            }
        }
    }
}

fn select(model: &str, current: &str) -> CommandResult {
    if model == current {
        println!("  already using {model}");
        return CommandResult::Handled;
    }
    println!("  ✓ model changed to {model}");
    CommandResult::StateChanged(StateChange::Model(model.to_string()))
}
