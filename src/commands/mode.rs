use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::mode::Mode;

pub struct ModeCommand;

#[async_trait]
impl Command for ModeCommand {
    fn name(&self) -> &str {
        "/mode"
    }

    fn usage(&self) -> &str {
        "[character|style]"
    }

    fn description(&self) -> &str {
        "show or switch the transformation mode"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            let current = info.engine.map(|e| e.mode()).unwrap_or_default();
            for mode in [Mode::Character, Mode::Style] {
                let marker = if mode == current { " ← current" } else { "" };
                println!("  {:<10} {}{marker}", mode.as_str(), mode.description());
            }
            return CommandResult::Handled;
        }

        match args.parse::<Mode>() {
            Ok(mode) => {
                println!("  ✓ mode set to {mode}");
                CommandResult::StateChanged(StateChange::Mode(mode))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}
