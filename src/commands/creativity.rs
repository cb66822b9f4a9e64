use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::mode::Creativity;

pub struct CreativityCommand;

#[async_trait]
impl Command for CreativityCommand {
    fn name(&self) -> &str {
        "/creativity"
    }

    fn aliases(&self) -> &[&str] {
        &["/c"]
    }

    fn usage(&self) -> &str {
        "[0.0-1.0|NN%]"
    }

    fn description(&self) -> &str {
        "show or set creativity (character mode only)"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            match info.engine {
                Some(engine) => {
                    let c = engine.creativity();
                    println!("  creativity {c} ({})", c.label());
                    if !engine.mode().uses_creativity() {
                        println!("  (ignored in {} mode)", engine.mode());
                    }
                }
                None => println!("  creativity {}", Creativity::default()),
            }
            return CommandResult::Handled;
        }

        match args.parse::<Creativity>() {
            Ok(creativity) => {
                println!("  ✓ creativity set to {creativity} ({})", creativity.label());
                if let Some(engine) = info.engine
                    && !engine.mode().uses_creativity()
                {
                    println!("  (only used in character mode)");
                }
                CommandResult::StateChanged(StateChange::Creativity(creativity))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}
