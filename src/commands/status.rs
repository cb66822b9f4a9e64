use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::consts::format_bytes;

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "/status"
    }

    fn aliases(&self) -> &[&str] {
        &["/whoami"]
    }

    fn description(&self) -> &str {
        "show model, auth and the current session"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        println!("  provider    {} ({})", info.provider, info.model);
        println!("  auth        {}", info.auth_status);

        let Some(engine) = info.engine else {
            return CommandResult::Handled;
        };

        match engine.source() {
            Some(image) => println!(
                "  image       {} ({})",
                image.mime_type(),
                format_bytes(image.bytes().len())
            ),
            None => println!("  image       none (/upload <path>)"),
        }
        println!("  mode        {}", engine.mode());
        if engine.mode().uses_creativity() {
            println!(
                "  creativity  {} ({})",
                engine.creativity(),
                engine.creativity().label()
            );
        }
        println!("  state       {}", engine.state());
        if let Some(result) = engine.generated() {
            println!(
                "  result      {} ({})",
                result.mime_type,
                format_bytes(result.bytes.len())
            );
        }
        if let Some(err) = engine.error() {
            println!("  error       {err}");
        }
        CommandResult::Handled
    }
}
