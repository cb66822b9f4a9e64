use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::consts::format_bytes;

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "/quit"
    }

    fn aliases(&self) -> &[&str] {
        &["quit", "exit", "/exit"]
    }

    fn description(&self) -> &str {
        "exit morph"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if let Some(note) = unsaved_note(info) {
            println!("  {note}");
        }
        CommandResult::Quit
    }
}

/// Results live only in memory unless `/save` or `--out` wrote them.
fn unsaved_note(info: &SessionInfo<'_>) -> Option<String> {
    let image = info.engine?.generated()?;
    Some(format!(
        "last generated image ({}, {}) is discarded on exit unless it was saved",
        image.mime_type,
        format_bytes(image.bytes.len())
    ))
}
