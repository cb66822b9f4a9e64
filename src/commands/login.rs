use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::auth;

pub struct LoginCommand;

#[async_trait]
impl Command for LoginCommand {
    fn name(&self) -> &str {
        "/login"
    }

    fn usage(&self) -> &str {
        "[key]"
    }

    fn description(&self) -> &str {
        "store a Gemini API key"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let provider = info.provider;

        let key = if args.is_empty() {
            println!("Create a key at https://aistudio.google.com/apikey\n");
            print!("Paste your {provider} API key: ");
            if std::io::Write::flush(&mut std::io::stdout()).is_err() {
                return CommandResult::Handled;
            }
            let mut key = String::new();
            if std::io::stdin().read_line(&mut key).is_err() {
                eprintln!("  ✗ failed to read input");
                return CommandResult::Handled;
            }
            key
        } else {
            args.to_string()
        };

        match auth::login(info.db_path, provider, &key) {
            Ok(()) => {
                println!("  ✓ logged in to {provider}");
                CommandResult::StateChanged(StateChange::Auth("API key ✓".to_string()))
            }
            Err(e) => {
                eprintln!("  ✗ login failed: {e:#}");
                CommandResult::Handled
            }
        }
    }
}
