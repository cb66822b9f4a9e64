use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::auth::{self, AuthStorage};
use crate::consts::API_KEY_ENV_VARS;

pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    fn name(&self) -> &str {
        "/logout"
    }

    fn description(&self) -> &str {
        "remove the stored API key"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let provider = info.provider;

        if let Err(e) = auth::logout(info.db_path, provider) {
            eprintln!("  ✗ {e:#}");
            return CommandResult::Handled;
        }
        println!("  ✓ logged out from {provider}");

        // An environment key still authenticates after logout.
        let status = AuthStorage::open(info.db_path)
            .and_then(|storage| auth::auth_status(&storage, provider, API_KEY_ENV_VARS))
            .unwrap_or_else(|_| "not authenticated".to_string());
        if status != "not authenticated" {
            println!("  still using {status}");
        }
        CommandResult::StateChanged(StateChange::Auth(status))
    }
}
