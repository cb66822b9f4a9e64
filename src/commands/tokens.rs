use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::consts::format_number;
use crate::generator::TokenUsage;

pub struct TokensCommand;

#[async_trait]
impl Command for TokensCommand {
    fn name(&self) -> &str {
        "/tokens"
    }

    fn description(&self) -> &str {
        "show session token usage and image count"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let generations = info.engine.map(|e| e.generations()).unwrap_or(0);
        println!("  {}", usage_line(info.usage, generations));
        CommandResult::Handled
    }
}

fn usage_line(usage: TokenUsage, generations: u32) -> String {
    if usage.total() == 0 {
        return "no tokens used this session".to_string();
    }
    let mut line = format!(
        "{} input + {} output = {} total",
        format_number(usage.input_tokens),
        format_number(usage.output_tokens),
        format_number(usage.total()),
    );
    if generations > 0 {
        let per_image = usage.total() / u64::from(generations);
        line.push_str(&format!(
            " over {generations} image(s), ~{} per image",
            format_number(per_image)
        ));
    }
    line
}
