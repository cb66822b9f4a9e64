use std::path::Path;

use async_trait::async_trait;

use super::upload::expand_path;
use super::{Command, CommandResult, SessionInfo};

pub struct SaveCommand;

/// Which image `/save` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Original,
    Generated,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Target::Original => "original",
            Target::Generated => "generated",
        }
    }
}

/// `[original|generated] [dir]`, both optional, in that order.
fn parse_args(args: &str) -> (Target, &str) {
    let (first, rest) = match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (args, ""),
    };
    match first.to_ascii_lowercase().as_str() {
        "original" | "source" => (Target::Original, rest),
        "generated" | "result" => (Target::Generated, rest),
        _ => (Target::Generated, args),
    }
}

#[async_trait]
impl Command for SaveCommand {
    fn name(&self) -> &str {
        "/save"
    }

    fn aliases(&self) -> &[&str] {
        &["/download"]
    }

    fn usage(&self) -> &str {
        "[original|generated] [dir]"
    }

    fn description(&self) -> &str {
        "write an image to disk (default: generated, current dir)"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine else {
            eprintln!("  ✗ nothing to save");
            return CommandResult::Handled;
        };

        let (target, dir) = parse_args(args);
        let dir = if dir.is_empty() {
            Path::new(".").to_path_buf()
        } else {
            expand_path(dir)
        };

        let written = match target {
            Target::Original => engine.source().map(|img| img.save_to(&dir, target.label())),
            Target::Generated => engine
                .generated()
                .map(|img| img.save_to(&dir, target.label())),
        };

        match written {
            Some(Ok(path)) => println!("  ✓ saved {}", path.display()),
            Some(Err(e)) => eprintln!("  ✗ failed to save {} image: {e}", target.label()),
            None => eprintln!("  ✗ no {} image yet", target.label()),
        }
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;
    use crate::engine::transform::TransformEngine;
    use crate::generator::mock::{MockGenerator, MockReply};
    use crate::image::SourceImage;

    #[test]
    fn parse_args_defaults_to_generated() {
        assert_eq!(parse_args(""), (Target::Generated, ""));
        assert_eq!(parse_args("out"), (Target::Generated, "out"));
        assert_eq!(parse_args("original"), (Target::Original, ""));
        assert_eq!(parse_args("generated out/dir"), (Target::Generated, "out/dir"));
    }

    #[tokio::test]
    async fn saves_both_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TransformEngine::new(Box::new(MockGenerator::new(vec![
            MockReply::image(&[7, 7, 7]),
        ])));
        engine.upload(SourceImage::from_bytes(vec![1, 2], "image/jpeg").unwrap());
        engine.set_instruction("wave");
        engine.submit().await.unwrap();

        let info = SessionInfo {
            engine: Some(&engine),
            ..test_info()
        };
        let dir_arg = dir.path().to_string_lossy().to_string();
        SaveCommand
            .execute(&format!("original {dir_arg}"), &info)
            .await;
        SaveCommand.execute(&dir_arg, &info).await;

        assert_eq!(
            std::fs::read(dir.path().join("original_image.jpg")).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            std::fs::read(dir.path().join("generated_image.png")).unwrap(),
            vec![7, 7, 7]
        );
    }

    #[tokio::test]
    async fn nothing_generated_is_handled() {
        let engine = TransformEngine::new(Box::new(MockGenerator::new(vec![])));
        let info = SessionInfo {
            engine: Some(&engine),
            ..test_info()
        };
        assert!(matches!(
            SaveCommand.execute("", &info).await,
            CommandResult::Handled
        ));
    }
}
