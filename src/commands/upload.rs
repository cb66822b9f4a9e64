use std::path::PathBuf;

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::consts::format_bytes;
use crate::image::SourceImage;

pub struct UploadCommand;

#[async_trait]
impl Command for UploadCommand {
    fn name(&self) -> &str {
        "/upload"
    }

    fn aliases(&self) -> &[&str] {
        &["/u"]
    }

    fn usage(&self) -> &str {
        "<path>"
    }

    fn description(&self) -> &str {
        "load the source image (png, jpeg, webp)"
    }

    async fn execute(&self, args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            eprintln!("  ✗ usage: /upload <path>");
            return CommandResult::Handled;
        }

        let loaded = if args.starts_with("data:") {
            SourceImage::from_data_url(args)
        } else {
            SourceImage::from_path(&expand_path(args))
        };

        match loaded {
            Ok(image) => {
                println!(
                    "  ✓ loaded {} ({})",
                    image.mime_type(),
                    format_bytes(image.bytes().len())
                );
                CommandResult::StateChanged(StateChange::Upload(image))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}

/// Strip the quotes terminals add on drag-and-drop and expand a leading `~`.
pub(crate) fn expand_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    if let Some(rest) = trimmed.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;

    #[tokio::test]
    async fn loads_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let args = path.to_string_lossy().to_string();
        match UploadCommand.execute(&args, &test_info()).await {
            CommandResult::StateChanged(StateChange::Upload(image)) => {
                assert_eq!(image.mime_type(), "image/png");
                assert_eq!(image.bytes().len(), 4);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let args = path.to_string_lossy().to_string();
        assert!(matches!(
            UploadCommand.execute(&args, &test_info()).await,
            CommandResult::Handled
        ));
    }

    #[tokio::test]
    async fn missing_argument_is_handled() {
        assert!(matches!(
            UploadCommand.execute("", &test_info()).await,
            CommandResult::Handled
        ));
    }

    #[tokio::test]
    async fn accepts_data_url() {
        let result = UploadCommand
            .execute("data:image/webp;base64,AQID", &test_info())
            .await;
        match result {
            CommandResult::StateChanged(StateChange::Upload(image)) => {
                assert_eq!(image.bytes(), &[1, 2, 3]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn expand_path_strips_quotes() {
        assert_eq!(expand_path("'/tmp/a b.png'"), PathBuf::from("/tmp/a b.png"));
        assert_eq!(expand_path("\"x.jpg\""), PathBuf::from("x.jpg"));
    }
}
