//! Startup banner and session summary display.

use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};
use crate::generator::TokenUsage;
use crate::mode::{Creativity, Mode};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub auth_status: &'a str,
    pub mode: Mode,
    pub creativity: Creativity,
    pub image: &'a str,
    pub db: &'a str,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║              M O R P H                ║
   ║    same subject, new story            ║
   ╚═══════════════════════════════════════╝

   version     {}
   by          {}
   home        {}
   repo        {}
   provider    {} ({})
   auth        {}
   mode        {}
   creativity  {}
   image       {}
   db          {}

   /help for commands, or type what should happen to the image
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.provider,
        info.model,
        info.auth_status,
        info.mode,
        info.creativity,
        info.image,
        info.db,
    );
}

/// Print the session summary (generations, token usage, farewell).
pub fn print_session_summary(generations: u32, usage: TokenUsage) {
    if generations > 0 {
        let noun = if generations == 1 { "image" } else { "images" };
        println!("session: {generations} {noun} generated");
    }
    if usage.total() > 0 {
        println!(
            "session: {:>6} input + {:>6} output = {:>6} tokens",
            format_number(usage.input_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        );
    }
    println!("goodbye.");
}
