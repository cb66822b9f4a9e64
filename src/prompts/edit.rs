use crate::mode::{Creativity, Mode};

const INTRO: &str = "You are an image editor.";
const CHARACTER_RULES: &str = "Maintain the character/subject identity from the source image. Create new actions or expressions as described.";
const STYLE_RULES: &str = "Maintain the exact art style from the source image. Create an entirely new scene using that style.";

/// Build the text part sent alongside the source image.
///
/// Creativity is only encoded in character mode.
pub fn build_edit_instruction(mode: Mode, creativity: Creativity, request: &str) -> String {
    let request = request.trim();
    match mode {
        Mode::Character => format!(
            "{INTRO} {CHARACTER_RULES} Creativity level: {}%. User request: {request}",
            creativity.percent()
        ),
        Mode::Style => format!("{INTRO} {STYLE_RULES} User request: {request}"),
    }
}
