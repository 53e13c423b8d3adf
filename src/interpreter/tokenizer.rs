//! 指令串切分
//!
//! 只在「紧跟数字之后」的空白处切分：大多数指令以数字参数结尾（move_head_0_-10_0_80），
//! 而 say_text 的自由文本里可以有空格（"Hi! nice to meet you"），不能在那里切开。
//! 这是启发式规则：以数字结尾的句子后面紧跟下一个 token 时会被误切。

use std::sync::OnceLock;

use regex::Regex;

static SPLIT_RE: OnceLock<Regex> = OnceLock::new();

/// 将原始指令串切成有序 token；首尾空白忽略，不产生空 token
pub fn split_tokens(raw: &str) -> Vec<&str> {
    let re = SPLIT_RE.get_or_init(|| Regex::new(r"\d(\s+)").unwrap());
    let raw = raw.trim();
    let mut tokens = Vec::new();
    let mut start = 0;
    for caps in re.captures_iter(raw) {
        let Some(gap) = caps.get(1) else { continue };
        tokens.push(&raw[start..gap.start()]);
        start = gap.end();
    }
    tokens.push(&raw[start..]);
    tokens.retain(|t| !t.is_empty());
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_after_digits() {
        assert_eq!(
            split_tokens("set_volume_30 say_text_Hi there!_1 move_head_0_-10_0_80"),
            vec!["set_volume_30", "say_text_Hi there!_1", "move_head_0_-10_0_80"]
        );
    }

    #[test]
    fn test_no_split_without_preceding_digit() {
        // "!" 之后的空格不是切分点
        assert_eq!(
            split_tokens("say_text_Hi_there! move_head_0_-10_0_80"),
            vec!["say_text_Hi_there! move_head_0_-10_0_80"]
        );
    }

    #[test]
    fn test_whitespace_runs_and_newlines() {
        assert_eq!(
            split_tokens("turn_in_place_90_5 \t\n set_lift_height_1_2"),
            vec!["turn_in_place_90_5", "set_lift_height_1_2"]
        );
    }

    #[test]
    fn test_trim_and_empty() {
        assert!(split_tokens("").is_empty());
        assert!(split_tokens("   ").is_empty());
        assert_eq!(split_tokens("  play_anim_3  "), vec!["play_anim_3"]);
    }

    #[test]
    fn test_every_split_point_follows_a_digit() {
        let raw = "say_text_Good morning everyone_2 display_oled_face_image_Happy_3 drive_straight_10_20 foo bar_7";
        let tokens = split_tokens(raw);
        assert_eq!(tokens.len(), 4);
        for token in &tokens[..tokens.len() - 1] {
            assert!(token.chars().last().unwrap().is_ascii_digit());
        }
        assert_eq!(tokens[3], "foo bar_7");
    }

    #[test]
    fn test_sentence_ending_in_number_mis_splits() {
        assert_eq!(
            split_tokens("say_text_I am 5 years old_1"),
            vec!["say_text_I am 5", "years old_1"]
        );
    }
}
