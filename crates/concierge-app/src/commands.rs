//! Parsing of terminal input lines.
//!
//! Lines starting with `/` are commands; anything else is free text sent to
//! the engine. `/N` (or a bare `N`) picks the N-th option of the last menu.

use concierge_core::{Language, QuickReply};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Zero-based index into the last menu.
    Choose(usize),
    Reply(QuickReply),
    Language(Language),
    Text(String),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "\
  /N or N       pick option N of the last menu
  /yes, /no     answer \"anything else?\"
  /lang vi|en   switch language and restart
  /help         show this help
  /quit         leave
  anything else is sent as a question";

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let command = line.strip_prefix('/');
    if let Ok(n) = command.unwrap_or(line).parse::<usize>() {
        return match n {
            0 => Command::Unknown(line.to_string()),
            n => Command::Choose(n - 1),
        };
    }

    let Some(rest) = command else {
        return Command::Text(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    match (name.as_str(), arg) {
        ("yes" | "y" | "co" | "có", None) => Command::Reply(QuickReply::Yes),
        ("no" | "n" | "khong" | "không", None) => Command::Reply(QuickReply::No),
        ("lang" | "language", Some(code)) => match code.parse() {
            Ok(language) => Command::Language(language),
            Err(_) => Command::Unknown(line.to_string()),
        },
        ("help" | "h" | "?", None) => Command::Help,
        ("quit" | "q" | "exit", None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_pick_options() {
        assert_eq!(parse("1"), Command::Choose(0));
        assert_eq!(parse(" 12 "), Command::Choose(11));
        assert_eq!(parse("/3"), Command::Choose(2));
        assert_eq!(parse("0"), Command::Unknown("0".to_string()));
        assert_eq!(parse("/0"), Command::Unknown("/0".to_string()));
    }

    #[test]
    fn test_quick_replies() {
        assert_eq!(parse("/yes"), Command::Reply(QuickReply::Yes));
        assert_eq!(parse("/Có"), Command::Reply(QuickReply::Yes));
        assert_eq!(parse("/no"), Command::Reply(QuickReply::No));
        assert_eq!(parse("/không"), Command::Reply(QuickReply::No));
    }

    #[test]
    fn test_language_switch() {
        assert_eq!(parse("/lang en"), Command::Language(Language::En));
        assert_eq!(parse("/lang vietnamese"), Command::Language(Language::Vi));
        assert_eq!(
            parse("/lang fr"),
            Command::Unknown("/lang fr".to_string())
        );
        assert_eq!(parse("/lang"), Command::Unknown("/lang".to_string()));
    }

    #[test]
    fn test_text_and_control() {
        assert_eq!(
            parse("  I need a doctor "),
            Command::Text("I need a doctor".to_string())
        );
        assert_eq!(parse(""), Command::Empty);
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("/dance"), Command::Unknown("/dance".to_string()));
    }
}
