//! Text commands.

/// What a text message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start adding a subscription.
    Setting,
    List,
    On,
    Off,
    /// Delete every subscription.
    Delete,
    Help,
    /// Show trams currently near each subscribed station.
    Now,
    Unknown,
}

const ALIASES: &[(Command, &[&str])] = &[
    (Command::Setting, &["設定", "せってい", "setting"]),
    (Command::List, &["確認", "かくにん", "status", "list"]),
    (Command::On, &["オン", "on", "有効"]),
    (Command::Off, &["オフ", "off", "無効"]),
    (Command::Delete, &["削除", "delete"]),
    (Command::Help, &["ヘルプ", "help", "使い方", "?"]),
    (Command::Now, &["いま", "今", "now", "current"]),
];

impl Command {
    /// Match a whole message, ignoring case and surrounding whitespace.
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&text.as_str()))
            .map(|(command, _)| *command)
            .unwrap_or(Command::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn japanese_and_english_aliases() {
        assert_eq!(Command::parse("設定"), Command::Setting);
        assert_eq!(Command::parse("かくにん"), Command::List);
        assert_eq!(Command::parse("オン"), Command::On);
        assert_eq!(Command::parse("無効"), Command::Off);
        assert_eq!(Command::parse("削除"), Command::Delete);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("今"), Command::Now);
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        assert_eq!(Command::parse("  NOW \n"), Command::Now);
        assert_eq!(Command::parse("Status"), Command::List);
        assert_eq!(Command::parse("OFF"), Command::Off);
    }

    #[test]
    fn partial_matches_are_unknown() {
        assert_eq!(Command::parse("設定して"), Command::Unknown);
        assert_eq!(Command::parse("now please"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
    }

    proptest! {
        #[test]
        fn padding_never_changes_command(
            alias in prop::sample::select(vec!["設定", "list", "on", "いま", "help"]),
            left in "[ \t\n]{0,3}",
            right in "[ \t\n]{0,3}",
        ) {
            let padded = format!("{left}{alias}{right}");
            prop_assert_eq!(Command::parse(&padded), Command::parse(alias));
            prop_assert_ne!(Command::parse(alias), Command::Unknown);
        }
    }
}
