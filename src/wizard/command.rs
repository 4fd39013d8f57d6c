//! Grammar of a wizard turn.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Question,
}

impl Field {
    fn prefix(self) -> &'static str {
        match self {
            Field::Title => "change title to ",
            Field::Description => "change description to ",
            Field::Question => "change question to ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Restart,
    SetField(Field, String),
    Confirm(bool),
    AddQuestion,
    RawText(String),
}

const RESTART: &[&str] = &["restart", "start over"];
const AFFIRMATIVE: &[&str] = &["yes", "y", "yes✔️"];
const NEGATIVE: &[&str] = &["no", "n", "no❌", "finish", "finished", "done", "i'm done"];
const ADD_QUESTION: &[&str] = &["add question", "add a question", "add another question"];

impl Command {
    pub fn parse(input: &str) -> Command {
        let text = input.trim();
        let phrase = normalize(text);

        if RESTART.contains(&phrase.as_str()) {
            return Command::Restart;
        }

        for field in [Field::Title, Field::Description, Field::Question] {
            if let Some(value) = strip_prefix_ignore_case(text, field.prefix()) {
                let value = value.trim();
                if !value.is_empty() {
                    return Command::SetField(field, value.to_owned());
                }
            }
        }

        if AFFIRMATIVE.contains(&phrase.as_str()) {
            Command::Confirm(true)
        } else if NEGATIVE.contains(&phrase.as_str()) {
            Command::Confirm(false)
        } else if ADD_QUESTION.contains(&phrase.as_str()) {
            Command::AddQuestion
        } else {
            Command::RawText(text.to_owned())
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_is_a_whole_phrase() {
        assert_eq!(Command::parse("Restart"), Command::Restart);
        assert_eq!(Command::parse("  start over! "), Command::Restart);
        assert_eq!(
            Command::parse("When did the restart happen?"),
            Command::RawText("When did the restart happen?".into())
        );
    }

    #[test]
    fn field_overrides_keep_the_value_verbatim() {
        assert_eq!(
            Command::parse("change title to New Name"),
            Command::SetField(Field::Title, "New Name".into())
        );
        assert_eq!(
            Command::parse("Change Description to Geo Trivia, vol. 2"),
            Command::SetField(Field::Description, "Geo Trivia, vol. 2".into())
        );
        assert_eq!(
            Command::parse("change question to What is 2 + 2?"),
            Command::SetField(Field::Question, "What is 2 + 2?".into())
        );
    }

    #[test]
    fn override_without_value_is_plain_text() {
        assert_eq!(
            Command::parse("change title to "),
            Command::RawText("change title to".into())
        );
    }

    #[test]
    fn confirmations() {
        assert_eq!(Command::parse("yes"), Command::Confirm(true));
        assert_eq!(Command::parse("Yes✔️"), Command::Confirm(true));
        assert_eq!(Command::parse("NO"), Command::Confirm(false));
        assert_eq!(Command::parse("done."), Command::Confirm(false));
        assert_eq!(Command::parse("finish"), Command::Confirm(false));
        assert_eq!(
            Command::parse("No way it's Paris?"),
            Command::RawText("No way it's Paris?".into())
        );
    }

    #[test]
    fn add_question() {
        assert_eq!(Command::parse("Add question"), Command::AddQuestion);
        assert_eq!(
            Command::parse("add question about rivers"),
            Command::RawText("add question about rivers".into())
        );
    }

    #[test]
    fn non_ascii_input_does_not_split_characters() {
        assert_eq!(Command::parse("日本の首都は？"), Command::RawText("日本の首都は？".into()));
    }
}
