//! Interpretation of a submitted input line

/// Separates the question from its answer choices. Only counts when it
/// stands alone between whitespace, so `std::vector` stays in the question.
pub const CHOICES_SEPARATOR: &str = "::";

/// Separates answer choices from each other
pub const CHOICE_DELIMITER: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Logout,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Empty,
    Command(Command),
    Question { text: String, choices: Vec<String> },
}

/// Parse one line: `/command`, `question`, or `question :: a | b | c`.
///
/// Choices are passed through untouched; trimming and dropping blanks is the
/// session's job.
pub fn parse_input(line: &str) -> UserInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return UserInput::Empty;
    }

    if let Some(command) = trimmed.strip_prefix('/') {
        let name = command.split_whitespace().next().unwrap_or("");
        return UserInput::Command(match name.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "status" => Command::Status,
            "logout" => Command::Logout,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(name.to_string()),
        });
    }

    match find_separator(line) {
        Some(at) => UserInput::Question {
            text: line[..at].trim_end().to_string(),
            choices: line[at + CHOICES_SEPARATOR.len()..]
                .split(CHOICE_DELIMITER)
                .map(str::to_string)
                .collect(),
        },
        None => UserInput::Question {
            text: line.to_string(),
            choices: Vec::new(),
        },
    }
}

/// Byte offset of the first `::` with whitespace before it and whitespace
/// or the end of the line after it
fn find_separator(line: &str) -> Option<usize> {
    line.match_indices(CHOICES_SEPARATOR)
        .map(|(at, _)| at)
        .find(|&at| {
            let before = line[..at].chars().next_back();
            let after = line[at + CHOICES_SEPARATOR.len()..].chars().next();
            before.is_some_and(char::is_whitespace) && after.map_or(true, char::is_whitespace)
        })
}
