//! reedline-based line editor for the chat prompt
//!
//! Emacs keybindings, file-backed history, slash commands highlighted, and a
//! prompt that shows who is signed in.

use anyhow::{Context, Result};
use nu_ansi_term::{Color as ReedlineColor, Style as ReedlineStyle};
use reedline::{
    DefaultHinter, FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, Reedline, Signal, StyledText,
};
use std::borrow::Cow;
use std::path::Path;

const HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    Interrupt,
    Eof,
}

/// Prompt showing the signed-in user's first name
pub struct ChatPrompt {
    label: String,
}

impl ChatPrompt {
    pub fn new() -> Self {
        Self {
            label: String::new(),
        }
    }

    pub fn set_user(&mut self, name: Option<&str>) {
        self.label = name
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or_default()
            .to_string();
    }
}

impl Default for ChatPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for ChatPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.label.is_empty() {
            Cow::Borrowed("🌱")
        } else {
            Cow::Owned(format!("🌱 {}", self.label))
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" › ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("│ ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

/// Colors slash commands so they stand out from questions
pub struct CommandHighlighter;

impl reedline::Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        let style = if line.trim_start().starts_with('/') {
            ReedlineStyle::new().fg(ReedlineColor::Cyan)
        } else {
            ReedlineStyle::new()
        };
        styled.push((style, line.to_string()));
        styled
    }
}

pub struct ChatInput {
    editor: Reedline,
    prompt: ChatPrompt,
}

impl ChatInput {
    pub fn new(history_path: &Path) -> Result<Self> {
        if let Some(dir) = history_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let history = Box::new(
            FileBackedHistory::with_file(HISTORY_CAPACITY, history_path.to_path_buf())
                .context("Failed to create history")?,
        );

        let editor = Reedline::create()
            .with_history(history)
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(ReedlineStyle::new().dimmed()),
            ))
            .with_highlighter(Box::new(CommandHighlighter));

        Ok(Self {
            editor,
            prompt: ChatPrompt::new(),
        })
    }

    pub fn set_user(&mut self, name: Option<&str>) {
        self.prompt.set_user(name);
    }

    /// Block until the user submits a line or interrupts
    pub fn read(&mut self) -> Result<InputEvent> {
        let signal = self
            .editor
            .read_line(&self.prompt)
            .context("Failed to read input")?;

        Ok(match signal {
            Signal::Success(line) => InputEvent::Line(line),
            Signal::CtrlD => InputEvent::Eof,
            Signal::CtrlC => InputEvent::Interrupt,
            #[allow(unreachable_patterns)]
            _ => InputEvent::Interrupt,
        })
    }
}
