use console::style;
use crossterm::{
    cursor::MoveLeft,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

use crate::chat::Message;
use crate::identity::Profile;
use crate::reveal::RevealFrame;
use crate::view::Greeting;

/// Drawn after the last revealed character while the reply is still typing
pub const CARET: &str = "▌";

/// One entry of the metadata footer under an assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaItem {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// Footer items in display order: difficulty, model, category
pub fn metadata_items(message: &Message) -> Vec<MetaItem> {
    let mut items = Vec::new();
    if let Some(difficulty) = message.difficulty() {
        items.push(MetaItem {
            icon: "🔥",
            label: "Difficulty",
            value: difficulty.to_string(),
        });
    }
    if let Some(modelo) = message.modelo() {
        items.push(MetaItem {
            icon: "🤖",
            label: "Model",
            value: modelo.to_string(),
        });
    }
    if let Some(category) = message.category() {
        items.push(MetaItem {
            icon: "📂",
            label: "Category",
            value: category.to_string(),
        });
    }
    items
}

/// Writes the transcript to a terminal (or any writer in tests)
pub struct OutputHandler<W: Write = io::Stdout> {
    out: W,
    painted: usize,
    caret_shown: bool,
}

impl OutputHandler<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> OutputHandler<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            painted: 0,
            caret_shown: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_banner(&mut self, profile: Option<&Profile>) -> io::Result<()> {
        let who = match profile {
            Some(p) => format!("{} · {}", p.name, p.company),
            None => "not signed in".to_string(),
        };
        writeln!(
            self.out,
            "{} {}",
            style("🌱 GreenChoice").green().bold(),
            style(who).dim()
        )?;
        writeln!(self.out, "{}", style("─".repeat(48)).dim())?;
        self.out.flush()
    }

    pub fn print_greeting(&mut self, greeting: &Greeting) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  {}", style(&greeting.title).bold())?;
        writeln!(self.out, "  {}", style(&greeting.subtitle).dim())?;
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn print_user(&mut self, message: &Message) -> io::Result<()> {
        writeln!(self.out, "{} {}", style("You ›").cyan().bold(), message.content())?;
        self.out.flush()
    }

    /// Assistant reply shown fully revealed
    pub fn print_assistant(&mut self, message: &Message) -> io::Result<()> {
        self.begin_reveal()?;
        write!(self.out, "{}", message.content())?;
        writeln!(self.out)?;
        self.print_metadata(message)
    }

    pub fn print_metadata(&mut self, message: &Message) -> io::Result<()> {
        let items = metadata_items(message);
        if items.is_empty() {
            return self.out.flush();
        }

        let line = items
            .iter()
            .map(|item| format!("{} {} {}", item.icon, style(item.label).bold(), item.value))
            .collect::<Vec<_>>()
            .join("   ");
        writeln!(self.out, "  {}", style(line).dim())?;
        self.out.flush()
    }

    /// Start an assistant reply; frames are painted after this label
    pub fn begin_reveal(&mut self) -> io::Result<()> {
        self.painted = 0;
        self.caret_shown = false;
        write!(self.out, "{} ", style("GreenChoice ›").green().bold())?;
        self.out.flush()
    }

    /// Paint the characters a frame adds and move the caret after them
    pub fn paint_frame(&mut self, frame: &RevealFrame) -> io::Result<()> {
        self.erase_caret()?;

        let delta = frame.visible.get(self.painted..).unwrap_or("");
        write!(self.out, "{}", delta)?;
        self.painted = frame.visible.len();

        if frame.typing {
            write!(self.out, "{}", style(CARET).green())?;
            self.caret_shown = true;
        }
        self.out.flush()
    }

    /// Finish an assistant reply, printing whatever the reveal did not
    /// reach (e.g. when it was skipped), then the metadata footer.
    pub fn end_reveal(&mut self, message: &Message) -> io::Result<()> {
        self.erase_caret()?;
        let rest = message.content().get(self.painted..).unwrap_or("");
        write!(self.out, "{}", rest)?;
        self.painted = message.content().len();
        writeln!(self.out)?;
        self.print_metadata(message)
    }

    fn erase_caret(&mut self) -> io::Result<()> {
        if self.caret_shown {
            queue!(self.out, MoveLeft(1), Clear(ClearType::UntilNewLine))?;
            self.caret_shown = false;
        }
        Ok(())
    }

    pub fn print_info(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", style(text).dim())?;
        self.out.flush()
    }

    pub fn print_error(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", style("✗").red().bold(), style(text).red())?;
        self.out.flush()
    }

    pub fn print_help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", style("Ask anything about greener choices.").bold())?;
        writeln!(self.out, "  question :: choice A | choice B   ask with answer choices")?;
        writeln!(self.out, "  /status                           connection and session info")?;
        writeln!(self.out, "  /logout                           sign out")?;
        writeln!(self.out, "  /quit                             leave")?;
        writeln!(self.out, "  Ctrl-C while a reply is typing skips the animation")?;
        self.out.flush()
    }
}
