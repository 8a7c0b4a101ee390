use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::Transport;
use crate::identity::{IdentityProvider, LocalIdentity};
use crate::session::Session;
use crate::ui::{
    parse_input, ChatInput, Command, InputEvent, LoadingIndicator, Transcript, UserInput,
};
use crate::utils::config::Config;
use crate::view::{compose, Layout};

/// What the main loop should do after handling one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub struct App {
    config: Config,
    session: Session,
    transcript: Transcript,
    identity: LocalIdentity,
    input: ChatInput,
    loading: LoadingIndicator,
}

impl App {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let input = ChatInput::new(&Config::history_path())?;
        let identity = LocalIdentity::load(Config::profile_path());
        let transcript = Transcript::stdout(config.reveal_timing(), config.reveal.enabled);

        Ok(Self {
            session: Session::new(transport),
            transcript,
            identity,
            input,
            loading: LoadingIndicator::new(),
            config,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            if !self.identity.is_authenticated() && !self.login_gate()? {
                return Ok(());
            }

            let line = match self.input.read()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupt => continue,
                InputEvent::Eof => return Ok(()),
            };

            if self.handle_line(&line).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        match parse_input(line) {
            UserInput::Empty => {}
            UserInput::Question { text, choices } => return self.ask(&text, &choices).await,
            UserInput::Command(Command::Quit) => return Ok(Flow::Exit),
            UserInput::Command(Command::Help) => self.transcript.output().print_help()?,
            UserInput::Command(Command::Status) => self.print_status().await?,
            UserInput::Command(Command::Logout) => self.logout()?,
            UserInput::Command(Command::Unknown(name)) => {
                self.transcript
                    .output()
                    .print_error(&format!("Unknown command /{}. Try /help", name))?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Placeholder SSO: the chat is only reachable once signed in
    fn login_gate(&mut self) -> Result<bool> {
        self.input.set_user(None);
        self.transcript.output().print_banner(None)?;
        self.transcript
            .output()
            .print_info("Press Enter to sign in with SSO, or Ctrl-D to quit.")?;

        loop {
            match self.input.read()? {
                InputEvent::Line(_) => break,
                InputEvent::Interrupt => continue,
                InputEvent::Eof => return Ok(false),
            }
        }

        let profile = self.identity.login().context("Sign-in failed")?.clone();
        self.input.set_user(Some(&profile.name));
        self.show_home()?;
        Ok(true)
    }

    fn show_home(&mut self) -> Result<()> {
        let output = self.transcript.output();
        output.print_banner(self.identity.profile())?;
        if let Layout::Empty { greeting } =
            compose(self.session.conversation(), self.identity.profile())
        {
            output.print_greeting(&greeting)?;
        }
        Ok(())
    }

    /// Leaving the chat drops the conversation, like closing the page
    fn logout(&mut self) -> Result<()> {
        self.transcript.reset();
        self.identity.logout().context("Sign-out failed")?;
        self.session = Session::new(self.session.transport());
        self.transcript.output().print_info("Signed out.")?;
        Ok(())
    }

    /// Ctrl-C while waiting for the reply leaves the app
    async fn ask(&mut self, text: &str, choices: &[String]) -> Result<Flow> {
        let pending = match self.session.begin_turn(text, choices) {
            Ok(Some(pending)) => pending,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                warn!("{}", e);
                self.transcript.output().print_error(&e.to_string())?;
                return Ok(Flow::Continue);
            }
        };

        self.refresh().await?;

        self.loading.start("Thinking...");
        let transport = self.session.transport();
        let outcome = tokio::select! {
            outcome = transport.post_question(&pending.request) => Some(outcome),
            _ = interrupted() => None,
        };
        self.loading.stop();

        let Some(outcome) = outcome else {
            info!(seq = pending.seq, "Interrupted while waiting for a reply");
            return Ok(Flow::Exit);
        };

        self.session.complete_turn(&pending, outcome);
        self.refresh().await?;
        Ok(Flow::Continue)
    }

    /// Bring new messages into view; Ctrl-C skips the typing reveal
    async fn refresh(&mut self) -> Result<()> {
        let outcome = self
            .transcript
            .refresh(self.session.conversation(), interrupted())
            .await?;
        if outcome.skipped {
            debug!(index = ?outcome.animated, "Reveal skipped by user");
        }
        Ok(())
    }

    async fn print_status(&mut self) -> Result<()> {
        let health = match self.session.transport().health().await {
            Ok(message) => format!("reachable ({})", message),
            Err(e) => {
                info!("Health check failed: {}", e);
                format!("unreachable ({})", e)
            }
        };

        let user = self
            .identity
            .profile()
            .map(|p| format!("{} <{}>", p.name, p.email))
            .unwrap_or_else(|| "not signed in".to_string());

        let output = self.transcript.output();
        output.print_info(&format!("Endpoint:  {} {}", self.config.endpoint, health))?;
        output.print_info(&format!("User:      {}", user))?;
        output.print_info(&format!(
            "Messages:  {}",
            self.session.conversation().len()
        ))?;
        output.print_info(&format!(
            "Animation: {}",
            if self.config.reveal.enabled { "on" } else { "off" }
        ))?;
        Ok(())
    }
}
