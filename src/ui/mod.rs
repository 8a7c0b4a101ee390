//! Terminal UI for GreenChoice
//!
//! Line input, transcript rendering with the typing reveal, and the loading
//! spinner.

pub mod input_handler;
pub mod output;
pub mod reedline_input;
pub mod spinner;
pub mod transcript;

pub use input_handler::{parse_input, Command, UserInput};
pub use output::OutputHandler;
pub use reedline_input::{ChatInput, InputEvent};
pub use spinner::LoadingIndicator;
pub use transcript::{RefreshOutcome, Transcript};
