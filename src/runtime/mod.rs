//! `container` CLI integration
//!
//! Translates services into argument vectors for the runtime binary, runs
//! them, and decodes what comes back.

pub mod command;
pub mod inspect;
pub mod process;

pub use command::{CommandTranslator, Intent, Invocation, TranslationWarning};
pub use inspect::{parse_inspect_output, InspectData, NetworkAttachment};
pub use process::{CapturedOutput, ContainerRuntime, ProcessRuntime, DEFAULT_RUNTIME};
