//! Error types for the sync/compare/build cycle

use thiserror::Error;

/// Errors from running an external command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}")]
    Failed { program: String, code: i32 },

    #[error("{program} was terminated by a signal")]
    Interrupted { program: String },
}

impl CommandError {
    /// The command line that failed, as displayed to the user
    pub fn program(&self) -> &str {
        match self {
            Self::Launch { program, .. }
            | Self::Wait { program, .. }
            | Self::Failed { program, .. }
            | Self::Interrupted { program } => program,
        }
    }
}

/// Errors that end a cycle, tagged with the stage that produced them
///
/// Every variant is fatal to the daemon; the binary logs it and exits.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("git pull")]
    Sync(#[source] CommandError),

    #[error("getVersion")]
    Version(#[source] CommandError),

    #[error("getVersion: unknown version in {output:?}")]
    UnknownVersion { output: String },

    #[error("git hash")]
    Revision(#[source] CommandError),

    #[error("build")]
    Build(#[source] CommandError),
}

impl BuilderError {
    /// The external command behind this error, if one failed
    pub fn command(&self) -> Option<&CommandError> {
        match self {
            Self::Sync(e) | Self::Version(e) | Self::Revision(e) | Self::Build(e) => Some(e),
            Self::UnknownVersion { .. } => None,
        }
    }
}
