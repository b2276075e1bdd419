use thiserror::Error;

/// Job-level error taxonomy.
///
/// Per-clip extraction failures and subtitle encoding/parse failures are
/// absorbed inside their components and never reach this type; what
/// remains is the distinction the caller cares about: bad input, a failed
/// external collaborator, or something unexpected.
#[derive(Error, Debug)]
pub enum JobError {
    /// Missing input file, empty keyword, or a keyword with no matches.
    /// Ends the job early with a clear reason.
    #[error("{0}")]
    Input(String),

    /// An external collaborator (transcription service or encoder) failed
    /// in a way the pipeline cannot degrade around.
    #[error("{stage} failed: {message}")]
    Collaborator {
        stage: &'static str,
        message: String,
    },

    /// Anything unexpected. Logged with full context at the job boundary;
    /// the user-facing message stays generic.
    #[error("an internal error occurred during processing")]
    Internal(#[source] anyhow::Error),
}

impl JobError {
    pub fn collaborator(stage: &'static str, err: anyhow::Error) -> Self {
        Self::Collaborator {
            stage,
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<std::io::Error> for JobError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_message_is_generic() {
        let err = JobError::Internal(anyhow::anyhow!("secret diagnostic detail"));
        let shown = err.to_string();
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_collaborator_names_the_stage() {
        let err = JobError::collaborator("reel assembly", anyhow::anyhow!("exit code 1"));
        assert_eq!(err.to_string(), "reel assembly failed: exit code 1");
    }
}
