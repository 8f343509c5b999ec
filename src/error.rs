use std::path::PathBuf;

/// Run-level failures. Per-field synthesis failures never surface here; they
/// are recorded in the run report instead.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Please choose an Excel file")]
    MissingInput,

    #[error("Please choose an output folder")]
    MissingOutput,

    #[error("No audio to generate (empty inputs or options).")]
    NothingToDo,

    #[error("Failed to read spreadsheet {path}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Spreadsheet {0} contains no worksheet")]
    NoWorksheet(PathBuf),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize lesson data")]
    Json(#[from] serde_json::Error),

    #[error("Failed to start the build worker")]
    Worker(#[source] std::io::Error),
}

/// How a failure should be presented to the person running the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
    Error,
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BuildError::MissingInput | BuildError::MissingOutput => Severity::Warning,
            BuildError::NothingToDo => Severity::Info,
            _ => Severity::Error,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BuildError::MissingInput => "Missing file",
            BuildError::MissingOutput => "Missing output",
            BuildError::NothingToDo => "No tasks",
            BuildError::Spreadsheet { .. } | BuildError::NoWorksheet(_) => "Unreadable spreadsheet",
            BuildError::Io { .. } | BuildError::Json(_) | BuildError::Worker(_) => "Build failed",
        }
    }

    /// Message including the whole source chain, for dialogs and logs.
    pub fn detail(&self) -> String {
        let mut msg = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            msg.push_str(": ");
            msg.push_str(&err.to_string());
            source = err.source();
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_are_warnings() {
        assert_eq!(BuildError::MissingInput.severity(), Severity::Warning);
        assert_eq!(BuildError::MissingOutput.severity(), Severity::Warning);
        assert_eq!(BuildError::NothingToDo.severity(), Severity::Info);
    }

    #[test]
    fn detail_includes_source() {
        let err = BuildError::io(
            "/tmp/out/lesson.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.detail(), "I/O error on /tmp/out/lesson.json: denied");
    }
}
