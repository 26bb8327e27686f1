use std::fmt;

/// Machine-readable error codes for run-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ItemNotFound,
    EmptyTask,
    DuplicateItemId,
    ForeignItem,
    StoreUnreadable,
    StoreCorrupt,
    StoreWriteFailed,
    LockContention,
    OracleTransport,
    OracleEmptyResponse,
    OracleMissingCredentials,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ItemNotFound => "E2001",
            Self::EmptyTask => "E2002",
            Self::DuplicateItemId => "E2003",
            Self::ForeignItem => "E2004",
            Self::StoreUnreadable => "E3001",
            Self::StoreCorrupt => "E3002",
            Self::StoreWriteFailed => "E3003",
            Self::LockContention => "E3004",
            Self::OracleTransport => "E4001",
            Self::OracleEmptyResponse => "E4002",
            Self::OracleMissingCredentials => "E4003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Action item not found",
            Self::EmptyTask => "Task text is empty",
            Self::DuplicateItemId => "Duplicate action item ID",
            Self::ForeignItem => "Action item belongs to another project",
            Self::StoreUnreadable => "Project store unreadable",
            Self::StoreCorrupt => "Project store corrupt",
            Self::StoreWriteFailed => "Project store write failed",
            Self::LockContention => "Lock contention",
            Self::OracleTransport => "Language model request failed",
            Self::OracleEmptyResponse => "Language model returned no content",
            Self::OracleMissingCredentials => "Language model API key missing",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the actrack config.toml and retry."),
            Self::ItemNotFound => Some("Run `actrack list --all` to see known item IDs."),
            Self::EmptyTask => Some("Provide a non-empty task description."),
            Self::DuplicateItemId | Self::ForeignItem | Self::StoreCorrupt => {
                Some("Inspect the project JSON file; restore it from a backup if it was hand-edited.")
            }
            Self::StoreUnreadable => Some("Check that the data directory exists and is readable."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other `actrack` process for this project finishes.")
            }
            Self::OracleTransport => Some("Check network access, base_url, and model name."),
            Self::OracleEmptyResponse => Some("Retry once; the provider may be overloaded."),
            Self::OracleMissingCredentials => {
                Some("Export the API key variable named by oracle.api_key_env.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::ItemNotFound,
            ErrorCode::EmptyTask,
            ErrorCode::DuplicateItemId,
            ErrorCode::ForeignItem,
            ErrorCode::StoreUnreadable,
            ErrorCode::StoreCorrupt,
            ErrorCode::StoreWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::OracleTransport,
            ErrorCode::OracleEmptyResponse,
            ErrorCode::OracleMissingCredentials,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::StoreCorrupt.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }
}
