use std::fmt;

/// Machine-readable error codes for scripts and agents driving `dsr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ServerNotConfigured,
    ReportNotFound,
    UnknownField,
    InvalidFieldValue,
    MissingRelationId,
    TransportFailed,
    GraphQlRejected,
    MalformedResponse,
    DispatcherClosed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ServerNotConfigured => "E1002",
            Self::ReportNotFound => "E2001",
            Self::UnknownField => "E2002",
            Self::InvalidFieldValue => "E2003",
            Self::MissingRelationId => "E2004",
            Self::TransportFailed => "E4001",
            Self::GraphQlRejected => "E4002",
            Self::MalformedResponse => "E4003",
            Self::DispatcherClosed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ServerNotConfigured => "Server URL not configured",
            Self::ReportNotFound => "Report not found",
            Self::UnknownField => "Unknown report field",
            Self::InvalidFieldValue => "Invalid field value",
            Self::MissingRelationId => "Relation id missing for edge deletion",
            Self::TransportFailed => "Remote call failed",
            Self::GraphQlRejected => "Server rejected the operation",
            Self::MalformedResponse => "Malformed server response",
            Self::DispatcherClosed => "Dispatcher closed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .dossier/config.toml and retry."),
            Self::ServerNotConfigured => {
                Some("Pass --url, set DOSSIER_URL, or add [server] url to the config.")
            }
            Self::ReportNotFound => Some("Check the report id and your access rights."),
            Self::UnknownField => Some("Use one of: name, published, description."),
            Self::InvalidFieldValue => None,
            Self::MissingRelationId => {
                Some("Refresh the report so every edge carries its relation id.")
            }
            Self::TransportFailed => Some("Check network connectivity and the server URL."),
            Self::GraphQlRejected => Some("Inspect the server error message and your token."),
            Self::MalformedResponse => Some("Check that the server speaks the expected schema."),
            Self::DispatcherClosed => None,
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
            ErrorCode::ServerNotConfigured,
            ErrorCode::ReportNotFound,
            ErrorCode::UnknownField,
            ErrorCode::InvalidFieldValue,
            ErrorCode::MissingRelationId,
            ErrorCode::TransportFailed,
            ErrorCode::GraphQlRejected,
            ErrorCode::MalformedResponse,
            ErrorCode::DispatcherClosed,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::MissingRelationId.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }
}
