use crate::processor::ProcessError;

/// A parsed request line.
///
/// Numbers are kept signed so that negative input reaches validation and is
/// reported as such instead of as a parse failure.
#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    GetPacks,
    SetPacks { sizes: Vec<i64> },
    Calculate { order: i64 },
    Quit,
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::GetPacks => "get_packs",
            Command::SetPacks { .. } => "set_packs",
            Command::Calculate { .. } => "calculate",
            Command::Quit => "quit",
        }
    }
}

/// How a request ended, used for the reply status line and the request log.
#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    Success,
    ClientError(String),
    ServerError(String),
}

impl Outcome {
    pub(crate) fn to_line(&self) -> Option<String> {
        match self {
            Outcome::Success => None,
            Outcome::ClientError(msg) => Some(format!("CLIENT_ERROR {}", msg)),
            Outcome::ServerError(msg) => Some(format!("SERVER_ERROR {}", msg)),
        }
    }
}

impl From<&ProcessError> for Outcome {
    fn from(err: &ProcessError) -> Self {
        if err.is_client_error() {
            Outcome::ClientError(err.to_string())
        } else {
            Outcome::ServerError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use pack_resolver::{InvariantViolation, ResolveError};

    use super::*;

    #[test]
    fn test_resolver_defects_are_server_errors() {
        let err = ProcessError::Resolve(
            InvariantViolation::BrokenReconstruction {
                target: 16,
                remaining: 4,
            }
            .into(),
        );
        let outcome = Outcome::from(&err);
        assert!(matches!(outcome, Outcome::ServerError(_)));
        assert_eq!(
            Some(
                "SERVER_ERROR internal invariant violated: reconstruction of 16 stalled with 4 remaining"
                    .to_string()
            ),
            outcome.to_line()
        );

        let err = ProcessError::Resolve(
            InvariantViolation::NoReachableTotal {
                order: 7,
                max_total: 9,
            }
            .into(),
        );
        assert!(Outcome::from(&err)
            .to_line()
            .unwrap()
            .starts_with("SERVER_ERROR internal invariant violated"));
    }

    #[test]
    fn test_resolver_preconditions_are_client_errors() {
        assert_eq!(
            Outcome::ClientError("no pack sizes provided".to_string()),
            Outcome::from(&ProcessError::Resolve(ResolveError::NoPackSizes))
        );
        assert_eq!(
            Outcome::ClientError("pack sizes must be positive".to_string()),
            Outcome::from(&ProcessError::Resolve(ResolveError::ZeroPackSize))
        );
        assert_eq!(
            Some("CLIENT_ERROR no pack configuration is active".to_string()),
            Outcome::from(&ProcessError::NotConfigured).to_line()
        );
        assert_eq!(None, Outcome::Success.to_line());
    }

    #[tokio::test]
    async fn test_failed_task_is_server_error() {
        let join_err = tokio::spawn(async { panic!("solver panicked") })
            .await
            .unwrap_err();
        let outcome = Outcome::from(&ProcessError::from(join_err));
        assert!(matches!(outcome, Outcome::ServerError(_)));
        assert!(outcome
            .to_line()
            .unwrap()
            .starts_with("SERVER_ERROR calculation task failed"));
    }
}
