//! Target specs given on the command line
//!
//! A spec is a target name with an optional `:`-separated argument, such as
//! `clean:all`, `get:serde` or `package:bdist:gztar`.

use std::fmt;
use std::str::FromStr;

use buildstack_engine::BuildStack;
use thiserror::Error;

/// Errors raised while parsing a target spec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The target name is not known
    #[error("{0}: unknown target")]
    Unknown(String),

    /// The target requires an argument
    #[error("{target}: missing argument, expected {target}:<{argument}>")]
    MissingArgument {
        /// Target name
        target: String,
        /// Name of the expected argument
        argument: &'static str,
    },

    /// The target takes no argument
    #[error("{target}: unexpected argument '{argument}'")]
    UnexpectedArgument {
        /// Target name
        target: String,
        /// The argument given
        argument: String,
    },
}

/// One lifecycle request parsed from a target spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRequest {
    /// `get:<id>`
    Get(String),
    /// `clean[:<scope>]`
    Clean(Option<String>),
    /// `compile`
    Compile,
    /// `test`
    Test,
    /// `package[:<format>]`
    Package(Option<String>),
    /// `publish[:<repository>]`
    Publish(Option<String>),
    /// `install[:<inventory>]` and `uninstall[:<inventory>]`
    Install {
        /// Inventory identifier
        inventory: Option<String>,
        /// Reverse the installation
        uninstall: bool,
    },
    /// `develop` and `undevelop`
    Develop {
        /// Reverse the development installation
        uninstall: bool,
    },
    /// `release[:<kind>]`
    Release(Option<String>),
}

impl TargetRequest {
    /// Hand the request to a session
    ///
    /// `message` is only used by `release`.
    pub fn apply(
        &self,
        stack: &BuildStack,
        message: Option<&str>,
    ) -> buildstack_core::Result<()> {
        match self {
            Self::Get(requirement) => stack.get(requirement),
            Self::Clean(scope) => stack.clean(scope.as_deref()),
            Self::Compile => stack.compile(),
            Self::Test => stack.test(),
            Self::Package(format) => stack.package(format.as_deref()),
            Self::Publish(repository) => stack.publish(repository.as_deref()),
            Self::Install {
                inventory,
                uninstall,
            } => stack.install(inventory.as_deref(), *uninstall),
            Self::Develop { uninstall } => stack.develop(*uninstall),
            Self::Release(kind) => stack.release(kind.as_deref(), message),
        }
    }
}

fn no_argument(
    target: &str,
    argument: Option<String>,
    request: TargetRequest,
) -> Result<TargetRequest, RequestError> {
    match argument {
        Some(argument) => Err(RequestError::UnexpectedArgument {
            target: target.to_string(),
            argument,
        }),
        None => Ok(request),
    }
}

impl FromStr for TargetRequest {
    type Err = RequestError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (name, argument) = match spec.split_once(':') {
            Some((name, argument)) => (name, Some(argument)),
            None => (spec, None),
        };
        let argument = argument.filter(|a| !a.is_empty()).map(str::to_string);

        match name {
            "get" => argument.map(Self::Get).ok_or(RequestError::MissingArgument {
                target: name.to_string(),
                argument: "requirement",
            }),
            "clean" => Ok(Self::Clean(argument)),
            "compile" => no_argument(name, argument, Self::Compile),
            "test" => no_argument(name, argument, Self::Test),
            "package" => Ok(Self::Package(argument)),
            "publish" => Ok(Self::Publish(argument)),
            "install" => Ok(Self::Install {
                inventory: argument,
                uninstall: false,
            }),
            "uninstall" => Ok(Self::Install {
                inventory: argument,
                uninstall: true,
            }),
            "develop" => no_argument(name, argument, Self::Develop { uninstall: false }),
            "undevelop" => no_argument(name, argument, Self::Develop { uninstall: true }),
            "release" => Ok(Self::Release(argument)),
            _ => Err(RequestError::Unknown(spec.to_string())),
        }
    }
}

impl fmt::Display for TargetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, argument) = match self {
            Self::Get(id) => ("get", Some(id)),
            Self::Clean(scope) => ("clean", scope.as_ref()),
            Self::Compile => ("compile", None),
            Self::Test => ("test", None),
            Self::Package(format) => ("package", format.as_ref()),
            Self::Publish(repository) => ("publish", repository.as_ref()),
            Self::Install {
                inventory,
                uninstall,
            } => (
                if *uninstall { "uninstall" } else { "install" },
                inventory.as_ref(),
            ),
            Self::Develop { uninstall } => {
                (if *uninstall { "undevelop" } else { "develop" }, None)
            }
            Self::Release(kind) => ("release", kind.as_ref()),
        };
        match argument {
            Some(argument) => write!(f, "{name}:{argument}"),
            None => f.write_str(name),
        }
    }
}

/// Parse every spec, failing on the first invalid one
pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Vec<TargetRequest>, RequestError> {
    specs.iter().map(|s| s.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn test_plain_targets() {
        assert_eq!("compile".parse::<TargetRequest>(), Ok(TargetRequest::Compile));
        assert_eq!("test".parse::<TargetRequest>(), Ok(TargetRequest::Test));
        assert_eq!("clean".parse::<TargetRequest>(), Ok(TargetRequest::Clean(None)));
        assert_eq!(
            "develop".parse::<TargetRequest>(),
            Ok(TargetRequest::Develop { uninstall: false })
        );
        assert_eq!(
            "undevelop".parse::<TargetRequest>(),
            Ok(TargetRequest::Develop { uninstall: true })
        );
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            "get:serde".parse::<TargetRequest>(),
            Ok(TargetRequest::Get("serde".to_string()))
        );
        assert_eq!(
            "clean:all".parse::<TargetRequest>(),
            Ok(TargetRequest::Clean(Some("all".to_string())))
        );
        assert_eq!(
            "uninstall:hosts".parse::<TargetRequest>(),
            Ok(TargetRequest::Install {
                inventory: Some("hosts".to_string()),
                uninstall: true,
            })
        );
        assert_eq!(
            "release:minor".parse::<TargetRequest>(),
            Ok(TargetRequest::Release(Some("minor".to_string())))
        );
    }

    #[test]
    fn test_argument_keeps_later_colons() {
        assert_eq!(
            "package:bdist:gztar".parse::<TargetRequest>(),
            Ok(TargetRequest::Package(Some("bdist:gztar".to_string())))
        );
    }

    #[test]
    fn test_empty_argument_is_absent() {
        assert_eq!("publish:".parse::<TargetRequest>(), Ok(TargetRequest::Publish(None)));
    }

    #[test]
    fn test_get_requires_requirement() {
        let err = "get".parse::<TargetRequest>().unwrap_err();
        assert!(matches!(err, RequestError::MissingArgument { .. }));
        assert!("get:".parse::<TargetRequest>().is_err());
    }

    #[test]
    fn test_unexpected_argument() {
        let err = "compile:fast".parse::<TargetRequest>().unwrap_err();
        assert_eq!(err.to_string(), "compile: unexpected argument 'fast'");
    }

    #[test]
    fn test_unknown_target() {
        let err = "deploy".parse::<TargetRequest>().unwrap_err();
        assert_eq!(err.to_string(), "deploy: unknown target");
        assert!("flush".parse::<TargetRequest>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for spec in ["get:x", "clean:all", "uninstall", "undevelop", "package:bdist:zip"] {
            assert_eq!(spec.parse::<TargetRequest>().unwrap().to_string(), spec);
        }
    }

    #[test]
    fn test_parse_all_stops_on_first_error() {
        let err = parse_all(&["compile", "bogus", "nope"]).unwrap_err();
        assert_eq!(err, RequestError::Unknown("bogus".to_string()));
        assert_eq!(parse_all(&["compile", "test"]).unwrap().len(), 2);
    }
}
