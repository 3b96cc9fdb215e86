use core::fmt;

use crate::station::StateId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    NotAuthorized,
    InvalidNetwork,
    MissingConfig,
    EmptyCredential,
    PrimitiveFailed(&'static str),
    NotInState(StateId),
    NotConnected,
    WpsInProgress,
    WpsOverlap,
    WpsTimedOut,
    WpsFailed(u16),
    WpsCancelled,
}

impl CommandError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthorized => "not_authorized",
            Self::InvalidNetwork => "invalid_network",
            Self::MissingConfig => "missing_config",
            Self::EmptyCredential => "empty_credential",
            Self::PrimitiveFailed(_) => "primitive_failed",
            Self::NotInState(_) => "not_in_state",
            Self::NotConnected => "not_connected",
            Self::WpsInProgress => "wps_in_progress",
            Self::WpsOverlap => "wps_overlap",
            Self::WpsTimedOut => "wps_timed_out",
            Self::WpsFailed(_) => "wps_failed",
            Self::WpsCancelled => "wps_cancelled",
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimitiveFailed(primitive) => write!(f, "{} ({primitive})", self.as_str()),
            Self::NotInState(state) => write!(f, "{} ({})", self.as_str(), state.as_str()),
            Self::WpsFailed(code) => write!(f, "{} (config error {code})", self.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(feature = "policy-file")]
#[derive(Debug)]
pub enum PolicyError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

#[cfg(feature = "policy-file")]
impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "policy read failed: {err}"),
            Self::Parse(err) => write!(f, "policy parse failed: {err}"),
        }
    }
}

#[cfg(feature = "policy-file")]
impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}
