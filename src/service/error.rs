use std::{fmt, io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

use super::keys::KeyError;
use crate::routeros::error::RouterError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("router unreachable: {0}")]
    Transport(RouterError),
    #[error("router rejected credentials ({0})")]
    Auth(StatusCode),
    #[error("{0} not found")]
    NotFound(String),
    #[error("ip pool exhausted")]
    PoolExhausted,
    #[error("peer registration rejected: {0}")]
    RegistrationRejected(String),
    #[error("key tool unavailable: {0}")]
    KeyToolUnavailable(#[from] KeyError),
    #[error("can't write {}: {source}", .path.display())]
    ConfigWrite { path: PathBuf, source: io::Error },
}

impl From<RouterError> for ServiceError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Auth(status) => Self::Auth(status),
            e => Self::Transport(e),
        }
    }
}

impl ServiceError {
    /// Classification of a failed peer PUT: anything the router answered
    /// with, other than a credential failure, is a rejection.
    pub fn registration(e: RouterError) -> Self {
        match e {
            RouterError::Status { status, detail } => {
                Self::RegistrationRejected(format!("{status}: {detail}"))
            }
            e => e.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveServerPubkey,
    ResolveSubnet,
    AllocateAddress,
    GenerateKeypair,
    WriteConfig,
    RegisterPeer,
    CreateInterface,
    AssignAddress,
    OpenTunnelPort,
    AllowLanAccess,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ResolveServerPubkey => "resolve server public key",
            Stage::ResolveSubnet => "resolve subnet",
            Stage::AllocateAddress => "allocate address",
            Stage::GenerateKeypair => "generate key pair",
            Stage::WriteConfig => "write client config",
            Stage::RegisterPeer => "register peer",
            Stage::CreateInterface => "create interface",
            Stage::AssignAddress => "assign address range",
            Stage::OpenTunnelPort => "open tunnel port",
            Stage::AllowLanAccess => "allow lan access",
        })
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: ServiceError,
}

/// Attaches the failing stage to an error.
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<ServiceError>> StageExt<T> for Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError {
            stage,
            source: e.into(),
        })
    }
}
