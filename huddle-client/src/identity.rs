//! Persistent member identity.
//!
//! A client keeps the same member id across restarts and reconnects so the
//! registry sees a rejoin rather than a new participant.
//!
//! Path resolution:
//! 1. `HUDDLE_IDENTITY_PATH` (full path), or
//! 2. `$HOME/.huddle/member-id`
//!
//! An existing but empty or unreadable file is an error; it is never
//! regenerated behind the caller's back.

use huddle_core::MemberId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const ENV_IDENTITY_PATH: &str = "HUDDLE_IDENTITY_PATH";

const DEFAULT_DIR_NAME: &str = ".huddle";
const DEFAULT_FILE_NAME: &str = "member-id";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("cannot resolve identity path: neither {ENV_IDENTITY_PATH} nor HOME is set")]
    NoHomePath,
    #[error("identity file {0:?} is empty")]
    Empty(PathBuf),
    #[error("identity store I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn resolve() -> Result<Self, IdentityError> {
        if let Ok(custom) = std::env::var(ENV_IDENTITY_PATH) {
            if !custom.is_empty() {
                return Ok(Self::new(custom));
            }
        }
        match std::env::var("HOME") {
            Ok(home) if !home.is_empty() => Ok(Self::new(
                PathBuf::from(home)
                    .join(DEFAULT_DIR_NAME)
                    .join(DEFAULT_FILE_NAME),
            )),
            _ => Err(IdentityError::NoHomePath),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_create(&self) -> Result<MemberId, IdentityError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                MemberId::parse(contents.trim()).map_err(|_| IdentityError::Empty(self.path.clone()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let member = MemberId::generate();
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, member.as_str())?;
                info!("Created member identity {} at {:?}", member, self.path);
                Ok(member)
            }
            Err(e) => Err(e.into()),
        }
    }
}
