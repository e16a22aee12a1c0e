//! Request and response envelopes exchanged with a store.
//!
//! A [`Request`] carries one command plus the routing metadata stamped on
//! it just before sending. A [`Response`] carries the matching body, and
//! every body may embed a [`RegionError`]. Both envelopes serialize as
//! named MsgPack so transports can move them as opaque bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::KvContext;
use crate::region_error::RegionError;

// ---------------------------------------------------------------------------
// CmdType
// ---------------------------------------------------------------------------

/// Discriminant shared by a request command and its response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CmdType {
    Get,
    Scan,
    BatchGet,
    Prewrite,
    Commit,
    Cleanup,
    BatchRollback,
    ResolveLock,
    RawGet,
    RawPut,
    RawDelete,
    Cop,
}

impl CmdType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Scan => "Scan",
            Self::BatchGet => "BatchGet",
            Self::Prewrite => "Prewrite",
            Self::Commit => "Commit",
            Self::Cleanup => "Cleanup",
            Self::BatchRollback => "BatchRollback",
            Self::ResolveLock => "ResolveLock",
            Self::RawGet => "RawGet",
            Self::RawPut => "RawPut",
            Self::RawDelete => "RawDelete",
            Self::Cop => "Cop",
        }
    }
}

impl fmt::Display for CmdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shared payload pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationOp {
    Put,
    Delete,
    Lock,
}

/// A single write within a prewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    pub op: MutationOp,
    #[serde(with = "serde_bytes")]
    pub key: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KvPair {
    #[serde(with = "serde_bytes")]
    pub key: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

/// Half-open key range used by coprocessor requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRange {
    #[serde(with = "serde_bytes")]
    pub start: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub end: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Command body of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    Get {
        #[serde(with = "serde_bytes")]
        key: Vec<u8>,
        version: u64,
    },
    Scan {
        #[serde(with = "serde_bytes")]
        start_key: Vec<u8>,
        limit: u32,
        version: u64,
        key_only: bool,
    },
    BatchGet {
        keys: Vec<serde_bytes::ByteBuf>,
        version: u64,
    },
    Prewrite {
        mutations: Vec<Mutation>,
        #[serde(with = "serde_bytes")]
        primary_lock: Vec<u8>,
        start_version: u64,
        lock_ttl: u64,
    },
    Commit {
        keys: Vec<serde_bytes::ByteBuf>,
        start_version: u64,
        commit_version: u64,
    },
    Cleanup {
        #[serde(with = "serde_bytes")]
        key: Vec<u8>,
        start_version: u64,
    },
    BatchRollback {
        keys: Vec<serde_bytes::ByteBuf>,
        start_version: u64,
    },
    ResolveLock {
        start_version: u64,
        commit_version: u64,
    },
    RawGet {
        #[serde(with = "serde_bytes")]
        key: Vec<u8>,
    },
    RawPut {
        #[serde(with = "serde_bytes")]
        key: Vec<u8>,
        #[serde(with = "serde_bytes")]
        value: Vec<u8>,
    },
    RawDelete {
        #[serde(with = "serde_bytes")]
        key: Vec<u8>,
    },
    Cop {
        tp: i64,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
        ranges: Vec<KeyRange>,
    },
}

impl Command {
    #[must_use]
    pub fn cmd_type(&self) -> CmdType {
        match self {
            Self::Get { .. } => CmdType::Get,
            Self::Scan { .. } => CmdType::Scan,
            Self::BatchGet { .. } => CmdType::BatchGet,
            Self::Prewrite { .. } => CmdType::Prewrite,
            Self::Commit { .. } => CmdType::Commit,
            Self::Cleanup { .. } => CmdType::Cleanup,
            Self::BatchRollback { .. } => CmdType::BatchRollback,
            Self::ResolveLock { .. } => CmdType::ResolveLock,
            Self::RawGet { .. } => CmdType::RawGet,
            Self::RawPut { .. } => CmdType::RawPut,
            Self::RawDelete { .. } => CmdType::RawDelete,
            Self::Cop { .. } => CmdType::Cop,
        }
    }
}

/// Request envelope: a command plus the routing metadata of the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Routing metadata, stamped once per attempt. `None` until first sent.
    pub context: Option<KvContext>,
    pub command: Command,
}

impl Request {
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            context: None,
            command,
        }
    }

    #[must_use]
    pub fn cmd_type(&self) -> CmdType {
        self.command.cmd_type()
    }

    /// Stamps routing metadata, replacing whatever a previous attempt set.
    pub fn set_context(&mut self, context: KvContext) {
        self.context = Some(context);
    }

    /// Serializes the request as named MsgPack.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Encode` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Deserializes a request from named MsgPack.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Decode` on malformed input.
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Response body. Every variant may embed a region error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseBody {
    Get {
        region_error: Option<RegionError>,
        #[serde(with = "serde_bytes")]
        value: Option<Vec<u8>>,
        key_error: Option<String>,
    },
    Scan {
        region_error: Option<RegionError>,
        pairs: Vec<KvPair>,
    },
    BatchGet {
        region_error: Option<RegionError>,
        pairs: Vec<KvPair>,
    },
    Prewrite {
        region_error: Option<RegionError>,
        key_errors: Vec<String>,
    },
    Commit {
        region_error: Option<RegionError>,
        key_error: Option<String>,
    },
    Cleanup {
        region_error: Option<RegionError>,
        key_error: Option<String>,
        commit_version: u64,
    },
    BatchRollback {
        region_error: Option<RegionError>,
        key_error: Option<String>,
    },
    ResolveLock {
        region_error: Option<RegionError>,
        key_error: Option<String>,
    },
    RawGet {
        region_error: Option<RegionError>,
        #[serde(with = "serde_bytes")]
        value: Option<Vec<u8>>,
        error: Option<String>,
    },
    RawPut {
        region_error: Option<RegionError>,
        error: Option<String>,
    },
    RawDelete {
        region_error: Option<RegionError>,
        error: Option<String>,
    },
    Cop {
        region_error: Option<RegionError>,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
        other_error: Option<String>,
    },
}

impl ResponseBody {
    #[must_use]
    pub fn cmd_type(&self) -> CmdType {
        match self {
            Self::Get { .. } => CmdType::Get,
            Self::Scan { .. } => CmdType::Scan,
            Self::BatchGet { .. } => CmdType::BatchGet,
            Self::Prewrite { .. } => CmdType::Prewrite,
            Self::Commit { .. } => CmdType::Commit,
            Self::Cleanup { .. } => CmdType::Cleanup,
            Self::BatchRollback { .. } => CmdType::BatchRollback,
            Self::ResolveLock { .. } => CmdType::ResolveLock,
            Self::RawGet { .. } => CmdType::RawGet,
            Self::RawPut { .. } => CmdType::RawPut,
            Self::RawDelete { .. } => CmdType::RawDelete,
            Self::Cop { .. } => CmdType::Cop,
        }
    }

    #[must_use]
    pub fn region_error(&self) -> Option<&RegionError> {
        match self {
            Self::Get { region_error, .. }
            | Self::Scan { region_error, .. }
            | Self::BatchGet { region_error, .. }
            | Self::Prewrite { region_error, .. }
            | Self::Commit { region_error, .. }
            | Self::Cleanup { region_error, .. }
            | Self::BatchRollback { region_error, .. }
            | Self::ResolveLock { region_error, .. }
            | Self::RawGet { region_error, .. }
            | Self::RawPut { region_error, .. }
            | Self::RawDelete { region_error, .. }
            | Self::Cop { region_error, .. } => region_error.as_ref(),
        }
    }

    /// Empty body of the given type carrying only `err`.
    #[must_use]
    pub fn from_region_error(cmd_type: CmdType, err: RegionError) -> Self {
        let region_error = Some(err);
        match cmd_type {
            CmdType::Get => Self::Get {
                region_error,
                value: None,
                key_error: None,
            },
            CmdType::Scan => Self::Scan {
                region_error,
                pairs: Vec::new(),
            },
            CmdType::BatchGet => Self::BatchGet {
                region_error,
                pairs: Vec::new(),
            },
            CmdType::Prewrite => Self::Prewrite {
                region_error,
                key_errors: Vec::new(),
            },
            CmdType::Commit => Self::Commit {
                region_error,
                key_error: None,
            },
            CmdType::Cleanup => Self::Cleanup {
                region_error,
                key_error: None,
                commit_version: 0,
            },
            CmdType::BatchRollback => Self::BatchRollback {
                region_error,
                key_error: None,
            },
            CmdType::ResolveLock => Self::ResolveLock {
                region_error,
                key_error: None,
            },
            CmdType::RawGet => Self::RawGet {
                region_error,
                value: None,
                error: None,
            },
            CmdType::RawPut => Self::RawPut {
                region_error,
                error: None,
            },
            CmdType::RawDelete => Self::RawDelete {
                region_error,
                error: None,
            },
            CmdType::Cop => Self::Cop {
                region_error,
                data: Vec::new(),
                other_error: None,
            },
        }
    }
}

/// Response envelope.
///
/// `body` is optional on the wire; a response without a body, or with a
/// body of a different type than `cmd_type`, is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub cmd_type: CmdType,
    pub body: Option<ResponseBody>,
}

impl Response {
    /// Wraps a body, taking its type as the response type.
    #[must_use]
    pub fn new(body: ResponseBody) -> Self {
        Self {
            cmd_type: body.cmd_type(),
            body: Some(body),
        }
    }

    /// Synthesizes a response to `req` that carries only `err`.
    #[must_use]
    pub fn region_error_for(req: &Request, err: RegionError) -> Self {
        Self::new(ResponseBody::from_region_error(req.cmd_type(), err))
    }

    /// Extracts the embedded region error, if any.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::MissingBody` if the response has no body, and
    /// `EnvelopeError::TypeMismatch` if the body does not match `cmd_type`.
    pub fn region_error(&self) -> Result<Option<&RegionError>, EnvelopeError> {
        let body = self.body.as_ref().ok_or(EnvelopeError::MissingBody {
            cmd_type: self.cmd_type,
        })?;
        if body.cmd_type() != self.cmd_type {
            return Err(EnvelopeError::TypeMismatch {
                expected: self.cmd_type,
                actual: body.cmd_type(),
            });
        }
        Ok(body.region_error())
    }

    /// Serializes the response as named MsgPack.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Encode` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Deserializes a response from named MsgPack.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Decode` on malformed input.
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// EnvelopeError
// ---------------------------------------------------------------------------

/// Errors from inspecting or (de)serializing an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("{cmd_type} response has no body")]
    MissingBody { cmd_type: CmdType },
    #[error("response body type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: CmdType, actual: CmdType },
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
