use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crypto::ProfileId;
use crate::dataset::Dataset;
use crate::linked_data::{ContentAddress, IPFS_PREFIX};
use crate::p2p::TransportError;
use crate::repo::RepoError;

/// Peername alias for the local profile
pub const ME: &str = "me";
/// Longest peername or dataset name we accept
pub const MAX_NAME_LEN: usize = 64;

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap_or_else(|e| unreachable!("{e}"))
    })
}

/// Whether `s` is usable as a peername or dataset name
pub fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_NAME_LEN && name_pattern().is_match(s)
}

#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("malformed reference '{input}': {reason}")]
    Malformed { input: String, reason: String },
    #[error("ambiguous reference '{reference}': matches {candidates} profiles")]
    Ambiguous { reference: String, candidates: usize },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("timed out resolving {0}")]
    Timeout(String),
    #[error("repo error: {0}")]
    Repo(#[from] RepoError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl RefError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        RefError::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Pointer to a dataset (or, with no name, to a peer).
///
/// Parsed from `peername/name[@address]`, a bare `peername`, or a bare
///  content address. Canonicalization fills in `profile_id` and `path`;
///  once both are set the ref is canonical and should be treated as a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRef {
    pub peername: String,
    pub profile_id: Option<ProfileId>,
    pub name: String,
    pub path: Option<ContentAddress>,
    /// Materialized manifest, when the caller asked for it
    pub dataset: Option<Dataset>,
}

impl DatasetRef {
    pub fn new(peername: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            peername: peername.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_path(path: ContentAddress) -> Self {
        Self {
            path: Some(path),
            ..Default::default()
        }
    }

    /// Parse a reference string.
    ///
    /// A string without a `/` (or starting with `/ipfs/`) is first read as a
    ///  content address and only otherwise as a peername.
    pub fn parse(input: &str) -> Result<Self, RefError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(RefError::malformed(input, "empty reference"));
        }

        let (names, at) = match s.split_once('@') {
            Some((names, at)) => (names, Some(at)),
            None => (s, None),
        };

        if at.is_none() && (s.starts_with(IPFS_PREFIX) || !s.contains('/')) {
            if let Ok(path) = s.parse::<ContentAddress>() {
                return Ok(Self::from_path(path));
            }
            if s.starts_with(IPFS_PREFIX) {
                return Err(RefError::malformed(input, "invalid content address"));
            }
        }

        let segments: Vec<&str> = names.split('/').collect();
        let mut parsed = match segments.as_slice() {
            [peername] if at.is_none() => Self::new(*peername, ""),
            [_] => return Err(RefError::malformed(input, "'@' requires peername/name")),
            [peername, name] => Self::new(*peername, *name),
            _ => return Err(RefError::malformed(input, "too many path segments")),
        };

        if !is_valid_name(&parsed.peername) {
            return Err(RefError::malformed(
                input,
                format!("invalid peername '{}'", parsed.peername),
            ));
        }
        if segments.len() == 2 && !is_valid_name(&parsed.name) {
            return Err(RefError::malformed(
                input,
                format!("invalid dataset name '{}'", parsed.name),
            ));
        }

        if let Some(at) = at {
            let path = at
                .parse::<ContentAddress>()
                .map_err(|e| RefError::malformed(input, e.to_string()))?;
            parsed.path = Some(path);
        }

        Ok(parsed)
    }

    /// Neither names nor a path
    pub fn is_empty(&self) -> bool {
        self.peername.is_empty() && self.name.is_empty() && self.path.is_none()
    }

    /// Names a peer, not a dataset
    pub fn is_peer_ref(&self) -> bool {
        !self.peername.is_empty() && self.name.is_empty() && self.path.is_none()
    }

    /// Both owner and content are pinned down
    pub fn is_canonical(&self) -> bool {
        self.profile_id.is_some() && self.path.is_some()
    }

    /// Whether resolving this ref further needs the network. Peer refs need
    ///  a profile id, dataset refs need a content address.
    pub fn needs_network(&self) -> bool {
        if self.is_peer_ref() {
            self.profile_id.is_none()
        } else {
            self.path.is_none()
        }
    }

    /// Whether this and `other` name the same dataset by peername and name
    pub fn same_name(&self, other: &DatasetRef) -> bool {
        self.peername == other.peername && self.name == other.name
    }

    /// Namespace address of this ref: `peername/name`, or just the
    ///  peername for peer refs
    pub fn address(&self) -> String {
        if self.name.is_empty() {
            self.peername.clone()
        } else {
            format!("{}/{}", self.peername, self.name)
        }
    }

    /// Copy of this ref with the materialized dataset dropped
    pub fn without_dataset(&self) -> Self {
        Self {
            dataset: None,
            ..self.clone()
        }
    }
}

impl FromStr for DatasetRef {
    type Err = RefError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.address();
        match (&self.path, names.is_empty()) {
            (Some(path), true) => write!(f, "{}", path.to_path()),
            (Some(path), false) => write!(f, "{}@{}", names, path.to_path()),
            (None, _) => write!(f, "{}", names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

    #[test]
    fn test_parse_dataset_ref() {
        let r = DatasetRef::parse("b5/comics").unwrap();
        assert_eq!(r.peername, "b5");
        assert_eq!(r.name, "comics");
        assert!(r.path.is_none());
        assert!(r.needs_network());
        assert!(!r.is_peer_ref());
    }

    #[test]
    fn test_parse_bare_hash() {
        for input in [HASH.to_string(), format!("/ipfs/{}", HASH)] {
            let r = DatasetRef::parse(&input).unwrap();
            assert!(r.peername.is_empty());
            assert!(r.name.is_empty());
            assert_eq!(r.path.unwrap().to_string(), HASH);
            assert!(!r.needs_network());
        }
    }

    #[test]
    fn test_parse_pinned_version() {
        let r = DatasetRef::parse(&format!("b5/comics@/ipfs/{}", HASH)).unwrap();
        assert_eq!(r.address(), "b5/comics");
        assert!(r.path.is_some());
        assert_eq!(r.to_string(), format!("b5/comics@/ipfs/{}", HASH));
    }

    #[test]
    fn test_parse_peer_ref() {
        let r = DatasetRef::parse("b5").unwrap();
        assert!(r.is_peer_ref());
        assert_eq!(r.to_string(), "b5");
    }

    #[test]
    fn test_malformed() {
        for input in [
            "",
            "   ",
            "a/b/c",
            "b5/",
            "/comics",
            "b5/comics@",
            "b5/comics@nope",
            "b5@",
            "9lives/comics",
            "b5/com ics",
            "/ipfs/nope",
        ] {
            assert!(
                matches!(DatasetRef::parse(input), Err(RefError::Malformed { .. })),
                "expected {:?} to be malformed",
                input
            );
        }
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(DatasetRef::parse(&format!("b5/{}", long)).is_err());
    }

    #[test]
    fn test_empty_and_canonical() {
        assert!(DatasetRef::default().is_empty());
        let r = DatasetRef::parse(HASH).unwrap();
        assert!(!r.is_empty());
        assert!(!r.is_canonical());
    }
}
