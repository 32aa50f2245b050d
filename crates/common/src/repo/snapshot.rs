use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::RepoError;

pub const REFS_FILE: &str = "refs.json";
pub const PEERS_FILE: &str = "peers.json";
pub const PACKAGES_FILE: &str = "packages.json";

/// Read a JSON snapshot, falling back to the default when it does not exist yet
pub fn read<T: DeserializeOwned + Default>(dir: &Path, file: &str) -> Result<T, RepoError> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(T::default());
    }
    let data = std::fs::read(&path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Write a JSON snapshot through a temp file so readers never see a torn write
pub fn write<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<(), RepoError> {
    let path = dir.join(file);
    let tmp = dir.join(format!("{}.tmp", file));
    let data = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}
