use iroh_blobs::Hash;
use serde::{Deserialize, Serialize};

use crate::linked_data::ContentAddress;

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("block {0} does not match its address")]
    Corrupt(ContentAddress),
    #[error("package root {0} is not among its blocks")]
    MissingRoot(ContentAddress),
}

/// A blob travelling inside a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub address: ContentAddress,
    pub data: Vec<u8>,
}

/// Every blob reachable from one dataset manifest: the manifest itself,
///  its body and the full chain of previous versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub root: ContentAddress,
    pub blocks: Vec<Block>,
}

impl Package {
    /// Check the root is present and every block hashes to its address
    pub fn verify(&self) -> Result<(), PackageError> {
        if !self.blocks.iter().any(|b| b.address == self.root) {
            return Err(PackageError::MissingRoot(self.root));
        }
        for block in &self.blocks {
            if ContentAddress::from_hash(Hash::new(&block.data)) != block.address {
                return Err(PackageError::Corrupt(block.address));
            }
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.blocks.iter().map(|b| b.data.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(data: &[u8]) -> Block {
        Block {
            address: ContentAddress::from_hash(Hash::new(data)),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_verify() {
        let root = block(b"manifest");
        let body = block(b"[[1]]");
        let package = Package {
            root: root.address,
            blocks: vec![root.clone(), body.clone()],
        };
        assert!(package.verify().is_ok());

        let mut tampered = package.clone();
        tampered.blocks[1].data = b"[[2]]".to_vec();
        assert!(matches!(tampered.verify(), Err(PackageError::Corrupt(_))));

        let headless = Package {
            root: root.address,
            blocks: vec![body],
        };
        assert!(matches!(
            headless.verify(),
            Err(PackageError::MissingRoot(_))
        ));
    }
}
