use serde::{Deserialize, Serialize};

/// Version details baked in at compile time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub build_profile: String,
    pub build_features: Vec<String>,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "strata {} ({})", self.version, self.build_profile)?;
        if !self.build_features.is_empty() {
            write!(f, " [{}]", self.build_features.join(", "))?;
        }
        Ok(())
    }
}

pub fn build_info() -> BuildInfo {
    let build_profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };
    let mut build_features = Vec::new();
    if cfg!(test) {
        build_features.push("test".to_string());
    }
    BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_profile: build_profile.to_string(),
        build_features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let info = BuildInfo {
            version: "0.1.0".into(),
            build_profile: "release".into(),
            build_features: vec![],
        };
        assert_eq!(info.to_string(), "strata 0.1.0 (release)");
    }
}
