use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::ProfileId;
use crate::linked_data::ContentAddress;

/// Whether a profile belongs to a person or an organization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    #[default]
    User,
    Organization,
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileType::User => write!(f, "user"),
            ProfileType::Organization => write!(f, "organization"),
        }
    }
}

impl std::str::FromStr for ProfileType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ProfileType::User),
            "organization" => Ok(ProfileType::Organization),
            other => Err(format!("unknown profile type '{}'", other)),
        }
    }
}

/// Identity record of a peer.
///
/// `id` is fixed for the life of the node that owns the profile. Every
///  other field is display metadata that may be edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub peername: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    pub email: String,
    pub name: String,
    pub description: String,
    pub home_url: String,
    pub color: String,
    pub twitter: String,
    pub photo: Option<ContentAddress>,
    pub thumb: Option<ContentAddress>,
    pub poster: Option<ContentAddress>,
}

impl Profile {
    pub fn new(id: ProfileId, peername: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            peername: peername.into(),
            created: now,
            updated: now,
            profile_type: ProfileType::User,
            email: String::new(),
            name: String::new(),
            description: String::new(),
            home_url: String::new(),
            color: String::new(),
            twitter: String::new(),
            photo: None,
            thumb: None,
            poster: None,
        }
    }

    /// Collapse the set fields of each edit onto this profile, in order.
    /// Empty strings and absent fields leave the current value alone.
    pub fn assign_editable<'a>(&mut self, edits: impl IntoIterator<Item = &'a ProfileEdit>) {
        let mut touched = false;
        for edit in edits {
            touched |= assign(&mut self.peername, &edit.peername);
            touched |= assign(&mut self.email, &edit.email);
            touched |= assign(&mut self.name, &edit.name);
            touched |= assign(&mut self.description, &edit.description);
            touched |= assign(&mut self.home_url, &edit.home_url);
            touched |= assign(&mut self.color, &edit.color);
            touched |= assign(&mut self.twitter, &edit.twitter);
            if let Some(t) = edit.profile_type {
                self.profile_type = t;
                touched = true;
            }
        }
        if touched {
            self.updated = Utc::now();
        }
    }
}

fn assign(field: &mut String, value: &Option<String>) -> bool {
    match value {
        Some(v) if !v.is_empty() => {
            *field = v.clone();
            true
        }
        _ => false,
    }
}

/// The editable subset of a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileEdit {
    pub peername: Option<String>,
    #[serde(rename = "type")]
    pub profile_type: Option<ProfileType>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub home_url: Option<String>,
    pub color: Option<String>,
    pub twitter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;

    #[test]
    fn test_assign_editable_skips_empty() {
        let mut profile = Profile::new(SecretKey::generate().public(), "b5");
        profile.email = "b5@example.com".into();
        let before = profile.updated;

        let first = ProfileEdit {
            name: Some("Brendan".into()),
            email: Some(String::new()),
            ..Default::default()
        };
        let second = ProfileEdit {
            color: Some("#ff0000".into()),
            profile_type: Some(ProfileType::Organization),
            ..Default::default()
        };
        profile.assign_editable([&first, &second]);

        assert_eq!(profile.peername, "b5");
        assert_eq!(profile.email, "b5@example.com");
        assert_eq!(profile.name, "Brendan");
        assert_eq!(profile.color, "#ff0000");
        assert_eq!(profile.profile_type, ProfileType::Organization);
        assert!(profile.updated >= before);
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = Profile::new(SecretKey::generate().public(), "b5");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["homeUrl"], "");
        assert!(json["photo"].is_null());
    }
}
