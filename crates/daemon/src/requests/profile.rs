use base64::Engine;
use serde::{Deserialize, Serialize};

use common::node::Node;
use common::profile::{Profile, ProfileEdit};
use common::reference::{is_valid_name, ME};

use super::{Dispatch, RequestError};

pub const GET_PROFILE: &str = "Profile.GetProfile";
pub const SAVE_PROFILE: &str = "Profile.SaveProfile";
pub const SAVE_PEERNAME: &str = "Profile.SavePeername";
pub const SET_PROFILE_PHOTO: &str = "Profile.SetProfilePhoto";
pub const SET_POSTER_PHOTO: &str = "Profile.SetPosterPhoto";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeernameParams {
    pub peername: String,
}

/// Image bytes, base64 encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoParams {
    pub data: String,
}

impl PhotoParams {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    fn decode(&self) -> Result<Vec<u8>, RequestError> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| RequestError::InvalidParams(format!("photo data: {}", e)))
    }
}

#[derive(Debug, Clone)]
pub struct ProfileRequests {
    dispatch: Dispatch,
}

impl ProfileRequests {
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    pub async fn get_profile(&self) -> Result<Profile, RequestError> {
        self.dispatch
            .run(GET_PROFILE, &(), |node| async move { Ok(node.profile()) })
            .await
    }

    /// Apply the non-empty fields of `edit` and persist the result
    pub async fn save_profile(&self, edit: &ProfileEdit) -> Result<Profile, RequestError> {
        self.dispatch
            .run(SAVE_PROFILE, edit, |node| async move {
                if let Some(peername) = &edit.peername {
                    check_peername(peername)?;
                }
                let profile = node.update_profile(|p| p.assign_editable(std::iter::once(edit)))?;
                node.save_config()?;
                Ok(profile)
            })
            .await
    }

    /// Change this node's peername. Refs it owns follow the new name.
    pub async fn save_peername(&self, params: &PeernameParams) -> Result<Profile, RequestError> {
        self.dispatch
            .run(SAVE_PEERNAME, params, |node| async move {
                check_peername(&params.peername)?;
                let profile = node.update_profile(|p| {
                    p.peername = params.peername.clone();
                    p.updated = chrono::Utc::now();
                })?;
                node.save_config()?;
                Ok(profile)
            })
            .await
    }

    pub async fn set_profile_photo(&self, params: &PhotoParams) -> Result<Profile, RequestError> {
        self.dispatch
            .run(SET_PROFILE_PHOTO, params, |node| async move {
                let address = store_image(&node, params).await?;
                let profile = node.update_profile(|p| {
                    p.photo = Some(address);
                    p.thumb = Some(address);
                    p.updated = chrono::Utc::now();
                })?;
                node.save_config()?;
                Ok(profile)
            })
            .await
    }

    pub async fn set_poster_photo(&self, params: &PhotoParams) -> Result<Profile, RequestError> {
        self.dispatch
            .run(SET_POSTER_PHOTO, params, |node| async move {
                let address = store_image(&node, params).await?;
                let profile = node.update_profile(|p| {
                    p.poster = Some(address);
                    p.updated = chrono::Utc::now();
                })?;
                node.save_config()?;
                Ok(profile)
            })
            .await
    }
}

fn check_peername(peername: &str) -> Result<(), RequestError> {
    if peername == ME || !is_valid_name(peername) {
        return Err(RequestError::InvalidParams(format!(
            "invalid peername '{}'",
            peername
        )));
    }
    Ok(())
}

async fn store_image(
    node: &Node,
    params: &PhotoParams,
) -> Result<common::linked_data::ContentAddress, RequestError> {
    let bytes = params.decode()?;
    if bytes.is_empty() {
        return Err(RequestError::InvalidParams("photo is empty".to_string()));
    }
    node.repo()
        .store()
        .put(bytes)
        .await
        .map_err(|e| RequestError::Internal(e.to_string()))
}
