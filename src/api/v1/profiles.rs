use crate::{
    api::v1::{ok_resp, ApiError, AuthUser, JSONResp, MaybeAuthUser},
    db::{profiles, profiles::Profile, DbConn},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProfileResp {
    profile: Profile,
}

#[get("/profiles/<username>")]
pub async fn get(
    conn: DbConn,
    auth: MaybeAuthUser,
    username: String,
) -> JSONResp<ProfileResp> {
    let viewer = auth.viewer();
    let profile = conn
        .run(move |c| profiles::by_username(&username, viewer, c))
        .await?;
    ok_resp(ProfileResp { profile })
}

#[post("/profiles/<username>/follow")]
pub async fn follow(
    conn: DbConn,
    auth: AuthUser,
    username: String,
) -> JSONResp<ProfileResp> {
    let viewer = auth.id();
    let profile = conn
        .run(move |c| -> Result<_, ApiError> {
            let mut profile = profiles::by_username(&username, Some(viewer), c)?;
            if profile.id == viewer {
                return Err(ApiError::unprocessable("cannot follow yourself"));
            }
            profiles::follow(viewer, profile.id, c)?;
            profile.following = true;
            Ok(profile)
        })
        .await?;
    ok_resp(ProfileResp { profile })
}

#[delete("/profiles/<username>/follow")]
pub async fn unfollow(
    conn: DbConn,
    auth: AuthUser,
    username: String,
) -> JSONResp<ProfileResp> {
    let viewer = auth.id();
    let profile = conn
        .run(move |c| -> Result<_, ApiError> {
            let mut profile = profiles::by_username(&username, Some(viewer), c)?;
            profiles::unfollow(viewer, profile.id, c)?;
            profile.following = false;
            Ok(profile)
        })
        .await?;
    ok_resp(ProfileResp { profile })
}
