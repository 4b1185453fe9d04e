use crate::schema::{follows, users};
use diesel::{dsl::exists, prelude::*};
use serde::Serialize;
use std::collections::HashSet;

/// Public view of a user, relative to whoever is looking.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    #[serde(skip_serializing)]
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub following: bool,
}

pub fn by_username(
    username: &str,
    viewer: Option<i64>,
    connection: &mut PgConnection,
) -> QueryResult<Profile> {
    let (id, username, bio, image) = users::table
        .filter(users::username.eq(username))
        .select((users::id, users::username, users::bio, users::image))
        .get_result::<(i64, String, String, Option<String>)>(connection)?;

    let following = match viewer {
        Some(viewer) => is_following(viewer, id, connection)?,
        None => false,
    };

    Ok(Profile {
        id,
        username,
        bio,
        image,
        following,
    })
}

pub fn is_following(
    follower: i64,
    followee: i64,
    connection: &mut PgConnection,
) -> QueryResult<bool> {
    diesel::select(exists(
        follows::table
            .filter(follows::follower_id.eq(follower))
            .filter(follows::followee_id.eq(followee)),
    ))
    .get_result(connection)
}

/// The subset of `candidates` that `viewer` follows.
pub fn followed_among(
    viewer: i64,
    candidates: &[i64],
    connection: &mut PgConnection,
) -> QueryResult<HashSet<i64>> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }
    let followed = follows::table
        .filter(follows::follower_id.eq(viewer))
        .filter(follows::followee_id.eq_any(candidates))
        .select(follows::followee_id)
        .load::<i64>(connection)?;
    Ok(followed.into_iter().collect())
}

/// Following twice is a no-op.
pub fn follow(
    follower: i64,
    followee: i64,
    connection: &mut PgConnection,
) -> QueryResult<usize> {
    diesel::insert_into(follows::table)
        .values((
            follows::follower_id.eq(follower),
            follows::followee_id.eq(followee),
        ))
        .on_conflict_do_nothing()
        .execute(connection)
}

pub fn unfollow(
    follower: i64,
    followee: i64,
    connection: &mut PgConnection,
) -> QueryResult<usize> {
    diesel::delete(
        follows::table
            .filter(follows::follower_id.eq(follower))
            .filter(follows::followee_id.eq(followee)),
    )
    .execute(connection)
}
