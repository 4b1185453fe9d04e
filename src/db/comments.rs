use crate::{
    db::profiles::{self, Profile},
    schema::{comments, users},
    timestamp::Timestamp,
};
use diesel::{prelude::*, result::Error};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub body: String,
    pub author: Profile,
}

type CommentRow = (
    i64,
    Timestamp,
    Timestamp,
    String,
    i64,
    String,
    String,
    Option<String>,
);

fn comment_columns() -> (
    comments::id,
    comments::created_at,
    comments::updated_at,
    comments::body,
    users::id,
    users::username,
    users::bio,
    users::image,
) {
    (
        comments::id,
        comments::created_at,
        comments::updated_at,
        comments::body,
        users::id,
        users::username,
        users::bio,
        users::image,
    )
}

fn from_row(row: CommentRow, following: bool) -> Comment {
    let (id, created_at, updated_at, body, author_id, username, bio, image) = row;
    Comment {
        id,
        created_at,
        updated_at,
        body,
        author: Profile {
            id: author_id,
            username,
            bio,
            image,
            following,
        },
    }
}

/// Comments on an article, oldest first.
pub fn for_article(
    article_id: i64,
    viewer: Option<i64>,
    connection: &mut PgConnection,
) -> QueryResult<Vec<Comment>> {
    let rows = comments::table
        .inner_join(users::table)
        .filter(comments::article_id.eq(article_id))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select(comment_columns())
        .load::<CommentRow>(connection)?;

    let followed = match viewer {
        Some(viewer) => {
            let authors: Vec<i64> = rows.iter().map(|row| row.4).collect();
            profiles::followed_among(viewer, &authors, connection)?
        }
        None => Default::default(),
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let following = followed.contains(&row.4);
            from_row(row, following)
        })
        .collect())
}

pub fn insert(
    article_id: i64,
    author_id: i64,
    body: &str,
    connection: &mut PgConnection,
) -> QueryResult<Comment> {
    let id = diesel::insert_into(comments::table)
        .values((
            comments::article_id.eq(article_id),
            comments::author_id.eq(author_id),
            comments::body.eq(body),
        ))
        .returning(comments::id)
        .get_result::<i64>(connection)?;

    let row = comments::table
        .inner_join(users::table)
        .filter(comments::id.eq(id))
        .select(comment_columns())
        .get_result::<CommentRow>(connection)?;
    // Nobody follows themselves.
    Ok(from_row(row, false))
}

/// Only the comment's author may delete it.
pub fn delete(
    article_id: i64,
    comment_id: i64,
    author_id: i64,
    connection: &mut PgConnection,
) -> QueryResult<()> {
    let removed = diesel::delete(
        comments::table
            .filter(comments::id.eq(comment_id))
            .filter(comments::article_id.eq(article_id))
            .filter(comments::author_id.eq(author_id)),
    )
    .execute(connection)?;
    if removed == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_comment_with_author_profile() {
        let ts = Timestamp::from_unix(1_700_000_000).unwrap();
        let comment = from_row(
            (1, ts, ts, "nice".into(), 7, "jake".into(), "bio".into(), None),
            true,
        );
        assert_eq!(comment.author.username, "jake");
        assert!(comment.author.following);

        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20.000Z");
        assert!(json["author"].get("id").is_none());
    }
}
