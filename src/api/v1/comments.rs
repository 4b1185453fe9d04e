use crate::{
    api::v1::{ok_resp, ApiError, AuthUser, JSONResp, MaybeAuthUser},
    db::{articles, comments, comments::Comment, DbConn},
};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentEnvelope<T> {
    pub comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentsResp {
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewComment {
    #[validate(length(min = 1))]
    body: String,
}

#[get("/articles/<slug>/comments")]
pub async fn list(
    conn: DbConn,
    auth: MaybeAuthUser,
    slug: String,
) -> JSONResp<CommentsResp> {
    let viewer = auth.viewer();
    let comments = conn
        .run(move |c| -> Result<_, ApiError> {
            let article_id = articles::id_by_slug(&slug, c)?;
            Ok(comments::for_article(article_id, viewer, c)?)
        })
        .await?;
    ok_resp(CommentsResp { comments })
}

#[post("/articles/<slug>/comments", format = "json", data = "<body>")]
pub async fn add(
    conn: DbConn,
    auth: AuthUser,
    slug: String,
    body: Json<CommentEnvelope<NewComment>>,
) -> JSONResp<CommentEnvelope<Comment>> {
    let new = body.into_inner().comment;
    new.validate()?;
    let author_id = auth.id();

    let comment = conn
        .run(move |c| -> Result<_, ApiError> {
            let article_id = articles::id_by_slug(&slug, c)?;
            Ok(comments::insert(article_id, author_id, &new.body, c)?)
        })
        .await?;
    ok_resp(CommentEnvelope { comment })
}

#[delete("/articles/<slug>/comments/<id>")]
pub async fn delete(
    conn: DbConn,
    auth: AuthUser,
    slug: String,
    id: i64,
) -> JSONResp<String> {
    let author_id = auth.id();
    conn.run(move |c| -> Result<_, ApiError> {
        let article_id = articles::id_by_slug(&slug, c)?;
        Ok(comments::delete(article_id, id, author_id, c)?)
    })
    .await?;
    ok_resp(format!("Deleted comment {}", id))
}
