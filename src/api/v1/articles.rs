use crate::{
    api::v1::{ok_resp, ApiError, AuthUser, JSONResp, MaybeAuthUser},
    db::{
        articles,
        articles::{Article, ArticleChanges, NewArticle},
        favorites, DbConn,
    },
    query::ArticleFilter,
    slug::slugify,
    timestamp::Timestamp,
};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleEnvelope<T> {
    pub article: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResp {
    articles: Vec<Article>,
    articles_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewArticleData {
    #[validate(length(min = 1))]
    title: String,
    #[validate(length(min = 1))]
    description: String,
    #[validate(length(min = 1))]
    body: String,
    #[serde(default)]
    tag_list: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ArticleUpdate {
    #[validate(length(min = 1))]
    title: Option<String>,
    #[validate(length(min = 1))]
    description: Option<String>,
    #[validate(length(min = 1))]
    body: Option<String>,
}

fn slug_for(title: &str) -> Result<String, ApiError> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(ApiError::unprocessable(
            "title: must contain letters or digits",
        ));
    }
    Ok(slug)
}

/// Trimmed, non-empty, first occurrence wins.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_owned());
        }
    }
    cleaned
}

async fn listing(conn: DbConn, filter: ArticleFilter) -> JSONResp<ArticlesResp> {
    let selected = conn.run(move |c| articles::select(&filter, c)).await?;
    ok_resp(ArticlesResp {
        articles: selected.articles,
        articles_count: selected.total,
    })
}

#[allow(clippy::too_many_arguments)]
#[get("/articles?<tag>&<author>&<favorited>&<limit>&<offset>")]
pub async fn list(
    conn: DbConn,
    auth: MaybeAuthUser,
    tag: Option<String>,
    author: Option<String>,
    favorited: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> JSONResp<ArticlesResp> {
    let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
    let filter = ArticleFilter {
        viewer: auth.viewer(),
        tag: non_empty(tag),
        author: non_empty(author),
        favorited_by: non_empty(favorited),
        limit,
        offset,
        ..ArticleFilter::default()
    };
    listing(conn, filter).await
}

#[get("/articles/feed?<limit>&<offset>")]
pub async fn feed(
    conn: DbConn,
    auth: AuthUser,
    limit: Option<i64>,
    offset: Option<i64>,
) -> JSONResp<ArticlesResp> {
    listing(conn, ArticleFilter::feed(auth.id(), limit, offset)).await
}

#[get("/articles/<slug>")]
pub async fn get(
    conn: DbConn,
    auth: MaybeAuthUser,
    slug: String,
) -> JSONResp<ArticleEnvelope<Article>> {
    let viewer = auth.viewer();
    let article = conn.run(move |c| articles::get(&slug, viewer, c)).await?;
    ok_resp(ArticleEnvelope { article })
}

#[post("/articles", format = "json", data = "<body>")]
pub async fn create(
    conn: DbConn,
    auth: AuthUser,
    body: Json<ArticleEnvelope<NewArticleData>>,
) -> JSONResp<ArticleEnvelope<Article>> {
    let data = body.into_inner().article;
    data.validate()?;
    let slug = slug_for(&data.title)?;
    let author_id = auth.id();

    let article = conn
        .run(move |c| -> Result<_, ApiError> {
            let new = NewArticle {
                slug,
                title: data.title,
                description: data.description,
                body: data.body,
                author_id,
            };
            articles::insert(&new, &clean_tags(data.tag_list), c)?;
            Ok(articles::get(&new.slug, Some(author_id), c)?)
        })
        .await?;
    log::info!("User {} created article {}", author_id, article.slug);
    ok_resp(ArticleEnvelope { article })
}

/// Only the author may edit. Anyone else gets a 404.
#[put("/articles/<slug>", format = "json", data = "<body>")]
pub async fn update(
    conn: DbConn,
    auth: AuthUser,
    slug: String,
    body: Json<ArticleEnvelope<ArticleUpdate>>,
) -> JSONResp<ArticleEnvelope<Article>> {
    let update = body.into_inner().article;
    update.validate()?;
    let new_slug = update.title.as_deref().map(slug_for).transpose()?;
    let author_id = auth.id();

    let article = conn
        .run(move |c| -> Result<_, ApiError> {
            let id = articles::owned_id(&slug, author_id, c)?;
            let changes = ArticleChanges {
                slug: new_slug,
                title: update.title,
                description: update.description,
                body: update.body,
                updated_at: Some(Timestamp::now()),
            };
            let slug = if changes.is_empty() {
                slug
            } else {
                articles::update(id, &changes, c)?
            };
            Ok(articles::get(&slug, Some(author_id), c)?)
        })
        .await?;
    ok_resp(ArticleEnvelope { article })
}

#[delete("/articles/<slug>")]
pub async fn delete(conn: DbConn, auth: AuthUser, slug: String) -> JSONResp<String> {
    let author_id = auth.id();
    let deleted = conn
        .run(move |c| -> Result<_, ApiError> {
            if articles::delete(&slug, author_id, c)? == 0 {
                return Err(ApiError::not_found());
            }
            Ok(slug)
        })
        .await?;
    ok_resp(format!("Deleted article {}", deleted))
}

#[post("/articles/<slug>/favorite")]
pub async fn favorite(
    conn: DbConn,
    auth: AuthUser,
    slug: String,
) -> JSONResp<ArticleEnvelope<Article>> {
    let user_id = auth.id();
    let article = conn
        .run(move |c| -> Result<_, ApiError> {
            let id = articles::id_by_slug(&slug, c)?;
            favorites::favorite(user_id, id, c)?;
            Ok(articles::get(&slug, Some(user_id), c)?)
        })
        .await?;
    ok_resp(ArticleEnvelope { article })
}

#[delete("/articles/<slug>/favorite")]
pub async fn unfavorite(
    conn: DbConn,
    auth: AuthUser,
    slug: String,
) -> JSONResp<ArticleEnvelope<Article>> {
    let user_id = auth.id();
    let article = conn
        .run(move |c| -> Result<_, ApiError> {
            let id = articles::id_by_slug(&slug, c)?;
            favorites::unfavorite(user_id, id, c)?;
            Ok(articles::get(&slug, Some(user_id), c)?)
        })
        .await?;
    ok_resp(ArticleEnvelope { article })
}
