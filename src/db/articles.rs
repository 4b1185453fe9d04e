use crate::{
    db::{profiles::Profile, tags},
    query::{self, Aggregated, Arg, ArticleFilter, ArticleRow},
    schema::articles,
    timestamp::Timestamp,
};
use diesel::{
    connection::DefaultLoadingMode,
    pg::Pg,
    prelude::*,
    result::Error,
    sql_types::{BigInt, Text},
};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(skip_serializing)]
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub author: Profile,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: i64,
}

#[derive(AsChangeset, Default, Debug)]
#[diesel(table_name = articles)]
pub struct ArticleChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub updated_at: Option<Timestamp>,
}

impl ArticleChanges {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.body.is_none()
    }
}

/// Runs the composed listing query and folds its rows into articles.
pub fn select(
    filter: &ArticleFilter,
    connection: &mut PgConnection,
) -> QueryResult<Aggregated> {
    let composed = query::compose(filter);
    log::debug!(
        "Selecting articles with {} bound args: {}",
        composed.args.len(),
        composed.sql
    );

    let mut statement = diesel::sql_query(composed.sql).into_boxed::<Pg>();
    for arg in composed.args {
        statement = match arg {
            Arg::Text(value) => statement.bind::<Text, _>(value),
            Arg::BigInt(value) => statement.bind::<BigInt, _>(value),
        };
    }

    let rows =
        statement.load_iter::<ArticleRow, DefaultLoadingMode>(connection)?;
    query::try_aggregate(rows, filter.viewer)
}

pub fn get(
    slug: &str,
    viewer: Option<i64>,
    connection: &mut PgConnection,
) -> QueryResult<Article> {
    select(&ArticleFilter::by_slug(slug, viewer), connection)?
        .articles
        .into_iter()
        .next()
        .ok_or(Error::NotFound)
}

pub fn id_by_slug(slug: &str, connection: &mut PgConnection) -> QueryResult<i64> {
    articles::table
        .filter(articles::slug.eq(slug))
        .select(articles::id)
        .get_result(connection)
}

/// Id of the article at `slug`, if `author_id` wrote it.
pub fn owned_id(
    slug: &str,
    author_id: i64,
    connection: &mut PgConnection,
) -> QueryResult<i64> {
    articles::table
        .filter(articles::slug.eq(slug))
        .filter(articles::author_id.eq(author_id))
        .select(articles::id)
        .get_result(connection)
}

/// Inserts the article and links its tags. Returns the new id.
pub fn insert(
    article: &NewArticle,
    tag_list: &[String],
    connection: &mut PgConnection,
) -> QueryResult<i64> {
    connection.transaction::<_, Error, _>(|conn| {
        let id = diesel::insert_into(articles::table)
            .values(article)
            .returning(articles::id)
            .get_result::<i64>(conn)?;
        tags::attach(id, tag_list, conn)?;
        Ok(id)
    })
}

/// Applies `changes` and returns the (possibly new) slug.
pub fn update(
    id: i64,
    changes: &ArticleChanges,
    connection: &mut PgConnection,
) -> QueryResult<String> {
    diesel::update(articles::table.find(id))
        .set(changes)
        .returning(articles::slug)
        .get_result(connection)
}

pub fn delete(
    slug: &str,
    author_id: i64,
    connection: &mut PgConnection,
) -> QueryResult<usize> {
    diesel::delete(
        articles::table
            .filter(articles::slug.eq(slug))
            .filter(articles::author_id.eq(author_id)),
    )
    .execute(connection)
}
