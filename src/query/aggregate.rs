use crate::{
    db::{articles::Article, profiles::Profile},
    timestamp::Timestamp,
};
use diesel::{
    prelude::*,
    sql_types::{BigInt, Nullable, Text, Timestamptz},
};
use std::mem;

/// One row of the composed listing query: an article joined with its author,
/// one of its tags (if any) and the viewer's follow/favorite ids.
#[derive(QueryableByName, Debug, Clone, PartialEq, Eq)]
pub struct ArticleRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub slug: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub description: String,
    #[diesel(sql_type = Text)]
    pub body: String,
    #[diesel(sql_type = BigInt)]
    pub favorites_count: i64,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: Timestamp,
    #[diesel(sql_type = Timestamptz)]
    pub updated_at: Timestamp,
    #[diesel(sql_type = BigInt)]
    pub author_id: i64,
    #[diesel(sql_type = Text)]
    pub author_username: String,
    #[diesel(sql_type = Text)]
    pub author_bio: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub author_image: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub article_tag: Option<String>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub subscriber_id: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub favorited_by_id: Option<i64>,
    #[diesel(sql_type = BigInt)]
    pub articles_count: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Aggregated {
    pub articles: Vec<Article>,
    /// Articles matching the filter, ignoring limit and offset.
    pub total: i64,
}

#[derive(Debug)]
enum State {
    Empty,
    Accumulating(Article),
}

/// Folds rows into articles. Rows for one article must be contiguous, which
/// the composed query's ORDER BY guarantees; a new id always closes the
/// current article.
#[derive(Debug)]
pub struct Aggregator {
    viewer: Option<i64>,
    state: State,
    articles: Vec<Article>,
    total: i64,
}

impl Aggregator {
    pub fn new(viewer: Option<i64>) -> Aggregator {
        Aggregator {
            viewer,
            state: State::Empty,
            articles: Vec::new(),
            total: 0,
        }
    }

    pub fn push(&mut self, row: ArticleRow) {
        self.state = match mem::replace(&mut self.state, State::Empty) {
            State::Empty => {
                self.total = row.articles_count;
                State::Accumulating(start(row, self.viewer))
            }
            State::Accumulating(mut article) if article.id == row.id => {
                if let Some(tag) = row.article_tag {
                    article.tag_list.push(tag);
                }
                State::Accumulating(article)
            }
            State::Accumulating(article) => {
                self.articles.push(article);
                State::Accumulating(start(row, self.viewer))
            }
        };
    }

    pub fn finish(mut self) -> Aggregated {
        if let State::Accumulating(article) = self.state {
            self.articles.push(article);
        }
        Aggregated {
            articles: self.articles,
            total: self.total,
        }
    }
}

// Viewer flags are fixed by the first row of a group.
fn start(row: ArticleRow, viewer: Option<i64>) -> Article {
    let is_viewer = |id: Option<i64>| match (viewer, id) {
        (Some(viewer), Some(id)) => viewer == id,
        _ => false,
    };

    Article {
        id: row.id,
        slug: row.slug,
        title: row.title,
        description: row.description,
        body: row.body,
        tag_list: row.article_tag.into_iter().collect(),
        favorited: is_viewer(row.favorited_by_id),
        favorites_count: row.favorites_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
        author: Profile {
            id: row.author_id,
            username: row.author_username,
            bio: row.author_bio,
            image: row.author_image,
            following: is_viewer(row.subscriber_id),
        },
    }
}

pub fn aggregate<I>(rows: I, viewer: Option<i64>) -> Aggregated
where
    I: IntoIterator<Item = ArticleRow>,
{
    let mut aggregator = Aggregator::new(viewer);
    for row in rows {
        aggregator.push(row);
    }
    aggregator.finish()
}

/// Like `aggregate`, for a fallible row stream. The first error is returned
/// as is.
pub fn try_aggregate<I, E>(rows: I, viewer: Option<i64>) -> Result<Aggregated, E>
where
    I: IntoIterator<Item = Result<ArticleRow, E>>,
{
    let mut aggregator = Aggregator::new(viewer);
    for row in rows {
        aggregator.push(row?);
    }
    Ok(aggregator.finish())
}
