use crate::query::{Arg, ArticleFilter, Args, Placeholder};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JoinKind::Inner => f.write_str("INNER"),
            JoinKind::Left => f.write_str("LEFT"),
        }
    }
}

/// Joins applied to `articles a INNER JOIN users u` before paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// Keep only articles favorited by the user with the bound username.
    FavoritedBy { username: Placeholder },
    /// The viewer's follow of the article's author. Inner in feed mode.
    Follows { viewer: Placeholder, kind: JoinKind },
    /// The viewer's favorite of the article.
    Favorites { viewer: Placeholder },
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Join::FavoritedBy { username } => write!(
                f,
                "INNER JOIN favorites fb ON fb.article_id = a.id \
                 AND fb.user_id IN (SELECT id FROM users WHERE username = {})",
                username
            ),
            Join::Follows { viewer, kind } => write!(
                f,
                "{} JOIN follows s ON s.followee_id = a.author_id \
                 AND s.follower_id = {}",
                kind, viewer
            ),
            Join::Favorites { viewer } => write!(
                f,
                "LEFT JOIN favorites f ON f.article_id = a.id \
                 AND f.user_id = {}",
                viewer
            ),
        }
    }
}

/// Conditions ANDed into the WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    SlugEq(Placeholder),
    HasTag(Placeholder),
    AuthorEq(Placeholder),
    /// Feed requested without a viewer: nothing can match.
    Never,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Predicate::SlugEq(slug) => write!(f, "a.slug = {}", slug),
            Predicate::HasTag(tag) => write!(
                f,
                "EXISTS (SELECT 1 FROM article_tags atr \
                 INNER JOIN tags t ON t.id = atr.tag_id \
                 WHERE atr.article_id = a.id AND t.value = {})",
                tag
            ),
            Predicate::AuthorEq(username) => {
                write!(f, "u.username = {}", username)
            }
            Predicate::Never => f.write_str("FALSE"),
        }
    }
}

/// A statement ready for a single parameterized execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedQuery {
    pub sql: String,
    pub args: Vec<Arg>,
}

/// Structured form of an article listing query. User supplied strings only
/// ever reach the statement through `args`; the SQL text is built from fixed
/// clause skeletons, placeholders and validated integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    personalized: bool,
    limit: i64,
    offset: Option<i64>,
    args: Args,
}

impl ArticleQuery {
    pub fn new(filter: &ArticleFilter) -> ArticleQuery {
        let mut args = Args::new();
        let mut joins = Vec::new();
        let mut predicates = Vec::new();

        if let Some(username) = &filter.favorited_by {
            joins.push(Join::FavoritedBy {
                username: args.append(username.as_str()),
            });
        }

        match filter.viewer {
            Some(viewer) => {
                let viewer = args.append(viewer);
                let kind = if filter.feed {
                    JoinKind::Inner
                } else {
                    JoinKind::Left
                };
                joins.push(Join::Follows { viewer, kind });
                joins.push(Join::Favorites { viewer });
            }
            None if filter.feed => predicates.push(Predicate::Never),
            None => (),
        }

        if let Some(slug) = &filter.slug {
            predicates.push(Predicate::SlugEq(args.append(slug.as_str())));
        }

        if let Some(tag) = &filter.tag {
            predicates.push(Predicate::HasTag(args.append(tag.as_str())));
        }

        if let Some(author) = &filter.author {
            predicates.push(Predicate::AuthorEq(args.append(author.as_str())));
        }

        ArticleQuery {
            joins,
            predicates,
            personalized: filter.viewer.is_some(),
            limit: filter.effective_limit(),
            offset: filter.effective_offset(),
            args,
        }
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn to_sql(&self) -> String {
        let viewer_columns = if self.personalized {
            "s.follower_id AS subscriber_id, f.user_id AS favorited_by_id"
        } else {
            "NULL::bigint AS subscriber_id, NULL::bigint AS favorited_by_id"
        };

        let joins: String = self
            .joins
            .iter()
            .map(|join| format!("\n    {}", join))
            .collect();

        let filter = if self.predicates.is_empty() {
            String::new()
        } else {
            let predicates: Vec<String> =
                self.predicates.iter().map(ToString::to_string).collect();
            format!("\n    WHERE {}", predicates.join(" AND "))
        };

        let mut page = format!("LIMIT {}", self.limit);
        if let Some(offset) = self.offset {
            page.push_str(&format!(" OFFSET {}", offset));
        }

        // The inner select filters and pages whole articles; tags are joined
        // afterwards so a page never splits an article's tag rows.
        format!(
            "SELECT
  a.id, a.slug, a.title, a.description, a.body, a.favorites_count,
  a.created_at, a.updated_at,
  a.author_id, a.author_username, a.author_bio, a.author_image,
  a.subscriber_id, a.favorited_by_id, a.articles_count,
  t.value AS article_tag
FROM (
  SELECT
    a.id, a.slug, a.title, a.description, a.body, a.favorites_count,
    a.created_at, a.updated_at,
    u.id AS author_id, u.username AS author_username,
    u.bio AS author_bio, u.image AS author_image,
    {viewer_columns},
    COUNT(*) OVER () AS articles_count
  FROM articles a
    INNER JOIN users u ON u.id = a.author_id{joins}{filter}
  ORDER BY a.created_at DESC, a.id DESC
  {page}
) a
LEFT JOIN article_tags atr ON atr.article_id = a.id
LEFT JOIN tags t ON t.id = atr.tag_id
ORDER BY a.created_at DESC, a.id DESC, t.value ASC",
            viewer_columns = viewer_columns,
            joins = joins,
            filter = filter,
            page = page,
        )
    }

    pub fn finish(self) -> ComposedQuery {
        let sql = self.to_sql();
        ComposedQuery {
            sql,
            args: self.args.into_vec(),
        }
    }
}

/// Turns a filter into one executable statement. Never fails: an empty
/// filter yields the newest `MAX_LIMIT` articles.
pub fn compose(filter: &ArticleFilter) -> ComposedQuery {
    ArticleQuery::new(filter).finish()
}
