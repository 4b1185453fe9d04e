use crate::schema::{article_tags, tags};
use diesel::prelude::*;

/// Every known tag value, alphabetically.
pub fn all(connection: &mut PgConnection) -> QueryResult<Vec<String>> {
    tags::table
        .select(tags::value)
        .order(tags::value.asc())
        .load(connection)
}

/// Creates any missing tags and links all of `values` to the article.
pub fn attach(
    article_id: i64,
    values: &[String],
    connection: &mut PgConnection,
) -> QueryResult<usize> {
    if values.is_empty() {
        return Ok(0);
    }

    let new_tags: Vec<_> = values.iter().map(|v| tags::value.eq(v)).collect();
    diesel::insert_into(tags::table)
        .values(new_tags)
        .on_conflict(tags::value)
        .do_nothing()
        .execute(connection)?;

    let ids = tags::table
        .filter(tags::value.eq_any(values))
        .select(tags::id)
        .load::<i64>(connection)?;

    let links: Vec<_> = ids
        .into_iter()
        .map(|tag_id| {
            (
                article_tags::article_id.eq(article_id),
                article_tags::tag_id.eq(tag_id),
            )
        })
        .collect();
    diesel::insert_into(article_tags::table)
        .values(links)
        .on_conflict_do_nothing()
        .execute(connection)
}
