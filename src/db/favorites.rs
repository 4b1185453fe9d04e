use crate::schema::{articles, favorites};
use diesel::{prelude::*, result::Error};

/// Marks the article as a favorite of `user_id`. Repeats are no-ops and
/// leave the counter untouched.
pub fn favorite(
    user_id: i64,
    article_id: i64,
    connection: &mut PgConnection,
) -> QueryResult<()> {
    connection.transaction::<_, Error, _>(|conn| {
        let inserted = diesel::insert_into(favorites::table)
            .values((
                favorites::user_id.eq(user_id),
                favorites::article_id.eq(article_id),
            ))
            .on_conflict_do_nothing()
            .execute(conn)?;
        if inserted > 0 {
            diesel::update(articles::table.find(article_id))
                .set(articles::favorites_count.eq(articles::favorites_count + 1))
                .execute(conn)?;
        }
        Ok(())
    })
}

pub fn unfavorite(
    user_id: i64,
    article_id: i64,
    connection: &mut PgConnection,
) -> QueryResult<()> {
    connection.transaction::<_, Error, _>(|conn| {
        let removed = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::article_id.eq(article_id)),
        )
        .execute(conn)?;
        if removed > 0 {
            diesel::update(articles::table.find(article_id))
                .set(articles::favorites_count.eq(articles::favorites_count - 1))
                .execute(conn)?;
        }
        Ok(())
    })
}
