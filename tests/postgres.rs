//! End-to-end checks of the listing query against a live database.
//!
//! Run with `DATABASE_URL` pointing at a scratch Postgres and
//! `cargo test -- --ignored`. Each test builds the schema in a private
//! namespace inside a transaction that is never committed.

use conduit::{
    db::{
        articles::{self, NewArticle},
        favorites, profiles,
        users::{self, NewUser, User},
    },
    query::ArticleFilter,
};
use diesel::{connection::SimpleConnection, prelude::*};

fn connect(namespace: &str) -> PgConnection {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut conn = PgConnection::establish(&url).unwrap();
    conn.begin_test_transaction().unwrap();
    conn.batch_execute(&format!(
        "CREATE SCHEMA {0}; SET LOCAL search_path TO {0};",
        namespace
    ))
    .unwrap();
    conn.batch_execute(include_str!(
        "../migrations/2024-03-01-000000_create_conduit/up.sql"
    ))
    .unwrap();
    conn
}

fn user(name: &str, conn: &mut PgConnection) -> User {
    users::insert(
        &NewUser {
            email: format!("{}@example.com", name),
            username: name.into(),
            password: "not-a-real-hash".into(),
        },
        conn,
    )
    .unwrap()
}

fn article(author: &User, title: &str, tags: &[&str], conn: &mut PgConnection) -> i64 {
    let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    articles::insert(
        &NewArticle {
            slug: conduit::slug::slugify(title),
            title: title.into(),
            description: "about".into(),
            body: "words".into(),
            author_id: author.id,
        },
        &tags,
        conn,
    )
    .unwrap()
}

#[test]
#[ignore]
fn author_listing_pages_and_keeps_tag_order() {
    let conn = &mut connect("conduit_author_listing");
    let jane = user("jane", conn);
    for n in 0..6 {
        article(&jane, &format!("Untagged {}", n), &[], conn);
    }
    let tagged = article(&jane, "Tagged", &["web", "go"], conn);

    let selected = articles::select(
        &ArticleFilter {
            author: Some("jane".into()),
            limit: Some(5),
            ..ArticleFilter::default()
        },
        conn,
    )
    .unwrap();

    assert_eq!(selected.articles.len(), 5);
    assert_eq!(selected.total, 7);
    assert_eq!(selected.articles[0].id, tagged);
    assert_eq!(selected.articles[0].tag_list, vec!["go", "web"]);
    assert!(selected.articles[1..].iter().all(|a| a.tag_list.is_empty()));
    let ids: Vec<i64> = selected.articles.iter().map(|a| a.id).collect();
    let mut newest_first = ids.clone();
    newest_first.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, newest_first);
}

#[test]
#[ignore]
fn feed_only_shows_followed_authors() {
    let conn = &mut connect("conduit_feed");
    let reader = user("reader", conn);
    let followed = user("followed", conn);
    let stranger = user("stranger", conn);
    profiles::follow(reader.id, followed.id, conn).unwrap();
    article(&followed, "From a friend", &["news"], conn);
    article(&stranger, "From a stranger", &[], conn);
    article(&followed, "Another from a friend", &[], conn);

    let feed = articles::select(&ArticleFilter::feed(reader.id, None, None), conn).unwrap();

    assert_eq!(feed.total, 2);
    assert!(feed
        .articles
        .iter()
        .all(|a| a.author.username == "followed" && a.author.following));
}

#[test]
#[ignore]
fn favorites_are_viewer_relative_and_counted_once() {
    let conn = &mut connect("conduit_favorites");
    let author = user("author", conn);
    let fan = user("fan", conn);
    let id = article(&author, "Loved", &[], conn);

    favorites::favorite(fan.id, id, conn).unwrap();
    favorites::favorite(fan.id, id, conn).unwrap();

    let as_fan = articles::get("loved", Some(fan.id), conn).unwrap();
    assert!(as_fan.favorited);
    assert_eq!(as_fan.favorites_count, 1);

    let as_author = articles::get("loved", Some(author.id), conn).unwrap();
    assert!(!as_author.favorited);

    let by_fan = articles::select(
        &ArticleFilter {
            favorited_by: Some("fan".into()),
            ..ArticleFilter::default()
        },
        conn,
    )
    .unwrap();
    assert_eq!(by_fan.articles.len(), 1);

    favorites::unfavorite(fan.id, id, conn).unwrap();
    assert_eq!(articles::get("loved", None, conn).unwrap().favorites_count, 0);
}

#[test]
#[ignore]
fn missing_slug_is_not_found() {
    let conn = &mut connect("conduit_missing_slug");
    assert!(matches!(
        articles::get("nope", None, conn),
        Err(diesel::result::Error::NotFound)
    ));
}
