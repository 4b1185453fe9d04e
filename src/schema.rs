diesel::table! {
    article_tags (article_id, tag_id) {
        article_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    articles (id) {
        id -> Int8,
        slug -> Text,
        title -> Text,
        description -> Text,
        body -> Text,
        author_id -> Int8,
        favorites_count -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    comments (id) {
        id -> Int8,
        body -> Text,
        article_id -> Int8,
        author_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    favorites (user_id, article_id) {
        user_id -> Int8,
        article_id -> Int8,
    }
}

diesel::table! {
    follows (follower_id, followee_id) {
        follower_id -> Int8,
        followee_id -> Int8,
    }
}

diesel::table! {
    tags (id) {
        id -> Int8,
        value -> Text,
    }
}

diesel::table! {
    token_issuances (user_id) {
        user_id -> Int8,
        issued_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Int8,
        email -> Text,
        username -> Text,
        password -> Text,
        bio -> Text,
        image -> Nullable<Text>,
    }
}

diesel::joinable!(article_tags -> articles (article_id));
diesel::joinable!(article_tags -> tags (tag_id));
diesel::joinable!(articles -> users (author_id));
diesel::joinable!(comments -> articles (article_id));
diesel::joinable!(comments -> users (author_id));
diesel::joinable!(favorites -> articles (article_id));
diesel::joinable!(favorites -> users (user_id));
diesel::joinable!(token_issuances -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    article_tags,
    articles,
    comments,
    favorites,
    follows,
    tags,
    token_issuances,
    users,
);
