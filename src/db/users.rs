use crate::{auth::Principal, schema::users};
use diesel::prelude::*;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password: String,
    pub bio: String,
    pub image: Option<String>,
}

impl User {
    /// Attribute snapshot embedded in this user's tokens.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Already hashed.
    pub password: String,
}

/// Partial update. `None` fields are left alone.
#[derive(AsChangeset, Default, Debug)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.image.is_none()
            && self.bio.is_none()
    }
}

pub fn get(id: i64, connection: &mut PgConnection) -> QueryResult<User> {
    users::table
        .find(id)
        .select(User::as_select())
        .get_result(connection)
}

pub fn by_email(email: &str, connection: &mut PgConnection) -> QueryResult<User> {
    users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .get_result(connection)
}

pub fn insert(user: &NewUser, connection: &mut PgConnection) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(user)
        .returning(User::as_returning())
        .get_result(connection)
}

pub fn update(
    id: i64,
    changes: &UserChanges,
    connection: &mut PgConnection,
) -> QueryResult<User> {
    if changes.is_empty() {
        return get(id, connection);
    }
    diesel::update(users::table.find(id))
        .set(changes)
        .returning(User::as_returning())
        .get_result(connection)
}
