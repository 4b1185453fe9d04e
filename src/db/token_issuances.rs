use crate::{
    auth::{RevocationStore, StoreError},
    db::Pool,
    schema::token_issuances,
    timestamp::Timestamp,
};
use diesel::{prelude::*, upsert::excluded};

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = token_issuances)]
pub struct TokenIssuance {
    pub user_id: i64,
    pub issued_at: Timestamp,
}

pub fn get(
    user_id: i64,
    connection: &mut PgConnection,
) -> QueryResult<Option<TokenIssuance>> {
    token_issuances::table
        .find(user_id)
        .select(TokenIssuance::as_select())
        .get_result(connection)
        .optional()
}

/// Overwrites the user's last issuance.
pub fn upsert(
    issuance: &TokenIssuance,
    connection: &mut PgConnection,
) -> QueryResult<usize> {
    diesel::insert_into(token_issuances::table)
        .values(issuance)
        .on_conflict(token_issuances::user_id)
        .do_update()
        .set(token_issuances::issued_at.eq(excluded(token_issuances::issued_at)))
        .execute(connection)
}

/// Revocation entries kept in `token_issuances`, so they survive restarts.
pub struct PgRevocationStore {
    pool: Pool,
}

impl PgRevocationStore {
    pub fn new(pool: Pool) -> PgRevocationStore {
        PgRevocationStore { pool }
    }
}

fn backend<E: std::fmt::Display>(error: E) -> StoreError {
    StoreError::Backend(error.to_string())
}

impl RevocationStore for PgRevocationStore {
    fn get(&self, principal_id: i64) -> Result<Option<Timestamp>, StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;
        let issuance = get(principal_id, &mut conn).map_err(backend)?;
        Ok(issuance.map(|i| i.issued_at))
    }

    fn set(&self, principal_id: i64, issued_at: Timestamp) -> Result<(), StoreError> {
        let mut conn = self.pool.get().map_err(backend)?;
        upsert(
            &TokenIssuance {
                user_id: principal_id,
                issued_at,
            },
            &mut conn,
        )
        .map_err(backend)?;
        Ok(())
    }
}
