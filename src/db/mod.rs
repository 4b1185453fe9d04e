pub mod articles;
pub mod comments;
pub mod favorites;
pub mod profiles;
pub mod tags;
pub mod token_issuances;
pub mod users;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PoolError},
};
use rocket_sync_db_pools::database;

/// Pool for work that happens outside a request, like the durable
/// revocation store.
pub type Pool = diesel::r2d2::Pool<ConnectionManager<PgConnection>>;

/// Request-scoped connection, configured under `databases.conduit`.
#[database("conduit")]
pub struct DbConn(PgConnection);

pub fn init_pool(database_url: &str, max_size: u32) -> Result<Pool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}
