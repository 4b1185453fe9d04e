// Custom date + time type
// Fulfills serde + diesel traits

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    serialize::{self, Output, ToSql},
    sql_types,
};
use serde::{Serialize, Serializer};
use std::{
    fmt,
    ops::{Add, Sub},
};

#[derive(
    Debug, AsExpression, FromSqlRow, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy,
)]
#[diesel(sql_type = sql_types::Timestamptz)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Timestamp {
        Timestamp(Utc::now())
    }

    /// Whole seconds since the epoch, or `None` if out of range.
    pub fn from_unix(secs: i64) -> Option<Timestamp> {
        Utc.timestamp_opt(secs, 0).single().map(Timestamp)
    }

    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }

    /// Drops the sub-second part.
    pub fn trunc_secs(self) -> Timestamp {
        Timestamp::from_unix(self.unix()).unwrap_or(self)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Timestamp {
        Timestamp(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Add<chrono::Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, other: chrono::Duration) -> Timestamp {
        Timestamp(self.0.add(other))
    }
}

impl Sub<chrono::Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, other: chrono::Duration) -> Timestamp {
        Timestamp(self.0.sub(other))
    }
}

impl ToSql<sql_types::Timestamptz, Pg> for Timestamp {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        ToSql::<sql_types::Timestamptz, Pg>::to_sql(&self.0, out)
    }
}

impl FromSql<sql_types::Timestamptz, Pg> for Timestamp {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let dt = <DateTime<Utc> as FromSql<sql_types::Timestamptz, Pg>>::from_sql(bytes)?;
        Ok(Timestamp(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_rfc3339_millis() {
        let ts = Timestamp(Utc.with_ymd_and_hms(2016, 2, 18, 3, 22, 56).unwrap());
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            "\"2016-02-18T03:22:56.000Z\""
        );
    }

    #[test]
    fn truncates_to_whole_seconds() {
        let ts = Timestamp(Utc.timestamp_opt(1_700_000_000, 987_000_000).unwrap());
        assert_eq!(ts.trunc_secs(), Timestamp::from_unix(1_700_000_000).unwrap());
    }
}
