use std::{fmt, io::Write};

use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    serialize::{self, IsNull, Output, ToSql},
    sql_types,
};
use ulid::Ulid;

/// A ULID stored in a Postgres `uuid` column.
///
/// Both are 128 bits in big-endian order, so sorting by the column sorts by
/// creation time first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[diesel(sql_type = sql_types::Uuid)]
pub struct DbUlid(Ulid);

impl DbUlid {
    pub fn new() -> Self {
        DbUlid(Ulid::new())
    }

    pub fn from_string(s: &str) -> Option<Self> {
        Ulid::from_string(s).ok().map(DbUlid)
    }

    pub fn inner(&self) -> &Ulid {
        &self.0
    }
}

impl Default for DbUlid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DbUlid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Ulid> for DbUlid {
    fn from(u: Ulid) -> Self {
        Self(u)
    }
}

impl From<DbUlid> for Ulid {
    fn from(d: DbUlid) -> Self {
        d.0
    }
}

impl ToSql<sql_types::Uuid, Pg> for DbUlid {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(&self.0.to_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<sql_types::Uuid, Pg> for DbUlid {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        let bytes: [u8; 16] = value
            .as_bytes()
            .try_into()
            .map_err(|_| "DbUlid: expected exactly 16 bytes")?;
        Ok(DbUlid(Ulid::from_bytes(bytes)))
    }
}
