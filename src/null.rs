use crate::Nano64;

/// A [`Nano64`] that may be absent, such as a nullable database column.
///
/// Absence is tracked by a separate flag rather than by the identifier value, so an absent
/// `NullNano64` is never confused with a present [`Nano64::NIL`]. An absent value always carries
/// the nil identifier.
///
/// # Examples
///
/// ```rust
/// use nano64::{Nano64, NullNano64};
///
/// let present = NullNano64::from(Some(Nano64::NIL));
/// let absent = NullNano64::default();
/// assert!(present.is_valid() && !absent.is_valid());
/// assert_eq!(absent.id(), Nano64::NIL);
/// assert_eq!(present.into_option(), Some(Nano64::NIL));
/// assert_eq!(absent.into_option(), None);
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NullNano64 {
    id: Nano64,
    valid: bool,
}

impl NullNano64 {
    /// An absent identifier.
    pub const NULL: Self = Self {
        id: Nano64::NIL,
        valid: false,
    };

    /// Creates a present identifier.
    pub const fn new(id: Nano64) -> Self {
        Self { id, valid: true }
    }

    /// Returns the identifier; [`Nano64::NIL`] if absent.
    pub const fn id(&self) -> Nano64 {
        self.id
    }

    /// Returns `true` if an identifier is present.
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the identifier if present.
    pub const fn into_option(self) -> Option<Nano64> {
        if self.valid {
            Some(self.id)
        } else {
            None
        }
    }
}

impl From<Option<Nano64>> for NullNano64 {
    fn from(src: Option<Nano64>) -> Self {
        src.map_or(Self::NULL, Self::new)
    }
}

impl From<NullNano64> for Option<Nano64> {
    fn from(src: NullNano64) -> Self {
        src.into_option()
    }
}

impl From<Nano64> for NullNano64 {
    fn from(src: Nano64) -> Self {
        Self::new(src)
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{Nano64, NullNano64};
    use serde::{Deserializer, Serializer};

    impl serde::Serialize for NullNano64 {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self.into_option() {
                Some(id) => serializer.serialize_some(&id),
                None => serializer.serialize_none(),
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for NullNano64 {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            <Option<Nano64> as serde::Deserialize>::deserialize(deserializer).map(Self::from)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::{Nano64, NullNano64};

        /// Maps absence to JSON null and back
        #[test]
        fn maps_absence_to_json_null_and_back() {
            assert_eq!(serde_json::to_string(&NullNano64::NULL).unwrap(), "null");
            let back: NullNano64 = serde_json::from_str("null").unwrap();
            assert_eq!(back, NullNano64::NULL);
        }

        /// Round-trips present identifiers through JSON
        #[test]
        fn round_trips_present_identifiers_through_json() {
            for id in [Nano64::NIL, Nano64::from(0x1234_5678_9abc_def0)] {
                let e = NullNano64::new(id);
                let json = serde_json::to_string(&e).unwrap();
                assert_eq!(json, format!("\"{}\"", id));
                let back: NullNano64 = serde_json::from_str(&json).unwrap();
                assert!(back.is_valid());
                assert_eq!(back.id(), id);
            }
        }
    }
}

#[cfg(feature = "rusqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "rusqlite")))]
mod rusqlite_support {
    use super::{Nano64, NullNano64};
    use rusqlite::types::{FromSql, FromSqlResult, Null, ToSql, ToSqlOutput, ValueRef};

    impl ToSql for NullNano64 {
        /// Binds SQL NULL when absent, otherwise the same BLOB as [`Nano64`].
        fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
            match self.into_option() {
                Some(id) => Ok(ToSqlOutput::from(id.to_bytes().to_vec())),
                None => Ok(ToSqlOutput::from(Null)),
            }
        }
    }

    impl FromSql for NullNano64 {
        fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
            match value {
                ValueRef::Null => Ok(Self::NULL),
                _ => Nano64::column_result(value).map(Self::new),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::{Nano64, NullNano64};
        use rusqlite::{params, Connection};

        /// Stores absence as SQL NULL and the nil identifier as a value
        #[test]
        fn stores_absence_as_sql_null_and_the_nil_identifier_as_a_value() {
            let conn = Connection::open_in_memory().unwrap();
            conn.execute_batch(
                "CREATE TABLE t (k INTEGER PRIMARY KEY, nullable_id BLOB, non_null_id BLOB NOT NULL)",
            )
            .unwrap();

            let id = Nano64::from_fields(1234567890123, 0x12345);
            conn.execute(
                "INSERT INTO t VALUES (?1, ?2, ?3)",
                params![1, NullNano64::NULL, NullNano64::new(id)],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO t VALUES (?1, ?2, ?3)",
                params![2, NullNano64::new(Nano64::NIL), NullNano64::new(Nano64::NIL)],
            )
            .unwrap();

            let (a, b): (NullNano64, NullNano64) = conn
                .query_row(
                    "SELECT nullable_id, non_null_id FROM t WHERE k = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .unwrap();
            assert_eq!(a, NullNano64::NULL);
            assert_eq!(b, NullNano64::new(id));

            let is_null: bool = conn
                .query_row("SELECT nullable_id IS NULL FROM t WHERE k = 1", [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert!(is_null);

            let c: NullNano64 = conn
                .query_row("SELECT nullable_id FROM t WHERE k = 2", [], |row| row.get(0))
                .unwrap();
            assert_eq!(c, NullNano64::new(Nano64::NIL));
        }

        /// Reads integer columns as present identifiers
        #[test]
        fn reads_integer_columns_as_present_identifiers() {
            let conn = Connection::open_in_memory().unwrap();
            let e: NullNano64 = conn
                .query_row("SELECT 12345", [], |row| row.get(0))
                .unwrap();
            assert_eq!(e, NullNano64::new(Nano64::from(12345)));
        }
    }
}
