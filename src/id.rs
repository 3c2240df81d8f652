use std::{fmt, str, time};

use crate::{Error, MAX_RANDOM, MAX_TIMESTAMP, RANDOM_BITS};

/// Represents a Nano64 identifier: a 44-bit millisecond timestamp followed by a 20-bit random
/// field, stored as a single unsigned 64-bit integer.
///
/// Identifiers compare and sort as unsigned integers, which is the same as sorting by
/// timestamp and then by the random field. The big-endian byte form and the hexadecimal text
/// form preserve that order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Nano64(u64);

impl Nano64 {
    /// Nil identifier (00000000000-00000)
    ///
    /// The nil identifier is a regular value; use [`NullNano64`](crate::NullNano64) or
    /// `Option<Nano64>` to represent the absence of an identifier.
    pub const NIL: Self = Self(0);

    /// Max identifier (FFFFFFFFFFF-FFFFF)
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an identifier from the `timestamp` and `random` field values.
    ///
    /// Bits beyond each field's width are discarded; range checks belong to the generators.
    pub const fn from_fields(timestamp: u64, random: u32) -> Self {
        Self(((timestamp & MAX_TIMESTAMP) << RANDOM_BITS) | (random & MAX_RANDOM) as u64)
    }

    /// Returns the embedded Unix timestamp in milliseconds.
    pub const fn timestamp(&self) -> u64 {
        self.0 >> RANDOM_BITS
    }

    /// Returns the 20-bit random field.
    pub const fn random(&self) -> u32 {
        (self.0 & MAX_RANDOM as u64) as u32
    }

    /// Returns the underlying unsigned 64-bit integer.
    pub const fn to_u64(self) -> u64 {
        self.0
    }

    /// Returns the 8-byte big-endian representation.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Returns `true` if this is the nil identifier.
    pub const fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// Returns the embedded timestamp as a [`SystemTime`](time::SystemTime).
    pub fn to_system_time(&self) -> time::SystemTime {
        time::UNIX_EPOCH + time::Duration::from_millis(self.timestamp())
    }

    /// Returns the dashed hexadecimal string representation stored in a stack-allocated string
    /// type.
    ///
    /// The first 11 digits cover the timestamp field and the last 5 cover the random field.
    /// Use the [`fmt::Display`] trait usually to get the same representation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nano64::Nano64;
    ///
    /// let x = Nano64::from_fields(1234567890123, 0x12345);
    /// assert_eq!(&x.encode() as &str, "11F71FB04CB-12345");
    /// assert_eq!(x.to_string(), "11F71FB04CB-12345");
    /// ```
    pub fn encode(&self) -> fstr::FStr<17> {
        const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

        let mut buffer = [b'-'; 17];
        for i in 0..16 {
            let digit = (self.0 >> (60 - 4 * i)) as usize & 15;
            buffer[if i < 11 { i } else { i + 1 }] = DIGITS[digit];
        }
        debug_assert!(buffer.is_ascii());
        // SAFETY: ok because buffer consists of ASCII code points
        unsafe { fstr::FStr::from_inner_unchecked(buffer) }
    }

    /// Creates an identifier from an 8-byte big-endian slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if `bytes` is not exactly 8 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        <[u8; 8]>::try_from(bytes)
            .map(Self::from)
            .map_err(|_| Error::InvalidLength {
                expected: 8,
                got: bytes.len(),
            })
    }
}

impl fmt::Display for Nano64 {
    /// Returns the dashed 11-5 hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Nano64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nano64")
            .field("value", &self.0)
            .field("timestamp", &self.timestamp())
            .field("random", &self.random())
            .finish()
    }
}

impl str::FromStr for Nano64 {
    type Err = Error;

    /// Creates an object from the hexadecimal string representation.
    ///
    /// Accepts 16 hexadecimal digits in either case, optionally prefixed by `0x` or `0X` and
    /// optionally split by dashes. Dashes are removed before the prefix is looked for.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        // room for 16 digits and a two-character prefix
        let mut buffer = [0u8; 18];
        let mut len = 0;
        for c in src.bytes().filter(|&c| c != b'-') {
            let dst = buffer
                .get_mut(len)
                .ok_or(Error::InvalidFormat("hex must be 16 digits"))?;
            *dst = c;
            len += 1;
        }

        let cleaned = &buffer[..len];
        let digits = cleaned
            .strip_prefix(b"0x")
            .or_else(|| cleaned.strip_prefix(b"0X"))
            .unwrap_or(cleaned);
        if digits.len() != 16 {
            return Err(Error::InvalidFormat("hex must be 16 digits"));
        }

        let mut dst = [0u8; 8];
        hex::decode_to_slice(digits, &mut dst)
            .map_err(|_| Error::InvalidFormat("hex contains non-hex character"))?;
        Ok(Self::from(dst))
    }
}

impl From<Nano64> for u64 {
    fn from(src: Nano64) -> Self {
        src.0
    }
}

impl From<u64> for Nano64 {
    fn from(src: u64) -> Self {
        Self(src)
    }
}

impl From<Nano64> for [u8; 8] {
    fn from(src: Nano64) -> Self {
        src.to_bytes()
    }
}

impl From<[u8; 8]> for Nano64 {
    fn from(src: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(src))
    }
}

impl TryFrom<&[u8]> for Nano64 {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(src)
    }
}

impl From<Nano64> for String {
    fn from(src: Nano64) -> Self {
        src.to_string()
    }
}

impl TryFrom<&str> for Nano64 {
    type Error = Error;

    fn try_from(src: &str) -> Result<Self, Self::Error> {
        src.parse()
    }
}

impl TryFrom<String> for Nano64 {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Nano64};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Nano64 {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(&self.to_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Nano64 {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                // hex string preferred, raw unsigned integer accepted
                deserializer.deserialize_any(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Nano64;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a Nano64 representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Self::Value::from(value))
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Self::Value::from_slice(value).map_err(de::Error::custom)
        }
    }

}

#[cfg(feature = "rusqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "rusqlite")))]
mod rusqlite_support {
    use super::Nano64;
    use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

    impl ToSql for Nano64 {
        /// Binds the identifier as an 8-byte big-endian BLOB.
        fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
            Ok(ToSqlOutput::from(self.to_bytes().to_vec()))
        }
    }

    impl FromSql for Nano64 {
        /// Reads an 8-byte BLOB, or an INTEGER reinterpreted as an unsigned 64-bit value.
        fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
            match value {
                ValueRef::Integer(n) => Ok(Self::from(n as u64)),
                ValueRef::Blob(bytes) => {
                    <[u8; 8]>::try_from(bytes)
                        .map(Self::from)
                        .map_err(|_| FromSqlError::InvalidBlobSize {
                            expected_size: 8,
                            blob_size: bytes.len(),
                        })
                }
                _ => Err(FromSqlError::InvalidType),
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::Nano64;
    use crate::{Error, MAX_RANDOM, MAX_TIMESTAMP};

    /// Returns a collection of prepared cases
    fn prepare_cases() -> &'static [((u64, u32), u64, &'static str)] {
        &[
            ((0, 0), 0, "00000000000-00000"),
            ((MAX_TIMESTAMP, 0), 0xffff_ffff_fff0_0000, "FFFFFFFFFFF-00000"),
            ((0, MAX_RANDOM), 0x0000_0000_000f_ffff, "00000000000-FFFFF"),
            ((MAX_TIMESTAMP, MAX_RANDOM), u64::MAX, "FFFFFFFFFFF-FFFFF"),
            (
                (1234567890123, 0x12345),
                0x11f7_1fb0_4cb1_2345,
                "11F71FB04CB-12345",
            ),
            (
                (0x1_2345_6789_ab, 0xcdef0),
                0x1234_5678_9abc_def0,
                "123456789AB-CDEF0",
            ),
        ]
    }

    /// Encodes and decodes prepared cases correctly
    #[test]
    fn encodes_and_decodes_prepared_cases_correctly() {
        for ((timestamp, random), value, text) in prepare_cases() {
            let from_fields = Nano64::from_fields(*timestamp, *random);
            assert_eq!(from_fields.to_u64(), *value);
            assert_eq!(from_fields.timestamp(), *timestamp);
            assert_eq!(from_fields.random(), *random);
            assert_eq!(&from_fields.encode() as &str, *text);
            assert_eq!(&from_fields.to_string(), text);
            assert_eq!(text.parse::<Nano64>().unwrap(), from_fields);
            assert_eq!(text.to_lowercase().parse::<Nano64>().unwrap(), from_fields);
            assert_eq!(text.replace('-', "").parse::<Nano64>().unwrap(), from_fields);
        }
    }

    /// Discards bits beyond each field width
    #[test]
    fn discards_bits_beyond_each_field_width() {
        let e = Nano64::from_fields(MAX_TIMESTAMP + 2, MAX_RANDOM + 3);
        assert_eq!(e.timestamp(), 1);
        assert_eq!(e.random(), 2);
        assert_eq!(Nano64::from_fields(u64::MAX, u32::MAX), Nano64::MAX);
    }

    /// Accepts optional prefix and dashes in any case
    #[test]
    fn accepts_optional_prefix_and_dashes_in_any_case() {
        let expected = Nano64::from(0x1234_5678_9abc_def0);
        let cases = [
            "123456789AB-CDEF0",
            "123456789ABCDEF0",
            "123456789ab-cdef0",
            "0x123456789ABCDEF0",
            "0X123456789abcdef0",
            "0x123456789AB-CDEF0",
            "1234-5678-9ABC-DEF0",
            "-0x123456789ABCDEF0",
            "0x-123456789AB-CDEF0",
            "0-x123456789ABCDEF0",
            "--0X-123456789abcdef0--",
        ];
        for e in cases {
            assert_eq!(e.parse::<Nano64>().unwrap(), expected, "{}", e);
        }
    }

    /// Returns error to invalid string representation
    #[test]
    fn returns_error_to_invalid_string_representation() {
        let cases = [
            "",
            "123",
            "0x",
            "123456789AB-CDEFG",
            "123456789AB-CDEF",
            "123456789AB-CDEF01",
            " 123456789AB-CDEF0",
            "123456789AB-CDEF0 ",
            "+123456789ABCDEF0",
            "123456789AB_CDEF0",
            "0x0x123456789ABCDEF0",
            "123456789AB-CDEF\u{e9}",
        ];
        for e in cases {
            assert!(
                matches!(e.parse::<Nano64>(), Err(Error::InvalidFormat(_))),
                "{}",
                e
            );
        }
    }

    /// Returns Nil and Max identifiers
    #[test]
    fn returns_nil_and_max_identifiers() {
        assert_eq!(&Nano64::NIL.encode() as &str, "00000000000-00000");
        assert_eq!(&Nano64::MAX.encode() as &str, "FFFFFFFFFFF-FFFFF");
        assert!(Nano64::NIL.is_nil());
        assert!(Nano64::default().is_nil());
        assert!(!Nano64::MAX.is_nil());
    }

    /// Has symmetric converters
    #[test]
    fn has_symmetric_converters() {
        for (_, value, _) in prepare_cases() {
            let e = Nano64::from(*value);
            assert_eq!(Nano64::from(<[u8; 8]>::from(e)), e);
            assert_eq!(Nano64::from(u64::from(e)), e);
            assert_eq!(Nano64::try_from(&e.to_bytes()[..]).unwrap(), e);
            assert_eq!(Nano64::try_from(String::from(e)).unwrap(), e);
            assert_eq!(Nano64::try_from(&e.encode() as &str).unwrap(), e);
        }
    }

    /// Rejects byte slices of wrong length
    #[test]
    fn rejects_byte_slices_of_wrong_length() {
        for len in [0, 1, 7, 9, 16] {
            let bytes = vec![0u8; len];
            assert!(matches!(
                Nano64::from_slice(&bytes),
                Err(Error::InvalidLength { expected: 8, got }) if got == len
            ));
        }
    }

    /// Sorts bytes and strings in the same order as integers
    #[test]
    fn sorts_bytes_and_strings_in_the_same_order_as_integers() {
        let mut values: Vec<Nano64> = (0..1_000)
            .map(|_| Nano64::from(rand::random::<u64>() >> rand::random::<u32>() % 64))
            .collect();
        values.sort();
        for w in values.windows(2) {
            assert!(w[0].to_u64() <= w[1].to_u64());
            assert!(w[0].to_bytes() <= w[1].to_bytes());
            assert!(w[0].to_string() <= w[1].to_string());
        }
    }

    /// Converts timestamp to system time
    #[test]
    fn converts_timestamp_to_system_time() {
        use std::time::UNIX_EPOCH;
        let e = Nano64::from_fields(1234567890123, 0);
        let elapsed = e.to_system_time().duration_since(UNIX_EPOCH).unwrap();
        assert_eq!(elapsed.as_millis(), 1234567890123);
    }

    /// Shows decoded fields in debug output
    #[test]
    fn shows_decoded_fields_in_debug_output() {
        let e = Nano64::from_fields(1000, 7);
        assert_eq!(
            format!("{:?}", e),
            "Nano64 { value: 1048576007, timestamp: 1000, random: 7 }"
        );
    }
}
