//! Authenticated encryption of Nano64 identifiers with AES-GCM.

use std::fmt;

use aes::Aes192;
use aes_gcm::aead::{consts::U12, Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use rand::{rngs::OsRng, RngCore};

use crate::generator::{generate, OsRandSource, RandSource, StdSystemTime, TimeSource};
use crate::{Error, Nano64, IV_LENGTH, PAYLOAD_LENGTH, TAG_LENGTH};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM cipher selected by key length.
enum Cipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl Cipher {
    fn new(key: &[u8]) -> Result<Self, Error> {
        let invalid = |_| Error::InvalidKeyLength(key.len());
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128).map_err(invalid),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192).map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256).map_err(invalid),
            len => Err(Error::InvalidKeyLength(len)),
        }
    }

    const fn key_bits(&self) -> usize {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }

    fn seal(&self, iv: [u8; IV_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::<U12>::from(iv);
        match self {
            Self::Aes128(c) => c.encrypt(&nonce, plaintext),
            Self::Aes192(c) => c.encrypt(&nonce, plaintext),
            Self::Aes256(c) => c.encrypt(&nonce, plaintext),
        }
    }

    fn open(&self, iv: [u8; IV_LENGTH], ciphertext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::<U12>::from(iv);
        match self {
            Self::Aes128(c) => c.decrypt(&nonce, ciphertext),
            Self::Aes192(c) => c.decrypt(&nonce, ciphertext),
            Self::Aes256(c) => c.decrypt(&nonce, ciphertext),
        }
    }
}

/// An AES-GCM key bound to the random source and clock used by
/// [`generate_encrypted`](EncryptionContext::generate_encrypted).
///
/// The key is 16, 24, or 32 bytes long for AES-128, AES-192, or AES-256. Each encryption draws
/// a fresh 12-byte IV from the operating system's random source and seals the 8-byte big-endian
/// identifier without associated data, so the payload is always
/// `IV (12) || ciphertext (8) || tag (16)`.
///
/// The context holds no mutable state and can be shared freely between threads.
///
/// # Examples
///
/// ```rust
/// use nano64::{EncryptionContext, Nano64};
///
/// let ctx = EncryptionContext::new(&[0x42; 32])?;
/// let id = Nano64::from_fields(1234567890123, 0x12345);
///
/// let enc = ctx.encrypt(id)?;
/// assert_eq!(enc.to_hex().len(), 72);
/// assert_eq!(ctx.decrypt(&enc.to_bytes())?, id);
/// assert_eq!(ctx.decrypt_hex(&enc.to_hex())?, id);
/// # Ok::<(), nano64::Error>(())
/// ```
pub struct EncryptionContext<R = OsRandSource, T = StdSystemTime> {
    cipher: Cipher,
    rand_source: R,
    time_source: T,
}

impl EncryptionContext {
    /// Creates a context that uses the operating system's random source and system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] if `key` is not 16, 24, or 32 bytes long.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        Self::with_sources(key, OsRandSource, StdSystemTime)
    }
}

impl<R: RandSource, T: TimeSource> EncryptionContext<R, T> {
    /// Creates a context with a random number generator and a clock for identifier generation.
    ///
    /// IVs are always drawn from the operating system's random source.
    pub fn with_sources(key: &[u8], rand_source: R, time_source: T) -> Result<Self, Error> {
        Ok(Self {
            cipher: Cipher::new(key)?,
            rand_source,
            time_source,
        })
    }

    /// Returns the AES key length in bits.
    pub const fn key_bits(&self) -> usize {
        self.cipher.key_bits()
    }

    /// Encrypts an identifier under a fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if no IV could be drawn and [`Error::Crypto`] if the cipher
    /// fails.
    pub fn encrypt(&self, id: Nano64) -> Result<EncryptedNano64, Error> {
        let mut iv = [0u8; IV_LENGTH];
        OsRng.try_fill_bytes(&mut iv).map_err(|err| {
            tracing::warn!(error = %err, "operating system random source failed");
            Error::entropy(err)
        })?;

        let ciphertext = self
            .cipher
            .seal(iv, &id.to_bytes())
            .map_err(|_| Error::Crypto)?;
        if ciphertext.len() != PAYLOAD_LENGTH - IV_LENGTH {
            return Err(Error::Crypto);
        }

        let mut payload = [0u8; PAYLOAD_LENGTH];
        payload[..IV_LENGTH].copy_from_slice(&iv);
        payload[IV_LENGTH..].copy_from_slice(&ciphertext);
        Ok(EncryptedNano64 { id, payload })
    }

    /// Decrypts and authenticates a 36-byte payload.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLength`] if `payload` is not 36 bytes long.
    /// - [`Error::Authentication`] if the payload does not verify under this key. The error
    ///   does not tell a wrong key from a modified payload.
    pub fn decrypt(&self, payload: &[u8]) -> Result<Nano64, Error> {
        self.decrypt_encrypted(payload).map(|enc| enc.id)
    }

    /// Decrypts a payload from its 72-digit hexadecimal form.
    ///
    /// Digits are accepted in either case, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if `src` is not hexadecimal, and otherwise the errors
    /// of [`decrypt`](Self::decrypt).
    pub fn decrypt_hex(&self, src: &str) -> Result<Nano64, Error> {
        self.decrypt_encrypted_hex(src).map(|enc| enc.id)
    }

    /// Decrypts a 36-byte payload and keeps it next to the identifier, so the verified payload
    /// can be emitted again.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`decrypt`](Self::decrypt).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nano64::{EncryptionContext, Nano64};
    ///
    /// let ctx = EncryptionContext::new(&[0x42; 16])?;
    /// let stored = ctx.encrypt(Nano64::from(42))?.to_hex();
    ///
    /// let enc = ctx.decrypt_encrypted_hex(&stored)?;
    /// assert_eq!(enc.id(), Nano64::from(42));
    /// assert_eq!(enc.to_hex(), stored);
    /// # Ok::<(), nano64::Error>(())
    /// ```
    pub fn decrypt_encrypted(&self, payload: &[u8]) -> Result<EncryptedNano64, Error> {
        let payload =
            <[u8; PAYLOAD_LENGTH]>::try_from(payload).map_err(|_| Error::InvalidLength {
                expected: PAYLOAD_LENGTH,
                got: payload.len(),
            })?;

        let mut iv = [0u8; IV_LENGTH];
        iv.copy_from_slice(&payload[..IV_LENGTH]);
        let plaintext = self
            .cipher
            .open(iv, &payload[IV_LENGTH..])
            .map_err(|_| {
                tracing::debug!("rejected encrypted payload");
                Error::Authentication
            })?;

        Ok(EncryptedNano64 {
            id: Nano64::from_slice(&plaintext)?,
            payload,
        })
    }

    /// Decrypts a payload from its 72-digit hexadecimal form and keeps it next to the
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`decrypt_hex`](Self::decrypt_hex).
    pub fn decrypt_encrypted_hex(&self, src: &str) -> Result<EncryptedNano64, Error> {
        let digits = src
            .strip_prefix("0x")
            .or_else(|| src.strip_prefix("0X"))
            .unwrap_or(src);
        let payload =
            hex::decode(digits).map_err(|_| Error::InvalidFormat("invalid hexadecimal payload"))?;
        self.decrypt_encrypted(&payload)
    }

    /// Generates a new identifier and encrypts it.
    ///
    /// `None` and `Some(0)` both read the clock, so this method cannot produce an identifier
    /// with the epoch as its timestamp; use [`generate`] and [`encrypt`](Self::encrypt) for
    /// that.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`generate`] and [`encrypt`](Self::encrypt).
    pub fn generate_encrypted(&self, unix_ts_ms: Option<u64>) -> Result<EncryptedNano64, Error> {
        let unix_ts_ms = match unix_ts_ms {
            Some(ts) if ts != 0 => ts,
            _ => self.time_source.unix_ts_ms(),
        };
        self.encrypt(generate(unix_ts_ms, &self.rand_source)?)
    }

    /// Generates a new identifier from the current timestamp and encrypts it.
    pub fn generate_encrypted_now(&self) -> Result<EncryptedNano64, Error> {
        self.generate_encrypted(None)
    }
}

impl<R: fmt::Debug, T: fmt::Debug> fmt::Debug for EncryptionContext<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("key_bits", &self.cipher.key_bits())
            .field("rand_source", &self.rand_source)
            .field("time_source", &self.time_source)
            .finish_non_exhaustive()
    }
}

/// An identifier paired with its encrypted payload.
///
/// The payload is `IV (12) || ciphertext (8) || tag (16)`, always 36 bytes. Accessors return
/// copies, so the value stays valid after the [`EncryptionContext`] that made it is dropped.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct EncryptedNano64 {
    id: Nano64,
    payload: [u8; PAYLOAD_LENGTH],
}

impl EncryptedNano64 {
    /// Returns the plaintext identifier.
    pub const fn id(&self) -> Nano64 {
        self.id
    }

    /// Returns the 36-byte payload.
    pub const fn to_bytes(&self) -> [u8; PAYLOAD_LENGTH] {
        self.payload
    }

    /// Returns the payload as 72 uppercase hexadecimal digits.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.payload)
    }

    /// Returns the 16-byte authentication tag at the end of the payload.
    pub fn tag(&self) -> &[u8] {
        &self.payload[PAYLOAD_LENGTH - TAG_LENGTH..]
    }
}

impl fmt::Display for EncryptedNano64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
