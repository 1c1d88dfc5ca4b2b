use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid mnemonic length: expected {expected} words, obtained {obtained}")]
    InvalidLength {
        expected: &'static str,
        obtained: usize,
    },

    #[error("unknown word: \"{0}\" is not in the BIP-39 wordlist")]
    UnknownWord(String),

    #[error("invalid checksum: expected {expected:x}, obtained {obtained:x}")]
    InvalidChecksum { expected: u8, obtained: u8 },

    #[error("invalid entropy size: expected 128/160/192/224/256 bits, obtained {0} bits")]
    InvalidEntropyLength(usize),

    #[error("entropy source failure: {0}")]
    EntropySource(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(&'static str),

    #[error("authentication failed: wrong password or corrupted carrier")]
    AuthenticationFailed,

    #[error("insufficient capacity: {required} bits required, {available} bits available")]
    InsufficientCapacity { required: usize, available: usize },

    #[error("invalid carrier: {0}")]
    InvalidCarrier(&'static str),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
