use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::mnemonic::{Mnemonic, WORD_SIZE};

/// Leading `entropy_bits / 32` bits of SHA-256(entropy), right-aligned.
pub fn checksum_bits(entropy: &[u8]) -> u8 {
    let size = checksum_size(entropy).min(8);
    let hash = Sha256::digest(entropy);
    hash[0].checked_shr((8 - size) as u32).unwrap_or(0)
}

pub fn checksum_size(entropy: &[u8]) -> usize {
    entropy.len() * 8 / 32
}

/// Index of the last word once the checksum is recomputed: the trailing
/// `11 - checksum_size` entropy bits followed by the checksum bits.
pub fn corrected_last_index(entropy: &[u8]) -> u16 {
    let size = checksum_size(entropy);
    let tail = WORD_SIZE - size;

    // 3..=7 bits, always inside the last entropy byte.
    let last = entropy.last().copied().unwrap_or_default() as u16;
    let entropy_tail = last & ((1 << tail) - 1);

    (entropy_tail << size) | checksum_bits(entropy) as u16
}

/// Rewrites the checksum carried by the last word, leaving every entropy bit
/// untouched. Correct phrases come back unchanged.
pub fn correct<S: AsRef<str>>(words: &[S]) -> Result<Vec<&'static str>> {
    Mnemonic::from_words(words, true).map(|mnemonic| mnemonic.words())
}

pub(crate) fn verify(entropy: &[u8], obtained: u8) -> Result<()> {
    let expected = checksum_bits(entropy);
    if expected != obtained {
        return Err(Error::InvalidChecksum { expected, obtained });
    }
    Ok(())
}
