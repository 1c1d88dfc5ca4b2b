//! Entropy <-> mnemonic conversion.
//!
//! A [`Mnemonic`] owns only its entropy; words and checksum are projections
//! recomputed on demand, so an instance can never hold a stale checksum.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, trace, warn};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::bits::{BitReader, BitWriter};
use crate::checksum;
use crate::error::{Error, Result};
use crate::seed::Seed;
use crate::transform::Transformation;
use crate::wordlist::{index_of, word_at};

pub const WORD_SIZE: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WordCount {
    #[default]
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl WordCount {
    pub const ALL: [WordCount; 5] = [
        WordCount::Words12,
        WordCount::Words15,
        WordCount::Words18,
        WordCount::Words21,
        WordCount::Words24,
    ];

    pub const fn words(self) -> usize {
        match self {
            WordCount::Words12 => 12,
            WordCount::Words15 => 15,
            WordCount::Words18 => 18,
            WordCount::Words21 => 21,
            WordCount::Words24 => 24,
        }
    }

    pub const fn entropy_bits(self) -> usize {
        self.words() * 32 / 3
    }

    pub const fn entropy_bytes(self) -> usize {
        self.entropy_bits() / 8
    }

    pub const fn checksum_bits(self) -> usize {
        self.words() / 3
    }

    pub fn from_entropy_len(bytes: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|count| count.entropy_bytes() == bytes)
            .ok_or(Error::InvalidEntropyLength(bytes * 8))
    }
}

impl TryFrom<usize> for WordCount {
    type Error = Error;

    fn try_from(words: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|count| count.words() == words)
            .ok_or(Error::InvalidLength {
                expected: "12/15/18/21/24",
                obtained: words,
            })
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words())
    }
}

/// Leading entropy portion of the concatenated word indices.
pub(crate) fn entropy_from_indices(indices: &[u16], word_count: WordCount) -> Zeroizing<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(indices.len() * WORD_SIZE);
    for index in indices {
        writer.write(*index as u32, WORD_SIZE);
    }
    let mut bytes = Zeroizing::new(writer.into_bytes());
    bytes.truncate(word_count.entropy_bytes());
    bytes
}

#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic {
    entropy: Zeroizing<Vec<u8>>,
}

impl Mnemonic {
    /// Draws fresh entropy from the operating system.
    pub fn generate(word_count: WordCount) -> Result<Self> {
        Self::generate_with(word_count, &mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(word_count: WordCount, rng: &mut R) -> Result<Self> {
        let mut entropy = Zeroizing::new(vec![0u8; word_count.entropy_bytes()]);
        rng.try_fill_bytes(&mut entropy)
            .map_err(|e| Error::EntropySource(e.to_string()))?;

        debug!(words = word_count.words(), "generated entropy");
        Ok(Self { entropy })
    }

    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        WordCount::from_entropy_len(entropy.len())?;
        Ok(Self {
            entropy: Zeroizing::new(entropy.to_vec()),
        })
    }

    /// Parses a space separated phrase. The text is NFKD-normalized first.
    pub fn from_phrase(phrase: &str, fix_checksum: bool) -> Result<Self> {
        let normalized: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
        let words: Vec<&str> = normalized.split_whitespace().collect();
        Self::from_words(&words, fix_checksum)
    }

    /// With `fix_checksum` a mismatching checksum is recomputed from the
    /// entropy bits, which only ever changes the last word.
    pub fn from_words<S: AsRef<str>>(words: &[S], fix_checksum: bool) -> Result<Self> {
        let word_count = WordCount::try_from(words.len())?;

        let mut indices = Vec::with_capacity(words.len());
        for word in words {
            let index = index_of(word.as_ref())?;
            trace!(index, word = word.as_ref(), "index -> word");
            indices.push(index);
        }

        let entropy = entropy_from_indices(&indices, word_count);
        let mask = (1u16 << word_count.checksum_bits()) - 1;
        let obtained = (indices[indices.len() - 1] & mask) as u8;

        match checksum::verify(&entropy, obtained) {
            Ok(()) => {}
            Err(Error::InvalidChecksum { expected, obtained }) if fix_checksum => {
                let last = checksum::corrected_last_index(&entropy);
                let (expected, obtained) = (format!("{expected:x}"), format!("{obtained:x}"));
                warn!(
                    %expected,
                    %obtained,
                    word = word_at(last),
                    "invalid checksum, replacing last word"
                );
            }
            Err(e) => return Err(e),
        }

        Ok(Self { entropy })
    }

    pub fn word_count(&self) -> WordCount {
        // Every constructor validates the entropy length.
        WordCount::from_entropy_len(self.entropy.len()).unwrap_or_default()
    }

    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    pub fn checksum(&self) -> u8 {
        checksum::checksum_bits(&self.entropy)
    }

    pub fn indices(&self) -> Vec<u16> {
        let word_count = self.word_count();

        let mut writer = BitWriter::with_capacity(word_count.words() * WORD_SIZE);
        writer.write_bytes(&self.entropy);
        writer.write(self.checksum() as u32, word_count.checksum_bits());
        let bits = Zeroizing::new(writer.into_bytes());

        let mut reader = BitReader::new(&bits);
        (0..word_count.words())
            .map(|_| reader.read(WORD_SIZE).unwrap_or_default() as u16)
            .collect()
    }

    pub fn words(&self) -> Vec<&'static str> {
        self.indices().into_iter().map(word_at).collect()
    }

    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.words().join(" "))
    }

    pub fn info(&self) -> MnemonicInfo {
        MnemonicInfo {
            entropy: hex::encode(&*self.entropy),
            checksum: format!("{:x}", self.checksum()),
            words: self
                .words()
                .into_iter()
                .enumerate()
                .map(|(i, w)| (i + 1, w))
                .collect(),
        }
    }

    /// Side mnemonic: same word count, entropy passed through `transformation`,
    /// checksum recomputed.
    pub fn transform(&self, transformation: Transformation) -> Self {
        Self {
            entropy: transformation.apply(&self.entropy),
        }
    }

    pub fn to_seed(&self, passphrase: &str) -> Seed {
        Seed::from_phrase(&self.phrase(), passphrase)
    }
}

impl FromStr for Mnemonic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_phrase(s, false)
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &(self.entropy.len() * 8 * 3 / 32))
            .finish_non_exhaustive()
    }
}

/// Diagnostic projection of a mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicInfo {
    pub entropy: String,
    pub checksum: String,
    /// 1-based position -> word.
    pub words: Vec<(usize, &'static str)>,
}

impl fmt::Display for MnemonicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "entropy:  {}", self.entropy)?;
        writeln!(f, "checksum: {}", self.checksum)?;
        for (position, word) in &self.words {
            writeln!(f, "  {position:>2}  {word}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &[(&str, &str)] = &[
        (
            "00000000000000000000000000000000",
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        ),
        (
            "7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f",
            "legal winner thank year wave sausage worth useful legal winner thank yellow",
        ),
        (
            "80808080808080808080808080808080",
            "letter advice cage absurd amount doctor acoustic avoid letter advice cage above",
        ),
        (
            "ffffffffffffffffffffffffffffffff",
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong",
        ),
        (
            "9e885d952ad362caeb4efe34a8e91bd2",
            "ozone drill grab fiber curtain grace pudding thank cruise elder eight picnic",
        ),
        (
            "0000000000000000000000000000000000000000000000000000000000000000",
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art",
        ),
        (
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo vote",
        ),
    ];

    struct FixedEntropy(Vec<u8>);

    impl RngCore for FixedEntropy {
        fn next_u32(&mut self) -> u32 {
            let mut buf = [0u8; 4];
            self.fill_bytes(&mut buf);
            u32::from_le_bytes(buf)
        }

        fn next_u64(&mut self) -> u64 {
            let mut buf = [0u8; 8];
            self.fill_bytes(&mut buf);
            u64::from_le_bytes(buf)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for (i, byte) in dest.iter_mut().enumerate() {
                *byte = self.0[i % self.0.len()];
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for FixedEntropy {}

    #[test]
    fn test_reference_vectors() {
        for (entropy, phrase) in VECTORS {
            let from_entropy = Mnemonic::from_entropy(&hex::decode(entropy).unwrap()).unwrap();
            let from_phrase = Mnemonic::from_phrase(phrase, false).unwrap();

            assert_eq!(*from_entropy.phrase(), *phrase);
            assert_eq!(from_phrase, from_entropy);
            assert_eq!(hex::encode(from_phrase.entropy()), *entropy);
        }
    }

    #[test]
    fn test_generate_with_fixed_source() {
        let entropy = hex::decode("f3eb990c391405f8c266668125b3b1b8").unwrap();
        let mut rng = FixedEntropy(entropy.clone());

        let mnemonic = Mnemonic::generate_with(WordCount::Words12, &mut rng).unwrap();

        assert_eq!(mnemonic.entropy(), entropy.as_slice());
        assert_eq!(mnemonic.checksum(), 0);
        assert_eq!(
            *mnemonic.phrase(),
            "view fresh drink impulse doctor wise another smoke license collect unaware hybrid"
        );

        let twice = mnemonic
            .transform(Transformation::Negative)
            .transform(Transformation::Negative);
        assert_eq!(twice, mnemonic);
    }

    #[test]
    fn test_generate_sizes() {
        for count in WordCount::ALL {
            let mnemonic = Mnemonic::generate(count).unwrap();
            assert_eq!(mnemonic.word_count(), count);
            assert_eq!(mnemonic.words().len(), count.words());
            assert_eq!(mnemonic.entropy().len() * 8, count.entropy_bits());

            let parsed = Mnemonic::from_phrase(&mnemonic.phrase(), false).unwrap();
            assert_eq!(parsed, mnemonic);
        }
    }

    #[test]
    fn test_generate_is_random() {
        let a = Mnemonic::generate(WordCount::Words24).unwrap();
        let b = Mnemonic::generate(WordCount::Words24).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_word_count_sizes() {
        let sizes: Vec<(usize, usize, usize)> = WordCount::ALL
            .iter()
            .map(|c| (c.words(), c.entropy_bits(), c.checksum_bits()))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (12, 128, 4),
                (15, 160, 5),
                (18, 192, 6),
                (21, 224, 7),
                (24, 256, 8)
            ]
        );
        assert_eq!(WordCount::try_from(18).unwrap(), WordCount::Words18);
        assert!(WordCount::try_from(13).is_err());
        assert!(WordCount::from_entropy_len(17).is_err());
    }

    #[test]
    fn test_invalid_length() {
        let result = Mnemonic::from_phrase("abandon abandon abandon", false);
        assert_eq!(
            result,
            Err(Error::InvalidLength {
                expected: "12/15/18/21/24",
                obtained: 3
            })
        );
        assert!(matches!(
            Mnemonic::from_phrase("", false),
            Err(Error::InvalidLength { obtained: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_word() {
        let result = Mnemonic::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon bitcoin",
            false,
        );
        assert_eq!(result, Err(Error::UnknownWord("bitcoin".to_string())));
    }

    #[test]
    fn test_unknown_word_reported_before_checksum() {
        // "abandon" x12 alone would fail the checksum.
        for fix_checksum in [false, true] {
            let result = Mnemonic::from_phrase(
                "abandon abandon ethereum abandon abandon abandon abandon abandon abandon abandon abandon abandon",
                fix_checksum,
            );
            assert_eq!(result, Err(Error::UnknownWord("ethereum".to_string())));
        }
    }

    #[test]
    fn test_invalid_checksum_reports_values() {
        let result = Mnemonic::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon",
            false,
        );
        assert_eq!(
            result,
            Err(Error::InvalidChecksum {
                expected: 3,
                obtained: 0
            })
        );
    }

    #[test]
    fn test_fix_checksum_keeps_entropy() {
        let broken =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        let fixed = Mnemonic::from_phrase(broken, true).unwrap();

        assert_eq!(fixed.entropy(), &[0u8; 16]);
        assert_eq!(fixed.words()[11], "about");
    }

    #[test]
    fn test_single_bit_flip_in_last_word() {
        for (_, phrase) in VECTORS {
            let original = Mnemonic::from_phrase(phrase, false).unwrap();
            let count = original.word_count();
            let mut indices = original.indices();
            let last = indices.len() - 1;

            for bit in 0..WORD_SIZE {
                indices[last] ^= 1 << bit;
                let words: Vec<&str> = indices.iter().map(|i| word_at(*i)).collect();

                if bit < count.checksum_bits() {
                    assert!(matches!(
                        Mnemonic::from_words(&words, false),
                        Err(Error::InvalidChecksum { .. })
                    ));
                    let fixed = Mnemonic::from_words(&words, true).unwrap();
                    assert_eq!(fixed, original);
                } else {
                    // Entropy bit flipped: the fix keeps the new entropy.
                    let fixed = Mnemonic::from_words(&words, true).unwrap();
                    assert_ne!(fixed.entropy(), original.entropy());
                    assert_eq!(&fixed.words()[..last], &words[..last]);
                }

                indices[last] ^= 1 << bit;
            }
        }
    }

    #[test]
    fn test_normalization_and_whitespace() {
        let messy = "  abandon\tabandon abandon  abandon abandon abandon\nabandon abandon abandon abandon abandon about ";
        let mnemonic: Mnemonic = messy.parse().unwrap();
        assert_eq!(mnemonic.entropy(), &[0u8; 16]);
    }

    #[test]
    fn test_indices_match_corrected_last_index() {
        for (entropy, _) in VECTORS {
            let mnemonic = Mnemonic::from_entropy(&hex::decode(entropy).unwrap()).unwrap();
            let indices = mnemonic.indices();
            assert_eq!(
                indices[indices.len() - 1],
                checksum::corrected_last_index(mnemonic.entropy())
            );
        }
    }

    #[test]
    fn test_info() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        let info = mnemonic.info();

        assert_eq!(info.entropy, "00000000000000000000000000000000");
        assert_eq!(info.checksum, "3");
        assert_eq!(info.words.len(), 12);
        assert_eq!(info.words[0], (1, "abandon"));
        assert_eq!(info.words[11], (12, "about"));

        let rendered = info.to_string();
        assert!(rendered.contains("checksum: 3"));
        assert!(rendered.contains("12  about"));
    }

    #[test]
    fn test_from_entropy_rejects_bad_size() {
        assert_eq!(
            Mnemonic::from_entropy(&[0u8; 15]),
            Err(Error::InvalidEntropyLength(120))
        );
    }

    #[test]
    fn test_debug_hides_words() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        let debug = format!("{:?}", mnemonic);
        assert!(!debug.contains("abandon"));
        assert!(debug.contains("12"));
    }
}
