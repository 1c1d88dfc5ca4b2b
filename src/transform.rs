//! Involutive entropy transformations used to derive side mnemonics.

use std::fmt;
use std::str::FromStr;

use tracing::debug;
use zeroize::Zeroizing;

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::mnemonic::{Mnemonic, WORD_SIZE, WordCount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transformation {
    /// Complements every bit.
    #[default]
    Negative,
    /// Reads the whole bit string from right to left.
    Reversal,
    /// Reverses the bits inside each 11-bit group aligned to word boundaries.
    Mirror,
}

impl Transformation {
    pub const ALL: [Transformation; 3] = [
        Transformation::Negative,
        Transformation::Reversal,
        Transformation::Mirror,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Transformation::Negative => "negative",
            Transformation::Reversal => "reversal",
            Transformation::Mirror => "mirror",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Transformation::Negative => "inverts all bits, like in a negative",
            Transformation::Reversal => "reads all bits from right to left",
            Transformation::Mirror => "reverses the bits under each word, like in front of a mirror",
        }
    }

    pub fn apply(self, entropy: &[u8]) -> Zeroizing<Vec<u8>> {
        debug!(transformation = self.name(), bits = entropy.len() * 8, "transforming entropy");
        match self {
            Transformation::Negative => Zeroizing::new(entropy.iter().map(|b| !b).collect()),
            Transformation::Reversal => {
                Zeroizing::new(entropy.iter().rev().map(|b| b.reverse_bits()).collect())
            }
            Transformation::Mirror => mirror(entropy),
        }
    }
}

fn mirror(entropy: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut reader = BitReader::new(entropy);
    let mut writer = BitWriter::with_capacity(entropy.len() * 8);

    while reader.remaining() > 0 {
        let width = reader.remaining().min(WORD_SIZE);
        let group = reader.read(width).unwrap_or_default();
        writer.write(group.reverse_bits() >> (32 - width), width);
    }

    Zeroizing::new(writer.into_bytes())
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Transformation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown transformation \"{}\"", s))
    }
}

/// Transforms a 24-word mnemonic and splits the result into two 12-word ones.
pub fn split(mnemonic: &Mnemonic, transformation: Transformation) -> Result<(Mnemonic, Mnemonic)> {
    if mnemonic.word_count() != WordCount::Words24 {
        return Err(Error::InvalidLength {
            expected: "24",
            obtained: mnemonic.word_count().words(),
        });
    }

    let entropy = transformation.apply(mnemonic.entropy());
    let (first, second) = entropy.split_at(entropy.len() / 2);
    Ok((Mnemonic::from_entropy(first)?, Mnemonic::from_entropy(second)?))
}

/// Joins two 12-word mnemonics into one 24-word mnemonic and transforms it.
pub fn join(first: &Mnemonic, second: &Mnemonic, transformation: Transformation) -> Result<Mnemonic> {
    for part in [first, second] {
        if part.word_count() != WordCount::Words12 {
            return Err(Error::InvalidLength {
                expected: "12",
                obtained: part.word_count().words(),
            });
        }
    }

    let mut entropy = Zeroizing::new(Vec::with_capacity(WordCount::Words24.entropy_bytes()));
    entropy.extend_from_slice(first.entropy());
    entropy.extend_from_slice(second.entropy());

    Ok(Mnemonic::from_entropy(&entropy)?.transform(transformation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase_of(entropy: &[u8]) -> String {
        Mnemonic::from_entropy(entropy).unwrap().phrase().to_string()
    }

    #[test]
    fn test_negative_reference() {
        let zero = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        let negative = zero.transform(Transformation::Negative);
        assert_eq!(
            *negative.phrase(),
            "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong"
        );

        let legal = Mnemonic::from_entropy(&[0x7f; 16]).unwrap();
        assert_eq!(
            *legal.transform(Transformation::Negative).phrase(),
            "letter advice cage absurd amount doctor acoustic avoid letter advice cage above"
        );
    }

    #[test]
    fn test_reversal() {
        assert_eq!(&*Transformation::Reversal.apply(&[0x80; 16]), &[0x01; 16]);
        assert_eq!(
            &*Transformation::Reversal.apply(&[0x12, 0x34, 0x56, 0x78]),
            &[0x1e, 0x6a, 0x2c, 0x48]
        );
    }

    #[test]
    fn test_mirror_groups_follow_words() {
        let mut entropy = [0u8; 16];
        entropy[0] = 0x80;
        let mirrored = Transformation::Mirror.apply(&entropy);

        let mut expected = [0u8; 16];
        expected[1] = 0x20;
        assert_eq!(&*mirrored, &expected);

        // The trailing 7-bit group is mirrored on its own.
        let mut entropy = [0u8; 16];
        entropy[15] = 0x01;
        let mut expected = [0u8; 16];
        expected[15] = 0x40;
        assert_eq!(&*Transformation::Mirror.apply(&entropy), &expected);
    }

    #[test]
    fn test_mirror_differs_from_reversal() {
        let entropy = hex::decode("f3eb990c391405f8c266668125b3b1b8").unwrap();
        assert_ne!(
            Transformation::Mirror.apply(&entropy),
            Transformation::Reversal.apply(&entropy)
        );
        assert_ne!(
            Transformation::Mirror.apply(&entropy),
            Transformation::Negative.apply(&entropy)
        );
    }

    #[test]
    fn test_involution_all_sizes() {
        let entropy: Vec<u8> = (0u8..32).map(|b| b.wrapping_mul(37).wrapping_add(11)).collect();

        for count in WordCount::ALL {
            let mnemonic = Mnemonic::from_entropy(&entropy[..count.entropy_bytes()]).unwrap();
            for transformation in Transformation::ALL {
                let side = mnemonic.transform(transformation);
                assert_ne!(side, mnemonic, "{} on {} words", transformation, count);
                assert_eq!(side.word_count(), count);
                assert_eq!(side.transform(transformation), mnemonic);
            }
        }
    }

    #[test]
    fn test_transformed_mnemonic_is_valid() {
        let mnemonic = Mnemonic::from_entropy(&hex::decode("9e885d952ad362caeb4efe34a8e91bd2").unwrap()).unwrap();
        for transformation in Transformation::ALL {
            let side = mnemonic.transform(transformation);
            let reparsed = Mnemonic::from_phrase(&side.phrase(), false).unwrap();
            assert_eq!(reparsed, side);
        }
    }

    #[test]
    fn test_split_join() {
        let entropy: Vec<u8> = (0u8..32).collect();
        let mnemonic = Mnemonic::from_entropy(&entropy).unwrap();

        for transformation in Transformation::ALL {
            let (first, second) = split(&mnemonic, transformation).unwrap();
            assert_eq!(first.word_count(), WordCount::Words12);
            assert_eq!(second.word_count(), WordCount::Words12);

            let joined = join(&first, &second, transformation).unwrap();
            assert_eq!(joined, mnemonic);
        }
    }

    #[test]
    fn test_split_negative_halves() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 32]).unwrap();
        let (first, second) = split(&mnemonic, Transformation::Negative).unwrap();
        assert_eq!(*first.phrase(), phrase_of(&[0xff; 16]));
        assert_eq!(*second.phrase(), phrase_of(&[0xff; 16]));
    }

    #[test]
    fn test_split_join_sizes() {
        let twelve = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        let eighteen = Mnemonic::from_entropy(&[0u8; 24]).unwrap();

        assert_eq!(
            split(&twelve, Transformation::Negative).unwrap_err(),
            Error::InvalidLength {
                expected: "24",
                obtained: 12
            }
        );
        assert!(join(&twelve, &eighteen, Transformation::Negative).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("negative".parse::<Transformation>().unwrap(), Transformation::Negative);
        assert_eq!("MIRROR".parse::<Transformation>().unwrap(), Transformation::Mirror);
        assert_eq!(" reversal ".parse::<Transformation>().unwrap(), Transformation::Reversal);
        assert!("rot13".parse::<Transformation>().is_err());
        assert_eq!(Transformation::default(), Transformation::Negative);
    }
}
