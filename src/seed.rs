use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const SEED_LEN: usize = 64;
const ITERATIONS: u32 = 2048;
const SALT_PREFIX: &str = "mnemonic";

/// BIP-39 seed: PBKDF2-HMAC-SHA512 over the NFKD-normalized sentence, salted
/// with `"mnemonic" + passphrase`.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed(Zeroizing<[u8; SEED_LEN]>);

impl Seed {
    pub fn derive(mnemonic: &crate::Mnemonic, passphrase: &str) -> Self {
        mnemonic.to_seed(passphrase)
    }

    /// Works on raw text: the phrase is not validated against the wordlist.
    pub fn from_phrase(phrase: &str, passphrase: &str) -> Self {
        let password: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
        let salt: Zeroizing<String> =
            Zeroizing::new(format!("{}{}", SALT_PREFIX, passphrase).nfkd().collect());

        let mut output = Zeroizing::new([0u8; SEED_LEN]);
        pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), ITERATIONS, &mut *output);
        Self(output)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&*self.0))
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(..)")
    }
}
