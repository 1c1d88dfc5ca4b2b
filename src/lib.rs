pub mod bits;
pub mod checksum;
pub mod error;
pub mod kdf;
pub mod mnemonic;
pub mod payload;
pub mod seed;
pub mod stego;
pub mod transform;
pub mod wordlist;

pub use error::{Error, Result};
pub use kdf::{Argon2Config, derive_payload_key};
pub use mnemonic::{Mnemonic, MnemonicInfo, WordCount};
pub use seed::Seed;
pub use stego::{Carrier, Direction, capacity, embed, extract, hide, reveal};
pub use transform::{Transformation, join, split};
pub use wordlist::{get_wordlist, wordlist_size};
