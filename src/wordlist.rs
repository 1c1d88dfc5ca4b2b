// This file is part of bip39kit.
//
// Copyright (c) 2025  René Coignard <contact@renecoignard.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashMap;
use std::sync::OnceLock;

use bip39::Language;

use crate::error::{Error, Result};

const WORDLIST_SIZE: u16 = 2048;

static INDEX: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();

pub fn get_wordlist() -> &'static [&'static str] {
    Language::English.word_list()
}

pub const fn wordlist_size() -> u16 {
    WORDLIST_SIZE
}

fn get_index() -> &'static HashMap<&'static str, u16> {
    INDEX.get_or_init(|| {
        let words = get_wordlist();
        let index: HashMap<&'static str, u16> = words
            .iter()
            .enumerate()
            .map(|(i, word)| (*word, i as u16))
            .collect();

        debug_assert_eq!(index.len(), WORDLIST_SIZE as usize);
        index
    })
}

/// Word stored at an 11-bit index. Indices are masked to the table size.
pub fn word_at(index: u16) -> &'static str {
    get_wordlist()[(index & (WORDLIST_SIZE - 1)) as usize]
}

pub fn index_of(word: &str) -> Result<u16> {
    get_index()
        .get(word)
        .copied()
        .ok_or_else(|| Error::UnknownWord(word.to_string()))
}
