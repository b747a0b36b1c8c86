// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Component masks: bitsets over registered component ids.
//!
//! A mask is the identity of an archetype and the filter of a selection.
//! Trailing zero words are always trimmed, so two masks with the same bits
//! compare and hash equal regardless of how they were built.

use smallvec::SmallVec;

use crate::component::{ComponentId, ComponentSet};

const WORD_BITS: usize = 64;

#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentMask {
    words: SmallVec<[u64; 2]>,
}

impl ComponentMask {
    /// Empty mask.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask of every component type in `S`.
    pub fn of<S: ComponentSet>() -> Self {
        S::mask()
    }

    /// Mask built from a list of ids.
    pub fn from_ids<I: IntoIterator<Item = ComponentId>>(ids: I) -> Self {
        let mut mask = Self::new();
        for id in ids {
            mask.insert(id);
        }
        mask
    }

    /// Set the bit for `id`. Grows automatically.
    pub fn insert(&mut self, id: ComponentId) {
        let (word_idx, bit_idx) = (id.index() / WORD_BITS, id.index() % WORD_BITS);
        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }
        self.words[word_idx] |= 1 << bit_idx;
    }

    /// Clear the bit for `id`.
    pub fn remove(&mut self, id: ComponentId) {
        let (word_idx, bit_idx) = (id.index() / WORD_BITS, id.index() % WORD_BITS);
        if let Some(word) = self.words.get_mut(word_idx) {
            *word &= !(1 << bit_idx);
        }
        self.trim();
    }

    /// Check if the bit for `id` is set.
    pub fn has(&self, id: ComponentId) -> bool {
        let (word_idx, bit_idx) = (id.index() / WORD_BITS, id.index() % WORD_BITS);
        match self.words.get(word_idx) {
            Some(word) => (word & (1 << bit_idx)) != 0,
            None => false,
        }
    }

    /// True iff every bit set in `other` is also set in `self`.
    pub fn contains(&self, other: &Self) -> bool {
        if other.words.len() > self.words.len() {
            // Trimmed, so other's last word is non-zero and out of our range.
            return false;
        }
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(mine, theirs)| mine & theirs == *theirs)
    }

    /// True iff `self` and `other` share at least one bit.
    pub fn has_common(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(mine, theirs)| mine & theirs != 0)
    }

    /// Copy of `self` with every bit of `other` cleared.
    #[must_use]
    pub fn remove_common(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (mine, theirs) in result.words.iter_mut().zip(other.words.iter()) {
            *mine &= !theirs;
        }
        result.trim();
        result
    }

    /// Union of both masks.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let (long, short) = if self.words.len() >= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut result = long.clone();
        for (mine, theirs) in result.words.iter_mut().zip(short.words.iter()) {
            *mine |= theirs;
        }
        result
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Ids of the set bits, ascending.
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl std::fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ones().map(|id| id.index())).finish()
    }
}

impl FromIterator<ComponentId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// Iterator over the set bits of a [`ComponentMask`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl<'a> Iterator for Ones<'a> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let trailing = self.current_word.trailing_zeros();
                self.current_word &= !(1 << trailing);
                return Some(ComponentId::from_index(
                    self.word_idx * WORD_BITS + trailing as usize,
                ));
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current_word = self.words[self.word_idx];
        }
    }
}
