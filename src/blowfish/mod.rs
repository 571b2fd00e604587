//! Blowfish with the Eksblowfish key schedule.
//!
//! Standard Blowfish keys its P-array and S-boxes once. bcrypt's variant,
//! Eksblowfish, first runs a salted key expansion and then alternately
//! re-keys the state with the password and with the salt `2^cost` times.
//! That loop is what makes bcrypt slow on purpose.
//!
//! All key and salt bytes are consumed as big-endian 32-bit words, cycling
//! back to the start of the input when it runs out.

mod consts;

use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::engine::Cost;
use crate::error::{BcryptError, BcryptResult};
use consts::{P_INIT, S_INIT};

const ROUNDS: usize = 16;

/// Expanded Blowfish key material: 18 round subkeys and four S-boxes.
///
/// The contents are derived from the password, so they are wiped when the
/// value is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Subkeys {
    p: [u32; ROUNDS + 2],
    s: [[u32; 256]; 4],
}

/// Reads big-endian words from a byte string, wrapping around at the end.
struct WordStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WordStream<'a> {
    fn new(data: &'a [u8]) -> Self {
        WordStream { data, pos: 0 }
    }

    fn next_word(&mut self) -> u32 {
        let mut word = 0u32;
        for _ in 0..4 {
            if self.pos >= self.data.len() {
                self.pos = 0;
            }
            word = (word << 8) | self.data[self.pos] as u32;
            self.pos += 1;
        }
        word
    }
}

impl Subkeys {
    /// The unkeyed Blowfish state.
    pub fn initial() -> Self {
        Subkeys {
            p: P_INIT,
            s: S_INIT,
        }
    }

    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        let h = self.s[0][a as usize].wrapping_add(self.s[1][b as usize]);
        (h ^ self.s[2][c as usize]).wrapping_add(self.s[3][d as usize])
    }

    /// Encrypts one 64-bit block given as its two halves.
    pub fn encrypt_block(&self, mut left: u32, mut right: u32) -> (u32, u32) {
        for i in (0..ROUNDS).step_by(2) {
            left ^= self.p[i];
            right ^= self.f(left);
            right ^= self.p[i + 1];
            left ^= self.f(right);
        }
        left ^= self.p[ROUNDS];
        right ^= self.p[ROUNDS + 1];

        (right, left)
    }

    fn mix_key(&mut self, key: &[u8]) -> BcryptResult<()> {
        if key.is_empty() {
            return Err(BcryptError::InvalidKey);
        }
        let mut stream = WordStream::new(key);
        for p in self.p.iter_mut() {
            *p ^= stream.next_word();
        }
        Ok(())
    }

    /// Refills P and then the S-boxes with the running ciphertext. When
    /// `salt` is given, its words are folded into each block before it is
    /// encrypted.
    fn refill(&mut self, mut salt: Option<WordStream<'_>>) {
        let mut block = (0u32, 0u32);
        let mut next = |state: &Subkeys, block: (u32, u32)| {
            let (mut l, mut r) = block;
            if let Some(stream) = salt.as_mut() {
                l ^= stream.next_word();
                r ^= stream.next_word();
            }
            state.encrypt_block(l, r)
        };

        for i in (0..ROUNDS + 2).step_by(2) {
            block = next(&*self, block);
            self.p[i] = block.0;
            self.p[i + 1] = block.1;
        }

        for b in 0..4 {
            for k in (0..256).step_by(2) {
                block = next(&*self, block);
                self.s[b][k] = block.0;
                self.s[b][k + 1] = block.1;
            }
        }
    }

    /// Salted key expansion, the first step of Eksblowfish.
    ///
    /// XORs the cycled key into the P-array, then regenerates every subkey
    /// by encrypting a chain of blocks each pre-mixed with the next two
    /// words of the salt.
    pub fn expand_key(&mut self, key: &[u8], salt: &[u8]) -> BcryptResult<()> {
        if salt.is_empty() {
            return Err(BcryptError::InvalidSalt(0));
        }
        self.mix_key(key)?;
        self.refill(Some(WordStream::new(salt)));
        Ok(())
    }

    /// Unsalted re-keying with `key`. Applied to [`Subkeys::initial`] this
    /// is the standard Blowfish key schedule.
    pub fn expand_state(&mut self, key: &[u8]) -> BcryptResult<()> {
        self.mix_key(key)?;
        self.refill(None);
        Ok(())
    }
}

/// Runs the full Eksblowfish setup and returns the derived state.
///
/// `key` is the prepared password (already truncated and terminated by the
/// caller). The returned [`Subkeys`] wipe themselves on drop, and so does
/// the intermediate state if any step fails.
pub fn eks_setup(cost: Cost, key: &[u8], salt: &[u8]) -> BcryptResult<Subkeys> {
    let mut state = Subkeys::initial();
    state.expand_key(key, salt)?;

    trace!(rounds = cost.rounds(), "eksblowfish expensive key schedule");
    for _ in 0..cost.rounds() {
        state.expand_state(key)?;
        state.expand_state(salt)?;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(key: &[u8]) -> Subkeys {
        let mut state = Subkeys::initial();
        state.expand_state(key).unwrap();
        state
    }

    // Eric Young's Blowfish ECB vectors.
    #[test]
    fn standard_blowfish_vectors() {
        let zero = keyed(&[0u8; 8]);
        assert_eq!(zero.encrypt_block(0, 0), (0x4ef99745, 0x6198dd78));

        let ones = keyed(&[0xffu8; 8]);
        assert_eq!(
            ones.encrypt_block(0xffffffff, 0xffffffff),
            (0x51866fd5, 0xb85ecb8a)
        );

        let mixed = keyed(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(
            mixed.encrypt_block(0x11111111, 0x11111111),
            (0x61f9c380, 0x2281b096)
        );
    }

    #[test]
    fn initial_state_matches_pi() {
        let state = Subkeys::initial();
        assert_eq!(state.p[0], 0x243f6a88);
        assert_eq!(state.p[17], 0x8979fb1b);
        assert_eq!(state.s[0][0], 0xd1310ba6);
        assert_eq!(state.s[3][255], 0x3ac372e6);
    }

    #[test]
    fn word_stream_wraps_big_endian() {
        let mut stream = WordStream::new(&[1, 2, 3]);
        assert_eq!(stream.next_word(), 0x01020301);
        assert_eq!(stream.next_word(), 0x02030102);
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut state = Subkeys::initial();
        assert!(matches!(state.expand_state(&[]), Err(BcryptError::InvalidKey)));
        assert!(matches!(
            state.expand_key(&[], &[0u8; 16]),
            Err(BcryptError::InvalidKey)
        ));
        assert!(matches!(
            state.expand_key(b"key", &[]),
            Err(BcryptError::InvalidSalt(0))
        ));
    }

    #[test]
    fn salt_changes_state() {
        let cost = Cost::new(4).unwrap();
        let a = eks_setup(cost, b"pw\0", &[0u8; 16]).unwrap();
        let b = eks_setup(cost, b"pw\0", &[1u8; 16]).unwrap();
        assert_ne!(a.encrypt_block(0, 0), b.encrypt_block(0, 0));
    }
}
