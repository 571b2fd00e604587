//! bcrypt's base64 dialect.
//!
//! bcrypt does not use RFC 4648 base64. The alphabet starts with `./`
//! followed by `A-Z`, `a-z` and `0-9`, and no `=` padding is ever written or
//! accepted. A trailing partial group carries only the bits it needs: 16 salt
//! bytes become 22 characters and 23 digest bytes become 31 characters, with
//! the unused low bits of the final character left at zero.

use crate::error::{BcryptError, BcryptResult};

/// bcrypt's 64-character alphabet, in value order.
pub const ALPHABET: &[u8; 64] = b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const INVALID: u8 = 0xff;

const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Number of characters needed to encode `len` bytes without padding.
pub const fn encoded_len(len: usize) -> usize {
    (len * 4 + 2) / 3
}

/// Number of whole bytes carried by `len` characters.
pub const fn decoded_len(len: usize) -> usize {
    len * 3 / 4
}

fn push_group(out: &mut Vec<u8>, chunk: &[u8]) {
    let b1 = chunk[0] as u32;
    let b2 = chunk.get(1).map(|&b| b as u32).unwrap_or(0);
    let b3 = chunk.get(2).map(|&b| b as u32).unwrap_or(0);

    let triple = (b1 << 16) | (b2 << 8) | b3;

    out.push(ALPHABET[(triple >> 18) as usize]);
    out.push(ALPHABET[(triple >> 12 & 0x3f) as usize]);
    if chunk.len() > 1 {
        out.push(ALPHABET[(triple >> 6 & 0x3f) as usize]);
    }
    if chunk.len() > 2 {
        out.push(ALPHABET[(triple & 0x3f) as usize]);
    }
}

fn encode_bytes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(input.len()));
    for chunk in input.chunks(3) {
        push_group(&mut out, chunk);
    }
    out
}

/// Encodes `input` with the bcrypt alphabet.
pub fn encode(input: &[u8]) -> String {
    encode_bytes(input).into_iter().map(char::from).collect()
}

/// Encodes `input` into a caller-supplied buffer followed by a NUL byte.
///
/// Returns the number of text bytes written, not counting the terminator.
/// If `output` cannot hold the text and its terminator, nothing is written.
pub fn encode_into(input: &[u8], output: &mut [u8]) -> BcryptResult<usize> {
    let len = encoded_len(input.len());
    if output.len() < len + 1 {
        return Err(BcryptError::BufferTooSmall {
            needed: len + 1,
            available: output.len(),
        });
    }

    let encoded = encode_bytes(input);
    output[..len].copy_from_slice(&encoded);
    output[len] = 0;
    Ok(len)
}

fn value_of(c: u8) -> BcryptResult<u32> {
    match DECODE_TABLE[c as usize] {
        INVALID => Err(BcryptError::MalformedEncoding),
        v => Ok(v as u32),
    }
}

fn decode_groups(input: &str, strict: bool) -> BcryptResult<Vec<u8>> {
    let bytes = input.as_bytes();
    if bytes.len() % 4 == 1 {
        return Err(BcryptError::MalformedEncoding);
    }

    let mut out = Vec::with_capacity(decoded_len(bytes.len()));
    for group in bytes.chunks(4) {
        let mut acc = 0u32;
        for &c in group {
            acc = (acc << 6) | value_of(c)?;
        }

        match group.len() {
            4 => {
                out.push((acc >> 16) as u8);
                out.push((acc >> 8) as u8);
                out.push(acc as u8);
            }
            3 => {
                if strict && acc & 0x03 != 0 {
                    return Err(BcryptError::MalformedEncoding);
                }
                out.push((acc >> 10) as u8);
                out.push((acc >> 2) as u8);
            }
            2 => {
                if strict && acc & 0x0f != 0 {
                    return Err(BcryptError::MalformedEncoding);
                }
                out.push((acc >> 4) as u8);
            }
            _ => unreachable!("groups of one are rejected above"),
        }
    }

    Ok(out)
}

/// Decodes bcrypt base64 text.
///
/// Fails with [`BcryptError::MalformedEncoding`] on a character outside the
/// alphabet, on a lone trailing character (which cannot hold a whole byte),
/// and on a final character whose unused low bits are not zero.
pub fn decode(input: &str) -> BcryptResult<Vec<u8>> {
    decode_groups(input, true)
}

/// Like [`decode`], but drops the unused low bits of the final character
/// instead of rejecting them, as OpenBSD does when reading a salt.
pub fn decode_lenient(input: &str) -> BcryptResult<Vec<u8>> {
    decode_groups(input, false)
}

fn exact<const N: usize>(input: &str, strict: bool) -> BcryptResult<[u8; N]> {
    if input.len() != encoded_len(N) {
        return Err(BcryptError::MalformedEncoding);
    }
    decode_groups(input, strict)?
        .try_into()
        .map_err(|_| BcryptError::MalformedEncoding)
}

/// Decodes exactly `N` bytes, failing if `input` is not the canonical
/// encoding of an `N`-byte value.
pub fn decode_exact<const N: usize>(input: &str) -> BcryptResult<[u8; N]> {
    exact(input, true)
}

/// Decodes exactly `N` bytes, ignoring stray bits in the final character.
pub fn decode_exact_lenient<const N: usize>(input: &str) -> BcryptResult<[u8; N]> {
    exact(input, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_is_bcrypt_order() {
        assert_eq!(&ALPHABET[..4], b"./AB");
        assert_eq!(ALPHABET[63], b'9');
        assert_eq!(encode(&[0x00]), "..");
        assert_eq!(encode(&[0xff, 0xff, 0xff]), "9999");
    }

    #[test]
    fn salt_and_digest_lengths() {
        assert_eq!(encode(&[0u8; 16]).len(), 22);
        assert_eq!(encode(&[0u8; 23]).len(), 31);
        assert_eq!(encode(&[0u8; 16]), "......................");
    }

    #[test]
    fn decodes_known_salt() {
        let salt = decode("abcdefghijklmnopqrstuu").unwrap();
        assert_eq!(salt.len(), 16);
        assert_eq!(encode(&salt), "abcdefghijklmnopqrstuu");
    }

    #[test]
    fn rejects_standard_base64_characters() {
        assert!(matches!(decode("ab+d"), Err(BcryptError::MalformedEncoding)));
        assert!(matches!(decode("abc="), Err(BcryptError::MalformedEncoding)));
        assert!(matches!(decode("ab$d"), Err(BcryptError::MalformedEncoding)));
    }

    #[test]
    fn rejects_truncated_group() {
        assert!(matches!(decode("abcde"), Err(BcryptError::MalformedEncoding)));
        assert!(matches!(decode("a"), Err(BcryptError::MalformedEncoding)));
    }

    #[test]
    fn rejects_stray_low_bits() {
        // '/' has value 1, which sets a bit past the end of the single byte.
        assert!(matches!(decode("./"), Err(BcryptError::MalformedEncoding)));
        assert!(matches!(decode("..."), Ok(_)));
        assert!(matches!(decode("../"), Err(BcryptError::MalformedEncoding)));
    }

    #[test]
    fn lenient_decode_masks_stray_bits() {
        assert_eq!(decode_lenient("./").unwrap(), vec![0x00]);
        assert_eq!(decode_lenient("../").unwrap(), decode("...").unwrap());
        assert!(matches!(decode_lenient("ab+d"), Err(BcryptError::MalformedEncoding)));
        assert!(matches!(decode_lenient("abcde"), Err(BcryptError::MalformedEncoding)));

        let canonical = decode_exact::<16>("abcdefghijklmnopqrstuu").unwrap();
        assert!(decode_exact::<16>("abcdefghijklmnopqrstuv").is_err());
        assert_eq!(
            decode_exact_lenient::<16>("abcdefghijklmnopqrstuv").unwrap(),
            canonical
        );
    }

    #[test]
    fn decode_exact_checks_length() {
        assert!(decode_exact::<16>("......................").is_ok());
        assert!(decode_exact::<16>(".....................").is_err());
        assert!(decode_exact::<16>(".......................").is_err());
    }

    #[test]
    fn encode_into_is_all_or_nothing() {
        let mut small = [0xaau8; 22];
        assert!(matches!(
            encode_into(&[0u8; 16], &mut small),
            Err(BcryptError::BufferTooSmall { needed: 23, available: 22 })
        ));
        assert!(small.iter().all(|&b| b == 0xaa));

        let mut buf = [0xaau8; 23];
        assert_eq!(encode_into(&[0u8; 16], &mut buf).unwrap(), 22);
        assert_eq!(&buf[..22], b"......................");
        assert_eq!(buf[22], 0);
    }
}
