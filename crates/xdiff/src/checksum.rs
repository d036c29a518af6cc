//! Client-side reference for the engine checksum expressions.
//!
//! Every dialect's `hash_to_int` must produce, for identical input bytes,
//! the same integer as [`md5_as_int`]. Sums of these integers over a key
//! range are compared across databases, so the value must stay small
//! enough that a sum over billions of rows fits in a signed 128-bit
//! accumulator (and in the engines' DECIMAL(38) sums).

use md5::{Digest, Md5};

use crate::dialect::{CHECKSUM_HEXDIGITS, CHECKSUM_OFFSET};

const TAIL_BYTES: usize = CHECKSUM_HEXDIGITS / 2;

/// Last [`CHECKSUM_HEXDIGITS`] lowercase hex digits of the MD5 of `data`.
///
/// Matches `Dialect::hash_to_hex`.
pub fn md5_hex_tail(data: &[u8]) -> String {
    let digest = Md5::digest(data);
    hex::encode(&digest[digest.len() - TAIL_BYTES..])
}

/// Integer digest of `data`: the MD5 tail as an unsigned integer minus
/// [`CHECKSUM_OFFSET`].
///
/// Matches `Dialect::hash_to_int`. The result lies in
/// `[-CHECKSUM_OFFSET, CHECKSUM_OFFSET + 1]`.
pub fn md5_as_int(data: &[u8]) -> i64 {
    let digest = Md5::digest(data);
    let tail = digest[digest.len() - TAIL_BYTES..]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    tail as i64 - CHECKSUM_OFFSET as i64
}

/// Sum of [`md5_as_int`] over `rows`, as the engines compute
/// `SUM(hash_to_int(...))`.
pub fn checksum_sum<I, T>(rows: I) -> i128
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    rows.into_iter()
        .map(|row| i128::from(md5_as_int(row.as_ref())))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex_tail() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(md5_hex_tail(b""), "0998ecf8427e");
        // md5("abc") = 900150983cd24fb0d6963f7d28e17f72
        assert_eq!(md5_hex_tail(b"abc"), "3f7d28e17f72");
    }

    #[test]
    fn test_md5_as_int() {
        assert_eq!(md5_as_int(b""), -130_185_072_983_425);
        assert_eq!(md5_as_int(b"abc"), -70_930_699_026_573);
        assert_eq!(md5_as_int(b"hello"), 32_508_877_456_787);
    }

    #[test]
    fn test_int_matches_hex_tail() {
        let inputs: [&[u8]; 3] = [b"x", b"2022-06-03 12:24:35.000000", b"\xe4\xb8\xad"];
        for input in inputs {
            let from_hex = i64::from_str_radix(&md5_hex_tail(input), 16).unwrap();
            assert_eq!(md5_as_int(input), from_hex - CHECKSUM_OFFSET as i64);
        }
    }

    #[test]
    fn test_range_is_centered() {
        let offset = CHECKSUM_OFFSET as i64;
        for i in 0..1000 {
            let v = md5_as_int(format!("row-{}", i).as_bytes());
            assert!((-offset..=offset + 1).contains(&v));
        }
    }

    #[test]
    fn test_checksum_sum() {
        let expected = i128::from(md5_as_int(b"abc")) + i128::from(md5_as_int(b"hello"));
        assert_eq!(checksum_sum(["abc", "hello"]), expected);
        assert_eq!(checksum_sum(Vec::<Vec<u8>>::new()), 0);
    }
}
