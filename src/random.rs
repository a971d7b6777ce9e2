// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::codec;
use crate::uuid::Uuid;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// version digit of random identifiers
pub const VERSION_RANDOM: u8 = 4;

/// Generates a random identifier.
///
/// The version nibble and variant bits are overwritten by shifting the random
/// byte down, so only 6 bits of entropy are lost.
pub fn random_uuid<R: RngCore + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    apply_version(bytes)
}

/// Generates a random identifier whose body is the SHA-256 digest of 64 random
/// hex digits. The version and variant groups are drawn again after hashing.
pub fn random_hash_uuid<R: RngCore + ?Sized>(rng: &mut R) -> Uuid {
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);
    let digest = Sha256::digest(codec::bytes_to_hex(&seed).as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    rng.fill_bytes(&mut bytes[6..10]);
    apply_version(bytes)
}

pub(crate) fn apply_version(mut bytes: [u8; 16]) -> Uuid {
    bytes[6] = (VERSION_RANDOM << 4) | (bytes[6] >> 4);
    bytes[8] = 0x80 | (bytes[8] >> 2);
    Uuid::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    const N_SAMPLES: usize = 50_000;
    const V4_PATTERN: &str =
        r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";

    type Flavor = fn(&mut StdRng) -> Uuid;
    const FLAVORS: [(&str, Flavor); 2] = [
        ("random_uuid", random_uuid::<StdRng>),
        ("random_hash_uuid", random_hash_uuid::<StdRng>),
    ];

    fn draw(flavor: Flavor) -> Vec<Uuid> {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        (0..N_SAMPLES).map(|_| flavor(&mut rng)).collect()
    }

    #[test]
    fn test_version_4_text_form() {
        let re = regex::Regex::new(V4_PATTERN).unwrap();
        for (name, flavor) in FLAVORS {
            for uuid in draw(flavor) {
                assert!(re.is_match(&uuid.to_string()), "{}: {}", name, uuid);
            }
        }
    }

    #[test]
    fn test_no_duplicates() {
        for (name, flavor) in FLAVORS {
            let unique: HashSet<Uuid> = draw(flavor).into_iter().collect();
            assert_eq!(unique.len(), N_SAMPLES, "{}", name);
        }
    }

    #[test]
    fn test_bit_frequencies() {
        // binomial 99.999% interval around one half
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();

        for (name, flavor) in FLAVORS {
            // ones seen per bit, most significant first
            let mut ones = [0u32; 128];
            for uuid in draw(flavor) {
                let value = u128::from(uuid);
                for (i, count) in ones.iter_mut().enumerate() {
                    *count += ((value >> (127 - i)) & 1) as u32;
                }
            }

            let n = N_SAMPLES as u32;
            // version nibble 0100, variant 10
            assert_eq!(ones[48..52], [0, n, 0, 0], "{}: version", name);
            assert_eq!(ones[64..66], [n, 0], "{}: variant", name);

            for (i, count) in ones.iter().enumerate() {
                if (48..52).contains(&i) || (64..66).contains(&i) {
                    continue;
                }
                let p = *count as f64 / N_SAMPLES as f64;
                assert!((p - 0.5).abs() < margin, "{}: bit {} set at {}", name, i, p);
            }
        }
    }
}
