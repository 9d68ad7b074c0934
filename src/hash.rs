use core::hash::BuildHasher;
use core::hash::Hasher;

/// Odd 64-bit constant derived from the golden ratio, used by [`avalanche`].
const GOLDEN_RATIO: u64 = 0x9E37_79B9_7F4A_7C15;

const SECRET: [u64; 4] = [
    0xa076_1d64_78bd_642f,
    0xe703_7ed1_a0b4_28db,
    0x8ebc_6af0_9c88_c6e3,
    0x5899_65cc_7537_4cc3,
];

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        use self::mum_wide as mum;
    } else {
        use self::mum_limbs as mum;
    }
}

/// Full 128-bit product of `a` and `b`, returned as `(low, high)`.
#[cfg(any(test, target_pointer_width = "64"))]
#[inline(always)]
fn mum_wide(a: u64, b: u64) -> (u64, u64) {
    let product = (a as u128) * (b as u128);
    (product as u64, (product >> 64) as u64)
}

/// Same as [`mum_wide`], computed from 32-bit limbs for targets without a
/// native 64x64 multiply.
#[cfg(any(test, not(target_pointer_width = "64")))]
#[inline(always)]
fn mum_limbs(a: u64, b: u64) -> (u64, u64) {
    let ha = a >> 32;
    let hb = b >> 32;
    let la = a & 0xFFFF_FFFF;
    let lb = b & 0xFFFF_FFFF;

    let rh = ha * hb;
    let rm0 = ha * lb;
    let rm1 = hb * la;
    let rl = la * lb;

    let t = rl.wrapping_add(rm0 << 32);
    let mut carry = (t < rl) as u64;
    let lo = t.wrapping_add(rm1 << 32);
    carry += (lo < t) as u64;
    let hi = rh
        .wrapping_add(rm0 >> 32)
        .wrapping_add(rm1 >> 32)
        .wrapping_add(carry);

    (lo, hi)
}

/// Multiplies `a` and `b` as 128-bit integers and folds the product by XORing
/// its high and low halves.
///
/// # Examples
///
/// ```rust
/// use robin_dense::hash::mix;
///
/// // (2^32) * (2^32) = 2^64: low half 0, high half 1.
/// assert_eq!(mix(1 << 32, 1 << 32), 1);
/// assert_eq!(mix(3, 5), 15);
/// ```
#[inline(always)]
pub fn mix(a: u64, b: u64) -> u64 {
    let (lo, hi) = mum(a, b);
    lo ^ hi
}

/// Spreads the bits of a possibly low-entropy hash across all 64 bits.
///
/// Integer identity hashes are the typical input: consecutive keys differ
/// only in their low bits, while bucket placement reads the high bits.
///
/// # Examples
///
/// ```rust
/// use robin_dense::hash::avalanche;
///
/// assert_ne!(avalanche(1) >> 56, avalanche(2) >> 56);
/// assert_eq!(avalanche(0), 0);
/// ```
#[inline(always)]
pub fn avalanche(x: u64) -> u64 {
    mix(x, GOLDEN_RATIO)
}

#[inline(always)]
fn read_u32(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf) as u64
}

#[inline(always)]
fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Reads one to three bytes as a single word: first, middle and last byte.
#[inline(always)]
fn read_small(bytes: &[u8]) -> u64 {
    let len = bytes.len();
    ((bytes[0] as u64) << 16) | ((bytes[len >> 1] as u64) << 8) | bytes[len - 1] as u64
}

/// Hashes a byte slice with a wyhash-style compression loop.
///
/// Used by [`MixHasher`] for string and slice keys. The result is already
/// well distributed; the map still applies [`avalanche`] on top of it.
///
/// # Examples
///
/// ```rust
/// use robin_dense::hash::hash_bytes;
///
/// assert_eq!(hash_bytes(b"robin"), hash_bytes(b"robin"));
/// assert_ne!(hash_bytes(b"robin"), hash_bytes(b"rob1n"));
/// ```
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let len = bytes.len();
    let mut seed = SECRET[0];
    let a;
    let b;

    if len <= 16 {
        if len >= 4 {
            let quarter = (len >> 3) << 2;
            a = (read_u32(bytes, 0) << 32) | read_u32(bytes, quarter);
            b = (read_u32(bytes, len - 4) << 32) | read_u32(bytes, len - 4 - quarter);
        } else if len > 0 {
            a = read_small(bytes);
            b = 0;
        } else {
            a = 0;
            b = 0;
        }
    } else {
        let mut rest = bytes;

        if rest.len() > 48 {
            let mut see1 = seed;
            let mut see2 = seed;

            while rest.len() > 48 {
                seed = mix(read_u64(rest, 0) ^ SECRET[1], read_u64(rest, 8) ^ seed);
                see1 = mix(read_u64(rest, 16) ^ SECRET[2], read_u64(rest, 24) ^ see1);
                see2 = mix(read_u64(rest, 32) ^ SECRET[3], read_u64(rest, 40) ^ see2);
                rest = &rest[48..];
            }

            seed ^= see1 ^ see2;
        }

        while rest.len() > 16 {
            seed = mix(read_u64(rest, 0) ^ SECRET[1], read_u64(rest, 8) ^ seed);
            rest = &rest[16..];
        }

        // The tail words may overlap bytes already consumed above.
        a = read_u64(bytes, len - 16);
        b = read_u64(bytes, len - 8);
    }

    mix(SECRET[1] ^ len as u64, mix(a ^ SECRET[1], b ^ seed))
}

/// The default key hasher.
///
/// Every integer written is widened to 64 bits (signed integers are
/// sign-extended) and folded into the state with [`avalanche`]; byte slices
/// are folded through [`hash_bytes`]. A fresh hasher that sees a single
/// integer `x` therefore finishes with `avalanche(x)`.
///
/// The hasher is unkeyed and deterministic. Maps exposed to untrusted keys
/// should be built with a randomized [`BuildHasher`] instead.
///
/// # Examples
///
/// ```rust
/// use core::hash::BuildHasher;
///
/// use robin_dense::hash::MixState;
/// use robin_dense::hash::avalanche;
///
/// assert_eq!(MixState.hash_one(42u64), avalanche(42));
/// assert_eq!(MixState.hash_one(-1i32), avalanche(u64::MAX));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct MixHasher {
    hash: u64,
}

impl MixHasher {
    #[inline(always)]
    fn fold(&mut self, word: u64) {
        self.hash = avalanche(self.hash ^ word);
    }
}

impl Hasher for MixHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.fold(hash_bytes(bytes));
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    #[inline]
    fn write_u128(&mut self, i: u128) {
        self.fold(i as u64);
        self.fold((i >> 64) as u64);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_i8(&mut self, i: i8) {
        self.fold(i as i64 as u64);
    }

    #[inline]
    fn write_i16(&mut self, i: i16) {
        self.fold(i as i64 as u64);
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.fold(i as i64 as u64);
    }

    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_i128(&mut self, i: i128) {
        self.write_u128(i as u128);
    }

    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.fold(i as i64 as u64);
    }
}

/// [`BuildHasher`] for [`MixHasher`]; the default hasher of
/// [`HashMap`](crate::HashMap).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixState;

impl BuildHasher for MixState {
    type Hasher = MixHasher;

    #[inline]
    fn build_hasher(&self) -> MixHasher {
        MixHasher::default()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn mum_implementations_agree() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        for _ in 0..10_000 {
            let a: u64 = rng.random();
            let b: u64 = rng.random();
            assert_eq!(mum_wide(a, b), mum_limbs(a, b), "{a:#x} * {b:#x}");
        }

        for (a, b) in [(0, 0), (u64::MAX, u64::MAX), (u64::MAX, 1), (1 << 63, 2)] {
            assert_eq!(mum_wide(a, b), mum_limbs(a, b), "{a:#x} * {b:#x}");
        }
    }

    #[test]
    fn mix_folds_product_halves() {
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1: high = 2^64 - 2, low = 1.
        assert_eq!(mix(u64::MAX, u64::MAX), u64::MAX);
        assert_eq!(mix(1 << 63, 2), 1);
        assert_eq!(mix(7, 6), 42);
        assert_eq!(mix(0, u64::MAX), 0);
    }

    #[test]
    fn avalanche_spreads_sequential_keys() {
        let mut top_bytes: Vec<u8> = (0..256u64).map(|x| (avalanche(x) >> 56) as u8).collect();
        top_bytes.sort_unstable();
        top_bytes.dedup();
        // Identity hashes of 0..256 would all share a zero top byte.
        assert!(top_bytes.len() > 128, "{}", top_bytes.len());
    }

    #[test]
    fn hash_bytes_covers_every_length_class() {
        let data: Vec<u8> = (0..128u8).collect();
        let mut hashes: Vec<u64> = [0, 1, 2, 3, 4, 7, 8, 15, 16, 17, 31, 48, 49, 64, 97, 128]
            .iter()
            .map(|&len| hash_bytes(&data[..len]))
            .collect();

        let count = hashes.len();
        hashes.sort_unstable();
        hashes.dedup();
        assert_eq!(hashes.len(), count);
    }

    #[test]
    fn hash_bytes_depends_on_every_byte() {
        let base = [0x5Au8; 64];
        let reference = hash_bytes(&base);
        for i in 0..base.len() {
            let mut flipped = base;
            flipped[i] ^= 1;
            assert_ne!(hash_bytes(&flipped), reference, "byte {i}");
        }
    }

    #[test]
    fn integer_keys_hash_to_their_avalanche() {
        assert_eq!(MixState.hash_one(42u8), avalanche(42));
        assert_eq!(MixState.hash_one(42u16), avalanche(42));
        assert_eq!(MixState.hash_one(42u32), avalanche(42));
        assert_eq!(MixState.hash_one(42usize), avalanche(42));
        assert_eq!(MixState.hash_one(-2i64), avalanche(-2i64 as u64));
        assert_eq!(MixState.hash_one(-2i8), avalanche(-2i64 as u64));
        assert_eq!(MixState.hash_one(true), avalanche(1));
        assert_eq!(MixState.hash_one('a'), avalanche('a' as u64));
    }

    #[test]
    fn string_forms_hash_alike() {
        let owned = String::from("dense");
        assert_eq!(MixState.hash_one("dense"), MixState.hash_one(&owned));
        assert_ne!(MixState.hash_one("dense"), MixState.hash_one("dens"));
        assert_ne!(MixState.hash_one(""), MixState.hash_one("\0"));
    }

    #[test]
    fn pointer_keys_hash_by_address() {
        let values = [1u32, 2];
        let first: *const u32 = &values[0];
        let second: *const u32 = &values[1];
        assert_eq!(MixState.hash_one(first), avalanche(first as usize as u64));
        assert_ne!(MixState.hash_one(first), MixState.hash_one(second));
    }
}
