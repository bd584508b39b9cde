//! Precompiled contracts at addresses `0x01..=0x08` (spec §4.8).
//!
//! Each precompile is a pure function of its input bytes and available
//! gas; none of them touch `SubState` or the account view, matching the
//! spec's `(gas, env) -> (remaining_gas, output)` shape. Grounded in the
//! teacher's precompile dispatch (`db`/`vm` crates use the same
//! `k256`/`sha2`/`ripemd`/`substrate-bn` stack for these).

use crate::constants::*;
use crate::errors::VMError;
use bytes::Bytes;
use ethereum_types::{Address, U256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use malachite::Natural;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// A precompile call either runs to completion (`Success`), runs to
/// completion on input it can't make sense of (`InvalidInput` — spec
/// §4.8/§7's `:invalid_input`, e.g. a bad `alt_bn128` curve point), or
/// never gets to run at all for lack of gas (`OutOfGas`, the spec's
/// `:failed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecompileOutcome {
    Success,
    InvalidInput,
    OutOfGas,
}

pub struct PrecompileResult {
    pub remaining_gas: u64,
    pub output: Bytes,
    pub outcome: PrecompileOutcome,
}

impl PrecompileResult {
    /// `InvalidInput` counts as success at the call-site level (spec
    /// §7): the call itself didn't fail, it just produced no output.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PrecompileOutcome::Success | PrecompileOutcome::InvalidInput)
    }
}

fn failed() -> PrecompileResult {
    PrecompileResult { remaining_gas: 0, output: Bytes::new(), outcome: PrecompileOutcome::OutOfGas }
}

fn ok(remaining_gas: u64, output: Bytes) -> PrecompileResult {
    PrecompileResult { remaining_gas, output, outcome: PrecompileOutcome::Success }
}

/// The gas charged for attempting the call stands; the call reports
/// success with empty `last_return_data` (spec §7).
fn invalid_input(remaining_gas: u64) -> PrecompileResult {
    PrecompileResult { remaining_gas, output: Bytes::new(), outcome: PrecompileOutcome::InvalidInput }
}

pub fn address_of(low_byte: u8) -> Address {
    Address::from_low_u64_be(u64::from(low_byte))
}

/// Returns the precompile's low byte if `address` names one in range
/// (spec §4.8 / `constants::MAX_PRECOMPILE_ADDRESS`).
pub fn precompile_id(address: Address) -> Option<u8> {
    let bytes = address.as_bytes();
    #[expect(clippy::indexing_slicing, reason = "Address is always 20 bytes")]
    let leading_zero = bytes[..19].iter().all(|b| *b == 0);
    #[expect(clippy::indexing_slicing, reason = "Address is always 20 bytes")]
    let low_byte = bytes[19];
    if leading_zero && low_byte >= PRECOMPILE_ECRECOVER && low_byte <= MAX_PRECOMPILE_ADDRESS {
        Some(low_byte)
    } else {
        None
    }
}

pub fn dispatch(id: u8, gas_limit: u64, input: &[u8], config: &crate::environment::Config) -> PrecompileResult {
    match id {
        PRECOMPILE_ECRECOVER => ecrecover(gas_limit, input),
        PRECOMPILE_SHA256 => sha256(gas_limit, input),
        PRECOMPILE_RIPEMD160 => ripemd160(gas_limit, input),
        PRECOMPILE_IDENTITY => identity(gas_limit, input),
        PRECOMPILE_MODEXP if config.has_mod_exp_builtin => modexp(gas_limit, input),
        PRECOMPILE_EC_ADD if config.has_ec_add_builtin => bn128_add(gas_limit, input),
        PRECOMPILE_EC_MUL if config.has_ec_mult_builtin => bn128_mul(gas_limit, input),
        PRECOMPILE_EC_PAIRING if config.has_ec_pairing_builtin => bn128_pairing(gas_limit, input),
        _ => failed(),
    }
}

fn words(len: usize) -> u64 {
    u64::try_from(len.div_ceil(WORD_SIZE_IN_BYTES_USIZE)).unwrap_or(u64::MAX)
}

fn ecrecover(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    const COST: u64 = 3000;
    if gas_limit < COST {
        return failed();
    }
    let mut padded = [0u8; 128];
    let len = input.len().min(128);
    #[expect(clippy::indexing_slicing, reason = "len <= 128 by construction")]
    padded[..len].copy_from_slice(&input[..len]);

    let hash = &padded[0..32];
    let v = U256::from_big_endian(&padded[32..64]);
    let r = &padded[64..96];
    let s = &padded[96..128];

    let recovered = (|| {
        if v != U256::from(27) && v != U256::from(28) {
            return None;
        }
        #[expect(clippy::as_conversions, reason = "v checked to be 27 or 28 above")]
        let recovery_id = RecoveryId::from_byte((v.low_u32() - 27) as u8)?;
        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(r);
        sig_bytes[32..].copy_from_slice(s);
        let signature = Signature::from_slice(&sig_bytes).ok()?;
        let verifying_key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id).ok()?;
        let encoded = verifying_key.to_encoded_point(false);
        let public_key_bytes = encoded.as_bytes();
        // Uncompressed SEC1 point is 0x04 || X || Y; Ethereum addresses
        // hash the X||Y tail with keccak256 and take the low 20 bytes.
        let tail = public_key_bytes.get(1..)?;
        let digest = Keccak256::digest(tail);
        Some(Address::from_slice(digest.get(12..32)?))
    })();

    match recovered {
        Some(address) => {
            let mut out = [0u8; 32];
            out[12..32].copy_from_slice(address.as_bytes());
            ok(gas_limit - COST, Bytes::copy_from_slice(&out))
        }
        None => ok(gas_limit - COST, Bytes::new()),
    }
}

fn sha256(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    let cost = 60u64.saturating_add(12u64.saturating_mul(words(input.len())));
    if gas_limit < cost {
        return failed();
    }
    let digest = Sha256::digest(input);
    ok(gas_limit - cost, Bytes::copy_from_slice(&digest))
}

fn ripemd160(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    let cost = 600u64.saturating_add(120u64.saturating_mul(words(input.len())));
    if gas_limit < cost {
        return failed();
    }
    let digest = Ripemd160::digest(input);
    let mut out = [0u8; 32];
    #[expect(clippy::indexing_slicing, reason = "Ripemd160 digest is 20 bytes, out is 32")]
    {
        out[12..32].copy_from_slice(&digest);
    }
    ok(gas_limit - cost, Bytes::copy_from_slice(&out))
}

fn identity(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    let cost = 15u64.saturating_add(3u64.saturating_mul(words(input.len())));
    if gas_limit < cost {
        return failed();
    }
    ok(gas_limit - cost, Bytes::copy_from_slice(input))
}

const MODEXP_MAX_LEN: usize = 24577;

fn read_len_field(input: &[u8], offset: usize) -> usize {
    let mut bytes = [0u8; 32];
    let available = input.len().saturating_sub(offset.min(input.len()));
    let copy_len = available.min(32);
    if copy_len > 0 {
        #[expect(clippy::indexing_slicing, reason = "copy_len computed from input bounds")]
        bytes[32 - copy_len..].copy_from_slice(&input[offset..offset.wrapping_add(copy_len)]);
    }
    crate::utils::u256_to_usize_saturating(U256::from_big_endian(&bytes))
}

fn modexp(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    let base_len = read_len_field(input, 0);
    let exp_len = read_len_field(input, 32);
    let mod_len = read_len_field(input, 64);

    if base_len > MODEXP_MAX_LEN || exp_len > MODEXP_MAX_LEN || mod_len > MODEXP_MAX_LEN {
        return failed();
    }

    let data_start = 96;
    let read_field = |offset: usize, len: usize| -> Vec<u8> {
        let mut out = vec![0u8; len];
        let source_start = data_start.saturating_add(offset);
        if source_start < input.len() {
            let available = input.len().saturating_sub(source_start);
            let copy_len = available.min(len);
            #[expect(clippy::indexing_slicing, reason = "copy_len bounded by input length")]
            out[..copy_len].copy_from_slice(&input[source_start..source_start.wrapping_add(copy_len)]);
        }
        out
    };

    let base_bytes = read_field(0, base_len);
    let exp_bytes = read_field(base_len, exp_len);
    let mod_bytes = read_field(base_len.wrapping_add(exp_len), mod_len);

    let cost = modexp_cost(base_len, mod_len, &exp_bytes);
    if gas_limit < cost {
        return failed();
    }

    use malachite::base::num::arithmetic::traits::ModPow as _;
    use malachite::base::num::basic::traits::Zero as _;
    use malachite::base::num::conversion::traits::PowerOf2DigitIterable as _;

    let Some(modulus) = Natural::from_power_of_2_digits_desc(8u64, mod_bytes.iter().copied()) else {
        return failed();
    };
    let output = if modulus == Natural::ZERO {
        vec![0u8; mod_len]
    } else {
        let Some(base) = Natural::from_power_of_2_digits_desc(8u64, base_bytes.iter().copied()) else {
            return failed();
        };
        let Some(exponent) = Natural::from_power_of_2_digits_desc(8u64, exp_bytes.iter().copied()) else {
            return failed();
        };
        let result = if exponent == Natural::ZERO {
            Natural::from(1u8) % &modulus
        } else {
            (base % &modulus).mod_pow(&exponent, &modulus)
        };
        let digits: Vec<u8> = result.to_power_of_2_digits_desc(8);
        let mut out = vec![0u8; mod_len];
        if digits.len() <= mod_len {
            let offset = mod_len.wrapping_sub(digits.len());
            #[expect(clippy::indexing_slicing, reason = "offset + digits.len() == mod_len")]
            out[offset..].copy_from_slice(&digits);
        } else {
            let skip = digits.len().wrapping_sub(mod_len);
            #[expect(clippy::indexing_slicing, reason = "skip computed from digits.len() > mod_len")]
            out.copy_from_slice(&digits[skip..]);
        }
        out
    };

    ok(gas_limit - cost, Bytes::from(output))
}

/// EIP-198 cost formula (spec §4.8): `f(max(base_len, mod_len)) *
/// max(adjusted_exponent_length, 1) / 20`.
fn modexp_cost(base_len: usize, mod_len: usize, exponent: &[u8]) -> u64 {
    let x = base_len.max(mod_len) as u64;
    let f = if x <= 64 {
        x.saturating_mul(x)
    } else if x <= 1024 {
        x.saturating_mul(x) / 4 + x.saturating_mul(96) - 3072
    } else {
        x.saturating_mul(x) / 16 + x.saturating_mul(480) - 199680
    };
    let adjusted_exp_len = adjusted_exponent_length(exponent).max(1);
    f.saturating_mul(adjusted_exp_len) / 20
}

/// EIP-198's `adjusted_exponent_length`: the bit index of the exponent's
/// highest set bit within its leading 32 bytes, plus `8 * (exp_len -
/// 32)` once the exponent itself runs past 32 bytes.
fn adjusted_exponent_length(exponent: &[u8]) -> u64 {
    let exp_len = exponent.len();
    let head = &exponent[..exp_len.min(32)];
    let value = U256::from_big_endian(head);
    let bit_index = if value.is_zero() { 0 } else { u64::from(255u32.saturating_sub(value.leading_zeros())) };
    if exp_len <= 32 {
        bit_index
    } else {
        let extra_bytes = u64::try_from(exp_len.saturating_sub(32)).unwrap_or(u64::MAX);
        extra_bytes.saturating_mul(8).saturating_add(bit_index)
    }
}

fn bn128_add(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    const COST: u64 = 150;
    if gas_limit < COST {
        return failed();
    }
    let mut padded = [0u8; 128];
    let len = input.len().min(128);
    #[expect(clippy::indexing_slicing, reason = "len <= 128 by construction")]
    padded[..len].copy_from_slice(&input[..len]);

    let parse_point = |bytes: &[u8]| -> Option<substrate_bn::G1> {
        let x = substrate_bn::Fq::from_slice(&bytes[0..32]).ok()?;
        let y = substrate_bn::Fq::from_slice(&bytes[32..64]).ok()?;
        if x.is_zero() && y.is_zero() {
            return Some(substrate_bn::G1::zero());
        }
        substrate_bn::AffineG1::new(x, y).ok().map(substrate_bn::G1::from)
    };

    let result = (|| {
        let a = parse_point(&padded[0..64])?;
        let b = parse_point(&padded[64..128])?;
        let sum = substrate_bn::AffineG1::from_jacobian(a + b)?;
        Some(encode_g1(sum))
    })();

    match result {
        Some(output) => ok(gas_limit - COST, output),
        None => invalid_input(gas_limit - COST),
    }
}

fn bn128_mul(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    const COST: u64 = 6000;
    if gas_limit < COST {
        return failed();
    }
    let mut padded = [0u8; 96];
    let len = input.len().min(96);
    #[expect(clippy::indexing_slicing, reason = "len <= 96 by construction")]
    padded[..len].copy_from_slice(&input[..len]);

    let result = (|| {
        let x = substrate_bn::Fq::from_slice(&padded[0..32]).ok()?;
        let y = substrate_bn::Fq::from_slice(&padded[32..64]).ok()?;
        let point = if x.is_zero() && y.is_zero() {
            substrate_bn::G1::zero()
        } else {
            substrate_bn::G1::from(substrate_bn::AffineG1::new(x, y).ok()?)
        };
        let scalar = substrate_bn::Fr::from_slice(&padded[64..96]).ok()?;
        let product = substrate_bn::AffineG1::from_jacobian(point * scalar)?;
        Some(encode_g1(product))
    })();

    match result {
        Some(output) => ok(gas_limit - COST, output),
        None => invalid_input(gas_limit - COST),
    }
}

fn bn128_pairing(gas_limit: u64, input: &[u8]) -> PrecompileResult {
    const GROUP_SIZE: usize = 192;
    if input.len() % GROUP_SIZE != 0 {
        return failed();
    }
    let n_pairs = u64::try_from(input.len() / GROUP_SIZE).unwrap_or(u64::MAX);
    let cost = 100_000u64.saturating_add(80_000u64.saturating_mul(n_pairs));
    if gas_limit < cost {
        return failed();
    }

    let result = (|| {
        let mut pairs = Vec::with_capacity(input.len() / GROUP_SIZE);
        for chunk in input.chunks(GROUP_SIZE) {
            let x = substrate_bn::Fq::from_slice(&chunk[0..32]).ok()?;
            let y = substrate_bn::Fq::from_slice(&chunk[32..64]).ok()?;
            let g1 = if x.is_zero() && y.is_zero() {
                substrate_bn::G1::zero()
            } else {
                substrate_bn::G1::from(substrate_bn::AffineG1::new(x, y).ok()?)
            };

            let parse_fq2 = |bytes: &[u8]| -> Option<substrate_bn::Fq2> {
                let a = substrate_bn::Fq::from_slice(&bytes[0..32]).ok()?;
                let b = substrate_bn::Fq::from_slice(&bytes[32..64]).ok()?;
                Some(substrate_bn::Fq2::new(a, b))
            };
            let x2 = parse_fq2(&chunk[64..128])?;
            let y2 = parse_fq2(&chunk[128..192])?;
            let g2 = if x2.is_zero() && y2.is_zero() {
                substrate_bn::G2::zero()
            } else {
                substrate_bn::G2::from(substrate_bn::AffineG2::new(x2, y2).ok()?)
            };
            pairs.push((g1, g2));
        }
        Some(substrate_bn::pairing_batch(&pairs) == substrate_bn::Gt::one())
    })();

    match result {
        Some(success) => {
            let mut out = [0u8; 32];
            if success {
                out[31] = 1;
            }
            ok(gas_limit - cost, Bytes::copy_from_slice(&out))
        }
        None => invalid_input(gas_limit - cost),
    }
}

fn encode_g1(point: substrate_bn::AffineG1) -> Bytes {
    let mut out = [0u8; 64];
    point.x().to_big_endian(&mut out[0..32]).ok();
    point.y().to_big_endian(&mut out[32..64]).ok();
    Bytes::copy_from_slice(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_echoes_input_and_charges_per_word() {
        let input = [1u8, 2, 3];
        let result = identity(100, &input);
        assert!(result.is_success());
        assert_eq!(&result.output[..], &input[..]);
        assert_eq!(result.remaining_gas, 100 - (15 + 3));
    }

    #[test]
    fn identity_fails_on_insufficient_gas() {
        let result = identity(10, &[0u8; 64]);
        assert!(!result.is_success());
        assert_eq!(result.remaining_gas, 0);
    }

    #[test]
    fn sha256_matches_digest() {
        let result = sha256(10_000, b"abc");
        assert!(result.is_success());
        let expected = Sha256::digest(b"abc");
        assert_eq!(&result.output[..], &expected[..]);
    }

    #[test]
    fn ripemd160_output_is_left_padded_to_32_bytes() {
        let result = ripemd160(10_000, b"abc");
        assert!(result.is_success());
        assert_eq!(result.output.len(), 32);
        assert_eq!(&result.output[..12], &[0u8; 12]);
    }

    #[test]
    fn precompile_id_recognizes_reserved_range() {
        assert_eq!(precompile_id(address_of(0x01)), Some(0x01));
        assert_eq!(precompile_id(address_of(0x08)), Some(0x08));
        assert_eq!(precompile_id(address_of(0x09)), None);
    }

    #[test]
    fn modexp_cost_small_values() {
        // x=1 -> f(x)=1; adjusted exponent length for exponent=1 is 0,
        // clamped to 1 by modexp_cost's max(_, 1).
        let cost = modexp_cost(1, 1, &[1]);
        assert_eq!(cost, 0); // floor(1*1/20) == 0
    }

    #[test]
    fn adjusted_exponent_length_matches_eip_198() {
        assert_eq!(adjusted_exponent_length(&[0]), 0);
        assert_eq!(adjusted_exponent_length(&[1]), 0);
        assert_eq!(adjusted_exponent_length(&[0xff]), 7);
        let mut long_exponent = vec![0u8; 40];
        long_exponent[39] = 1;
        assert_eq!(adjusted_exponent_length(&long_exponent), 8 * 8);
    }

    #[test]
    fn bn128_add_rejects_bad_curve_point_as_invalid_input() {
        let mut input = [0u8; 128];
        input[31] = 1; // x = 1, y = 0 is not on the curve
        let result = bn128_add(150, &input);
        assert_eq!(result.outcome, PrecompileOutcome::InvalidInput);
        assert!(result.is_success());
        assert!(result.output.is_empty());
        assert_eq!(result.remaining_gas, 0);
    }
}
