use ethers::types::U256;

const LIMB_BASE: f64 = 18_446_744_073_709_551_616.0; // 2^64
const U128_LIMIT: f64 = LIMB_BASE * LIMB_BASE;
const U256_LIMIT: f64 = U128_LIMIT * U128_LIMIT;

pub fn to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * LIMB_BASE + limb as f64)
}

/// Rounds to the nearest wei. Negative, NaN and infinite inputs map to zero;
/// values beyond 2^256 saturate.
pub fn from_f64(value: f64) -> U256 {
    if !value.is_finite() || value <= 0.0 {
        return U256::zero();
    }
    let rounded = value.round();
    if rounded < U128_LIMIT {
        return U256::from(rounded as u128);
    }
    if rounded >= U256_LIMIT {
        return U256::MAX;
    }

    // at or above 2^128 the value is an integer mantissa times a positive power of two
    let bits = rounded.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as usize - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    U256::from(mantissa) << exponent
}

pub fn gwei(amount: u64) -> U256 {
    U256::from(amount).saturating_mul(U256::exp10(9))
}

/// `#[serde(with = "wei::decimal")]` for a single `U256`.
pub mod decimal {
    use ethers::types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(|e| D::Error::custom(format!("invalid wei amount {}: {:?}", raw, e)))
    }
}

/// `#[serde(with = "wei::decimal_seq")]` for `Vec<U256>`.
pub mod decimal_seq {
    use ethers::types::U256;
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<U256>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| {
                U256::from_dec_str(raw)
                    .map_err(|e| D::Error::custom(format!("invalid wei amount {}: {:?}", raw, e)))
            })
            .collect()
    }
}
