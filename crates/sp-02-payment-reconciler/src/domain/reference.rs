//! Payment reference decoding.
//!
//! The reference emitted on chain is the `uint256 paymentId` argument. It
//! arrives either as a `0x`-prefixed hex word or as a decimal string. Both
//! forms must fit a `u64` request id.

use crate::domain::errors::ReconcileError;
use primitive_types::U256;
use shared_types::PaymentRequestId;

const MAX_HEX_DIGITS: usize = 64;

/// Decode a payment reference into a request id.
pub fn decode_payment_reference(reference: &str) -> Result<PaymentRequestId, ReconcileError> {
    let fail = || ReconcileError::DecodeError {
        reference: reference.to_string(),
    };
    let trimmed = reference.trim();

    let value = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(digits) => {
            if digits.is_empty() || digits.len() > MAX_HEX_DIGITS {
                return Err(fail());
            }
            U256::from_str_radix(digits, 16).map_err(|_| fail())?
        }
        None => {
            if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail());
            }
            U256::from_dec_str(trimmed).map_err(|_| fail())?
        }
    };

    if value > U256::from(u64::MAX) {
        return Err(fail());
    }
    Ok(PaymentRequestId(value.low_u64()))
}
