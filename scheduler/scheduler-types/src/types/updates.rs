//! Chain-update instructions: authorized changes to chain parameters.

use crate::types::accounts::{Signature, VerifyKey};
use crate::types::encoding::{serial_bytes_u16, serial_bytes_u32, DecodeError, Decoder, Serial};
use crate::types::parameters::ExchangeRate;
use crate::types::primitives::{
    hex_bytes, Amount, Hash, TransactionTime, UpdateSequenceNumber,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum size of an encoded update payload.
pub const MAX_UPDATE_PAYLOAD_SIZE: usize = 1024;

/// Index of a key authorized to sign chain updates.
pub type UpdateKeyIndex = u16;

/// The kind of a chain update. Updates of each kind have their own sequence numbers and
/// their own authorized keys.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateType {
    EnergyRate = 0,
    MinimumBakerStake = 1,
    AccountCreationLimit = 2,
    BakerCooldown = 3,
}

impl UpdateType {
    pub const ALL: [UpdateType; 4] = [
        UpdateType::EnergyRate,
        UpdateType::MinimumBakerStake,
        UpdateType::AccountCreationLimit,
        UpdateType::BakerCooldown,
    ];
}

impl TryFrom<u8> for UpdateType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(UpdateType::EnergyRate),
            1 => Ok(UpdateType::MinimumBakerStake),
            2 => Ok(UpdateType::AccountCreationLimit),
            3 => Ok(UpdateType::BakerCooldown),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

/// Decoded payload of a chain update.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "update", content = "value", rename_all = "camelCase")]
pub enum UpdatePayload {
    EnergyRate(ExchangeRate),
    MinimumBakerStake(Amount),
    AccountCreationLimit(u16),
    BakerCooldown(u64),
}

impl UpdatePayload {
    pub fn update_type(&self) -> UpdateType {
        match self {
            UpdatePayload::EnergyRate(_) => UpdateType::EnergyRate,
            UpdatePayload::MinimumBakerStake(_) => UpdateType::MinimumBakerStake,
            UpdatePayload::AccountCreationLimit(_) => UpdateType::AccountCreationLimit,
            UpdatePayload::BakerCooldown(_) => UpdateType::BakerCooldown,
        }
    }

    pub fn encode(&self) -> EncodedUpdatePayload {
        EncodedUpdatePayload(self.to_bytes())
    }
}

impl Serial for UpdatePayload {
    fn serial(&self, out: &mut Vec<u8>) {
        (self.update_type() as u8).serial(out);
        match self {
            UpdatePayload::EnergyRate(rate) => {
                rate.numerator.serial(out);
                rate.denominator.serial(out);
            }
            UpdatePayload::MinimumBakerStake(amount) => amount.micro_ccd.serial(out),
            UpdatePayload::AccountCreationLimit(limit) => limit.serial(out),
            UpdatePayload::BakerCooldown(millis) => millis.serial(out),
        }
    }
}

/// Encoded payload of a chain update.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedUpdatePayload(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl EncodedUpdatePayload {
    /// Decode the payload. An exchange rate with a zero denominator does not decode.
    pub fn decode(&self) -> Result<UpdatePayload, DecodeError> {
        let mut decoder = Decoder::new(&self.0);
        let payload = match UpdateType::try_from(decoder.u8()?)? {
            UpdateType::EnergyRate => {
                let numerator = decoder.u64()?;
                let denominator = decoder.u64()?;
                let rate = ExchangeRate::new(numerator, denominator)
                    .ok_or(DecodeError::NonCanonical("zero denominator"))?;
                UpdatePayload::EnergyRate(rate)
            }
            UpdateType::MinimumBakerStake => {
                UpdatePayload::MinimumBakerStake(Amount::from_micro_ccd(decoder.u64()?))
            }
            UpdateType::AccountCreationLimit => UpdatePayload::AccountCreationLimit(decoder.u16()?),
            UpdateType::BakerCooldown => UpdatePayload::BakerCooldown(decoder.u64()?),
        };
        decoder.finish()?;
        Ok(payload)
    }
}

/// Header of a chain-update instruction.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UpdateHeader {
    pub seq_number: UpdateSequenceNumber,
    /// Time the update takes effect. Zero means as soon as it is included in a block.
    pub effective_time: TransactionTime,
    /// The instruction is not valid after this time.
    pub timeout: TransactionTime,
    pub payload_size: u32,
}

impl Serial for UpdateHeader {
    fn serial(&self, out: &mut Vec<u8>) {
        self.seq_number.0.serial(out);
        self.effective_time.0.serial(out);
        self.timeout.0.serial(out);
        self.payload_size.serial(out);
    }
}

/// Keys authorized to sign updates of one type, and the number of signatures required.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UpdateKeys {
    pub keys: BTreeMap<UpdateKeyIndex, VerifyKey>,
    pub threshold: u16,
}

/// A chain-update instruction block item.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UpdateInstruction {
    pub header: UpdateHeader,
    /// The declared type of the update. Must match the payload.
    pub update_type: UpdateType,
    pub payload: EncodedUpdatePayload,
    pub signatures: BTreeMap<UpdateKeyIndex, Signature>,
}

impl UpdateInstruction {
    /// Construct an unsigned instruction for a payload.
    pub fn new(
        seq_number: UpdateSequenceNumber,
        effective_time: TransactionTime,
        timeout: TransactionTime,
        payload: &UpdatePayload,
    ) -> Self {
        let encoded = payload.encode();
        UpdateInstruction {
            header: UpdateHeader {
                seq_number,
                effective_time,
                timeout,
                payload_size: u32::try_from(encoded.0.len()).unwrap_or(u32::MAX),
            },
            update_type: payload.update_type(),
            payload: encoded,
            signatures: BTreeMap::new(),
        }
    }

    /// Hash of the header, declared type and payload. This is the message signed by the
    /// update keys.
    pub fn sign_hash(&self) -> Hash {
        let mut bytes = self.header.to_bytes();
        (self.update_type as u8).serial(&mut bytes);
        bytes.extend_from_slice(&self.payload.0);
        Hash::compute(&bytes)
    }
}

impl Serial for UpdateInstruction {
    fn serial(&self, out: &mut Vec<u8>) {
        self.header.serial(out);
        (self.update_type as u8).serial(out);
        serial_bytes_u32(&self.payload.0, out);
        u16::try_from(self.signatures.len())
            .unwrap_or(u16::MAX)
            .serial(out);
        for (index, signature) in &self.signatures {
            index.serial(out);
            serial_bytes_u16(&signature.0, out);
        }
    }
}
