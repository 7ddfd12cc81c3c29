//! Account transactions, their payloads, and block items.
//!
//! Account transactions carry their payload in encoded form. The payload is only decoded
//! when the transaction is executed, after the header has been checked, so that a
//! malformed payload can be charged for.

use crate::types::accounts::{
    AccountCredential, BakerKeyProofs, BakerKeys, CredentialDeployment,
    CredentialDeploymentValues, CredentialIndex, CredentialPublicKeys,
    CredentialRegistrationId, EncryptedAmount, EncryptedAmountIndex, KeyIndex, Policy,
    Signature, VerifyKey, AggregationVerifyKey,
};
use crate::types::contracts::{InitName, Parameter, ReceiveName};
use crate::types::encoding::{serial_bytes_u16, serial_bytes_u32, DecodeError, Decoder, Serial};
use crate::types::primitives::{
    hex_bytes, AccountAddress, Amount, AnonymityRevokerId, ContractAddress, Energy, Hash,
    IdentityProviderId, ModuleRef, Nonce, Timestamp, TransactionHash, TransactionTime,
};
use crate::types::updates::UpdateInstruction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size in bytes of a serialized [`TransactionHeader`].
pub const TRANSACTION_HEADER_SIZE: u64 = 32 + 8 + 8 + 4 + 8;

/// Maximum size of an encoded transaction payload.
pub const MAX_PAYLOAD_SIZE: u32 = 102_400;

/// Maximum size of data registered with [`Payload::RegisterData`].
pub const MAX_REGISTERED_DATA_SIZE: usize = 256;

/// Maximum number of credentials signing a transaction, and of signatures by one
/// credential. Counts are encoded in one byte.
pub const MAX_SIGNATURE_ENTRIES: usize = u8::MAX as usize;

/// Maximum size of a contract function name.
pub const MAX_FUNC_NAME_SIZE: usize = 100;

/// Maximum size of a parameter to a contract function.
pub const MAX_PARAMETER_SIZE: usize = 1024;

/// Maximum size of keys, proofs and credential ids embedded in payloads.
const MAX_KEY_SIZE: usize = 1024;

/// Header of an account transaction.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// The account sending, and paying for, the transaction.
    pub sender: AccountAddress,
    /// Account nonce. Must be the next nonce of the sender account.
    pub nonce: Nonce,
    /// Maximum energy the transaction may use, the deposit.
    pub energy_amount: Energy,
    /// Size of the encoded payload.
    pub payload_size: u32,
    /// The transaction is not valid after this time.
    pub expiry: TransactionTime,
}

impl Serial for TransactionHeader {
    fn serial(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sender.0);
        self.nonce.0.serial(out);
        self.energy_amount.0.serial(out);
        self.payload_size.serial(out);
        self.expiry.0.serial(out);
    }
}

type SignatureMap = BTreeMap<CredentialIndex, BTreeMap<KeyIndex, Signature>>;

/// Signatures on a transaction: credential index to key index to signature.
///
/// Deserializing rejects signatures with more than [`MAX_SIGNATURE_ENTRIES`] credentials
/// or signatures per credential.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SignatureMap", into = "SignatureMap")]
pub struct TransactionSignature {
    pub signatures: SignatureMap,
}

impl TransactionSignature {
    /// Total number of signatures, which determines the cost of checking them.
    pub fn num_signatures(&self) -> u32 {
        self.signatures
            .values()
            .map(|sigs| sigs.len() as u32)
            .fold(0u32, u32::saturating_add)
    }

    /// The larger of the number of credentials and the number of signatures by any one
    /// credential.
    fn largest_count(&self) -> usize {
        self.signatures
            .values()
            .map(BTreeMap::len)
            .fold(self.signatures.len(), usize::max)
    }

    /// Whether every count fits its one byte encoding. Signatures that are not well formed
    /// never verify.
    pub fn is_well_formed(&self) -> bool {
        self.largest_count() <= MAX_SIGNATURE_ENTRIES
    }
}

impl TryFrom<SignatureMap> for TransactionSignature {
    type Error = DecodeError;

    fn try_from(signatures: SignatureMap) -> Result<Self, Self::Error> {
        let signature = TransactionSignature { signatures };
        if signature.is_well_formed() {
            Ok(signature)
        } else {
            Err(DecodeError::LengthExceeded {
                length: signature.largest_count() as u64,
                max: MAX_SIGNATURE_ENTRIES as u64,
            })
        }
    }
}

impl From<TransactionSignature> for SignatureMap {
    fn from(signature: TransactionSignature) -> Self {
        signature.signatures
    }
}

/// One byte count of a signature map. Counts of signatures that are not well formed are
/// capped, while every entry is still encoded, so distinct signatures hash differently.
fn entry_count(len: usize) -> u8 {
    u8::try_from(len).unwrap_or(u8::MAX)
}

impl Serial for TransactionSignature {
    fn serial(&self, out: &mut Vec<u8>) {
        entry_count(self.signatures.len()).serial(out);
        for (cred_index, sigs) in &self.signatures {
            cred_index.serial(out);
            entry_count(sigs.len()).serial(out);
            for (key_index, signature) in sigs {
                key_index.serial(out);
                serial_bytes_u16(&signature.0, out);
            }
        }
    }
}

/// The kind of an account transaction. The discriminant is the payload tag.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    DeployModule = 0,
    InitContract = 1,
    Update = 2,
    Transfer = 3,
    AddBaker = 4,
    RemoveBaker = 5,
    UpdateBakerStake = 6,
    UpdateBakerRestakeEarnings = 7,
    UpdateBakerKeys = 8,
    UpdateCredentialKeys = 13,
    EncryptedAmountTransfer = 16,
    TransferToEncrypted = 17,
    TransferToPublic = 18,
    TransferWithSchedule = 19,
    RegisterData = 21,
}

impl TryFrom<u8> for TransactionType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(TransactionType::DeployModule),
            1 => Ok(TransactionType::InitContract),
            2 => Ok(TransactionType::Update),
            3 => Ok(TransactionType::Transfer),
            4 => Ok(TransactionType::AddBaker),
            5 => Ok(TransactionType::RemoveBaker),
            6 => Ok(TransactionType::UpdateBakerStake),
            7 => Ok(TransactionType::UpdateBakerRestakeEarnings),
            8 => Ok(TransactionType::UpdateBakerKeys),
            13 => Ok(TransactionType::UpdateCredentialKeys),
            16 => Ok(TransactionType::EncryptedAmountTransfer),
            17 => Ok(TransactionType::TransferToEncrypted),
            18 => Ok(TransactionType::TransferToPublic),
            19 => Ok(TransactionType::TransferWithSchedule),
            21 => Ok(TransactionType::RegisterData),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

/// Data of a transfer between encrypted balances. The proof is opaque to the scheduler.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EncryptedAmountTransferData {
    /// Encryption of the amount remaining on the sender account.
    pub remaining_amount: EncryptedAmount,
    /// Encryption of the transferred amount, under the receiver's key.
    pub transfer_amount: EncryptedAmount,
    /// The sender's incoming amounts up to this index are used as input.
    pub index: EncryptedAmountIndex,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

/// Data of a transfer from the encrypted to the public balance.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SecToPubAmountTransferData {
    /// Encryption of the amount remaining in the encrypted balance.
    pub remaining_amount: EncryptedAmount,
    /// The amount made public.
    pub transfer_amount: Amount,
    /// The incoming amounts up to this index are used as input.
    pub index: EncryptedAmountIndex,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

/// Decoded payload of an account transaction.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Payload {
    /// Deploy a smart contract module.
    DeployModule {
        #[serde(with = "hex_bytes")]
        module: Vec<u8>,
    },
    /// Create a contract instance.
    InitContract {
        amount: Amount,
        module_ref: ModuleRef,
        init_name: InitName,
        parameter: Parameter,
    },
    /// Invoke a contract instance.
    Update {
        amount: Amount,
        address: ContractAddress,
        receive_name: ReceiveName,
        message: Parameter,
    },
    /// Transfer to an account.
    Transfer {
        to_address: AccountAddress,
        amount: Amount,
    },
    /// Register the sender as a baker.
    AddBaker {
        keys: BakerKeys,
        proofs: BakerKeyProofs,
        baking_stake: Amount,
        restake_earnings: bool,
    },
    /// Remove the sender as a baker, after the cooldown.
    RemoveBaker,
    /// Change the stake of the sender's baker.
    UpdateBakerStake { stake: Amount },
    /// Change whether earnings are added to the stake.
    UpdateBakerRestakeEarnings { restake_earnings: bool },
    /// Replace the keys of the sender's baker.
    UpdateBakerKeys {
        keys: BakerKeys,
        proofs: BakerKeyProofs,
    },
    /// Replace the keys of one of the sender's credentials.
    UpdateCredentialKeys {
        cred_id: CredentialRegistrationId,
        keys: CredentialPublicKeys,
    },
    /// Transfer between encrypted balances.
    EncryptedAmountTransfer {
        to: AccountAddress,
        data: EncryptedAmountTransferData,
    },
    /// Move an amount from the public to the encrypted balance.
    TransferToEncrypted { amount: Amount },
    /// Move an amount from the encrypted to the public balance.
    TransferToPublic { data: SecToPubAmountTransferData },
    /// Transfer with a release schedule.
    TransferWithSchedule {
        to: AccountAddress,
        schedule: Vec<(Timestamp, Amount)>,
    },
    /// Register data on chain.
    RegisterData {
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
    },
}

impl Payload {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Payload::DeployModule { .. } => TransactionType::DeployModule,
            Payload::InitContract { .. } => TransactionType::InitContract,
            Payload::Update { .. } => TransactionType::Update,
            Payload::Transfer { .. } => TransactionType::Transfer,
            Payload::AddBaker { .. } => TransactionType::AddBaker,
            Payload::RemoveBaker => TransactionType::RemoveBaker,
            Payload::UpdateBakerStake { .. } => TransactionType::UpdateBakerStake,
            Payload::UpdateBakerRestakeEarnings { .. } => {
                TransactionType::UpdateBakerRestakeEarnings
            }
            Payload::UpdateBakerKeys { .. } => TransactionType::UpdateBakerKeys,
            Payload::UpdateCredentialKeys { .. } => TransactionType::UpdateCredentialKeys,
            Payload::EncryptedAmountTransfer { .. } => TransactionType::EncryptedAmountTransfer,
            Payload::TransferToEncrypted { .. } => TransactionType::TransferToEncrypted,
            Payload::TransferToPublic { .. } => TransactionType::TransferToPublic,
            Payload::TransferWithSchedule { .. } => TransactionType::TransferWithSchedule,
            Payload::RegisterData { .. } => TransactionType::RegisterData,
        }
    }

    /// Encode the payload.
    pub fn encode(&self) -> EncodedPayload {
        EncodedPayload(self.to_bytes())
    }
}

impl Serial for Payload {
    fn serial(&self, out: &mut Vec<u8>) {
        (self.transaction_type() as u8).serial(out);
        match self {
            Payload::DeployModule { module } => serial_bytes_u32(module, out),
            Payload::InitContract {
                amount,
                module_ref,
                init_name,
                parameter,
            } => {
                amount.micro_ccd.serial(out);
                out.extend_from_slice(&module_ref.0);
                serial_bytes_u16(init_name.0.as_bytes(), out);
                serial_bytes_u16(&parameter.0, out);
            }
            Payload::Update {
                amount,
                address,
                receive_name,
                message,
            } => {
                amount.micro_ccd.serial(out);
                address.index.serial(out);
                address.subindex.serial(out);
                serial_bytes_u16(receive_name.0.as_bytes(), out);
                serial_bytes_u16(&message.0, out);
            }
            Payload::Transfer { to_address, amount } => {
                out.extend_from_slice(&to_address.0);
                amount.micro_ccd.serial(out);
            }
            Payload::AddBaker {
                keys,
                proofs,
                baking_stake,
                restake_earnings,
            } => {
                keys.serial(out);
                proofs.serial(out);
                baking_stake.micro_ccd.serial(out);
                restake_earnings.serial(out);
            }
            Payload::RemoveBaker => {}
            Payload::UpdateBakerStake { stake } => stake.micro_ccd.serial(out),
            Payload::UpdateBakerRestakeEarnings { restake_earnings } => {
                restake_earnings.serial(out)
            }
            Payload::UpdateBakerKeys { keys, proofs } => {
                keys.serial(out);
                proofs.serial(out);
            }
            Payload::UpdateCredentialKeys { cred_id, keys } => {
                serial_bytes_u16(&cred_id.0, out);
                keys.serial(out);
            }
            Payload::EncryptedAmountTransfer { to, data } => {
                out.extend_from_slice(&to.0);
                serial_bytes_u32(&data.remaining_amount.0, out);
                serial_bytes_u32(&data.transfer_amount.0, out);
                data.index.serial(out);
                serial_bytes_u32(&data.proof, out);
            }
            Payload::TransferToEncrypted { amount } => amount.micro_ccd.serial(out),
            Payload::TransferToPublic { data } => {
                serial_bytes_u32(&data.remaining_amount.0, out);
                data.transfer_amount.micro_ccd.serial(out);
                data.index.serial(out);
                serial_bytes_u32(&data.proof, out);
            }
            Payload::TransferWithSchedule { to, schedule } => {
                out.extend_from_slice(&to.0);
                (schedule.len() as u8).serial(out);
                for (timestamp, amount) in schedule {
                    timestamp.0.serial(out);
                    amount.micro_ccd.serial(out);
                }
            }
            Payload::RegisterData { data } => serial_bytes_u16(data, out),
        }
    }
}

/// Encoded transaction payload.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPayload(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl EncodedPayload {
    /// Size of the encoded payload in bytes.
    pub fn size(&self) -> u64 {
        self.0.len() as u64
    }

    /// Decode the payload. Fails on unknown tags, malformed or oversized contents, and
    /// trailing bytes.
    pub fn decode(&self) -> Result<Payload, DecodeError> {
        let mut decoder = Decoder::new(&self.0);
        let payload = decode_payload(&mut decoder)?;
        decoder.finish()?;
        Ok(payload)
    }
}

fn decode_payload(decoder: &mut Decoder) -> Result<Payload, DecodeError> {
    let transaction_type = TransactionType::try_from(decoder.u8()?)?;
    let payload = match transaction_type {
        TransactionType::DeployModule => Payload::DeployModule {
            module: decoder.bytes_u32(MAX_PAYLOAD_SIZE as usize)?,
        },
        TransactionType::InitContract => Payload::InitContract {
            amount: Amount::from_micro_ccd(decoder.u64()?),
            module_ref: Hash(decoder.array_32()?),
            init_name: InitName(decoder.string_u16(MAX_FUNC_NAME_SIZE)?),
            parameter: Parameter(decoder.bytes_u16(MAX_PARAMETER_SIZE)?),
        },
        TransactionType::Update => Payload::Update {
            amount: Amount::from_micro_ccd(decoder.u64()?),
            address: ContractAddress::new(decoder.u64()?, decoder.u64()?),
            receive_name: ReceiveName(decoder.string_u16(MAX_FUNC_NAME_SIZE)?),
            message: Parameter(decoder.bytes_u16(MAX_PARAMETER_SIZE)?),
        },
        TransactionType::Transfer => Payload::Transfer {
            to_address: AccountAddress(decoder.array_32()?),
            amount: Amount::from_micro_ccd(decoder.u64()?),
        },
        TransactionType::AddBaker => Payload::AddBaker {
            keys: decode_baker_keys(decoder)?,
            proofs: decode_baker_key_proofs(decoder)?,
            baking_stake: Amount::from_micro_ccd(decoder.u64()?),
            restake_earnings: decoder.bool()?,
        },
        TransactionType::RemoveBaker => Payload::RemoveBaker,
        TransactionType::UpdateBakerStake => Payload::UpdateBakerStake {
            stake: Amount::from_micro_ccd(decoder.u64()?),
        },
        TransactionType::UpdateBakerRestakeEarnings => Payload::UpdateBakerRestakeEarnings {
            restake_earnings: decoder.bool()?,
        },
        TransactionType::UpdateBakerKeys => Payload::UpdateBakerKeys {
            keys: decode_baker_keys(decoder)?,
            proofs: decode_baker_key_proofs(decoder)?,
        },
        TransactionType::UpdateCredentialKeys => Payload::UpdateCredentialKeys {
            cred_id: CredentialRegistrationId(decoder.bytes_u16(MAX_KEY_SIZE)?),
            keys: decode_credential_public_keys(decoder)?,
        },
        TransactionType::EncryptedAmountTransfer => Payload::EncryptedAmountTransfer {
            to: AccountAddress(decoder.array_32()?),
            data: EncryptedAmountTransferData {
                remaining_amount: EncryptedAmount(decoder.bytes_u32(MAX_PAYLOAD_SIZE as usize)?),
                transfer_amount: EncryptedAmount(decoder.bytes_u32(MAX_PAYLOAD_SIZE as usize)?),
                index: decoder.u64()?,
                proof: decoder.bytes_u32(MAX_PAYLOAD_SIZE as usize)?,
            },
        },
        TransactionType::TransferToEncrypted => Payload::TransferToEncrypted {
            amount: Amount::from_micro_ccd(decoder.u64()?),
        },
        TransactionType::TransferToPublic => Payload::TransferToPublic {
            data: SecToPubAmountTransferData {
                remaining_amount: EncryptedAmount(decoder.bytes_u32(MAX_PAYLOAD_SIZE as usize)?),
                transfer_amount: Amount::from_micro_ccd(decoder.u64()?),
                index: decoder.u64()?,
                proof: decoder.bytes_u32(MAX_PAYLOAD_SIZE as usize)?,
            },
        },
        TransactionType::TransferWithSchedule => {
            let to = AccountAddress(decoder.array_32()?);
            let len = decoder.u8()?;
            let mut schedule = Vec::with_capacity(usize::from(len));
            for _ in 0..len {
                let timestamp = Timestamp(decoder.u64()?);
                let amount = Amount::from_micro_ccd(decoder.u64()?);
                schedule.push((timestamp, amount));
            }
            Payload::TransferWithSchedule { to, schedule }
        }
        TransactionType::RegisterData => Payload::RegisterData {
            data: decoder.bytes_u16(MAX_REGISTERED_DATA_SIZE)?,
        },
    };
    Ok(payload)
}

impl Serial for BakerKeys {
    fn serial(&self, out: &mut Vec<u8>) {
        serial_bytes_u16(&self.election_verify_key.0, out);
        serial_bytes_u16(&self.signature_verify_key.0, out);
        serial_bytes_u16(&self.aggregation_verify_key.0, out);
    }
}

fn decode_baker_keys(decoder: &mut Decoder) -> Result<BakerKeys, DecodeError> {
    Ok(BakerKeys {
        election_verify_key: VerifyKey(decoder.bytes_u16(MAX_KEY_SIZE)?),
        signature_verify_key: VerifyKey(decoder.bytes_u16(MAX_KEY_SIZE)?),
        aggregation_verify_key: AggregationVerifyKey(decoder.bytes_u16(MAX_KEY_SIZE)?),
    })
}

impl Serial for BakerKeyProofs {
    fn serial(&self, out: &mut Vec<u8>) {
        serial_bytes_u16(&self.proof_sig, out);
        serial_bytes_u16(&self.proof_election, out);
        serial_bytes_u16(&self.proof_aggregation, out);
    }
}

fn decode_baker_key_proofs(decoder: &mut Decoder) -> Result<BakerKeyProofs, DecodeError> {
    Ok(BakerKeyProofs {
        proof_sig: decoder.bytes_u16(MAX_KEY_SIZE)?,
        proof_election: decoder.bytes_u16(MAX_KEY_SIZE)?,
        proof_aggregation: decoder.bytes_u16(MAX_KEY_SIZE)?,
    })
}

impl Serial for CredentialPublicKeys {
    fn serial(&self, out: &mut Vec<u8>) {
        (self.keys.len() as u8).serial(out);
        for (index, key) in &self.keys {
            index.serial(out);
            serial_bytes_u16(&key.0, out);
        }
        self.threshold.serial(out);
    }
}

fn decode_credential_public_keys(
    decoder: &mut Decoder,
) -> Result<CredentialPublicKeys, DecodeError> {
    let len = decoder.u8()?;
    let mut keys = BTreeMap::new();
    let mut previous: Option<KeyIndex> = None;
    for _ in 0..len {
        let index = decoder.u8()?;
        if previous.map_or(false, |previous| previous >= index) {
            return Err(DecodeError::NonCanonical("key indices must be increasing"));
        }
        previous = Some(index);
        keys.insert(index, VerifyKey(decoder.bytes_u16(MAX_KEY_SIZE)?));
    }
    let threshold = decoder.u8()?;
    Ok(CredentialPublicKeys { keys, threshold })
}

impl Serial for Policy {
    fn serial(&self, out: &mut Vec<u8>) {
        self.identity_provider.0.serial(out);
        self.created_at.0.serial(out);
        self.valid_to.0.serial(out);
        (self.revealed_attributes.len() as u8).serial(out);
        for (tag, value) in &self.revealed_attributes {
            tag.serial(out);
            serial_bytes_u16(value.as_bytes(), out);
        }
    }
}

impl Serial for CredentialDeploymentValues {
    fn serial(&self, out: &mut Vec<u8>) {
        serial_bytes_u16(&self.cred_id.0, out);
        self.keys.serial(out);
        self.policy.serial(out);
        (self.anonymity_revokers.len() as u8).serial(out);
        for AnonymityRevokerId(ar) in &self.anonymity_revokers {
            ar.serial(out);
        }
        serial_bytes_u32(&self.proofs, out);
    }
}

impl Serial for CredentialDeployment {
    fn serial(&self, out: &mut Vec<u8>) {
        self.expiry.0.serial(out);
        self.credential.serial(out);
    }
}

impl CredentialDeploymentValues {
    /// The credential as it is stored on the account created by the deployment.
    pub fn to_account_credential(&self) -> AccountCredential {
        AccountCredential {
            cred_id: self.cred_id.clone(),
            keys: self.keys.clone(),
            policy: self.policy.clone(),
        }
    }

    /// The identity provider that issued the identity behind the credential.
    pub fn identity_provider(&self) -> IdentityProviderId {
        self.policy.identity_provider
    }
}

/// A signed transaction sent from an account.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountTransaction {
    pub signature: TransactionSignature,
    pub header: TransactionHeader,
    pub payload: EncodedPayload,
}

impl AccountTransaction {
    /// Construct a transaction from a payload. The payload size of the header is set from
    /// the encoded payload.
    pub fn new(
        sender: AccountAddress,
        nonce: Nonce,
        energy_amount: Energy,
        expiry: TransactionTime,
        payload: &Payload,
        signature: TransactionSignature,
    ) -> Self {
        let payload = payload.encode();
        let header = TransactionHeader {
            sender,
            nonce,
            energy_amount,
            payload_size: u32::try_from(payload.size()).unwrap_or(u32::MAX),
            expiry,
        };
        AccountTransaction {
            signature,
            header,
            payload,
        }
    }

    /// Hash of the header and payload. This is the message signed by the sender.
    pub fn sign_hash(&self) -> Hash {
        compute_sign_hash(&self.header, &self.payload)
    }

    /// Size of the header and payload, which the header check is charged for.
    pub fn charged_size(&self) -> u64 {
        TRANSACTION_HEADER_SIZE + u64::from(self.header.payload_size)
    }

    pub fn num_signatures(&self) -> u32 {
        self.signature.num_signatures()
    }
}

/// Compute the message signed by the sender of a transaction.
pub fn compute_sign_hash(header: &TransactionHeader, payload: &EncodedPayload) -> Hash {
    let mut bytes = header.to_bytes();
    bytes.extend_from_slice(&payload.0);
    Hash::compute(&bytes)
}

impl Serial for AccountTransaction {
    fn serial(&self, out: &mut Vec<u8>) {
        self.signature.serial(out);
        self.header.serial(out);
        out.extend_from_slice(&self.payload.0);
    }
}

/// Block item types and their tag in the block item encoding.
pub trait BlockItemType: Serial {
    const TAG: u8;
}

impl BlockItemType for AccountTransaction {
    const TAG: u8 = 0;
}

impl BlockItemType for CredentialDeployment {
    const TAG: u8 = 1;
}

impl BlockItemType for UpdateInstruction {
    const TAG: u8 = 2;
}

/// A block item together with metadata derived from its encoding and its arrival.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WithMetadata<T> {
    pub data: T,
    /// Hash of the block item encoding.
    pub hash: TransactionHash,
    /// Size of the block item encoding.
    pub size: u64,
    /// Time the item was received.
    pub arrival: TransactionTime,
}

impl<T: BlockItemType> WithMetadata<T> {
    pub fn new(data: T, arrival: TransactionTime) -> Self {
        let mut bytes = vec![T::TAG];
        data.serial(&mut bytes);
        WithMetadata {
            hash: Hash::compute(&bytes),
            size: bytes.len() as u64,
            data,
            arrival,
        }
    }
}

pub type TransactionWithMetadata = WithMetadata<AccountTransaction>;
pub type CredentialWithMetadata = WithMetadata<CredentialDeployment>;
pub type UpdateWithMetadata = WithMetadata<UpdateInstruction>;

/// The different kinds of items in a block.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "camelCase")]
pub enum BlockItemKind {
    AccountTransaction(AccountTransaction),
    CredentialDeployment(CredentialDeployment),
    UpdateInstruction(UpdateInstruction),
}

impl Serial for BlockItemKind {
    fn serial(&self, out: &mut Vec<u8>) {
        match self {
            BlockItemKind::AccountTransaction(transaction) => {
                AccountTransaction::TAG.serial(out);
                transaction.serial(out);
            }
            BlockItemKind::CredentialDeployment(credential) => {
                CredentialDeployment::TAG.serial(out);
                credential.serial(out);
            }
            BlockItemKind::UpdateInstruction(update) => {
                UpdateInstruction::TAG.serial(out);
                update.serial(out);
            }
        }
    }
}

/// An item of a block: an account transaction, a credential deployment or a chain update.
pub type BlockItem = WithMetadata<BlockItemKind>;

impl BlockItem {
    pub fn from_item(item: BlockItemKind, arrival: TransactionTime) -> Self {
        let bytes = item.to_bytes();
        WithMetadata {
            hash: Hash::compute(&bytes),
            size: bytes.len() as u64,
            data: item,
            arrival,
        }
    }
}

impl From<TransactionWithMetadata> for BlockItem {
    fn from(transaction: TransactionWithMetadata) -> Self {
        WithMetadata {
            data: BlockItemKind::AccountTransaction(transaction.data),
            hash: transaction.hash,
            size: transaction.size,
            arrival: transaction.arrival,
        }
    }
}

impl From<CredentialWithMetadata> for BlockItem {
    fn from(credential: CredentialWithMetadata) -> Self {
        WithMetadata {
            data: BlockItemKind::CredentialDeployment(credential.data),
            hash: credential.hash,
            size: credential.size,
            arrival: credential.arrival,
        }
    }
}

impl From<UpdateWithMetadata> for BlockItem {
    fn from(update: UpdateWithMetadata) -> Self {
        WithMetadata {
            data: BlockItemKind::UpdateInstruction(update.data),
            hash: update.hash,
            size: update.size,
            arrival: update.arrival,
        }
    }
}
