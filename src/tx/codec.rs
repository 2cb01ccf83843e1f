//! Canonical RLP serialization of transactions
//!
//! Unsigned layout:
//! `[nonce, gasPrice, gas, to, value, storageLimit, epochHeight, chainId, data]`
//!
//! Signed (raw) layout nests the unsigned list: `[[...], v, r, s]`.
//! The signature commits to `keccak256(rlp(unsigned))`, so the field order
//! here must never change.

use super::types::{ResolvedTransaction, Signature, SignedTransaction};
use crate::error::CodecError;

use ethers::core::k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use ethers::types::{Address, Bytes, H256};
use ethers::utils::rlp::{Rlp, RlpStream};
use sha3::{Digest, Keccak256};

const UNSIGNED_FIELDS: usize = 9;
const SIGNED_ITEMS: usize = 4;

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Derive a user-account address from a public key.
///
/// Takes the last 20 bytes of the keccak hash of the uncompressed key and
/// forces the type nibble to `0x1`.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    bytes[0] = (bytes[0] & 0x0f) | 0x10;
    Address::from(bytes)
}

impl ResolvedTransaction {
    fn rlp_append_unsigned(&self, stream: &mut RlpStream) {
        stream.begin_list(UNSIGNED_FIELDS);
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas);
        match &self.to {
            Some(to) => stream.append(to),
            None => stream.append_empty_data(),
        };
        stream.append(&self.value);
        stream.append(&self.storage_limit);
        stream.append(&self.epoch_height);
        stream.append(&self.chain_id);
        stream.append(&self.data.to_vec());
    }

    /// RLP of the unsigned field list
    pub fn rlp_unsigned(&self) -> Bytes {
        let mut stream = RlpStream::new();
        self.rlp_append_unsigned(&mut stream);
        stream.out().freeze().into()
    }

    /// Hash the signature commits to
    pub fn signing_hash(&self) -> H256 {
        H256::from(keccak256(&self.rlp_unsigned()))
    }
}

impl SignedTransaction {
    /// Serialize to the raw wire format
    pub fn encode(&self) -> Bytes {
        let mut stream = RlpStream::new_list(SIGNED_ITEMS);
        self.transaction().rlp_append_unsigned(&mut stream);
        stream.append(&self.signature().v);
        stream.append(&self.signature().r);
        stream.append(&self.signature().s);
        stream.out().freeze().into()
    }

    /// `0x`-prefixed hex of [`encode`](Self::encode)
    pub fn raw_hex(&self) -> String {
        crate::quantity::to_data(&self.encode())
    }

    /// Transaction hash as the node reports it
    pub fn hash(&self) -> H256 {
        H256::from(keccak256(&self.encode()))
    }

    /// Parse a raw transaction, recovering `from` from the signature.
    ///
    /// Non-canonical input (leading zeros, trailing bytes, wrong arity) is
    /// rejected, so `decode(raw)?.encode() == raw`.
    pub fn decode(raw: &[u8]) -> Result<Self, CodecError> {
        let rlp = Rlp::new(raw);
        let info = rlp.payload_info()?;
        let consumed = info.header_len + info.value_len;
        if consumed != raw.len() {
            return Err(CodecError::TrailingBytes(raw.len().saturating_sub(consumed)));
        }

        expect_list(&rlp, "signed transaction", SIGNED_ITEMS)?;
        let fields = rlp.at(0)?;
        expect_list(&fields, "transaction fields", UNSIGNED_FIELDS)?;

        let to_item = fields.at(3)?;
        let to = if to_item.is_data() && to_item.is_empty() {
            None
        } else {
            Some(to_item.as_val::<Address>()?)
        };

        let signature = Signature {
            v: rlp.val_at(1)?,
            r: rlp.val_at(2)?,
            s: rlp.val_at(3)?,
        };
        if signature.v > 1 {
            return Err(CodecError::OutOfRange { field: "v" });
        }

        let mut transaction = ResolvedTransaction {
            from: Address::zero(),
            to,
            nonce: fields.val_at(0)?,
            gas_price: fields.val_at(1)?,
            gas: fields.val_at(2)?,
            value: fields.val_at(4)?,
            storage_limit: fields.val_at(5)?,
            epoch_height: fields.val_at(6)?,
            chain_id: fields.val_at(7)?,
            data: Bytes::from(fields.val_at::<Vec<u8>>(8)?),
        };

        transaction.from = recover(&transaction.signing_hash(), &signature)?;
        Ok(SignedTransaction::new(transaction, signature))
    }

    /// Recover the signer's address
    pub fn recover_sender(&self) -> Result<Address, CodecError> {
        recover(&self.transaction().signing_hash(), self.signature())
    }
}

fn expect_list(rlp: &Rlp<'_>, what: &'static str, expected: usize) -> Result<(), CodecError> {
    if !rlp.is_list() {
        return Err(CodecError::Shape {
            what,
            expected,
            found: 0,
        });
    }
    let found = rlp.item_count()?;
    if found != expected {
        return Err(CodecError::Shape {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

fn recover(hash: &H256, signature: &Signature) -> Result<Address, CodecError> {
    let mut rs = [0u8; 64];
    signature.r.to_big_endian(&mut rs[..32]);
    signature.s.to_big_endian(&mut rs[32..]);

    let ecdsa = EcdsaSignature::from_slice(&rs)
        .map_err(|e| CodecError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.v)
        .ok_or(CodecError::OutOfRange { field: "v" })?;

    let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &ecdsa, recovery_id)
        .map_err(|e| CodecError::InvalidSignature(e.to_string()))?;

    Ok(public_key_to_address(&key))
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::wallet::{Keyring, LocalKeyring};
    use ethers::core::k256::ecdsa::SigningKey;
    use ethers::types::U256;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = U256> {
        prop_oneof![
            Just(U256::zero()),
            Just(U256::MAX),
            any::<u64>().prop_map(U256::from),
            any::<[u8; 32]>().prop_map(|bytes| U256::from_big_endian(&bytes)),
        ]
    }

    fn small_int() -> impl Strategy<Value = u64> {
        prop_oneof![Just(0u64), Just(u64::MAX), any::<u64>()]
    }

    prop_compose! {
        fn resolved_transaction()(
            to in proptest::option::of(any::<[u8; 20]>()),
            nonce in scalar(),
            gas_price in scalar(),
            gas in scalar(),
            value in scalar(),
            storage_limit in scalar(),
            epoch_height in small_int(),
            chain_id in small_int(),
            data in proptest::collection::vec(any::<u8>(), 0..300),
        ) -> ResolvedTransaction {
            ResolvedTransaction {
                from: Address::zero(),
                to: to.map(Address::from),
                nonce,
                gas_price,
                gas,
                value,
                storage_limit,
                epoch_height,
                chain_id,
                data: Bytes::from(data),
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn test_signed_roundtrip_is_byte_identical(
            seed in any::<[u8; 32]>(),
            mut tx in resolved_transaction(),
        ) {
            // Zero and out-of-range scalars are not valid keys
            let key = SigningKey::from_slice(&seed);
            prop_assume!(key.is_ok());

            let keyring = LocalKeyring::new();
            let account = keyring.add_signing_key(key.unwrap());
            tx.from = account.address();

            let signature = keyring.sign(&account.address(), &tx, None).unwrap();
            let signed = SignedTransaction::new(tx, signature);
            let raw = signed.encode();

            let decoded = SignedTransaction::decode(&raw).unwrap();
            prop_assert_eq!(decoded.encode(), raw);
            prop_assert_eq!(decoded.transaction().from, account.address());
            prop_assert_eq!(decoded.recover_sender().unwrap(), account.address());
            prop_assert_eq!(&decoded, &signed);
        }
    }
}
