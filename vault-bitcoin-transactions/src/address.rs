//! Wallet address metadata.
//!
//! An [`AddressInfo`] knows everything needed to spend an output it owns: which key signs
//! (by keypath, the key itself lives in the external signer), which signature hash
//! algorithm applies, and how a returned signature is turned into a script sig and witness.

use std::fmt;

use bitcoin::{
    bip32::DerivationPath,
    ecdsa,
    hashes::Hash,
    script::{Builder, PushBytesBuf, PushBytesError},
    CompressedPublicKey, PublicKey, ScriptBuf, ScriptHash, Witness,
};

/// Output script types this wallet can sign for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ScriptType {
    /// Pay to public key hash.
    P2pkh,
    /// Pay to witness public key hash, nested in pay to script hash.
    P2wpkhP2sh,
    /// Native pay to witness public key hash.
    P2wpkh,
}

impl ScriptType {
    pub fn sighash_kind(self) -> SighashKind {
        match self {
            ScriptType::P2pkh => SighashKind::Legacy,
            ScriptType::P2wpkhP2sh | ScriptType::P2wpkh => SighashKind::SegwitV0,
        }
    }

    pub fn is_segwit(self) -> bool {
        self.sighash_kind() == SighashKind::SegwitV0
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2wpkhP2sh => "p2wpkh-p2sh",
            ScriptType::P2wpkh => "p2wpkh",
        };
        f.write_str(name)
    }
}

/// Signature hash algorithm an input commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SighashKind {
    /// Original algorithm, hashes a modified copy of the whole transaction per input.
    Legacy,
    /// BIP143, shares precomputed prevouts/sequence/outputs hashes across inputs and commits
    /// to the spent value.
    SegwitV0,
}

/// An address owned by the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AddressInfo {
    pub key_path: DerivationPath,
    pub public_key: CompressedPublicKey,
    pub script_type: ScriptType,
}

impl AddressInfo {
    pub fn new(
        key_path: DerivationPath,
        public_key: CompressedPublicKey,
        script_type: ScriptType,
    ) -> Self {
        Self {
            key_path,
            public_key,
            script_type,
        }
    }

    /// Locking script of outputs paying to this address.
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self.script_type {
            ScriptType::P2pkh => ScriptBuf::new_p2pkh(&self.public_key.pubkey_hash()),
            ScriptType::P2wpkhP2sh => {
                ScriptBuf::new_p2sh(&ScriptHash::hash(self.witness_program().as_bytes()))
            }
            ScriptType::P2wpkh => self.witness_program(),
        }
    }

    pub fn sighash_kind(&self) -> SighashKind {
        self.script_type.sighash_kind()
    }

    /// Script the signature hash commits to.
    ///
    /// For legacy inputs this is the previous locking script. For segwit inputs it is the
    /// v0 witness program, from which the P2PKH-style script code is derived.
    pub fn sighash_script(&self) -> ScriptBuf {
        match self.script_type {
            ScriptType::P2pkh => self.script_pubkey(),
            ScriptType::P2wpkhP2sh | ScriptType::P2wpkh => self.witness_program(),
        }
    }

    /// Builds the script sig and witness spending an output of this address with `signature`.
    pub fn unlocking_proof(
        &self,
        signature: &ecdsa::Signature,
    ) -> Result<(ScriptBuf, Witness), PushBytesError> {
        match self.script_type {
            ScriptType::P2pkh => {
                let signature = PushBytesBuf::try_from(signature.to_vec())?;
                let script_sig = Builder::new()
                    .push_slice(signature)
                    .push_key(&PublicKey::new(self.public_key.0))
                    .into_script();

                Ok((script_sig, Witness::new()))
            }
            ScriptType::P2wpkhP2sh => {
                let redeem_script = PushBytesBuf::try_from(self.witness_program().into_bytes())?;
                let script_sig = Builder::new().push_slice(redeem_script).into_script();

                Ok((script_sig, Witness::p2wpkh(signature, &self.public_key.0)))
            }
            ScriptType::P2wpkh => Ok((
                ScriptBuf::new(),
                Witness::p2wpkh(signature, &self.public_key.0),
            )),
        }
    }

    fn witness_program(&self) -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&self.public_key.wpubkey_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{
        secp256k1::{Message, Secp256k1, SecretKey},
        EcdsaSighashType,
    };
    use std::str::FromStr;

    fn create_mock_address(script_type: ScriptType) -> (AddressInfo, SecretKey) {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let public_key = CompressedPublicKey(secret_key.public_key(&secp));

        (
            AddressInfo::new(
                DerivationPath::from_str("m/84'/1'/0'/0/7").unwrap(),
                public_key,
                script_type,
            ),
            secret_key,
        )
    }

    fn create_mock_signature(secret_key: &SecretKey) -> ecdsa::Signature {
        let secp = Secp256k1::new();
        let message = Message::from_digest([0x42; 32]);

        ecdsa::Signature::sighash_all(secp.sign_ecdsa(&message, secret_key))
    }

    #[test]
    fn script_pubkeys_have_standard_shapes() {
        let (p2pkh, _) = create_mock_address(ScriptType::P2pkh);
        let (nested, _) = create_mock_address(ScriptType::P2wpkhP2sh);
        let (native, _) = create_mock_address(ScriptType::P2wpkh);

        assert!(p2pkh.script_pubkey().is_p2pkh());
        assert!(nested.script_pubkey().is_p2sh());
        assert!(native.script_pubkey().is_p2wpkh());
        assert_eq!(p2pkh.script_pubkey().len(), 25);
        assert_eq!(nested.script_pubkey().len(), 23);
        assert_eq!(native.script_pubkey().len(), 22);
    }

    #[test]
    fn sighash_kind_follows_script_type() {
        assert_eq!(ScriptType::P2pkh.sighash_kind(), SighashKind::Legacy);
        assert!(ScriptType::P2wpkhP2sh.is_segwit());
        assert!(ScriptType::P2wpkh.is_segwit());
    }

    #[test]
    fn segwit_sighash_script_is_the_witness_program() {
        let (nested, _) = create_mock_address(ScriptType::P2wpkhP2sh);
        assert!(nested.sighash_script().is_p2wpkh());

        let (p2pkh, _) = create_mock_address(ScriptType::P2pkh);
        assert_eq!(p2pkh.sighash_script(), p2pkh.script_pubkey());
    }

    #[test]
    fn p2pkh_proof_is_script_sig_only() {
        let (address, secret_key) = create_mock_address(ScriptType::P2pkh);
        let signature = create_mock_signature(&secret_key);

        let (script_sig, witness) = address.unlocking_proof(&signature).unwrap();

        assert!(witness.is_empty());
        let pushes: Vec<_> = script_sig.instructions().map(|i| i.unwrap()).collect();
        assert_eq!(pushes.len(), 2);
        let sig_push = pushes[0].push_bytes().unwrap().as_bytes();
        assert_eq!(
            *sig_push.last().unwrap(),
            EcdsaSighashType::All.to_u32() as u8
        );
        assert_eq!(pushes[1].push_bytes().unwrap().len(), 33);
    }

    #[test]
    fn nested_segwit_proof_pushes_redeem_script() {
        let (address, secret_key) = create_mock_address(ScriptType::P2wpkhP2sh);
        let signature = create_mock_signature(&secret_key);

        let (script_sig, witness) = address.unlocking_proof(&signature).unwrap();

        assert_eq!(witness.len(), 2);
        let pushes: Vec<_> = script_sig.instructions().map(|i| i.unwrap()).collect();
        assert_eq!(pushes.len(), 1);
        assert_eq!(
            pushes[0].push_bytes().unwrap().as_bytes(),
            address.sighash_script().as_bytes()
        );
    }

    #[test]
    fn native_segwit_proof_is_witness_only() {
        let (address, secret_key) = create_mock_address(ScriptType::P2wpkh);
        let signature = create_mock_signature(&secret_key);

        let (script_sig, witness) = address.unlocking_proof(&signature).unwrap();

        assert!(script_sig.is_empty());
        assert_eq!(witness.len(), 2);
        assert_eq!(witness.nth(1).unwrap(), address.public_key.to_bytes());
    }
}
