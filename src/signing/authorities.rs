use super::{KeyRole, KeyService, MessageSigner, SignerResolver};
use crate::error::{HexlinkError, HexlinkResult};
use async_trait::async_trait;
use ethers_core::types::{Address, RecoveryMessage, Signature, H256};
use ethers_core::utils::hash_message;
use ethers_signers::{LocalWallet, Signer};
use std::sync::Arc;

/// Local private key signing with `personal_sign` semantics
pub struct HotWalletSigner {
    wallet: LocalWallet,
}

impl HotWalletSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl MessageSigner for HotWalletSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_message(&self, message: H256) -> HexlinkResult<Signature> {
        Ok(self.wallet.sign_message(message.as_bytes()).await?)
    }
}

/// Key service role. The EIP-191 digest is computed locally and the service
/// signs it as-is.
pub struct KmsSigner {
    service: Arc<dyn KeyService>,
    role: KeyRole,
    address: Address,
}

impl KmsSigner {
    pub fn new(service: Arc<dyn KeyService>, role: KeyRole) -> HexlinkResult<Self> {
        let address = service.public_address(role)?;
        Ok(Self { service, role, address })
    }
}

#[async_trait]
impl MessageSigner for KmsSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_message(&self, message: H256) -> HexlinkResult<Signature> {
        let digest = hash_message(message.as_bytes());
        let signature = self.service.sign_digest(self.role, digest).await?;
        // The service must sign with the key it advertised
        match signature.recover(RecoveryMessage::Hash(digest)) {
            Ok(signer) if signer == self.address => Ok(signature),
            Ok(signer) => Err(HexlinkError::signing_failed("key service signed with an unexpected key")
                .with_details(format!("expected={:?} got={:?}", self.address, signer))),
            Err(e) => Err(HexlinkError::signing_failed(format!("unrecoverable signature: {}", e))),
        }
    }
}

/// The two validator authorities. The hot wallet is consulted first.
#[derive(Default)]
pub struct ValidatorSigners {
    hot_wallet: Option<Arc<HotWalletSigner>>,
    managed: Option<Arc<KmsSigner>>,
}

impl ValidatorSigners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hot_wallet(mut self, wallet: LocalWallet) -> Self {
        self.hot_wallet = Some(Arc::new(HotWalletSigner::new(wallet)));
        self
    }

    pub fn with_key_service(mut self, service: Arc<dyn KeyService>) -> HexlinkResult<Self> {
        self.managed = Some(Arc::new(KmsSigner::new(service, KeyRole::Validator)?));
        Ok(self)
    }
}

impl SignerResolver for ValidatorSigners {
    fn resolve_signer(&self, address: Address) -> Option<Arc<dyn MessageSigner>> {
        if let Some(hot) = self.hot_wallet.as_ref().filter(|s| s.address() == address) {
            return Some(hot.clone() as Arc<dyn MessageSigner>);
        }
        if let Some(kms) = self.managed.as_ref().filter(|s| s.address() == address) {
            return Some(kms.clone() as Arc<dyn MessageSigner>);
        }
        None
    }
}
