//! Transaction sender: route, resolve, sign and dispatch

use super::gas::GasEstimator;
use super::resolver::FieldResolver;
use super::router::{route, SigningPath};
use super::types::{ResolvedTransaction, SenderRef, SignedTransaction, TransactionIntent};
use crate::config::SenderConfig;
use crate::error::{SendError, SendResult};
use crate::rpc::{methods, NodeClient, TransactionPayload, Transport};
use crate::wallet::{Credential, Keyring, LocalAccount};

use ethers::types::H256;
use std::sync::Arc;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

/// Assembles transactions from partial intents and submits them
pub struct TransactionSender {
    /// Typed node access
    client: NodeClient,
    /// Field resolver
    resolver: FieldResolver,
    /// Local signing capability
    keyring: Arc<dyn Keyring>,
}

impl TransactionSender {
    /// Create a new transaction sender
    pub fn new(transport: Arc<dyn Transport>, keyring: Arc<dyn Keyring>, config: &SenderConfig) -> Self {
        let client = NodeClient::new(transport, config.epoch_tag.clone());
        let resolver = FieldResolver::new(client.clone(), GasEstimator::new(config.transfer_gas));

        Self {
            client,
            resolver,
            keyring,
        }
    }

    /// Resolve, sign if local, and submit `intent`.
    ///
    /// Exactly one submission RPC is issued on success and none on any
    /// earlier failure.
    pub async fn send_transaction(
        &self,
        intent: &TransactionIntent,
        credential: Option<&Credential>,
    ) -> SendResult<H256> {
        let span = info_span!(
            "send_transaction",
            request_id = %Uuid::new_v4(),
            path = field::Empty
        );

        async {
            let result = self.dispatch(intent, credential).await;
            if let Err(e) = &result {
                warn!("Send failed ({}): {}", e.kind(), e);
                crate::metrics::record_send_failure(e.kind());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        intent: &TransactionIntent,
        credential: Option<&Credential>,
    ) -> SendResult<H256> {
        let path = route(sender_of(intent)?, self.keyring.as_ref())?;
        Span::current().record("path", path.label());
        debug!("Routed {:#x} to {} signing", path.address(), path.label());

        let resolved = self.resolver.resolve(intent, path.address()).await?;

        let tx_hash = match &path {
            SigningPath::Local(account) => {
                let signed = self.sign_resolved(account, resolved, credential)?;
                self.client
                    .send_raw_transaction(&signed.encode())
                    .await
                    .map_err(|source| SendError::SubmissionFailed {
                        method: methods::SEND_RAW_TRANSACTION,
                        source,
                    })?
            }
            SigningPath::Remote(_) => {
                let payload = remote_payload(&resolved);
                self.client
                    .send_transaction(&payload, credential)
                    .await
                    .map_err(|source| SendError::SubmissionFailed {
                        method: methods::SEND_TRANSACTION,
                        source,
                    })?
            }
        };

        info!("Transaction sent: {:#x} via {} path", tx_hash, path.label());
        crate::metrics::record_tx_submitted(path.label());

        Ok(tx_hash)
    }

    /// Resolve and sign locally without submitting.
    ///
    /// Only senders held by the keyring can be signed here.
    pub async fn sign_transaction(
        &self,
        intent: &TransactionIntent,
        credential: Option<&Credential>,
    ) -> SendResult<SignedTransaction> {
        let account = match route(sender_of(intent)?, self.keyring.as_ref())? {
            SigningPath::Local(account) => account,
            SigningPath::Remote(address) => {
                return Err(SendError::invalid(format!(
                    "no local key for {:#x}; it can only be signed by the node",
                    address
                )))
            }
        };

        let resolved = self.resolver.resolve(intent, account.address()).await?;
        self.sign_resolved(&account, resolved, credential)
    }

    /// Fill in every absent field without signing or submitting
    pub async fn resolve(&self, intent: &TransactionIntent) -> SendResult<ResolvedTransaction> {
        let path = route(sender_of(intent)?, self.keyring.as_ref())?;
        self.resolver.resolve(intent, path.address()).await
    }

    fn sign_resolved(
        &self,
        account: &LocalAccount,
        resolved: ResolvedTransaction,
        credential: Option<&Credential>,
    ) -> SendResult<SignedTransaction> {
        let signature = self
            .keyring
            .sign(&account.address(), &resolved, credential)?;
        let signed = SignedTransaction::new(resolved, signature);
        debug!("Signed tx {:#x}", signed.hash());
        Ok(signed)
    }
}

fn sender_of(intent: &TransactionIntent) -> SendResult<&SenderRef> {
    intent
        .from
        .as_ref()
        .ok_or_else(|| SendError::invalid("from is required"))
}

/// Structured payload for the node's wallet; epoch and chain are its own
fn remote_payload(resolved: &ResolvedTransaction) -> TransactionPayload {
    TransactionPayload::new(resolved.from)
        .to(resolved.to)
        .gas_price(resolved.gas_price)
        .gas(resolved.gas)
        .storage_limit(resolved.storage_limit)
        .value(resolved.value)
        .nonce(resolved.nonce)
        .data(&resolved.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Phase, TransportError};
    use crate::rpc::testing::ScriptedTransport;
    use crate::wallet::LocalKeyring;
    use ethers::types::{Address, U256};
    use serde_json::json;

    const PRIVATE_KEY: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn sender(transport: &Arc<ScriptedTransport>, keyring: &Arc<LocalKeyring>) -> TransactionSender {
        TransactionSender::new(transport.clone(), keyring.clone(), &SenderConfig::default())
    }

    fn hash_response() -> serde_json::Value {
        json!(format!("0x{}", "11".repeat(32)))
    }

    #[tokio::test]
    async fn test_missing_from_rejected_without_calls() {
        let transport = Arc::new(ScriptedTransport::new());
        let keyring = Arc::new(LocalKeyring::new());

        let err = sender(&transport, &keyring)
            .send_transaction(&TransactionIntent::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::InvalidInput(_)));
        assert_eq!(err.phase(), None);
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_payload_omits_epoch_and_chain() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(methods::SEND_TRANSACTION, Ok(hash_response()));
        let keyring = Arc::new(LocalKeyring::new());

        let intent = TransactionIntent::new()
            .from(Address::repeat_byte(0x1a))
            .to(Address::repeat_byte(0x1b))
            .nonce(1u64)
            .gas_price(10u64)
            .gas(21_000u64)
            .storage_limit(0u64)
            .epoch_height(5)
            .chain_id(1)
            .value(0u64);

        let tx_hash = sender(&transport, &keyring)
            .send_transaction(&intent, Some(&Credential::new("pw")))
            .await
            .unwrap();

        assert_eq!(tx_hash, H256::repeat_byte(0x11));
        let params = transport.last_params(methods::SEND_TRANSACTION).unwrap();
        assert_eq!(
            params[0],
            json!({
                "from": format!("{:#x}", Address::repeat_byte(0x1a)),
                "to": format!("{:#x}", Address::repeat_byte(0x1b)),
                "gasPrice": "0xa",
                "gas": "0x5208",
                "storageLimit": "0x0",
                "value": "0x0",
                "nonce": "0x1",
            })
        );
        assert_eq!(params[1], json!("pw"));
        assert_eq!(transport.count(methods::SEND_RAW_TRANSACTION), 0);
    }

    #[tokio::test]
    async fn test_sign_transaction_requires_local_key() {
        let transport = Arc::new(ScriptedTransport::new());
        let keyring = Arc::new(LocalKeyring::new());

        let intent = TransactionIntent::new()
            .from(Address::repeat_byte(0x1a))
            .to(Address::repeat_byte(0x1b));

        let err = sender(&transport, &keyring)
            .sign_transaction(&intent, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::InvalidInput(_)));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_sign_transaction_recovers_to_sender() {
        let transport = Arc::new(ScriptedTransport::new());
        let keyring = Arc::new(LocalKeyring::new());
        let account = keyring.add_private_key(PRIVATE_KEY).unwrap();

        let intent = TransactionIntent::new()
            .from(&account)
            .to(account.address())
            .nonce(100u64)
            .gas_price(10u64)
            .gas(1024u64)
            .storage_limit(2048u64)
            .epoch_height(1000)
            .chain_id(1)
            .value(0u64);

        let signed = sender(&transport, &keyring)
            .sign_transaction(&intent, None)
            .await
            .unwrap();

        assert_eq!(signed.recover_sender().unwrap(), account.address());
        assert_eq!(signed.transaction().storage_limit, U256::from(2048));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_submission_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            methods::SEND_RAW_TRANSACTION,
            Err(TransportError::Rpc {
                code: -32602,
                message: "nonce too stale".to_string(),
            }),
        );
        let keyring = Arc::new(LocalKeyring::new());
        let account = keyring.add_private_key(PRIVATE_KEY).unwrap();

        let intent = TransactionIntent::new()
            .from(account.address())
            .to(account.address())
            .nonce(0u64)
            .gas_price(1u64)
            .epoch_height(1)
            .chain_id(1);

        let err = sender(&transport, &keyring)
            .send_transaction(&intent, None)
            .await
            .unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Submission));
        assert!(!err.is_retryable());
        assert_eq!(transport.count(methods::SEND_RAW_TRANSACTION), 1);
    }

    #[tokio::test]
    async fn test_resolve_only_issues_no_submission() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(methods::GET_NEXT_NONCE, Ok(json!("0x2")));
        let keyring = Arc::new(LocalKeyring::new());

        let intent = TransactionIntent::new()
            .from(Address::repeat_byte(0x1a))
            .to(Address::repeat_byte(0x1b))
            .gas_price(1u64)
            .epoch_height(1)
            .chain_id(1);

        let resolved = sender(&transport, &keyring).resolve(&intent).await.unwrap();

        assert_eq!(resolved.nonce, U256::from(2));
        assert_eq!(resolved.gas, U256::from(21_000));
        assert_eq!(transport.total_calls(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_is_logged_inside_request_span() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let transport = Arc::new(ScriptedTransport::new());
        let keyring = Arc::new(LocalKeyring::new());
        let intent = TransactionIntent::new()
            .from(Address::repeat_byte(0x1a))
            .to(Address::repeat_byte(0x1b))
            .nonce(1u64)
            .gas_price(1u64)
            .epoch_height(1)
            .chain_id(1);

        let err = sender(&transport, &keyring)
            .send_transaction(&intent, None)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Submission));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("Send failed"))
            .expect("failure was logged");
        assert!(line.contains("send_transaction{"), "{line}");
        assert!(line.contains("request_id="), "{line}");
        assert!(line.contains("path=\"remote\""), "{line}");
    }
}
