//! Shared test harness.

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use k256::ecdsa::SigningKey;
use primitive_types::U256;
use shared_types::{Address, ChainPaymentEvent, PaymentRequest, PaymentRequestId, TxHash};
use sp_01_payment_store::{InMemoryStore, PaymentRepository};
use sp_02_payment_reconciler::{
    FixedRateSource, MockChainEventSource, PaymentPricer, PaymentReconciler, PollReport,
    ReconcilerConfig, SubscriptionConfig, SubscriptionDriver,
};
use sp_03_download_auth::{
    address_from_pubkey, download_digest, sign_digest, DownloadAuthorizer, DownloadRequest,
    InMemoryContentProvider, NonceRegistry,
};
use sp_04_storefront_api::{build_router, ApiConfig, AppState, OrderDesk};
use splice_runtime::seed::{default_catalog, seed_if_empty};
use std::sync::Arc;
use tower::ServiceExt;

pub const ALICE_KEY: &str = "979-8749522310";
pub const SHINING_KEY: &str = "978-0345806789";
pub const BRAVE_KEY: &str = "978-0060850524";

pub const RECEIVER: Address = Address([0xcc; 20]);
pub const USDC: Address = Address([0x11; 20]);
pub const USDC_DECIMALS: u8 = 6;

/// `ceil(999 * 10^18 / 220_000)`: the native quote for a 999-cent item.
pub const SHINING_QUOTE_WEI: u64 = 4_540_909_090_909_091;

/// Every component wired over one in-memory store and a mock chain.
pub struct Storefront {
    pub store: Arc<InMemoryStore>,
    pub content: Arc<InMemoryContentProvider>,
    pub chain: Arc<MockChainEventSource>,
    pub reconciler: Arc<PaymentReconciler>,
    pub driver: SubscriptionDriver,
    pub orders: Arc<OrderDesk>,
    pub router: Router,
}

impl Storefront {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        seed_if_empty(store.as_ref(), default_catalog())
            .await
            .expect("seed");

        let content = Arc::new(InMemoryContentProvider::new());
        content.insert(ALICE_KEY, "Down the Rabbit-Hole");
        content.insert(SHINING_KEY, "All work and no play makes Jack a dull boy.");
        content.insert(BRAVE_KEY, "A squat grey building of only thirty-four stories.");

        let pricer = Arc::new(PaymentPricer::new(
            ReconcilerConfig::default().with_stablecoin(USDC, USDC_DECIMALS),
            Arc::new(FixedRateSource::default()),
        ));
        let reconciler = Arc::new(PaymentReconciler::new(store.clone(), pricer.clone()));

        let chain = Arc::new(MockChainEventSource::new());
        let driver = SubscriptionDriver::new(
            chain.clone(),
            reconciler.clone(),
            SubscriptionConfig {
                max_block_range: 10,
                ..SubscriptionConfig::default()
            },
        )
        .with_cursor_store(store.clone());

        let orders = Arc::new(OrderDesk::new(
            store.clone(),
            store.clone(),
            pricer,
            RECEIVER,
        ));
        let downloads = DownloadAuthorizer::new(store.clone(), store.clone(), content.clone())
            .with_nonce_registry(NonceRegistry::default());
        let router = build_router(
            AppState {
                catalog: store.clone(),
                orders: orders.clone(),
                downloads: Arc::new(downloads),
            },
            &ApiConfig::default(),
        );

        Self {
            store,
            content,
            chain,
            reconciler,
            driver,
            orders,
            router,
        }
    }

    /// Open a payment request through the order desk.
    pub async fn order(&self, key: &str, payer: &Address) -> PaymentRequest {
        self.orders
            .create_order(key, &payer.to_string())
            .await
            .expect("order")
            .payment_request
    }

    /// Emit an event on the mock chain and process it. Events behind the
    /// cursor are moved up to it so they are not skipped.
    pub async fn settle(&self, mut event: ChainPaymentEvent) -> PollReport {
        let cursor = self.driver.next_block().unwrap_or(0);
        event.block_number = event.block_number.max(cursor);
        self.chain.push_event(event);
        self.driver.poll_once().await.expect("poll")
    }

    pub async fn reload(&self, id: PaymentRequestId) -> PaymentRequest {
        self.store
            .find_by_id(id)
            .await
            .expect("store")
            .expect("payment request")
    }
}

/// A buyer's key pair.
pub struct Wallet {
    pub key: SigningKey,
    pub address: Address,
}

impl Wallet {
    pub fn random() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_from_pubkey(key.verifying_key());
        Self { key, address }
    }

    /// Sign a download request, sending the address as `address_text`.
    pub fn sign_download_as(&self, address_text: &str, key: &str, nonce: &str) -> DownloadRequest {
        let digest = download_digest(address_text, key, nonce);
        DownloadRequest {
            catalog_key: key.to_string(),
            address: address_text.to_string(),
            nonce: nonce.to_string(),
            signature: sign_digest(&self.key, &digest).expect("sign").to_hex(),
        }
    }

    pub fn sign_download(&self, key: &str, nonce: &str) -> DownloadRequest {
        self.sign_download_as(&self.address.to_string(), key, nonce)
    }
}

/// Builder for `PaymentReceived` events.
pub struct EventBuilder {
    event: ChainPaymentEvent,
}

impl EventBuilder {
    /// Native payment of `amount` wei for request `id`.
    pub fn native(id: PaymentRequestId, payer: Address, amount: U256) -> Self {
        Self {
            event: ChainPaymentEvent {
                block_number: 1,
                tx_hash: TxHash([0x01; 32]),
                log_index: 0,
                payer,
                amount,
                token: Address::NATIVE,
                payment_reference: id.to_reference(),
            },
        }
    }

    pub fn token(mut self, token: Address) -> Self {
        self.event.token = token;
        self
    }

    pub fn block(mut self, block: u64) -> Self {
        self.event.block_number = block;
        self
    }

    pub fn tx(mut self, byte: u8) -> Self {
        self.event.tx_hash = TxHash([byte; 32]);
        self
    }

    pub fn log_index(mut self, index: u64) -> Self {
        self.event.log_index = index;
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.event.payment_reference = reference.into();
        self
    }

    pub fn build(self) -> ChainPaymentEvent {
        self.event
    }
}

/// Drive one request through a router.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, headers, body.to_vec())
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}
