//! # Payment Flows
//!
//! Chain feed → subscription driver → reconciler → payment store.
//!
//! A request is fulfilled by the first qualifying event in chain order and
//! never again; everything else is rejected and left payable.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use primitive_types::U256;
    use shared_types::{Address, TxHash};
    use sp_01_payment_store::CursorStore;
    use sp_02_payment_reconciler::{
        DriverEvent, PaymentReconcilerApi, ReconcileError, Reconciled, SubscriptionConfig,
        SubscriptionDriver,
    };
    use std::sync::Arc;

    fn buyer() -> Address {
        Address([0xb1; 20])
    }

    // =========================================================================
    // NATIVE PAYMENTS
    // =========================================================================

    #[tokio::test]
    async fn test_exact_native_quote_fulfills() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;

        let report = shop
            .settle(
                EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI))
                    .tx(0xa1)
                    .build(),
            )
            .await;

        assert_eq!(report.fulfilled, 1);
        let stored = shop.reload(request.id).await;
        assert_eq!(stored.fulfilled_tx, Some(TxHash([0xa1; 32])));
        assert_eq!(stored.paid_cents, Some(999));
    }

    #[tokio::test]
    async fn test_one_wei_short_is_rejected() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;

        let report = shop
            .settle(
                EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI - 1))
                    .build(),
            )
            .await;

        assert_eq!(report.rejected, 1);
        assert!(!shop.reload(request.id).await.is_fulfilled());
    }

    #[tokio::test]
    async fn test_underpayment_leaves_request_payable() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;
        let mut events = shop.driver.subscribe();

        // Just over 500 cents at 220_000 cents per coin.
        let five_dollars =
            U256::from(500u64) * U256::exp10(18) / U256::from(220_000u64) + U256::one();
        shop.settle(
            EventBuilder::native(request.id, buyer(), five_dollars)
                .tx(0x05)
                .build(),
        )
        .await;

        match events.recv().await.unwrap() {
            DriverEvent::Reconciled { outcome, .. } => assert!(matches!(
                outcome,
                Err(ReconcileError::InsufficientAmount {
                    paid_cents: 500,
                    required_cents: 999,
                    ..
                })
            )),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!shop.reload(request.id).await.is_fulfilled());

        shop.settle(
            EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI))
                .tx(0x06)
                .block(2)
                .build(),
        )
        .await;
        assert_eq!(
            shop.reload(request.id).await.fulfilled_tx,
            Some(TxHash([0x06; 32]))
        );
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    #[tokio::test]
    async fn test_allowlisted_stablecoin_is_pegged() {
        let shop = Storefront::new().await;
        let short = shop.order(SHINING_KEY, &buyer()).await;
        let exact = shop.order(BRAVE_KEY, &buyer()).await;

        // 9.98 USDC for a 999-cent item, 10.34 USDC for a 1034-cent item.
        let report = shop
            .settle(
                EventBuilder::native(short.id, buyer(), U256::from(9_980_000u64))
                    .token(USDC)
                    .tx(0x01)
                    .build(),
            )
            .await;
        assert_eq!(report.rejected, 1);

        let report = shop
            .settle(
                EventBuilder::native(exact.id, buyer(), U256::from(10_340_000u64))
                    .token(USDC)
                    .tx(0x02)
                    .block(3)
                    .build(),
            )
            .await;
        assert_eq!(report.fulfilled, 1);

        assert!(!shop.reload(short.id).await.is_fulfilled());
        assert_eq!(shop.reload(exact.id).await.paid_cents, Some(1034));
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let shop = Storefront::new().await;
        let request = shop.order(ALICE_KEY, &buyer()).await;

        let outcome = shop
            .reconciler
            .reconcile(
                &EventBuilder::native(request.id, buyer(), U256::exp10(30))
                    .token(Address([0x99; 20]))
                    .build(),
            )
            .await;

        assert!(matches!(outcome, Err(ReconcileError::UnsupportedToken { .. })));
        assert!(!shop.reload(request.id).await.is_fulfilled());
    }

    // =========================================================================
    // AT-MOST-ONCE
    // =========================================================================

    #[tokio::test]
    async fn test_duplicate_and_later_payments_never_overwrite() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;
        let paid = EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI))
            .tx(0xf1)
            .build();

        let first = shop.reconciler.reconcile(&paid).await.unwrap();
        assert!(matches!(first, Reconciled::Fulfilled { .. }));

        let replay = shop.reconciler.reconcile(&paid).await.unwrap();
        assert_eq!(replay.label(), "replay");

        let second = EventBuilder::native(request.id, buyer(), U256::exp10(19))
            .tx(0xf2)
            .build();
        let outcome = shop.reconciler.reconcile(&second).await.unwrap();
        assert!(matches!(
            outcome,
            Reconciled::AlreadyFulfilled { existing, replay: false, .. } if existing == TxHash([0xf1; 32])
        ));

        let stored = shop.reload(request.id).await;
        assert_eq!(stored.fulfilled_tx, Some(TxHash([0xf1; 32])));
        assert_eq!(stored.paid_cents, Some(999));
    }

    #[tokio::test]
    async fn test_first_event_in_chain_order_wins() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;
        let amount = U256::from(SHINING_QUOTE_WEI);

        // Delivered out of order within one range.
        shop.chain.push_event(
            EventBuilder::native(request.id, buyer(), amount)
                .block(4)
                .log_index(7)
                .tx(0x47)
                .build(),
        );
        shop.chain.push_event(
            EventBuilder::native(request.id, buyer(), amount)
                .block(4)
                .log_index(2)
                .tx(0x42)
                .build(),
        );
        shop.chain.push_event(
            EventBuilder::native(request.id, buyer(), amount)
                .block(5)
                .tx(0x50)
                .build(),
        );

        let report = shop.driver.poll_once().await.unwrap();
        assert_eq!(report.events, 3);
        assert_eq!(report.fulfilled, 1);
        assert_eq!(
            shop.reload(request.id).await.fulfilled_tx,
            Some(TxHash([0x42; 32]))
        );
    }

    #[tokio::test]
    async fn test_concurrent_qualifying_events_fulfill_once() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;

        let mut tasks = Vec::new();
        for byte in 1..=16u8 {
            let reconciler = Arc::clone(&shop.reconciler);
            let event = EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI))
                .tx(byte)
                .build();
            tasks.push(tokio::spawn(async move { reconciler.reconcile(&event).await }));
        }

        let mut fulfilled = Vec::new();
        for task in tasks {
            if let Reconciled::Fulfilled { tx_hash, .. } = task.await.unwrap().unwrap() {
                fulfilled.push(tx_hash);
            }
        }

        assert_eq!(fulfilled.len(), 1);
        assert_eq!(shop.reload(request.id).await.fulfilled_tx, Some(fulfilled[0]));
    }

    // =========================================================================
    // REFERENCES
    // =========================================================================

    #[tokio::test]
    async fn test_reference_encodings() {
        let shop = Storefront::new().await;
        let request = shop.order(ALICE_KEY, &buyer()).await;

        let garbage = EventBuilder::native(request.id, buyer(), U256::exp10(18))
            .reference("not-an-id")
            .build();
        assert!(matches!(
            shop.reconciler.reconcile(&garbage).await,
            Err(ReconcileError::DecodeError { .. })
        ));

        let unknown = EventBuilder::native(request.id, buyer(), U256::exp10(18))
            .reference("0xffff")
            .build();
        assert!(matches!(
            shop.reconciler.reconcile(&unknown).await,
            Err(ReconcileError::NotFound { .. })
        ));

        let decimal = EventBuilder::native(request.id, buyer(), U256::exp10(18))
            .reference(request.id.0.to_string())
            .build();
        assert!(matches!(
            shop.reconciler.reconcile(&decimal).await,
            Ok(Reconciled::Fulfilled { .. })
        ));
    }

    // =========================================================================
    // SUBSCRIPTION
    // =========================================================================

    #[tokio::test]
    async fn test_cursor_survives_restart() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;
        shop.chain.set_head(25);
        shop.chain.push_event(
            EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI))
                .block(17)
                .build(),
        );

        let report = shop.driver.poll_once().await.unwrap();
        assert_eq!(report.ranges, 3);
        assert_eq!(report.next_block, 26);
        assert_eq!(shop.store.load_cursor().await.unwrap(), Some(26));

        let restarted = SubscriptionDriver::new(
            shop.chain.clone(),
            shop.reconciler.clone(),
            SubscriptionConfig {
                max_block_range: 10,
                ..SubscriptionConfig::default()
            },
        )
        .with_cursor_store(shop.store.clone());
        let report = restarted.poll_once().await.unwrap();
        assert_eq!(report.events, 0);
        assert_eq!(restarted.next_block(), Some(26));
    }

    #[tokio::test]
    async fn test_provider_outage_is_retried() {
        let shop = Storefront::new().await;
        let request = shop.order(SHINING_KEY, &buyer()).await;
        shop.chain.push_event(
            EventBuilder::native(request.id, buyer(), U256::from(SHINING_QUOTE_WEI))
                .block(3)
                .build(),
        );

        shop.chain.fail_next(1);
        assert!(shop.driver.poll_once().await.is_err());
        assert!(!shop.reload(request.id).await.is_fulfilled());

        let report = shop.driver.poll_once().await.unwrap();
        assert_eq!(report.fulfilled, 1);
    }
}
