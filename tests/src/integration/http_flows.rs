//! # HTTP Flows
//!
//! The whole purchase over the storefront router: order, pay on chain,
//! poll the payment status, download with a signature.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use axum::http::{header, StatusCode};
    use primitive_types::U256;
    use serde_json::{json, Value};
    use shared_types::PaymentRequestId;
    use sp_04_storefront_api::CATALOG_TITLE_HEADER;

    fn parse(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    fn download_body(wallet: &Wallet, key: &str, nonce: &str) -> Value {
        let signed = wallet.sign_download(key, nonce);
        json!({
            "address": signed.address,
            "nonce": signed.nonce,
            "signature": signed.signature,
        })
    }

    #[tokio::test]
    async fn test_purchase_over_http() {
        let shop = Storefront::new().await;
        let wallet = Wallet::random();
        let address = wallet.address.to_string();

        // 1. Order.
        let (status, _, body) = send(
            &shop.router,
            post_json(
                &format!("/catalog/{SHINING_KEY}/order"),
                json!({ "address": address }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let order = parse(&body);
        assert_eq!(order["receiverAddress"], RECEIVER.to_string());
        assert_eq!(order["paymentRequest"]["requiredCents"], 999);
        assert_eq!(order["paymentRequest"]["fulfilled"], false);

        let id = PaymentRequestId(order["paymentRequest"]["id"].as_u64().unwrap());
        let quote = U256::from_dec_str(order["nativeQuoteWei"].as_str().unwrap()).unwrap();
        assert_eq!(quote, U256::from(SHINING_QUOTE_WEI));

        // 2. Not paid yet.
        let (status, _, body) = send(
            &shop.router,
            post_json(
                &format!("/catalog/{SHINING_KEY}/download"),
                download_body(&wallet, SHINING_KEY, "early"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(parse(&body)["error"]["code"], "not_paid");

        // 3. Pay exactly the quote with the reference the order returned.
        shop.settle(
            EventBuilder::native(id, wallet.address, quote)
                .reference(order["paymentReference"].as_str().unwrap())
                .tx(0x77)
                .build(),
        )
        .await;

        let (status, _, body) = send(
            &shop.router,
            get(&format!("/catalog/{SHINING_KEY}/payments/{address}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payment = parse(&body);
        assert_eq!(payment["fulfilled"], true);
        assert_eq!(payment["paidCents"], 999);
        assert_eq!(payment["fulfilledTx"], format!("0x{}", "77".repeat(32)));

        // 4. Download.
        let (status, headers, body) = send(
            &shop.router,
            post_json(
                &format!("/catalog/{SHINING_KEY}/download"),
                download_body(&wallet, SHINING_KEY, "n-1"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"The Shining.txt\""
        );
        assert_eq!(headers[CATALOG_TITLE_HEADER], "The Shining");
        assert_eq!(body, b"All work and no play makes Jack a dull boy.".to_vec());

        // 5. Replaying the same signed body is refused.
        let (status, _, body) = send(
            &shop.router,
            post_json(
                &format!("/catalog/{SHINING_KEY}/download"),
                download_body(&wallet, SHINING_KEY, "n-1"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(parse(&body)["error"]["code"], "nonce_reused");
    }

    #[tokio::test]
    async fn test_bad_signatures_are_unauthorized() {
        let shop = Storefront::new().await;
        let wallet = Wallet::random();

        let mut body = download_body(&wallet, SHINING_KEY, "n-1");
        body["signature"] = json!(format!("0x{}", "00".repeat(65)));
        let (status, _, response) = send(
            &shop.router,
            post_json(&format!("/catalog/{SHINING_KEY}/download"), body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(parse(&response)["error"]["code"], "unauthorized");

        // Signed for a different item.
        let body = download_body(&wallet, ALICE_KEY, "n-1");
        let (status, _, _) = send(
            &shop.router,
            post_json(&format!("/catalog/{SHINING_KEY}/download"), body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rejected_payment_is_visible_in_status() {
        let shop = Storefront::new().await;
        let buyer = Wallet::random();
        let request = shop.order(BRAVE_KEY, &buyer.address).await;

        shop.settle(EventBuilder::native(request.id, buyer.address, U256::from(1u64)).build())
            .await;

        let (status, _, body) = send(
            &shop.router,
            get(&format!("/catalog/{BRAVE_KEY}/payments/{}", buyer.address)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payment = parse(&body);
        assert_eq!(payment["fulfilled"], false);
        assert_eq!(payment["fulfilledTx"], Value::Null);
    }

    #[tokio::test]
    async fn test_catalog_and_health() {
        let shop = Storefront::new().await;

        let (status, _, body) = send(&shop.router, get("/catalog")).await;
        assert_eq!(status, StatusCode::OK);
        let keys: Vec<String> = parse(&body)
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["key"].as_str().unwrap().to_string())
            .collect();
        assert!(keys.contains(&ALICE_KEY.to_string()));
        assert!(keys.contains(&SHINING_KEY.to_string()));
        assert!(keys.contains(&BRAVE_KEY.to_string()));

        let (status, _, body) = send(&shop.router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body)["status"], "ok");
    }
}
