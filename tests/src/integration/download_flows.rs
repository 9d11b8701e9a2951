//! # Download Flows
//!
//! Signed download requests against payments the reconciler settled.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use primitive_types::U256;
    use sp_03_download_auth::{
        AuthError, DownloadAuthorizationApi, DownloadAuthorizer, FsContentProvider, NonceRegistry,
    };
    use std::sync::Arc;

    fn authorizer(shop: &Storefront) -> DownloadAuthorizer {
        DownloadAuthorizer::new(shop.store.clone(), shop.store.clone(), shop.content.clone())
            .with_nonce_registry(NonceRegistry::default())
    }

    async fn paid_shop(wallet: &Wallet, key: &str, quote: U256) -> Storefront {
        let shop = Storefront::new().await;
        let request = shop.order(key, &wallet.address).await;
        shop.settle(EventBuilder::native(request.id, wallet.address, quote).build())
            .await;
        shop
    }

    #[tokio::test]
    async fn test_paying_wallet_downloads() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, SHINING_KEY, U256::from(SHINING_QUOTE_WEI)).await;

        let download = authorizer(&shop)
            .authorize(&wallet.sign_download(SHINING_KEY, "n-1"))
            .await
            .unwrap();

        assert_eq!(download.item.title, "The Shining");
        assert_eq!(download.payer, wallet.address);
        assert_eq!(download.file_name(), "The Shining.txt");
        assert_eq!(
            download.content,
            b"All work and no play makes Jack a dull boy.".to_vec()
        );
    }

    #[tokio::test]
    async fn test_mixed_case_address_text_is_signed_as_sent() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, SHINING_KEY, U256::from(SHINING_QUOTE_WEI)).await;
        let shouting = format!("0x{}", wallet.address.to_string()[2..].to_uppercase());

        let download = authorizer(&shop)
            .authorize(&wallet.sign_download_as(&shouting, SHINING_KEY, "n-1"))
            .await
            .unwrap();
        assert_eq!(download.payer, wallet.address);
    }

    #[tokio::test]
    async fn test_another_wallet_cannot_claim_payment() {
        let buyer = Wallet::random();
        let thief = Wallet::random();
        let shop = paid_shop(&buyer, SHINING_KEY, U256::from(SHINING_QUOTE_WEI)).await;

        // Thief signs while claiming to be the buyer.
        let forged = thief.sign_download_as(&buyer.address.to_string(), SHINING_KEY, "n-1");
        let err = authorizer(&shop).authorize(&forged).await.unwrap_err();
        assert!(matches!(err, AuthError::SignerMismatch { .. }));
        assert_eq!(err.code(), "unauthorized");

        // Signing honestly only proves they never paid.
        let honest = thief.sign_download(SHINING_KEY, "n-1");
        let err = authorizer(&shop).authorize(&honest).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn test_payment_for_one_item_does_not_unlock_another() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, SHINING_KEY, U256::from(SHINING_QUOTE_WEI)).await;

        let err = authorizer(&shop)
            .authorize(&wallet.sign_download(ALICE_KEY, "n-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NoPaymentRequest { .. }));
    }

    #[tokio::test]
    async fn test_underpaid_request_is_not_paid() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, SHINING_KEY, U256::from(SHINING_QUOTE_WEI - 1)).await;

        let err = authorizer(&shop)
            .authorize(&wallet.sign_download(SHINING_KEY, "n-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotPaid { .. }));
    }

    #[tokio::test]
    async fn test_earlier_payment_still_unlocks_after_new_order() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, SHINING_KEY, U256::from(SHINING_QUOTE_WEI)).await;
        // A newer pending request must not hide the settled one.
        shop.order(SHINING_KEY, &wallet.address).await;

        let download = authorizer(&shop)
            .authorize(&wallet.sign_download(SHINING_KEY, "n-2"))
            .await
            .unwrap();
        assert_eq!(download.item.key, SHINING_KEY);
    }

    #[tokio::test]
    async fn test_nonce_is_single_use() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, SHINING_KEY, U256::from(SHINING_QUOTE_WEI)).await;
        let downloads = authorizer(&shop);
        let request = wallet.sign_download(SHINING_KEY, "once");

        downloads.authorize(&request).await.unwrap();
        assert_eq!(
            downloads.authorize(&request).await.unwrap_err(),
            AuthError::NonceReused
        );
        downloads
            .authorize(&wallet.sign_download(SHINING_KEY, "twice"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_content_from_disk() {
        let wallet = Wallet::random();
        let shop = paid_shop(&wallet, BRAVE_KEY, U256::exp10(18)).await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{BRAVE_KEY}.txt")), b"Community, Identity, Stability").unwrap();

        let downloads = DownloadAuthorizer::new(
            shop.store.clone(),
            shop.store.clone(),
            Arc::new(FsContentProvider::new(dir.path())),
        );
        let download = downloads
            .authorize(&wallet.sign_download(BRAVE_KEY, "n-1"))
            .await
            .unwrap();
        assert_eq!(download.content, b"Community, Identity, Stability".to_vec());

        std::fs::remove_file(dir.path().join(format!("{BRAVE_KEY}.txt"))).unwrap();
        let err = downloads
            .authorize(&wallet.sign_download(BRAVE_KEY, "n-2"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::ContentUnavailable(BRAVE_KEY.to_string()));
    }
}
