//! End-to-end flows through the keeper and router.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use warden_core::{FileKeyStore, KdfParams, KeyRing, KeyRingState, KeyStore, MemoryKeyStore};
use warden_keeper::messages::Request;
use warden_keeper::{
    AccessPolicy, Envelope, ErrorKind, KeeperError, KeyRingKeeper, RecordingSurface, Response,
    Router, StaticChainCatalog, TxConfig,
};

const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const COSMOS_ADDRESS: &str = "cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0auqdal4";
const UI: &str = "warden://ui";
const SITE: &str = "http://localhost:8081";
const CHAIN: &str = "cosmoshub-2";

struct Harness {
    keeper: Arc<KeyRingKeeper>,
    router: Router,
    surface: Arc<RecordingSurface>,
}

fn harness_with_store(store: Arc<dyn KeyStore>) -> Harness {
    let surface = Arc::new(RecordingSurface::new());
    let keeper = Arc::new(KeyRingKeeper::new(
        KeyRing::new(store, KdfParams::insecure_for_tests()),
        Arc::new(StaticChainCatalog::new(warden_keeper::chain::native_chains())),
        AccessPolicy::new(UI).allow(CHAIN, SITE),
        surface.clone(),
    ));
    Harness {
        router: Router::new(keeper.clone()),
        keeper,
        surface,
    }
}

fn harness() -> Harness {
    harness_with_store(Arc::new(MemoryKeyStore::new()))
}

async fn unlocked() -> Harness {
    let h = harness();
    h.keeper.create_mnemonic_key(MNEMONIC, "pw1").await.unwrap();
    h.keeper.set_path(CHAIN, 0, 0).unwrap();
    h
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn tx_config(memo: &str, gas: u64) -> TxConfig {
    TxConfig {
        chain_id: CHAIN.into(),
        account_number: Some(7),
        sequence: Some(3),
        gas,
        memo: memo.into(),
        fee: "5000uatom".into(),
    }
}

async fn send(router: &Router, origin: &str, request: Request) -> warden_keeper::Reply {
    router
        .handle(Envelope {
            seq: None,
            origin: origin.into(),
            request,
        })
        .await
}

// ============================================================================
// Scenario A: create and read a deterministic key
// ============================================================================

#[tokio::test]
async fn scenario_create_then_get_key() {
    let h = harness();
    assert_eq!(h.keeper.restore().unwrap(), KeyRingState::Empty);

    let state = h.keeper.create_mnemonic_key(MNEMONIC, "pw1").await.unwrap();
    assert_eq!(state, KeyRingState::Unlocked);

    h.keeper.set_path(CHAIN, 0, 0).unwrap();
    let key = h.keeper.get_key(CHAIN, Some(SITE)).unwrap();
    assert_eq!(key.path, "m/44'/118'/0'/0/0");
    assert_eq!(h.keeper.bech32_address(CHAIN, &key).unwrap(), COSMOS_ADDRESS);
}

// ============================================================================
// Scenario B: enable on a locked keyring waits for unlock
// ============================================================================

#[tokio::test]
async fn scenario_enable_waits_for_unlock() {
    let h = unlocked().await;
    assert_eq!(h.keeper.lock(), KeyRingState::Locked);

    let k1 = h.keeper.clone();
    let k2 = h.keeper.clone();
    let first = tokio::spawn(async move { k1.enable(CHAIN, Some(SITE)).await });
    let second = tokio::spawn(async move { k2.enable(CHAIN, Some(SITE)).await });
    settle().await;

    assert!(!first.is_finished());
    assert!(!second.is_finished());
    assert_eq!(h.surface.opened(), vec!["/unlock"]);

    assert_eq!(h.keeper.unlock("pw1").await.unwrap(), KeyRingState::Unlocked);
    assert_eq!(first.await.unwrap(), Ok(KeyRingState::Unlocked));
    assert_eq!(second.await.unwrap(), Ok(KeyRingState::Unlocked));
}

#[tokio::test]
async fn wrong_password_does_not_release_enable() {
    let h = unlocked().await;
    h.keeper.lock();

    let k = h.keeper.clone();
    let waiting = tokio::spawn(async move { k.enable(CHAIN, Some(SITE)).await });
    settle().await;

    assert_eq!(
        h.keeper.unlock("wrong").await.unwrap_err(),
        KeeperError::AuthenticationFailed
    );
    assert_eq!(h.keeper.status(), KeyRingState::Locked);
    settle().await;
    assert!(!waiting.is_finished());

    h.keeper.unlock("pw1").await.unwrap();
    assert_eq!(waiting.await.unwrap(), Ok(KeyRingState::Unlocked));
}

#[tokio::test]
async fn proactive_unlock_without_waiters() {
    let h = unlocked().await;
    h.keeper.lock();
    assert_eq!(h.keeper.unlock("pw1").await.unwrap(), KeyRingState::Unlocked);
    assert!(h.surface.opened().is_empty());
}

#[tokio::test]
async fn enable_restores_persisted_keyring() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keyring.json");

    {
        let h = harness_with_store(Arc::new(FileKeyStore::new(&path)));
        h.keeper.create_mnemonic_key(MNEMONIC, "pw1").await.unwrap();
    }

    // Fresh process over the same file
    let h = harness_with_store(Arc::new(FileKeyStore::new(&path)));
    assert_eq!(h.keeper.status(), KeyRingState::NotLoaded);

    let k = h.keeper.clone();
    let waiting = tokio::spawn(async move { k.enable(CHAIN, Some(SITE)).await });
    settle().await;
    assert_eq!(h.keeper.status(), KeyRingState::Locked);

    h.keeper.unlock("pw1").await.unwrap();
    assert_eq!(waiting.await.unwrap(), Ok(KeyRingState::Unlocked));

    h.keeper.set_path(CHAIN, 0, 0).unwrap();
    h.keeper.check_bech32_address(CHAIN, COSMOS_ADDRESS).unwrap();
}

// ============================================================================
// Scenario C: tx config requests for one chain share a resolution
// ============================================================================

#[tokio::test]
async fn scenario_tx_config_same_chain_resolves_together() {
    let h = unlocked().await;

    let k1 = h.keeper.clone();
    let first =
        tokio::spawn(async move { k1.request_tx_builder_config(tx_config("one", 100), true).await });
    settle().await;

    let k2 = h.keeper.clone();
    let second =
        tokio::spawn(async move { k2.request_tx_builder_config(tx_config("two", 200), true).await });
    settle().await;

    // The later request replaced what the UI shows
    assert_eq!(h.keeper.get_requested_tx_config(CHAIN).unwrap().memo, "two");

    let approved = tx_config("approved", 250_000);
    h.keeper.approve_tx_builder_config(CHAIN, approved.clone());

    assert_eq!(first.await.unwrap(), Ok(approved.clone()));
    assert_eq!(second.await.unwrap(), Ok(approved));
    assert!(matches!(
        h.keeper.get_requested_tx_config(CHAIN),
        Err(KeeperError::UnknownRequest(_))
    ));
    assert_eq!(h.surface.opened().len(), 2);
}

// ============================================================================
// Scenario D: unlisted origins never reach the keyring
// ============================================================================

#[tokio::test]
async fn scenario_get_key_unlisted_origin_denied() {
    let h = harness();
    // Keyring never loaded: a denial must not even trigger a restore
    let err = h
        .keeper
        .get_key(CHAIN, Some("https://evil.example"))
        .unwrap_err();
    assert_eq!(err, KeeperError::AccessDenied("https://evil.example".into()));
    assert_eq!(h.keeper.status(), KeyRingState::NotLoaded);

    let reply = send(
        &h.router,
        "https://evil.example",
        Request::GetKey {
            chain_id: CHAIN.into(),
        },
    )
    .await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::AccessDenied));
}

// ============================================================================
// Signing
// ============================================================================

#[tokio::test]
async fn sign_approved_over_router() {
    let h = unlocked().await;

    let router = h.router.clone();
    let request = tokio::spawn(async move {
        send(
            &router,
            SITE,
            Request::RequestSign {
                chain_id: CHAIN.into(),
                bech32_address: COSMOS_ADDRESS.into(),
                message_hex: hex::encode(b"{\"msgs\":[]}"),
                id: Some("req-1".into()),
                open_popup: true,
            },
        )
        .await
    });
    settle().await;
    assert_eq!(h.surface.opened(), vec!["/sign/req-1"]);

    let shown = send(&h.router, UI, Request::GetRequestedMessage { id: "req-1".into() }).await;
    assert_eq!(
        shown.ok,
        Some(Response::SignMessage {
            chain_id: CHAIN.into(),
            message_hex: hex::encode(b"{\"msgs\":[]}"),
        })
    );

    // Sites cannot approve their own requests
    let forged = send(&h.router, SITE, Request::ApproveSign { id: "req-1".into() }).await;
    assert_eq!(forged.error_kind(), Some(ErrorKind::AccessDenied));
    assert!(h.keeper.get_requested_message("req-1").is_ok());

    let ack = send(&h.router, UI, Request::ApproveSign { id: "req-1".into() }).await;
    assert_eq!(ack.ok, Some(Response::Ack));

    match request.await.unwrap().ok {
        Some(Response::Signature { signature_hex }) => assert_eq!(signature_hex.len(), 128),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn reject_sign_fails_request_and_removes_entry() {
    let h = unlocked().await;

    let k = h.keeper.clone();
    let request = tokio::spawn(async move {
        k.request_sign(CHAIN, b"payload".to_vec(), Some("req-2".into()), false)
            .await
    });
    settle().await;
    assert!(h.keeper.get_requested_message("req-2").is_ok());

    h.keeper.reject_sign("req-2", Some("not mine".into()));
    assert_eq!(
        request.await.unwrap(),
        Err(KeeperError::Rejected(Some("not mine".into())))
    );
    assert!(matches!(
        h.keeper.get_requested_message("req-2"),
        Err(KeeperError::UnknownRequest(_))
    ));
}

#[tokio::test]
async fn abandoned_sign_request_is_withdrawn() {
    let h = unlocked().await;

    let gave_up = tokio::time::timeout(
        Duration::from_millis(20),
        h.keeper
            .request_sign(CHAIN, b"one".to_vec(), Some("id1".into()), false),
    )
    .await;
    assert!(gave_up.is_err());
    assert!(matches!(
        h.keeper.get_requested_message("id1"),
        Err(KeeperError::UnknownRequest(_))
    ));

    // The id is free again
    let k = h.keeper.clone();
    let retry = tokio::spawn(async move {
        k.request_sign(CHAIN, b"two".to_vec(), Some("id1".into()), false)
            .await
    });
    settle().await;
    assert_eq!(h.keeper.get_requested_message("id1").unwrap().message, b"two");

    h.keeper.approve_sign("id1");
    assert_eq!(retry.await.unwrap().unwrap().len(), 64);
    assert!(h.keeper.get_requested_message("id1").is_err());
}

#[tokio::test]
async fn abandoned_tx_config_request_is_withdrawn() {
    let h = unlocked().await;

    let gave_up = tokio::time::timeout(
        Duration::from_millis(20),
        h.keeper.request_tx_builder_config(tx_config("gone", 1), false),
    )
    .await;
    assert!(gave_up.is_err());
    assert!(matches!(
        h.keeper.get_requested_tx_config(CHAIN),
        Err(KeeperError::UnknownRequest(_))
    ));
}

#[tokio::test]
async fn tx_config_kept_while_another_request_waits() {
    let h = unlocked().await;

    let k = h.keeper.clone();
    let staying =
        tokio::spawn(async move { k.request_tx_builder_config(tx_config("stay", 1), false).await });
    settle().await;

    let gave_up = tokio::time::timeout(
        Duration::from_millis(20),
        h.keeper.request_tx_builder_config(tx_config("leave", 2), false),
    )
    .await;
    assert!(gave_up.is_err());
    assert!(h.keeper.get_requested_tx_config(CHAIN).is_ok());

    let approved = tx_config("approved", 3);
    h.keeper.approve_tx_builder_config(CHAIN, approved.clone());
    assert_eq!(staying.await.unwrap(), Ok(approved));
    assert!(h.keeper.get_requested_tx_config(CHAIN).is_err());
}

#[tokio::test]
async fn unknown_ids_are_ignored() {
    let h = unlocked().await;
    h.keeper.approve_sign("never-asked");
    h.keeper.reject_sign("never-asked", None);
    h.keeper.approve_tx_builder_config(CHAIN, tx_config("x", 1));
    h.keeper.reject_tx_builder_config(CHAIN, None);

    let reply = send(&h.router, UI, Request::ApproveSign { id: "ghost".into() }).await;
    assert_eq!(reply.ok, Some(Response::Ack));
}

#[tokio::test]
async fn sign_as_foreign_address_refused() {
    let h = unlocked().await;

    // Same key, wrong prefix
    let terra_style = h
        .keeper
        .get_key(CHAIN, None)
        .unwrap()
        .bech32_address("terra")
        .unwrap();

    for address in [terra_style.as_str(), "cosmos1notmine", ""] {
        let reply = send(
            &h.router,
            SITE,
            Request::RequestSign {
                chain_id: CHAIN.into(),
                bech32_address: address.into(),
                message_hex: "00".into(),
                id: None,
                open_popup: true,
            },
        )
        .await;
        assert!(
            matches!(
                reply.error_kind(),
                Some(ErrorKind::InvalidAddress) | Some(ErrorKind::InvalidInput)
            ),
            "{} accepted",
            address
        );
    }
    assert!(h.surface.opened().is_empty());
}

#[tokio::test]
async fn sign_on_locked_keyring_never_exposes_key() {
    let h = unlocked().await;
    h.keeper.lock();

    assert_eq!(h.keeper.get_key(CHAIN, None).unwrap_err(), KeeperError::Locked);
    let reply = send(
        &h.router,
        SITE,
        Request::RequestSign {
            chain_id: CHAIN.into(),
            bech32_address: COSMOS_ADDRESS.into(),
            message_hex: "00".into(),
            id: None,
            open_popup: false,
        },
    )
    .await;
    assert_eq!(reply.error_kind(), Some(ErrorKind::Locked));
}

#[tokio::test(start_paused = true)]
async fn pending_approvals_expire() {
    let surface = Arc::new(RecordingSurface::new());
    let keeper = KeyRingKeeper::new(
        KeyRing::new(Arc::new(MemoryKeyStore::new()), KdfParams::insecure_for_tests()),
        Arc::new(StaticChainCatalog::new(warden_keeper::chain::native_chains())),
        AccessPolicy::new(UI).allow(CHAIN, SITE),
        surface,
    )
    .with_approval_timeout(Some(Duration::from_secs(60)));
    keeper.create_mnemonic_key(MNEMONIC, "pw1").await.unwrap();

    let err = keeper
        .request_tx_builder_config(tx_config("slow", 1), false)
        .await
        .unwrap_err();
    assert_eq!(err, KeeperError::Expired);
    assert!(keeper.get_requested_tx_config(CHAIN).is_err());

    keeper.lock();
    assert_eq!(
        keeper.enable(CHAIN, Some(SITE)).await.unwrap_err(),
        KeeperError::Expired
    );
}
