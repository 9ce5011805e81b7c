//! End-to-end edit sessions through the bridge.

#![allow(clippy::arithmetic_side_effects)]

use tbed_bridge::{BridgeError, ComposeTarget, UiEvent};
use tbed_config::BridgeConfig;
use tbed_test::{
    LoopbackHost, MockComposeSurface, ScriptedHost, init_test_logging, paged_reply, test_bridge,
    test_bridge_with,
};

#[tokio::test]
async fn paged_reply_replaces_the_draft() {
    init_test_logging();
    let surface = MockComposeSurface::new().with_plain("T1", "Hello world");
    let host = ScriptedHost::replying(paged_reply(&["Hel", "lo ", "world edited"]));
    let bridge = test_bridge(&surface, &host);

    let outcome = bridge.edit(ComposeTarget::new("T1")).await.unwrap();

    assert_eq!(
        host.posted(),
        vec![
            "--tbed-hdr\nCommand: /usr/bin/vim".to_string(),
            "Hello world".to_string()
        ]
    );
    assert_eq!(surface.body("T1").as_deref(), Some("Hello world edited"));
    assert_eq!(surface.write_count(), 1);
    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.bytes_sent, 11);
    assert!(surface.get_error_messages().is_empty());
}

#[tokio::test]
async fn draft_at_the_outbound_limit_is_sent() {
    let surface = MockComposeSurface::new().with_plain("T1", "0123456789");
    let host = ScriptedHost::replying(["done"]);
    let config = BridgeConfig {
        outbound_limit: 10,
        ..BridgeConfig::default()
    };
    let bridge = test_bridge_with(&surface, &host, config);

    bridge.edit(ComposeTarget::new("T1")).await.unwrap();
    assert_eq!(host.posted().len(), 2);
    assert_eq!(surface.body("T1").as_deref(), Some("done"));
}

#[tokio::test]
async fn draft_over_the_outbound_limit_sends_nothing() {
    let surface = MockComposeSurface::new().with_plain("T1", "0123456789X");
    let host = ScriptedHost::replying(["done"]);
    let config = BridgeConfig {
        outbound_limit: 10,
        ..BridgeConfig::default()
    };
    let bridge = test_bridge_with(&surface, &host, config);

    let err = bridge.edit(ComposeTarget::new("T1")).await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::SizeLimitExceeded { len: 11, limit: 10 }
    ));
    assert!(host.posted().is_empty());
    assert_eq!(surface.body("T1").as_deref(), Some("0123456789X"));
    assert_eq!(surface.write_count(), 0);
    assert_eq!(surface.get_error_messages().len(), 1);
}

#[tokio::test]
async fn rich_text_draft_never_opens_a_channel() {
    let surface = MockComposeSurface::new().with_rich("T1", "<p>Hello</p>");
    let host = ScriptedHost::replying(["unused"]);
    let bridge = test_bridge(&surface, &host);

    let err = bridge.edit(ComposeTarget::new("T1")).await.unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedContent { .. }));
    assert_eq!(host.connect_count(), 0);
    assert_eq!(surface.write_count(), 0);
    assert_eq!(surface.get_error_messages().len(), 1);
}

#[tokio::test]
async fn hotkey_needs_exactly_one_focused_tab() {
    for tabs in [&[][..], &["T1", "T2"][..]] {
        let surface = MockComposeSurface::new()
            .with_plain("T1", "a")
            .with_plain("T2", "b")
            .with_focused_tabs(tabs);
        let host = ScriptedHost::replying(["unused"]);
        let bridge = test_bridge(&surface, &host);

        let err = bridge
            .handle_event(UiEvent::Command("tbed".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::AmbiguousTarget { tabs: n } if n == tabs.len()));
        assert_eq!(host.connect_count(), 0);
        assert_eq!(surface.write_count(), 0);
    }
}

#[tokio::test]
async fn hotkey_without_a_focused_window_is_ambiguous() {
    let surface = MockComposeSurface::new().with_plain("T1", "a");
    let host = ScriptedHost::replying(["unused"]);
    let bridge = test_bridge(&surface, &host);

    let err = bridge
        .handle_event(UiEvent::Command("tbed".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::AmbiguousTarget { tabs: 0 }));
    assert_eq!(host.connect_count(), 0);
}

#[tokio::test]
async fn hotkey_edits_the_single_focused_tab() {
    let surface = MockComposeSurface::new()
        .with_plain("T7", "draft")
        .with_focused_tabs(&["T7"]);
    let host = ScriptedHost::replying(["edited"]);
    let bridge = test_bridge(&surface, &host);

    let outcome = bridge
        .handle_event(UiEvent::Command("tbed".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.target, ComposeTarget::new("T7"));
    assert_eq!(surface.body("T7").as_deref(), Some("edited"));
}

#[tokio::test]
async fn unrelated_commands_are_ignored() {
    let surface = MockComposeSurface::new().with_focused_tabs(&["T1"]);
    let host = ScriptedHost::replying(["unused"]);
    let bridge = test_bridge(&surface, &host);

    let result = bridge
        .handle_event(UiEvent::Command("something-else".into()))
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(host.connect_count(), 0);
}

#[tokio::test]
async fn button_click_edits_its_target() {
    let surface = MockComposeSurface::new().with_plain("T2", "x");
    let host = ScriptedHost::replying(["y"]);
    let bridge = test_bridge(&surface, &host);

    bridge
        .handle_event(UiEvent::ButtonClicked("T2".into()))
        .await
        .unwrap();
    assert_eq!(surface.body("T2").as_deref(), Some("y"));
}

#[tokio::test]
async fn peer_closing_early_leaves_the_draft() {
    let surface = MockComposeSurface::new().with_plain("T1", "keep me");
    let host = ScriptedHost::replying(paged_reply(&["only", "half"])[..2].to_vec());
    let bridge = test_bridge(&surface, &host);

    let err = bridge.edit(ComposeTarget::new("T1")).await.unwrap_err();
    assert!(matches!(err, BridgeError::Channel(_)));
    assert_eq!(surface.body("T1").as_deref(), Some("keep me"));
    assert!(!bridge.is_active(&ComposeTarget::new("T1")));
}

#[tokio::test]
async fn sessions_do_not_share_reassembly_state() {
    let surface = MockComposeSurface::new().with_plain("T1", "one");
    // The first session's reply stops mid-cycle; the second must start clean.
    let broken = ScriptedHost::replying(paged_reply(&["a", "b", "c"])[..2].to_vec());
    let bridge = test_bridge(&surface, &broken);
    assert!(bridge.edit(ComposeTarget::new("T1")).await.is_err());

    let host = ScriptedHost::replying(["fresh"]);
    let bridge = test_bridge(&surface, &host);
    bridge.edit(ComposeTarget::new("T1")).await.unwrap();
    assert_eq!(surface.body("T1").as_deref(), Some("fresh"));
}

#[tokio::test]
async fn loopback_application_round_trip() {
    init_test_logging();
    let draft = "Dear team,\n\n\"Quarterly\" numbers: ✓ ünïcödé\n".repeat(50);
    let surface = MockComposeSurface::new().with_plain("T1", &draft);
    let host = LoopbackHost::new(|command, draft| format!("{command}\n{}", draft.to_uppercase()))
        .with_page_size(128);
    let bridge = test_bridge(&surface, &host);

    let outcome = bridge.edit(ComposeTarget::new("T1")).await.unwrap();

    assert!(outcome.pages > 0);
    assert_eq!(
        surface.body("T1"),
        Some(format!("/usr/bin/vim\n{}", draft.to_uppercase()))
    );
    assert_eq!(
        host.sessions(),
        vec![("/usr/bin/vim".to_string(), draft.clone())]
    );
}

#[tokio::test]
async fn repeated_sessions_each_open_a_channel() {
    let surface = MockComposeSurface::new().with_plain("T1", "v0");
    let host = LoopbackHost::appending("+");
    let bridge = test_bridge(&surface, &host);

    for _ in 0..3 {
        bridge.edit(ComposeTarget::new("T1")).await.unwrap();
    }
    assert_eq!(surface.body("T1").as_deref(), Some("v0+++"));
    assert_eq!(host.sessions().len(), 3);
}
