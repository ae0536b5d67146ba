//! Integration test for the acceptance-transition flow: the host commands
//! the talking pose and waits for the surface's asynchronous load/ready
//! signals, tolerating whatever else the surface emits along the way.

use onboard_stage::{
    avatar_model_url, BridgeCommand, RenderSurfaceBridge, SurfaceSignal, SurfaceStatus,
};

#[test]
fn acceptance_transition_flow() {
    let (mut bridge, mut outbound) = RenderSurfaceBridge::new();

    // Screen controller commands the talking pose on acceptance.
    bridge.send(BridgeCommand::SwitchToTalking);
    assert_eq!(
        outbound.try_recv().unwrap(),
        r#"{"action":"switchToTalking"}"#
    );

    // The surface streams load progress, stumbles, then recovers.
    assert!(matches!(
        bridge.on_message("Loading avatar: 20%"),
        Some(SurfaceSignal::Progress(_))
    ));
    assert!(matches!(
        bridge.on_message("Failed to fetch animation clip"),
        Some(SurfaceSignal::Error(_))
    ));
    assert!(matches!(bridge.status(), SurfaceStatus::Error(_)));

    // Garbage in between must change nothing.
    assert_eq!(bridge.on_message("{\"kind\":"), None);
    assert!(matches!(bridge.status(), SurfaceStatus::Error(_)));

    // The ready signal clears the error state.
    assert!(matches!(
        bridge.on_message("Avatar loaded"),
        Some(SurfaceSignal::Ready(_))
    ));
    assert_eq!(bridge.status(), &SurfaceStatus::Ready);
}

#[test]
fn model_urls_follow_the_fixed_template() {
    let url = avatar_model_url("651a9b7a9e9d9f3a6c1f2b3c");
    assert!(url.starts_with("https://models.readyplayer.me/"));
    assert!(url.ends_with(".glb"));
}
