//! Asset URL templates for avatar models and animation clips. External,
//! read-only endpoints; the rendering surface fetches them itself.

/// Host serving rigged avatar models.
pub const AVATAR_MODEL_HOST: &str = "https://models.readyplayer.me";

/// Animation clip applied while the scene idles.
pub const IDLE_ANIMATION_URL: &str = "https://raw.githubusercontent.com/readyplayerme/animation-library/master/masculine/glb/idle/M_Standing_Idle_001.glb";

/// Animation clip applied after a `switchToTalking` command.
pub const TALKING_ANIMATION_URL: &str = "https://raw.githubusercontent.com/readyplayerme/animation-library/master/masculine/glb/talk/M_Talking_Variations_001.glb";

/// Deterministic model URL for an avatar id.
pub fn avatar_model_url(avatar_id: &str) -> String {
    format!("{}/{}.glb", AVATAR_MODEL_HOST, avatar_id)
}
