pub mod backend;

/// Ad SDK backends for the bridge.
pub mod backends {
    /// SDK that accepts every call and never fills
    pub mod null;
    /// In-process SDK driven by hand, used for tests and demos
    pub mod scripted;
}

pub use backend::{AdHandle, AdSdk, InterstitialListener, Reward, RewardListener, ZoneInfo};
