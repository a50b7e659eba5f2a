//! Keepalive state machine
//!
//! Tracks where one subscriber stands in the ping/pong protocol.

use tokio::time::Instant;

/// Liveness phase of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepalivePhase {
    /// Heard from the peer since the last probe
    Active,
    /// Probe sent, waiting for any message from the peer
    AwaitingPong,
    /// Connection declared dead; terminal
    Dead,
}

/// Per-subscriber keepalive bookkeeping
#[derive(Debug, Clone)]
pub struct KeepaliveState {
    /// Current phase
    pub phase: KeepalivePhase,

    /// Last time anything was received from the peer (or admission time)
    pub last_seen: Instant,

    /// Probes written so far
    pub probes_sent: u64,

    /// Messages received so far
    pub receipts: u64,
}

impl KeepaliveState {
    /// Fresh state for a just-admitted subscriber
    pub fn new() -> Self {
        Self {
            phase: KeepalivePhase::Active,
            last_seen: Instant::now(),
            probes_sent: 0,
            receipts: 0,
        }
    }

    /// A probe was written
    pub fn on_probe_sent(&mut self) {
        if self.phase == KeepalivePhase::Active {
            self.phase = KeepalivePhase::AwaitingPong;
        }
        if self.phase != KeepalivePhase::Dead {
            self.probes_sent += 1;
        }
    }

    /// Something arrived from the peer
    pub fn on_receipt(&mut self) {
        if self.phase == KeepalivePhase::Dead {
            return;
        }
        self.phase = KeepalivePhase::Active;
        self.last_seen = Instant::now();
        self.receipts += 1;
    }

    /// Connection is gone
    pub fn on_dead(&mut self) {
        self.phase = KeepalivePhase::Dead;
    }

    /// Whether the subscriber has been declared dead
    pub fn is_dead(&self) -> bool {
        self.phase == KeepalivePhase::Dead
    }
}

impl Default for KeepaliveState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_lifecycle() {
        let mut state = KeepaliveState::new();
        assert_eq!(state.phase, KeepalivePhase::Active);

        state.on_probe_sent();
        assert_eq!(state.phase, KeepalivePhase::AwaitingPong);
        assert_eq!(state.probes_sent, 1);

        // A second ping without an answer stays in AwaitingPong
        state.on_probe_sent();
        assert_eq!(state.phase, KeepalivePhase::AwaitingPong);

        let before = state.last_seen;
        tokio::time::advance(std::time::Duration::from_secs(5)).await;
        state.on_receipt();
        assert_eq!(state.phase, KeepalivePhase::Active);
        assert!(state.last_seen > before);
        assert_eq!(state.receipts, 1);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut state = KeepaliveState::new();
        state.on_dead();

        state.on_receipt();
        state.on_probe_sent();

        assert!(state.is_dead());
        assert_eq!(state.receipts, 0);
        assert_eq!(state.probes_sent, 0);
    }
}
