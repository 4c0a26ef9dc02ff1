//! Fixed limits shared by the stores and the event router.

/// Maximum number of messages kept in a room's log
pub const MESSAGE_LOG_CAP: usize = 100;

/// Number of messages replayed to a connection after it joins a room
pub const HISTORY_REPLAY_LIMIT: usize = 50;

/// Participant record lifetime in the store (24 hours)
pub const PARTICIPANT_TTL_SECS: u64 = 86_400;

/// Username length bounds (characters, after trimming)
pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 20;

/// Room name length bounds (characters, after trimming)
pub const ROOM_MIN_LEN: usize = 2;
pub const ROOM_MAX_LEN: usize = 30;

/// Maximum message body length (characters, after trimming)
pub const MESSAGE_MAX_LEN: usize = 1000;
