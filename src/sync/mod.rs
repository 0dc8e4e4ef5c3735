pub mod engine;
pub mod exec;

pub use engine::{
    is_merge_bot_commit, refresh_project, sync_all, sync_one, sync_project, ProjectSync,
    SyncMode, SyncOutcome, SyncStatus,
};
pub use exec::{exec, refresh, watch};
