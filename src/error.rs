use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Ledger store error: {0}")]
    Store(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Unknown report format '{0}' (expected structured-outline, decorated-text or styled-markup)")]
    UnknownFormat(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Project not tracked: {0}")]
    ProjectNotFound(String),
    #[error("Project already tracked: {0}")]
    ProjectExists(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

// gix errors are large; box them on the way in
impl From<gix::object::find::existing::Error> for LedgerError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        LedgerError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for LedgerError {
    fn from(err: gix::object::commit::Error) -> Self {
        LedgerError::Commit(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for LedgerError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        LedgerError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for LedgerError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        LedgerError::HeadPeel(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for LedgerError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        LedgerError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for LedgerError {
    fn from(err: gix::objs::decode::Error) -> Self {
        LedgerError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for LedgerError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        LedgerError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::discover::Error> for LedgerError {
    fn from(err: gix::discover::Error) -> Self {
        LedgerError::GitDiscover(Box::new(err))
    }
}
