//! Offerwatch engine: browser session management, extraction, state
//! persistence and the run coordinator.
mod browser;
mod coordinator;
mod extract;
mod notify;
mod persist;
mod store;
mod types;
mod webdriver;

pub use browser::{Browser, BrowserSession, BrowserSettings, PageStep, ReadyCondition};
pub use coordinator::{CancelFlag, RunCoordinator, RunSettings};
pub use extract::{ExtractError, Extraction, FieldMapping, OfferExtractor, SelectorExtractor};
pub use notify::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use persist::{ensure_state_dir, AtomicSnapshotWriter, PersistError};
pub use store::{JsonStateStore, StateStore};
pub use types::{RunError, RunOutcome, RunStatus};
pub use webdriver::WebDriverBrowser;
