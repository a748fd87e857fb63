pub mod classifier;
pub mod cookie_store;
pub mod downloader;
pub mod invoice_store;
pub mod pacing;
pub mod reissue_resolver;
pub mod session_manager;

pub use classifier::classify;
pub use cookie_store::CookieStore;
pub use downloader::{DownloadOrchestrator, DownloadResult, HttpTransfer, InvoiceTransfer};
pub use invoice_store::InvoiceStore;
pub use pacing::Pacer;
pub use reissue_resolver::ReissueResolver;
pub use session_manager::{Session, SessionManager};
