pub mod cookie;
pub mod invoice;
pub mod order;
pub mod pagination;

pub use cookie::StoredCookie;
pub use invoice::{CompanyProfile, DetailSnapshot, InvoiceLink, ReissueDecision, ReissueOutcome};
pub use order::{Disposition, OrderRow, RawOrderRow, RowLink};
pub use pagination::{PageCursor, PageLimit};
