pub mod billing;
pub mod case;

pub use billing::{
    parse_amount_cents, parse_ui_date, AuthorizationWindow, BillingRequest, DateRange,
    ExistingEntry,
};
pub use case::{CaseItem, CaseStatus, ContactInfo, PagerWindow, RowHandle, StageStatus};
