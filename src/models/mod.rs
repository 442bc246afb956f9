pub mod enums;
pub mod fake_report;
pub mod report;
pub mod user;

pub use enums::{Department, ReportStatus, Role};
pub use fake_report::{Entity as FakeReport, Model as FakeReportModel};
pub use report::{Entity as Report, Model as ReportModel};
pub use user::{Entity as User, Model as UserModel};
