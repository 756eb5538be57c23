pub mod assignment;
pub mod calculations;
pub mod calendar;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod member;
pub mod month;
pub mod persistence;
pub mod report;
pub mod scheduler;
pub mod telemetry;

pub use assignment::{Assignment, DutyType, Origin, SlotKey};
pub use calculations::{DutyPlan, PlanError, SkippedSlot, plan_duties, plan_with_rotation};
pub use calendar::{DayKind, DutyCalendar, Holiday};
pub use config::{AppConfig, ConfigError};
pub use member::{Member, MemberId, NewMember};
pub use month::{MonthParseError, MonthWindow};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteDutyStore;
pub use persistence::{
    AssignmentLedger, DutySnapshot, DutyStore, HolidayStore, MemoryStore, ReplaceSummary,
    RosterStore, StoreError, StoreResult, export_assignments_to_csv, load_snapshot_from_json,
    save_snapshot_to_json,
};
pub use report::{AssignmentView, MemberStats, MonthView, TodaySlice};
pub use scheduler::{DutyScheduler, ErrorKind, GenerationResult, ScheduleError};
