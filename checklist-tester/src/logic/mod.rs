pub mod reports;
pub mod snapshot;
pub mod tester;

pub use snapshot::{ChecklistSnapshot, ChecklistView, take_snapshot};
pub use tester::{LogicTester, ScenarioResult};
