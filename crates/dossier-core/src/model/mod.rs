pub mod association;
pub mod report;

pub use association::{Association, SelectOption, SingularAssociation, union_options};
pub use report::{InitialValues, ReportSnapshot};
