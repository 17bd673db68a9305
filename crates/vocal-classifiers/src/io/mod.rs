pub mod feature_table;
pub mod writers;

pub use feature_table::{read_feature_table, FeatureTableConfig};
pub use writers::{write_oof_scores, write_report_json, write_summary};
