pub mod angle_worker;
pub mod query_classifier;
pub mod report_writer;
pub mod research_planner;
