pub mod attribution;
pub mod clock;
pub mod config;
pub mod deadline;
pub mod draft;
pub mod error;
pub mod generate;
pub mod model;
pub mod presence;
pub mod session;
pub mod storage;
pub mod task_list;
