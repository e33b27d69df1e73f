pub mod activity_log;
pub mod db_utils;
pub mod forms;
pub mod storage;
pub mod username_index;
