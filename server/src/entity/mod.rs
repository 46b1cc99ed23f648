pub mod data_source;
pub mod data_source_permission;
pub mod plugin_setting;
