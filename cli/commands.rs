pub mod assist;
pub mod files;
pub mod git;
