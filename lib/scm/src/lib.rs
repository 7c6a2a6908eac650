pub mod commit;
pub mod drivers;
pub mod errors;

pub const GIT: &str = "git";
