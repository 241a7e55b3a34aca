pub mod prelude;

pub mod admins;
pub mod auth;
pub mod game_days;
pub mod get_index;
pub mod get_schedule;
pub mod get_standings;
pub mod newsletters;
pub mod post_report_result;
pub mod seasons;
pub mod teams;
