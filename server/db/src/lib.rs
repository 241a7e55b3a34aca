pub mod prelude;

pub mod accounts;
pub mod acls;
pub mod common;
pub mod game_day_players;
pub mod game_days;
pub mod game_results;
pub mod newsletters;
pub mod season_excluded_dates;
pub mod season_teams;
pub mod seasons;
pub mod team_invites;
pub mod team_members;
pub mod teams;
