pub use super::accounts::Entity as Accounts;
pub use super::acls::Entity as Acls;
pub use super::game_day_players::Entity as GameDayPlayers;
pub use super::game_days::Entity as GameDays;
pub use super::game_results::Entity as GameResults;
pub use super::newsletters::Entity as Newsletters;
pub use super::season_excluded_dates::Entity as SeasonExcludedDates;
pub use super::season_teams::Entity as SeasonTeams;
pub use super::seasons::Entity as Seasons;
pub use super::team_invites::Entity as TeamInvites;
pub use super::team_members::Entity as TeamMembers;
pub use super::teams::Entity as Teams;
