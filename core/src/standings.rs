use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Most sets one team can win or lose in a single game day result.
pub const MAX_SETS_PER_RESULT: i64 = 99;

/// Percentage of sets won; 0 when nothing has been played.
pub fn win_pct(won: i64, lost: i64) -> f64 {
    let played = won as i128 + lost as i128;
    if played == 0 {
        return 0.0;
    }
    100.0 * won as f64 / played as f64
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTally {
    pub won: i64,
    pub lost: i64,
}

impl SetTally {
    pub fn new(won: i64, lost: i64) -> Result<Self, Error> {
        if won < 0 || lost < 0 {
            return Err(Error::NegativeTally { won, lost });
        }
        Ok(Self { won, lost })
    }

    /// A single game day result, bounded by `MAX_SETS_PER_RESULT`.
    pub fn for_result(won: i64, lost: i64) -> Result<Self, Error> {
        let tally = Self::new(won, lost)?;
        if won > MAX_SETS_PER_RESULT || lost > MAX_SETS_PER_RESULT {
            return Err(Error::TooManySets {
                won,
                lost,
                max: MAX_SETS_PER_RESULT,
            });
        }
        Ok(tally)
    }

    pub fn played(&self) -> i128 {
        self.won as i128 + self.lost as i128
    }

    pub fn has_played(&self) -> bool {
        self.played() > 0
    }

    pub fn win_pct(&self) -> f64 {
        win_pct(self.won, self.lost)
    }

    fn add(&mut self, other: SetTally) -> Result<(), Error> {
        let (won, lost) = (self.won, self.lost);
        let overflow = move || Error::TallyOverflow { won, lost };
        let won = self.won.checked_add(other.won).ok_or_else(overflow)?;
        let lost = self.lost.checked_add(other.lost).ok_or_else(overflow)?;
        *self = Self { won, lost };
        Ok(())
    }

    // Exact comparison of won/played, with an unplayed tally counting as 0/1.
    // won < 2^63 and played < 2^64, so the products fit in i128.
    fn cmp_win_pct(&self, other: &SetTally) -> Ordering {
        let lhs = self.won as i128 * other.played().max(1);
        let rhs = other.won as i128 * self.played().max(1);
        lhs.cmp(&rhs)
    }
}

/// A team's accumulated record within one season.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamRecord {
    pub team_id: i64,
    pub team_name: String,
    pub sets_won: i64,
    pub sets_lost: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamStanding {
    pub rank: usize,
    pub team_id: i64,
    pub team_name: String,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub win_pct: f64,
    /// False renders as "-" rather than 0%.
    pub has_played: bool,
}

/// Ranks teams by win percentage, then by sets won. Teams equal on both
/// keep their input order.
pub fn rank_teams(records: impl IntoIterator<Item = TeamRecord>) -> Result<Vec<TeamStanding>, Error> {
    let mut rows = records
        .into_iter()
        .map(|r| SetTally::new(r.sets_won, r.sets_lost).map(|t| (r, t)))
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by(|(_, a), (_, b)| b.cmp_win_pct(a).then(b.won.cmp(&a.won)));
    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, (r, t))| TeamStanding {
            rank: i + 1,
            team_id: r.team_id,
            team_name: r.team_name,
            sets_won: t.won,
            sets_lost: t.lost,
            win_pct: t.win_pct(),
            has_played: t.has_played(),
        })
        .collect())
}

/// One team's recorded outcome on one game day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub game_day_id: i64,
    pub team_id: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
}

/// A player marked as having played for a team on a game day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Participation {
    pub game_day_id: i64,
    pub team_id: i64,
    pub account_id: i64,
}

// At most one result per (game day, team); a later row replaces an earlier one.
fn results_by_key(results: &[ResultRow]) -> Result<HashMap<(i64, i64), SetTally>, Error> {
    let mut by_key = HashMap::with_capacity(results.len());
    for r in results {
        by_key.insert(
            (r.game_day_id, r.team_id),
            SetTally::new(r.sets_won, r.sets_lost)?,
        );
    }
    Ok(by_key)
}

pub fn tally_by_team(results: &[ResultRow]) -> Result<HashMap<i64, SetTally>, Error> {
    let mut tallies = HashMap::<i64, SetTally>::new();
    for ((_, team_id), tally) in results_by_key(results)? {
        tallies.entry(team_id).or_default().add(tally)?;
    }
    Ok(tallies)
}

/// Season records derived from raw results rather than stored tallies.
/// Every listed team gets a record, 0/0 if it has no results; results of
/// unlisted teams are ignored.
pub fn team_records_from_results(
    teams: impl IntoIterator<Item = (i64, String)>,
    results: &[ResultRow],
) -> Result<Vec<TeamRecord>, Error> {
    let tallies = tally_by_team(results)?;
    Ok(teams
        .into_iter()
        .map(|(team_id, team_name)| {
            let t = tallies.get(&team_id).copied().unwrap_or_default();
            TeamRecord {
                team_id,
                team_name,
                sets_won: t.won,
                sets_lost: t.lost,
            }
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub account_id: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub games_played: i64,
    pub win_pct: f64,
    pub teams_played_on: Vec<String>,
}

/// Per-player totals over every result of a (game day, team) the player
/// took part in. Players with no such result are absent, not zero rows.
/// The returned entries are ranked, see `rank_leaderboard`.
pub fn aggregate_leaderboard(
    results: &[ResultRow],
    participations: &[Participation],
    team_names: &HashMap<i64, String>,
) -> Result<Vec<LeaderboardEntry>, Error> {
    #[derive(Default)]
    struct Acc {
        tally: SetTally,
        games: i64,
        teams: BTreeSet<String>,
    }

    let results = results_by_key(results)?;
    let participations = participations.iter().copied().collect::<BTreeSet<_>>();
    let mut players = BTreeMap::<i64, Acc>::new();
    for p in participations {
        let Some(tally) = results.get(&(p.game_day_id, p.team_id)) else {
            continue;
        };
        let acc = players.entry(p.account_id).or_default();
        acc.tally.add(*tally)?;
        acc.games += 1;
        if let Some(name) = team_names.get(&p.team_id) {
            acc.teams.insert(name.clone());
        }
    }
    let mut entries = players
        .into_iter()
        .map(|(account_id, acc)| LeaderboardEntry {
            account_id,
            sets_won: acc.tally.won,
            sets_lost: acc.tally.lost,
            games_played: acc.games,
            win_pct: acc.tally.win_pct(),
            teams_played_on: acc.teams.into_iter().collect(),
        })
        .collect::<Vec<_>>();
    rank_leaderboard(&mut entries);
    Ok(entries)
}

/// Win percentage, then sets won, then games played, descending; account
/// id ascending as the last resort.
pub fn rank_leaderboard(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        let ta = SetTally {
            won: a.sets_won,
            lost: a.sets_lost,
        };
        let tb = SetTally {
            won: b.sets_won,
            lost: b.sets_lost,
        };
        tb.cmp_win_pct(&ta)
            .then(b.sets_won.cmp(&a.sets_won))
            .then(b.games_played.cmp(&a.games_played))
            .then(a.account_id.cmp(&b.account_id))
    });
}

/// The entry with the most sets won, first in order among equals. Does not
/// reorder the leaderboard.
pub fn most_sets_won(entries: &[LeaderboardEntry]) -> Option<&LeaderboardEntry> {
    entries.iter().fold(None, |best, e| match best {
        Some(b) if b.sets_won >= e.sets_won => Some(b),
        _ => Some(e),
    })
}
