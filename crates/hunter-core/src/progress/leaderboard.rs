use serde::{Deserialize, Serialize};

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: usize,
    pub user_id: String,
    pub name: String,
    pub level: u32,
    pub xp: u32,
}

/// Raw user columns the leaderboard is built from.
#[derive(Debug, Clone)]
pub struct StandingRow {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub level: u32,
    pub xp: u32,
}

/// Display name: profile name, else email local part, else "Unknown".
pub(crate) fn display_name(name: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

/// Order by XP (desc), then level (desc), then name, and assign 1-based ranks.
pub fn rank(rows: Vec<StandingRow>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = rows
        .into_iter()
        .map(|row| Standing {
            rank: 0,
            name: display_name(row.name.as_deref(), row.email.as_deref()),
            user_id: row.user_id,
            level: row.level,
            xp: row.xp,
        })
        .collect();

    standings.sort_by(|a, b| {
        b.xp.cmp(&a.xp)
            .then_with(|| b.level.cmp(&a.level))
            .then_with(|| a.name.cmp(&b.name))
    });
    for (i, s) in standings.iter_mut().enumerate() {
        s.rank = i + 1;
    }
    standings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: Option<&str>, email: Option<&str>, level: u32, xp: u32) -> StandingRow {
        StandingRow {
            user_id: id.into(),
            name: name.map(Into::into),
            email: email.map(Into::into),
            level,
            xp,
        }
    }

    #[test]
    fn orders_by_xp_descending() {
        let board = rank(vec![
            row("a", Some("Jin"), None, 2, 30),
            row("b", Some("Cha"), None, 3, 80),
            row("c", Some("Yoo"), None, 1, 50),
        ]);
        let ids: Vec<_> = board.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn ties_break_on_level() {
        let board = rank(vec![
            row("low", Some("A"), None, 1, 40),
            row("high", Some("B"), None, 4, 40),
        ]);
        assert_eq!(board[0].user_id, "high");
    }

    #[test]
    fn name_falls_back_to_email_then_unknown() {
        assert_eq!(display_name(None, Some("sung@hunters.kr")), "sung");
        assert_eq!(display_name(Some("  "), Some("sung@hunters.kr")), "sung");
        assert_eq!(display_name(None, None), "Unknown");
        assert_eq!(display_name(Some("Jinwoo"), Some("x@y")), "Jinwoo");
    }
}
