//! Filter/sort mini-language.
//!
//! A filter string combines `field<op>value` clauses with `AND`/`OR`,
//! evaluated strictly left to right (no grouping). Operators: `==`, `!=`,
//! `>=`, `<=`, `>`, `<`, `~` and `:` (substring), plus the range form
//! `field:[min-max]`. Clauses that don't parse are dropped silently —
//! garbage input narrows nothing and never errors.

use std::sync::LazyLock;

use regex::Regex;

/// Short user-facing names to column names. Passed to the parser rather than
/// consulted as global state; the slice order is also the `--all` column order.
pub type AliasTable = &'static [(&'static str, &'static str)];

pub const COLUMN_ALIASES: AliasTable = &[
    ("id", "id"),
    ("company", "company_name"),
    ("company_url", "company_url"),
    ("company_linkedin", "company_linkedin"),
    ("role", "role_name"),
    ("role_url", "role_url"),
    ("location", "location"),
    ("arrangement", "arrangement"),
    ("type", "type"),
    ("level", "level"),
    ("source", "source"),
    ("recruiter", "recruiter_name"),
    ("recruiter_email", "recruiter_email"),
    ("recruiter_linkedin", "recruiter_linkedin"),
    ("salary", "expected_salary"),
    ("notes", "notes"),
    ("status", "status"),
    ("date_posted", "date_posted"),
    ("date", "date_applied"),
    ("response", "application_response_date"),
    ("interview_response", "interview_response_date"),
    ("followup", "followup_date"),
    ("interview", "interview_time"),
    ("interview_type", "interview_type"),
    ("interview_link", "interview_link"),
    ("offer", "offer"),
    ("rating", "rating"),
    ("fit", "fit"),
    ("feedback", "feedback"),
    ("method", "application_method"),
    ("transcript", "interview_transcript"),
];

pub const DEFAULT_VISIBLE: &[&str] = &["id", "company", "role", "status", "date"];

static CONNECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(AND|OR)\s+").unwrap());
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+):\[(.*)-(.*)\]$").unwrap());
static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*(==|!=|>=|<=|>|<|~|:)\s*(.*)$").unwrap());
static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Resolve a short name to a column. Unknown names pass through when they
/// look like a plain identifier, so columns added with `config add-column`
/// stay filterable; anything else is rejected.
pub fn resolve_column(aliases: AliasTable, short: &str) -> Option<String> {
    let key = short.trim().to_lowercase();
    for (alias, column) in aliases {
        if *alias == key {
            return Some((*column).to_string());
        }
    }
    IDENT_RE.is_match(&key).then_some(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    Like,
}

impl Op {
    fn sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseValue {
    One(String),
    Range(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: String,
    pub op: Op,
    pub value: ClauseValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn sql(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Parsed filter: clauses with the connector that precedes each (the first
/// carries none). Rendering walks the list in order, so `A AND B OR C` keeps
/// its positional meaning.
#[derive(Debug, Clone, Default)]
pub struct FilterExpr {
    items: Vec<(Option<Connector>, Clause)>,
}

impl FilterExpr {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.items.iter().map(|(_, c)| c)
    }

    /// Render to a WHERE fragment plus bound parameters. Values are only ever
    /// bound, never spliced into the fragment text.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let mut fragment = String::new();
        let mut params = Vec::new();

        for (connector, clause) in &self.items {
            if let Some(connector) = connector {
                fragment.push(' ');
                fragment.push_str(connector.sql());
                fragment.push(' ');
            }
            match &clause.value {
                ClauseValue::Range(min, max) => {
                    fragment.push_str(&format!(
                        "({col} >= ? AND {col} <= ?)",
                        col = clause.column
                    ));
                    params.push(min.clone());
                    params.push(max.clone());
                }
                ClauseValue::One(value) => {
                    fragment.push_str(&format!("{} {} ?", clause.column, clause.op.sql()));
                    params.push(match clause.op {
                        Op::Like => format!("%{value}%"),
                        _ => value.clone(),
                    });
                }
            }
        }

        (fragment, params)
    }
}

/// Parse a filter string. Never fails: malformed clauses are skipped, and a
/// connector next to a skipped clause goes with it so the rendered SQL stays
/// well-formed.
pub fn parse_filter(aliases: AliasTable, filter_str: &str) -> FilterExpr {
    let mut expr = FilterExpr::default();
    if filter_str.trim().is_empty() {
        return expr;
    }

    let mut pending: Option<Connector> = None;
    let mut last_end = 0;

    let mut push_segment = |segment: &str, pending: &mut Option<Connector>| {
        if let Some(clause) = parse_clause(aliases, segment) {
            let connector = if expr.items.is_empty() {
                None
            } else {
                Some(pending.unwrap_or(Connector::And))
            };
            expr.items.push((connector, clause));
        }
        *pending = None;
    };

    for m in CONNECTOR_RE.find_iter(filter_str) {
        push_segment(&filter_str[last_end..m.start()], &mut pending);
        pending = if m.as_str().trim().eq_ignore_ascii_case("or") {
            Some(Connector::Or)
        } else {
            Some(Connector::And)
        };
        last_end = m.end();
    }
    push_segment(&filter_str[last_end..], &mut pending);

    expr
}

fn parse_clause(aliases: AliasTable, segment: &str) -> Option<Clause> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    // Range first: `rating:[2-4]` would otherwise read as a substring match.
    if let Some(caps) = RANGE_RE.captures(segment) {
        let column = resolve_column(aliases, &caps[1])?;
        return Some(Clause {
            column,
            op: Op::Ge,
            value: ClauseValue::Range(caps[2].trim().to_string(), caps[3].trim().to_string()),
        });
    }

    let caps = CLAUSE_RE.captures(segment)?;
    let column = resolve_column(aliases, &caps[1])?;
    let op = match &caps[2] {
        "==" => Op::Eq,
        "!=" => Op::Ne,
        ">=" => Op::Ge,
        "<=" => Op::Le,
        ">" => Op::Gt,
        "<" => Op::Lt,
        "~" | ":" => Op::Like,
        _ => return None,
    };
    let value = caps[3].trim().trim_matches(|c| c == '\'' || c == '"').to_string();

    Some(Clause {
        column,
        op,
        value: ClauseValue::One(value),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

/// `field:direction` tokens; direction defaults to ascending when omitted or
/// unrecognized. Tokens whose field can't be resolved are skipped.
pub fn parse_sort(aliases: AliasTable, tokens: &[String]) -> Vec<SortKey> {
    let mut keys = Vec::new();
    for token in tokens {
        let (field, direction) = match token.split_once(':') {
            Some((field, dir)) => {
                let direction = if dir.trim().eq_ignore_ascii_case("desc") {
                    Direction::Desc
                } else {
                    Direction::Asc
                };
                (field, direction)
            }
            None => (token.as_str(), Direction::Asc),
        };
        if let Some(column) = resolve_column(aliases, field) {
            keys.push(SortKey { column, direction });
        }
    }
    keys
}

/// Newest application first, id as the deterministic tie-break.
pub fn default_sort() -> Vec<SortKey> {
    vec![
        SortKey {
            column: "date_applied".to_string(),
            direction: Direction::Desc,
        },
        SortKey {
            column: "id".to_string(),
            direction: Direction::Desc,
        },
    ]
}

pub fn order_by_sql(keys: &[SortKey]) -> String {
    keys.iter()
        .map(|k| format!("{} {}", k.column, k.direction.sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Visible column selection for `view`: defaults plus `--show`, minus
/// `--hide`; `--all` takes the whole alias table in order. Returns short keys.
pub fn visible_columns(
    aliases: AliasTable,
    show: Option<&str>,
    hide: Option<&str>,
    all: bool,
) -> Vec<String> {
    if all {
        return aliases.iter().map(|(alias, _)| (*alias).to_string()).collect();
    }

    let mut cols: Vec<String> = DEFAULT_VISIBLE.iter().map(|c| (*c).to_string()).collect();

    if let Some(show) = show {
        for key in show.split(',') {
            let key = key.trim().to_lowercase();
            if aliases.iter().any(|(alias, _)| *alias == key) && !cols.contains(&key) {
                cols.push(key);
            }
        }
    }

    if let Some(hide) = hide {
        for key in hide.split(',') {
            let key = key.trim().to_lowercase();
            cols.retain(|c| *c != key);
        }
    }

    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(filter: &str) -> (String, Vec<String>) {
        parse_filter(COLUMN_ALIASES, filter).to_sql()
    }

    #[test]
    fn test_alias_resolution_and_parameterization() {
        let (fragment, params) = sql("company~google");
        assert_eq!(fragment, "company_name LIKE ?");
        assert_eq!(params, vec!["%google%"]);
        // The literal value never appears in the fragment.
        assert!(!fragment.contains("google"));
    }

    #[test]
    fn test_all_operators() {
        assert_eq!(sql("rating>=4").0, "rating >= ?");
        assert_eq!(sql("rating<=4").0, "rating <= ?");
        assert_eq!(sql("rating>4").0, "rating > ?");
        assert_eq!(sql("rating<4").0, "rating < ?");
        assert_eq!(sql("status==offered").0, "status = ?");
        assert_eq!(sql("status!=ghosted").0, "status != ?");
        assert_eq!(sql("role:engineer").0, "role_name LIKE ?");
    }

    #[test]
    fn test_connectors_kept_verbatim() {
        let (fragment, params) = sql("rating>=4 AND company~google OR status==offered");
        assert_eq!(
            fragment,
            "rating >= ? AND company_name LIKE ? OR status = ?"
        );
        assert_eq!(params, vec!["4", "%google%", "offered"]);
    }

    #[test]
    fn test_connector_case_insensitive() {
        let (fragment, _) = sql("rating>=4 and fit>=3 or status==offered");
        assert_eq!(fragment, "rating >= ? AND fit >= ? OR status = ?");
    }

    #[test]
    fn test_range_clause() {
        let (fragment, params) = sql("rating:[2-4]");
        assert_eq!(fragment, "(rating >= ? AND rating <= ?)");
        assert_eq!(params, vec!["2", "4"]);
    }

    #[test]
    fn test_malformed_clauses_dropped_silently() {
        let (fragment, params) = sql("???");
        assert_eq!(fragment, "");
        assert!(params.is_empty());

        // Garbage in the middle drops its connector too.
        let (fragment, params) = sql("rating>=4 AND ??? AND fit>=3");
        assert_eq!(fragment, "rating >= ? AND fit >= ?");
        assert_eq!(params, vec!["4", "3"]);

        // Garbage up front leaves the survivor without a dangling connector.
        let (fragment, _) = sql("??? AND fit>=3");
        assert_eq!(fragment, "fit >= ?");
    }

    #[test]
    fn test_quoted_values_unwrapped() {
        let (_, params) = sql("company==\"Acme Corp\"");
        assert_eq!(params, vec!["Acme Corp"]);
    }

    #[test]
    fn test_unknown_field_passes_through_as_identifier() {
        // Columns added via `config add-column` aren't in the alias table.
        let (fragment, params) = sql("referral_bonus==yes");
        assert_eq!(fragment, "referral_bonus = ?");
        assert_eq!(params, vec!["yes"]);
    }

    #[test]
    fn test_empty_filter() {
        let expr = parse_filter(COLUMN_ALIASES, "   ");
        assert!(expr.is_empty());
        assert_eq!(expr.to_sql().0, "");
    }

    #[test]
    fn test_parse_sort() {
        let keys = parse_sort(
            COLUMN_ALIASES,
            &["date:desc".to_string(), "rating".to_string(), "fit:asc".to_string()],
        );
        assert_eq!(order_by_sql(&keys), "date_applied DESC, rating ASC, fit ASC");
    }

    #[test]
    fn test_sort_unrecognized_direction_defaults_asc() {
        let keys = parse_sort(COLUMN_ALIASES, &["date:downwards".to_string()]);
        assert_eq!(order_by_sql(&keys), "date_applied ASC");
    }

    #[test]
    fn test_default_sort_breaks_ties_by_id() {
        assert_eq!(order_by_sql(&default_sort()), "date_applied DESC, id DESC");
    }

    #[test]
    fn test_visible_columns_defaults() {
        let cols = visible_columns(COLUMN_ALIASES, None, None, false);
        assert_eq!(cols, vec!["id", "company", "role", "status", "date"]);
    }

    #[test]
    fn test_visible_columns_show_hide() {
        let cols = visible_columns(COLUMN_ALIASES, Some("rating,fit"), Some("date"), false);
        assert_eq!(cols, vec!["id", "company", "role", "status", "rating", "fit"]);
    }

    #[test]
    fn test_visible_columns_all() {
        let cols = visible_columns(COLUMN_ALIASES, None, None, true);
        assert_eq!(cols.len(), COLUMN_ALIASES.len());
        assert_eq!(cols[0], "id");
    }
}
