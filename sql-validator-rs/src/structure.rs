//! Structural extraction
//!
//! Text-level analysis of a single statement: which tables, columns and
//! functions it touches and how much of each clause it uses. Nothing here
//! parses SQL; the counts are approximations good enough to bound complexity.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    static ref LEADING_COMMAND_REGEX: Regex = Regex::new(r"^[\s(]*([A-Za-z]+)").unwrap();
    static ref TABLE_REGEX: Regex =
        Regex::new(r#"(?i)\b(FROM|JOIN|INTO|UPDATE)\s+(?:\(|["`\[]?([A-Za-z_][\w.]*))"#).unwrap();
    static ref FROM_ITEM_REGEX: Regex = Regex::new(r#"^["`\[]?([A-Za-z_][\w.]*)"#).unwrap();
    static ref TABLE_ALIAS_REGEX: Regex = Regex::new(r"^\s+(?:(?i:AS)\s+)?([A-Za-z_]\w*)").unwrap();
    static ref CTE_REGEX: Regex = Regex::new(r"(?i)(?:\bWITH(?:\s+RECURSIVE)?|,)\s*([A-Za-z_]\w*)\s+AS\s*\(").unwrap();
    static ref SELECT_LIST_REGEX: Regex = Regex::new(r"(?i)\bSELECT\s+(?:DISTINCT\s+)?").unwrap();
    static ref STRING_LITERAL_REGEX: Regex = Regex::new(r"'(?:[^']|'')*'").unwrap();
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"[A-Za-z_][\w.]*(\s*\()?").unwrap();
    static ref ALIAS_REGEX: Regex = Regex::new(r#"(?i)([\w)'"\]])\s+(?:AS\s+)?[A-Za-z_]\w*$"#).unwrap();
    static ref FUNCTION_REGEX: Regex = Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap();
    static ref JOIN_REGEX: Regex = Regex::new(r"(?i)\bJOIN\b").unwrap();
    static ref SUBQUERY_REGEX: Regex = Regex::new(r"(?i)\(\s*SELECT\b").unwrap();
    static ref WHERE_REGEX: Regex = Regex::new(r"(?i)\bWHERE\b").unwrap();
    static ref LOGICAL_REGEX: Regex = Regex::new(r"(?i)\b(AND|OR)\b").unwrap();
    static ref BETWEEN_REGEX: Regex = Regex::new(r"(?i)\bBETWEEN\b").unwrap();
    static ref ORDER_BY_REGEX: Regex = Regex::new(r"(?i)\bORDER\s+BY\b").unwrap();
    static ref GROUP_BY_REGEX: Regex = Regex::new(r"(?i)\bGROUP\s+BY\b").unwrap();
}

/// Words that may precede a parenthesis without being a function call
const NON_FUNCTION_WORDS: &[&str] = &[
    "IN", "EXISTS", "VALUES", "AS", "OVER", "FROM", "JOIN", "ON", "AND", "OR", "NOT", "WHERE",
    "SELECT", "INTO", "USING", "FILTER", "WITHIN", "ANY", "ALL", "SOME", "WITH", "THEN", "ELSE",
    "WHEN", "CASE", "END", "IS", "LIKE", "BETWEEN", "HAVING", "BY", "UNION", "EXCEPT", "INTERSECT",
];

/// Words that never name a column in a select list
const SQL_KEYWORDS: &[&str] = &[
    "AS", "DISTINCT", "CASE", "WHEN", "THEN", "ELSE", "END", "AND", "OR", "NOT", "NULL", "IS",
    "IN", "LIKE", "BETWEEN", "TRUE", "FALSE", "OVER", "PARTITION", "BY", "ORDER", "ASC", "DESC",
    "FILTER", "WHERE", "ALL", "ANY", "EXISTS", "SELECT", "INTEGER", "INT", "REAL", "TEXT",
    "VARCHAR", "NUMERIC", "FLOAT", "DECIMAL", "FROM",
];

/// Words that end a comma-separated FROM list where an alias could stand
const FROM_LIST_STOP_WORDS: &[&str] = &[
    "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "OUTER", "NATURAL", "ON", "USING",
    "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "EXCEPT", "INTERSECT", "WINDOW",
    "FETCH", "FOR",
];

/// Clause keywords that end an ORDER BY or GROUP BY list
const CLAUSE_TERMINATORS: &[&str] = &[
    "LIMIT", "OFFSET", "HAVING", "UNION", "EXCEPT", "INTERSECT", "ORDER", "GROUP", "WINDOW",
    "FETCH", "WHERE", "FROM",
];

/// Counts and names extracted from one statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStructure {
    pub command: Option<String>,
    pub tables: Vec<String>,
    pub cte_names: Vec<String>,
    pub columns: Vec<String>,
    pub functions: Vec<String>,
    pub joins: usize,
    pub subqueries: usize,
    pub where_conditions: usize,
    pub order_by: usize,
    pub group_by: usize,
}

impl QueryStructure {
    /// Analyse whitespace-normalized SQL
    pub fn extract(sql: &str) -> Self {
        let cte_names = cte_names(sql);
        Self {
            command: leading_command(sql),
            tables: tables(sql, &cte_names),
            columns: select_columns(sql),
            functions: functions(sql),
            joins: JOIN_REGEX.find_iter(sql).count(),
            subqueries: SUBQUERY_REGEX.find_iter(sql).count(),
            where_conditions: where_conditions(sql),
            order_by: clause_items(sql, &ORDER_BY_REGEX),
            group_by: clause_items(sql, &GROUP_BY_REGEX),
            cte_names,
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim
pub fn normalize_whitespace(sql: &str) -> String {
    WHITESPACE_REGEX.replace_all(sql, " ").trim().to_string()
}

/// Upper-cased first keyword of the statement
pub fn leading_command(sql: &str) -> Option<String> {
    LEADING_COMMAND_REGEX
        .captures(sql)
        .map(|caps| caps[1].to_uppercase())
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Names bound by WITH, lower-cased
pub fn cte_names(sql: &str) -> Vec<String> {
    if !sql.to_uppercase().contains("WITH") {
        return Vec::new();
    }
    let mut names = Vec::new();
    for caps in CTE_REGEX.captures_iter(sql) {
        push_unique(&mut names, caps[1].to_lowercase());
    }
    names
}

/// Tables after FROM, JOIN, INTO and UPDATE, every item of a comma-separated
/// FROM list included; lower-cased, schema prefix removed.
///
/// A FROM inside a function call such as `EXTRACT(YEAR FROM installed_at)`
/// names no table and is skipped.
pub fn tables(sql: &str, cte_names: &[String]) -> Vec<String> {
    let text = STRING_LITERAL_REGEX.replace_all(sql, "''");
    let mut found = Vec::new();

    for caps in TABLE_REGEX.captures_iter(&text) {
        let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !opens_table_scope(&text, keyword.start()) {
            continue;
        }

        // A derived table's own FROM is matched separately; skip past it
        let first_end = match caps.get(2) {
            Some(first) => {
                add_table(&mut found, cte_names, first.as_str());
                first.end()
            }
            None => match matching_paren(&text[whole.end() - 1..]) {
                Some(close) => whole.end() + close,
                None => continue,
            },
        };

        if keyword.as_str().eq_ignore_ascii_case("FROM") {
            for name in from_list_tail(&text[first_end..]) {
                add_table(&mut found, cte_names, name);
            }
        }
    }
    found
}

fn add_table(found: &mut Vec<String>, cte_names: &[String], qualified: &str) {
    let qualified = qualified.to_lowercase();
    let name = qualified.rsplit('.').next().unwrap_or(&qualified).to_string();
    if name.is_empty() || cte_names.contains(&name) {
        return;
    }
    push_unique(found, name);
}

/// Whether a keyword at `pos` sits at statement level or directly inside a
/// subquery, rather than inside a function's parentheses
fn opens_table_scope(sql: &str, pos: usize) -> bool {
    let mut open = Vec::new();
    for (i, c) in sql[..pos].char_indices() {
        match c {
            '(' => open.push(i),
            ')' => {
                open.pop();
            }
            _ => {}
        }
    }
    match open.last() {
        None => true,
        Some(&i) => {
            let inner = sql[i + 1..].trim_start();
            starts_with_keyword(inner, "SELECT") || starts_with_keyword(inner, "WITH")
        }
    }
}

/// Table names of the `, name [alias]` items following the first FROM item
fn from_list_tail(rest: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut cursor = 0;

    loop {
        cursor += alias_len(&rest[cursor..]);
        let next = rest[cursor..].trim_start();
        let Some(after_comma) = next.strip_prefix(',') else {
            break;
        };
        let item = after_comma.trim_start();
        let item_start = rest.len() - item.len();

        if item.starts_with('(') {
            match matching_paren(item) {
                Some(close) => cursor = item_start + close + 1,
                None => break,
            }
            continue;
        }
        match FROM_ITEM_REGEX.captures(item) {
            Some(caps) => {
                let Some(name) = caps.get(1) else { break };
                names.push(name.as_str());
                cursor = item_start + name.end();
            }
            None => break,
        }
    }
    names
}

/// Length of a closing quote plus an optional alias at the start of `text`
fn alias_len(text: &str) -> usize {
    let quote = usize::from(text.starts_with(|c: char| matches!(c, '"' | '`' | ']')));
    match TABLE_ALIAS_REGEX.captures(&text[quote..]) {
        Some(caps) if !FROM_LIST_STOP_WORDS.iter().any(|w| w.eq_ignore_ascii_case(&caps[1])) => {
            quote + caps.get(0).map_or(0, |m| m.end())
        }
        _ => quote,
    }
}

/// Index of the `)` closing the `(` that starts `text`
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte offset of the first `keyword` outside parentheses
fn top_level_keyword(text: &str, keyword: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut previous = ' ';
    for (i, c) in text.char_indices() {
        if depth == 0 && previous.is_whitespace() && starts_with_keyword(&text[i..], keyword) {
            return Some(i);
        }
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        previous = c;
    }
    None
}

/// Split on commas that are not inside parentheses
fn split_top_level(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                items.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(list[start..].trim());
    items.into_iter().filter(|item| !item.is_empty()).collect()
}

/// Columns named in the first select list.
///
/// Function names, keywords and aliases are left out; `*` is kept as is.
pub fn select_columns(sql: &str) -> Vec<String> {
    let text = STRING_LITERAL_REGEX.replace_all(sql, "''");
    let rest = match SELECT_LIST_REGEX.find(&text) {
        Some(m) => &text[m.end()..],
        None => return Vec::new(),
    };
    let list = match top_level_keyword(rest, "FROM") {
        Some(end) => &rest[..end],
        None => rest,
    };

    let mut columns = Vec::new();
    for item in split_top_level(list) {
        if item == "*" || item.ends_with(".*") {
            push_unique(&mut columns, "*".to_string());
            continue;
        }

        // Only strip an alias from an expression, never from a bare name
        let expression = if item.contains(' ') {
            ALIAS_REGEX.replace(item, "${1}").to_string()
        } else {
            item.to_string()
        };

        for m in IDENTIFIER_REGEX.find_iter(&expression) {
            let token = m.as_str();
            if token.ends_with('(') {
                continue;
            }
            let bare = token.rsplit('.').next().unwrap_or(token);
            if bare.is_empty() || SQL_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(bare)) {
                continue;
            }
            push_unique(&mut columns, bare.to_lowercase());
        }
    }
    columns
}

/// Upper-cased names of every function call
pub fn functions(sql: &str) -> Vec<String> {
    let mut found = Vec::new();
    for caps in FUNCTION_REGEX.captures_iter(sql) {
        let name = caps[1].to_uppercase();
        if NON_FUNCTION_WORDS.contains(&name.as_str()) {
            continue;
        }
        push_unique(&mut found, name);
    }
    found
}

/// WHERE clauses plus the AND/OR joining them, not counting BETWEEN's AND
pub fn where_conditions(sql: &str) -> usize {
    let first_where = match WHERE_REGEX.find(sql) {
        Some(m) => m.start(),
        None => return 0,
    };
    let tail = &sql[first_where..];

    let wheres = WHERE_REGEX.find_iter(tail).count();
    let logical = LOGICAL_REGEX.find_iter(tail).count();
    let betweens = BETWEEN_REGEX.find_iter(tail).count();

    (wheres + logical).saturating_sub(betweens)
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.len() >= keyword.len()
        && text.is_char_boundary(keyword.len())
        && text[..keyword.len()].eq_ignore_ascii_case(keyword)
        && !text[keyword.len()..]
            .chars()
            .next()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
}

/// Number of items listed across every occurrence of a clause
pub fn clause_items(sql: &str, clause: &Regex) -> usize {
    let mut total = 0;

    for m in clause.find_iter(sql) {
        let rest = &sql[m.end()..];
        let mut depth = 0i32;
        let mut items = 0;
        let mut has_content = false;
        let mut previous = ' ';

        for (i, c) in rest.char_indices() {
            if depth == 0 && previous.is_whitespace() {
                let remaining = &rest[i..];
                if CLAUSE_TERMINATORS.iter().any(|k| starts_with_keyword(remaining, k)) {
                    break;
                }
            }
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                ',' if depth == 0 => {
                    if has_content {
                        items += 1;
                    }
                    has_content = false;
                }
                c if !c.is_whitespace() => has_content = true,
                _ => {}
            }
            previous = c;
        }
        if has_content {
            items += 1;
        }
        total += items;
    }

    total
}
