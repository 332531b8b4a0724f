//! Collection query parsing: search, range and boolean filters, property
//! projection and page selection.
//!
//! Filters compile into a `WHERE` clause on a query that aliases
//! `dragon_treasures` as `t` and `users` as `u`.

use sqlx::{Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::user::parse_user_iri;
use crate::pagination::ITEMS_PER_PAGE;

/// Largest page whose row offset fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / ITEMS_PER_PAGE;

/// A numeric range condition on `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCondition {
    /// Inclusive on both ends.
    Between(i64, i64),
    Gt(i64),
    Gte(i64),
    Lt(i64),
    Lte(i64),
}

impl RangeCondition {
    fn parse(operator: &str, raw: &str) -> Option<Self> {
        let number = |s: &str| s.trim().parse::<i64>().ok();
        match operator {
            "between" => {
                let (low, high) = raw.split_once("..")?;
                Some(RangeCondition::Between(number(low)?, number(high)?))
            }
            "gt" => number(raw).map(RangeCondition::Gt),
            "gte" => number(raw).map(RangeCondition::Gte),
            "lt" => number(raw).map(RangeCondition::Lt),
            "lte" => number(raw).map(RangeCondition::Lte),
            _ => None,
        }
    }

    fn push_sql(&self, column: &str, qb: &mut QueryBuilder<'_, Postgres>) {
        match *self {
            RangeCondition::Between(low, high) if low == high => {
                qb.push(format!(" AND {} = ", column)).push_bind(low);
            }
            RangeCondition::Between(low, high) => {
                qb.push(format!(" AND {} BETWEEN ", column))
                    .push_bind(low)
                    .push(" AND ")
                    .push_bind(high);
            }
            RangeCondition::Gt(n) => {
                qb.push(format!(" AND {} > ", column)).push_bind(n);
            }
            RangeCondition::Gte(n) => {
                qb.push(format!(" AND {} >= ", column)).push_bind(n);
            }
            RangeCondition::Lt(n) => {
                qb.push(format!(" AND {} < ", column)).push_bind(n);
            }
            RangeCondition::Lte(n) => {
                qb.push(format!(" AND {} <= ", column)).push_bind(n);
            }
        }
    }
}

/// Filters available on treasure collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreasureFilters {
    pub name: Vec<String>,
    pub description: Vec<String>,
    pub owner_username: Vec<String>,
    pub owner: Vec<i64>,
    pub value: Vec<RangeCondition>,
    pub is_published: Option<bool>,
    /// `true` keeps records with a creation timestamp, `false` those without.
    pub created_at: Option<bool>,
    /// Restricts the collection to one owner (sub-resource scoping).
    pub scope_owner: Option<i64>,
}

impl TreasureFilters {
    /// Appends ` WHERE ...` to `qb`. Always emits a clause.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(owner_id) = self.scope_owner {
            qb.push(" AND t.owner_id = ").push_bind(owner_id);
        }
        push_partial_search(qb, "t.name", &self.name);
        push_partial_search(qb, "t.description", &self.description);
        push_partial_search(qb, "u.username", &self.owner_username);

        if !self.owner.is_empty() {
            qb.push(" AND t.owner_id = ANY(")
                .push_bind(self.owner.clone())
                .push(")");
        }
        for condition in &self.value {
            condition.push_sql("t.value", qb);
        }
        if let Some(is_published) = self.is_published {
            qb.push(" AND t.is_published = ").push_bind(is_published);
        }
        match self.created_at {
            Some(true) => {
                qb.push(" AND t.created_at IS NOT NULL");
            }
            Some(false) => {
                qb.push(" AND t.created_at IS NULL");
            }
            None => {}
        }
    }
}

/// OR-ed `LIKE '%term%'` over every term, with LIKE metacharacters escaped.
fn push_partial_search(qb: &mut QueryBuilder<'_, Postgres>, column: &str, terms: &[String]) {
    if terms.is_empty() {
        return;
    }
    qb.push(" AND (");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("{} LIKE ", column))
            .push_bind(format!("%{}%", escape_like(term)));
    }
    qb.push(")");
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// A parsed collection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub filters: TreasureFilters,
    /// Property projection requested with `properties[]`.
    pub properties: Option<Vec<String>>,
    /// 1-based page number.
    pub page: i64,
    /// Every pair except `page`, kept in request order for building page links.
    pub passthrough: Vec<(String, String)>,
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self {
            filters: TreasureFilters::default(),
            properties: None,
            page: 1,
            passthrough: Vec::new(),
        }
    }
}

impl CollectionQuery {
    /// Parses a raw treasure collection query string. Unknown keys and
    /// unparsable filter values are ignored; an invalid `page` is rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        Self::parse_with(raw, true)
    }

    /// Parses only `page` and `properties[]`. Every other key is dropped,
    /// including from the page links.
    pub fn parse_unfiltered(raw: Option<&str>) -> Result<Self, AppError> {
        Self::parse_with(raw, false)
    }

    fn parse_with(raw: Option<&str>, treasure_filters: bool) -> Result<Self, AppError> {
        let mut query = CollectionQuery::default();
        for (key, value) in decode_pairs(raw)? {
            if key == "page" {
                query.page = parse_page(&value)?;
                continue;
            }
            if treasure_filters {
                query.apply_pair(&key, &value);
            } else if is_properties_key(&key) {
                query.properties.get_or_insert_with(Vec::new).push(value.clone());
            } else {
                ignored(&key, &value);
                continue;
            }
            query.passthrough.push((key, value));
        }
        Ok(query)
    }

    fn apply_pair(&mut self, key: &str, value: &str) {
        let filters = &mut self.filters;
        let (name, modifier) = split_key(key);
        match (name, modifier) {
            ("name", None | Some("")) => filters.name.push(value.to_string()),
            ("description", None | Some("")) => filters.description.push(value.to_string()),
            ("owner.username" | "owner_username", None | Some("")) => {
                filters.owner_username.push(value.to_string())
            }
            ("owner", None | Some("")) => match parse_owner_filter(value) {
                Some(id) => filters.owner.push(id),
                None => ignored(key, value),
            },
            ("value", Some(operator)) => match RangeCondition::parse(operator, value) {
                Some(condition) => filters.value.push(condition),
                None => ignored(key, value),
            },
            ("isPublished", None) => match parse_bool(value) {
                Some(b) => filters.is_published = Some(b),
                None => ignored(key, value),
            },
            ("createdAt", None) => match parse_bool(value) {
                Some(b) => filters.created_at = Some(b),
                None => ignored(key, value),
            },
            ("properties", Some("")) => self
                .properties
                .get_or_insert_with(Vec::new)
                .push(value.to_string()),
            _ => ignored(key, value),
        }
    }
}

/// Reads the `properties[]` projection of an item request, ignoring every
/// other key.
pub fn parse_properties(raw: Option<&str>) -> Result<Option<Vec<String>>, AppError> {
    let mut properties: Option<Vec<String>> = None;
    for (key, value) in decode_pairs(raw)? {
        if is_properties_key(&key) {
            properties.get_or_insert_with(Vec::new).push(value);
        }
    }
    Ok(properties)
}

fn decode_pairs(raw: Option<&str>) -> Result<Vec<(String, String)>, AppError> {
    match raw {
        Some(raw) if !raw.is_empty() => serde_urlencoded::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e))),
        _ => Ok(Vec::new()),
    }
}

fn is_properties_key(key: &str) -> bool {
    split_key(key) == ("properties", Some(""))
}

fn ignored(key: &str, value: &str) {
    tracing::debug!(key = %key, value = %value, "Ignoring collection query parameter");
}

/// Splits `value[gte]` into `("value", Some("gte"))` and `name[]` into `("name", Some(""))`.
fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once('[') {
        Some((name, rest)) => match rest.strip_suffix(']') {
            Some(modifier) => (name, Some(modifier)),
            None => (key, None),
        },
        None => (key, None),
    }
}

fn parse_owner_filter(value: &str) -> Option<i64> {
    parse_user_iri(value).or_else(|| value.parse().ok())
}

fn parse_page(raw: &str) -> Result<i64, AppError> {
    let page: i64 = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid page number \"{}\"", raw)))?;
    if page < 1 {
        return Err(AppError::BadRequest(
            "Page should not be less than 1".to_string(),
        ));
    }
    if page > MAX_PAGE {
        return Err(AppError::BadRequest(format!(
            "Page should not be greater than {}",
            MAX_PAGE
        )));
    }
    Ok(page)
}
