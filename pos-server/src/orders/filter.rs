//! Line Query Filter
//!
//! 组合式查询条件。每个条件推入一个只含 `?` 占位符的 SQL 片段和对应的
//! 绑定值，绝不把调用方的值拼进 SQL 文本。所有片段以 `l.` 引用
//! `line_item` 表，使用方须以 `FROM line_item l` 起句。

use sqlx::Sqlite;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::sqlite::SqliteArguments;

/// Visibility scope for line queries, derived from the caller's role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Admin: every line
    All,
    /// Floor staff: lines they served or cooked
    Staff(i64),
    /// Manager: lines served by their staff
    Manager(i64),
}

/// One bound value, applied positionally after the SQL text
#[derive(Debug, Clone)]
pub enum Bind {
    Int(i64),
    Text(String),
}

/// Composable WHERE builder for `line_item` queries
#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    frags: Vec<String>,
    binds: Vec<Bind>,
}

impl LineFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, code: i64) -> Self {
        self.frags.push("l.status = ?".into());
        self.binds.push(Bind::Int(code));
        self
    }

    pub fn status_in(mut self, codes: &[i64]) -> Self {
        if codes.is_empty() {
            // empty IN () is a syntax error in SQLite; match nothing instead
            self.frags.push("1 = 0".into());
            return self;
        }
        let marks = vec!["?"; codes.len()].join(", ");
        self.frags.push(format!("l.status IN ({marks})"));
        self.binds.extend(codes.iter().map(|c| Bind::Int(*c)));
        self
    }

    pub fn status_below(mut self, code: i64) -> Self {
        self.frags.push("l.status < ?".into());
        self.binds.push(Bind::Int(code));
        self
    }

    pub fn table_ref(mut self, table: &str) -> Self {
        self.frags.push("l.table_ref = ?".into());
        self.binds.push(Bind::Text(table.to_string()));
        self
    }

    pub fn server_ref(mut self, id: i64) -> Self {
        self.frags.push("l.server_ref = ?".into());
        self.binds.push(Bind::Int(id));
        self
    }

    pub fn order_id(mut self, id: i64) -> Self {
        self.frags.push("l.order_id = ?".into());
        self.binds.push(Bind::Int(id));
        self
    }

    pub fn item_ref(mut self, id: i64) -> Self {
        self.frags.push("l.item_ref = ?".into());
        self.binds.push(Bind::Int(id));
        self
    }

    /// created_at >= from (inclusive)
    pub fn created_from(mut self, millis: i64) -> Self {
        self.frags.push("l.created_at >= ?".into());
        self.binds.push(Bind::Int(millis));
        self
    }

    /// created_at < to (exclusive)
    pub fn created_before(mut self, millis: i64) -> Self {
        self.frags.push("l.created_at < ?".into());
        self.binds.push(Bind::Int(millis));
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        match scope {
            Scope::All => {}
            Scope::Staff(id) => {
                self.frags
                    .push("(l.server_ref = ? OR l.chef_ref = ?)".into());
                self.binds.push(Bind::Int(id));
                self.binds.push(Bind::Int(id));
            }
            Scope::Manager(id) => {
                self.frags
                    .push("l.server_ref IN (SELECT id FROM users WHERE parent_ref = ?)".into());
                self.binds.push(Bind::Int(id));
            }
        }
        self
    }

    /// " WHERE a AND b AND c", or "" when no condition was added
    pub fn where_clause(&self) -> String {
        if self.frags.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.frags.join(" AND "))
        }
    }

    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }
}

pub fn bind_query<'q>(
    mut q: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: &[Bind],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for b in binds {
        q = match b {
            Bind::Int(v) => q.bind(*v),
            Bind::Text(s) => q.bind(s.clone()),
        };
    }
    q
}

pub fn bind_query_as<'q, O>(
    mut q: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    binds: &[Bind],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for b in binds {
        q = match b {
            Bind::Int(v) => q.bind(*v),
            Bind::Text(s) => q.bind(s.clone()),
        };
    }
    q
}

pub fn bind_query_scalar<'q, O>(
    mut q: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    binds: &[Bind],
) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for b in binds {
        q = match b {
            Bind::Int(v) => q.bind(*v),
            Bind::Text(s) => q.bind(s.clone()),
        };
    }
    q
}
