use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;
use worldforge_schema::{Entity, FieldDescriptor, FieldRole, ListPage, ListQuery};

use super::backend::BackendKind;
use super::connection::{ConnectionHandle, DbValue};
use super::layer::Db;
use super::normalize::RowNormalizer;
use super::tables::TableSpec;
use crate::error::WorldforgeError;

/// Owner assigned to networked rows created without one.
pub const DEFAULT_OWNER: i64 = 1;

/// Table-level CRUD for one entity, on whichever backend the operation resolves to.
///
/// Deletion is soft: rows are flagged `del_yn = 'Y'`, drop out of lists and can no longer be
/// updated or deleted.
#[derive(Debug, Clone)]
pub struct Mapper {
    db: Db,
    spec: &'static TableSpec,
    mode: Option<BackendKind>,
}

impl Mapper {
    pub fn new(db: Db, spec: &'static TableSpec) -> Self {
        Self {
            db,
            spec,
            mode: None,
        }
    }

    /// Copy of this mapper pinned to `kind`, regardless of the operation context.
    #[must_use]
    pub fn with_mode(&self, kind: BackendKind) -> Self {
        Self {
            mode: Some(kind),
            ..self.clone()
        }
    }

    pub fn spec(&self) -> &'static TableSpec {
        self.spec
    }

    async fn target(&self) -> Result<(BackendKind, ConnectionHandle), WorldforgeError> {
        let kind = self.db.resolve_mode(self.mode);
        let conn = self.db.connection(kind).await?;
        Ok((kind, conn))
    }

    fn writable_on(&self, f: &FieldDescriptor, kind: BackendKind) -> bool {
        f.role == FieldRole::Column
            && (kind == BackendKind::Networked || !self.spec.networked_only.contains(&f.column))
    }

    fn list_filter(&self, query: &ListQuery) -> (String, Vec<DbValue>) {
        let mut clauses = vec!["del_yn = 'N'".to_string()];
        let mut params = Vec::new();

        if let (Some(column), Some(prj_no)) = (self.spec.parent_column, query.prj_no) {
            clauses.push(format!("{column} = ?"));
            params.push(DbValue::Integer(prj_no));
        }

        let keyword = query
            .search_keyword
            .as_deref()
            .map(str::trim)
            .filter(|kw| !kw.is_empty());
        if let Some(keyword) = keyword {
            let columns: Vec<&str> = match query
                .search_type
                .as_deref()
                .and_then(|t| self.spec.searchable_column(t))
            {
                Some(column) => vec![column],
                None => self
                    .spec
                    .searchable
                    .iter()
                    .filter_map(|name| self.spec.searchable_column(name))
                    .collect(),
            };
            if !columns.is_empty() {
                let pattern = format!("%{keyword}%");
                let ors: Vec<String> = columns.iter().map(|c| format!("{c} LIKE ?")).collect();
                clauses.push(format!("({})", ors.join(" OR ")));
                params.extend(columns.iter().map(|_| DbValue::Text(pattern.clone())));
            }
        }

        (clauses.join(" AND "), params)
    }

    /// One page of live rows, newest key first, plus the total matching count.
    ///
    /// Without `page` and `pageSize` every matching row is returned.
    pub async fn select_list(
        &self,
        query: &ListQuery,
    ) -> Result<(Vec<Entity>, i64), WorldforgeError> {
        let (kind, conn) = self.target().await?;
        let TableSpec {
            table, key_column, ..
        } = self.spec;
        let (filter, mut params) = self.list_filter(query);

        let total = conn
            .fetch_optional(
                &format!("SELECT COUNT(*) AS total_cnt FROM {table} WHERE {filter}"),
                &params,
            )
            .await?
            .and_then(|row| row.get("total_cnt").and_then(Value::as_i64))
            .unwrap_or(0);

        let mut sql = format!("SELECT * FROM {table} WHERE {filter} ORDER BY {key_column} DESC");
        if let Some((limit, offset)) = page_window(query) {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(DbValue::Integer(limit));
            params.push(DbValue::Integer(offset));
        }
        let rows = conn.fetch_all(&sql, &params).await?;
        let list = RowNormalizer::new(self.spec.schema, kind).normalize_all(&rows)?;

        debug!(table, backend = %kind, total, returned = list.len(), "list selected");
        Ok((list, total))
    }

    /// Reads one row by key whatever its deletion flag; callers inspect `delYn`.
    pub async fn select_by_key(&self, key: i64) -> Result<Option<Entity>, WorldforgeError> {
        let (kind, conn) = self.target().await?;
        let TableSpec {
            table, key_column, ..
        } = self.spec;
        let row = conn
            .fetch_optional(
                &format!("SELECT * FROM {table} WHERE {key_column} = ? LIMIT 1"),
                &[DbValue::Integer(key)],
            )
            .await?;
        row.map(|row| RowNormalizer::new(self.spec.schema, kind).normalize(&row))
            .transpose()
    }

    /// Inserts the non-null writable fields of `entity` and returns the stored row.
    ///
    /// Creation and update timestamps are stamped here. On the networked backend a missing
    /// owner becomes [`DEFAULT_OWNER`]; on the embedded backend owner fields are never written.
    pub async fn insert(&self, entity: &Entity) -> Result<Entity, WorldforgeError> {
        let (kind, conn) = self.target().await?;
        let (sql, params) = self.insert_statement(entity, kind, Utc::now());
        let table = self.spec.table;
        let row = conn.fetch_optional(&sql, &params).await?.ok_or_else(|| {
            WorldforgeError::UnexpectedError(format!("insert into {table} returned no row"))
        })?;
        let stored = RowNormalizer::new(self.spec.schema, kind).normalize(&row)?;

        debug!(table, backend = %kind, key = ?stored.get_i64(self.spec.key_field), "row inserted");
        Ok(stored)
    }

    fn insert_statement(
        &self,
        entity: &Entity,
        kind: BackendKind,
        now: DateTime<Utc>,
    ) -> (String, Vec<DbValue>) {
        let mut columns = Vec::new();
        let mut params = Vec::new();

        for f in self.spec.schema.fields() {
            if self.writable_on(f, kind) {
                if let Some(value) = entity.get(f.name).and_then(|v| DbValue::from_json(f.ty, v))
                {
                    columns.push(f.column);
                    params.push(value);
                }
            } else if f.role == FieldRole::Owner && kind == BackendKind::Networked {
                columns.push(f.column);
                params.push(DbValue::Integer(
                    entity.get_i64(f.name).unwrap_or(DEFAULT_OWNER),
                ));
            }
        }

        for column in ["crt_dt", "updt_dt"] {
            columns.push(column);
            params.push(DbValue::Timestamp(now));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders}) RETURNING *",
            self.spec.table,
            columns.join(", ")
        );
        (sql, params)
    }

    /// Sets only the writable fields present in `patch`; `None` when no live row has `key`.
    pub async fn update(
        &self,
        key: i64,
        patch: &Map<String, Value>,
    ) -> Result<Option<Entity>, WorldforgeError> {
        let (kind, conn) = self.target().await?;
        let mut sets = Vec::new();
        let mut params = Vec::new();

        for f in self.spec.schema.fields() {
            if !self.writable_on(f, kind) {
                continue;
            }
            if let Some(value) = patch.get(f.name).and_then(|v| DbValue::from_json(f.ty, v)) {
                sets.push(format!("{} = ?", f.column));
                params.push(value);
            }
        }
        sets.push("updt_dt = ?".to_string());
        params.push(DbValue::Timestamp(Utc::now()));
        params.push(DbValue::Integer(key));

        let TableSpec {
            table, key_column, ..
        } = self.spec;
        let sql = format!(
            "UPDATE {table} SET {} WHERE {key_column} = ? AND del_yn = 'N' RETURNING *",
            sets.join(", ")
        );
        let row = conn.fetch_optional(&sql, &params).await?;

        debug!(table, backend = %kind, key, found = row.is_some(), "row updated");
        row.map(|row| RowNormalizer::new(self.spec.schema, kind).normalize(&row))
            .transpose()
    }

    /// Soft delete. `false` when no live row has `key`.
    pub async fn delete(&self, key: i64) -> Result<bool, WorldforgeError> {
        let (kind, conn) = self.target().await?;
        let TableSpec {
            table, key_column, ..
        } = self.spec;
        let now = DbValue::Timestamp(Utc::now());
        let affected = conn
            .execute(
                &format!(
                    "UPDATE {table} SET del_yn = 'Y', del_dt = ?, updt_dt = ? \
                     WHERE {key_column} = ? AND del_yn = 'N'"
                ),
                &[now.clone(), now, DbValue::Integer(key)],
            )
            .await?;

        debug!(table, backend = %kind, key, affected, "row soft-deleted");
        Ok(affected > 0)
    }
}

/// `LIMIT`/`OFFSET` pair when the query asks for paging.
fn page_window(query: &ListQuery) -> Option<(i64, i64)> {
    if query.page.is_none() && query.page_size.is_none() {
        return None;
    }
    let page = query.page.unwrap_or(1).max(1);
    let size = query
        .page_size
        .unwrap_or(ListPage::<()>::DEFAULT_PAGE_SIZE)
        .max(1);
    // Out-of-range pages saturate to an empty window.
    Some((size, (page - 1).saturating_mul(size)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, LocalDbConfig};
    use crate::db::connection::numbered_placeholders;
    use crate::db::context::run_with_mode;
    use crate::db::tables::{CHARACTERS, PROJECTS};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use worldforge_schema::entities::{CHARACTER, PROJECT};

    fn temp_db() -> (Db, PathBuf) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "worldforge-mapper-{}-{nanos}",
            std::process::id()
        ));
        let db = Db::new(&DbConfig {
            local: LocalDbConfig {
                path: dir.join("app.db"),
                ..LocalDbConfig::default()
            },
            ..DbConfig::default()
        });
        (db, dir)
    }

    async fn create_project(mapper: &Mapper, name: &str, desc: &str) -> Entity {
        let entity = PROJECT
            .validate(&json!({ "prjNm": name, "prjDesc": desc, "userNo": 99 }))
            .expect("valid project");
        mapper.insert(&entity).await.expect("insert")
    }

    #[test]
    fn page_window_only_when_requested() {
        assert_eq!(page_window(&ListQuery::default()), None);
        let q = ListQuery {
            page: Some(3),
            page_size: Some(5),
            ..ListQuery::default()
        };
        assert_eq!(page_window(&q), Some((5, 10)));
        let q = ListQuery {
            page: Some(0),
            ..ListQuery::default()
        };
        assert_eq!(page_window(&q), Some((10, 0)));
        let q = ListQuery {
            page: Some(i64::MAX),
            page_size: Some(i64::MAX),
            ..ListQuery::default()
        };
        assert_eq!(page_window(&q), Some((i64::MAX, i64::MAX)));
    }

    #[test]
    fn networked_insert_writes_owner_and_numbers_placeholders() {
        let (db, _dir) = temp_db();
        let mapper = db.mapper(&PROJECTS);
        let entity = PROJECT
            .validate(&json!({ "prjNm": "Atlas", "prjDesc": "maps", "tags": "north,ice" }))
            .expect("valid project");
        let now = Utc::now();

        let (sql, params) = mapper.insert_statement(&entity, BackendKind::Networked, now);
        assert_eq!(
            sql,
            "INSERT INTO projects (prj_nm, prj_desc, user_no, tags, crt_dt, updt_dt) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        );
        assert_eq!(
            params,
            [
                DbValue::Text("Atlas".into()),
                DbValue::Text("maps".into()),
                DbValue::Integer(DEFAULT_OWNER),
                DbValue::Text("north,ice".into()),
                DbValue::Timestamp(now),
                DbValue::Timestamp(now),
            ]
        );
        assert_eq!(
            numbered_placeholders(&sql),
            "INSERT INTO projects (prj_nm, prj_desc, user_no, tags, crt_dt, updt_dt) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        );

        let owned = PROJECT
            .validate(&json!({ "prjNm": "Atlas", "userNo": 42, "tags": "north" }))
            .expect("valid project");
        let (_, params) = mapper.insert_statement(&owned, BackendKind::Networked, now);
        assert_eq!(params[1], DbValue::Integer(42));

        let (sql, params) = mapper.insert_statement(&owned, BackendKind::Embedded, now);
        assert_eq!(
            sql,
            "INSERT INTO projects (prj_nm, crt_dt, updt_dt) VALUES (?, ?, ?) RETURNING *"
        );
        assert_eq!(params.len(), 3);
    }

    #[tokio::test]
    async fn insert_stamps_dates_and_skips_owner_on_embedded() {
        let (db, dir) = temp_db();
        let mapper = db.mapper(&PROJECTS);

        let stored = create_project(&mapper, "Atlas", "maps").await;
        assert!(stored.get_i64("prjNo").is_some());
        assert_eq!(stored.get_str("prjNm"), Some("Atlas"));
        assert_eq!(stored.get_str("delYn"), Some("N"));
        assert_eq!(stored.get_str("useYn"), Some("Y"));
        assert!(PROJECT.validate(&stored.clone().into_value()).is_ok());
        assert_eq!(stored.get("userNo"), Some(&Value::Null));
        assert!(stored.get_str("crtDt").is_some());
        assert_eq!(stored.get("crtDt"), stored.get("updtDt"));

        db.close_all().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn list_filters_searches_and_pages() {
        let (db, dir) = temp_db();
        let mapper = db.mapper(&PROJECTS);
        for (name, desc) in [("Atlas", "maps"), ("Borealis", "northern atlas"), ("Cinder", "fire")] {
            create_project(&mapper, name, desc).await;
        }

        let (all, total) = mapper.select_list(&ListQuery::default()).await.expect("list");
        assert_eq!(total, 3);
        let names: Vec<_> = all.iter().filter_map(|e| e.get_str("prjNm")).collect();
        assert_eq!(names, ["Cinder", "Borealis", "Atlas"]);

        let any_field = ListQuery {
            search_keyword: Some("atlas".into()),
            ..ListQuery::default()
        };
        let (found, total) = mapper.select_list(&any_field).await.expect("search");
        assert_eq!(total, 2);
        assert_eq!(found.len(), 2);

        let name_only = ListQuery {
            search_type: Some("prjNm".into()),
            ..any_field
        };
        let (found, _) = mapper.select_list(&name_only).await.expect("search name");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("prjNm"), Some("Atlas"));

        let paged = ListQuery {
            page: Some(2),
            page_size: Some(2),
            ..ListQuery::default()
        };
        let (page, total) = mapper.select_list(&paged).await.expect("page");
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].get_str("prjNm"), Some("Atlas"));

        db.close_all().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn update_and_soft_delete() {
        let (db, dir) = temp_db();
        let mapper = db.mapper(&PROJECTS);
        let key = create_project(&mapper, "Atlas", "maps")
            .await
            .get_i64("prjNo")
            .expect("key");

        let patch = PROJECT
            .validate_partial(&json!({ "prjNm": "Atlas II" }))
            .expect("patch");
        let updated = mapper.update(key, &patch).await.expect("update").expect("row");
        assert_eq!(updated.get_str("prjNm"), Some("Atlas II"));
        assert_eq!(updated.get_str("prjDesc"), Some("maps"));

        assert!(mapper.delete(key).await.expect("delete"));
        assert!(!mapper.delete(key).await.expect("second delete"));
        let deleted = mapper.select_by_key(key).await.expect("get").expect("row kept");
        assert_eq!(deleted.get_str("delYn"), Some("Y"));
        assert!(deleted.get_str("delDt").is_some());
        assert!(mapper.update(key, &patch).await.expect("update").is_none());
        let (_, total) = mapper.select_list(&ListQuery::default()).await.expect("list");
        assert_eq!(total, 0);

        db.close_all().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn children_filter_by_project() {
        let (db, dir) = temp_db();
        let projects = db.mapper(&PROJECTS);
        let characters = db.mapper(&CHARACTERS);
        let a = create_project(&projects, "A", "").await.get_i64("prjNo").expect("a");
        let b = create_project(&projects, "B", "").await.get_i64("prjNo").expect("b");

        for (prj_no, name) in [(a, "Ayla"), (a, "Bram"), (b, "Cato")] {
            let entity = CHARACTER
                .validate(&json!({ "prjNo": prj_no, "charNm": name }))
                .expect("valid character");
            characters.insert(&entity).await.expect("insert character");
        }

        let q = ListQuery {
            prj_no: Some(a),
            ..ListQuery::default()
        };
        let (list, total) = characters.select_list(&q).await.expect("list");
        assert_eq!(total, 2);
        assert!(list.iter().all(|c| c.get_i64("prjNo") == Some(a)));

        db.close_all().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn pinned_mode_ignores_operation_context() {
        let (db, dir) = temp_db();
        let mapper = db.mapper(&PROJECTS).with_mode(BackendKind::Embedded);

        // The context asks for the unconfigured networked backend; the pinned mapper never
        // consults it.
        let listed = run_with_mode(Some(BackendKind::Networked), async {
            mapper.select_list(&ListQuery::default()).await
        })
        .await;
        assert!(listed.is_ok());

        let unpinned = run_with_mode(Some(BackendKind::Networked), async {
            db.mapper(&PROJECTS).select_list(&ListQuery::default()).await
        })
        .await;
        assert!(matches!(unpinned, Err(WorldforgeError::Config(_))));

        db.close_all().await;
        let _ = std::fs::remove_dir_all(dir);
    }
}
