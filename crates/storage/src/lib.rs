use anyhow::{anyhow, Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{PathId, WaypointId},
    protocol::{Waypoint, WaypointUpdate},
};

const WAYPOINT_COLUMNS: &str = "id, x, y, heading, is_initial_guess, translation_constrained, \
     heading_constrained, control_interval_count";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database opens a fresh, empty one.
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores every field of `waypoint` except its id and returns the id the
    /// database assigned.
    pub async fn insert_waypoint(&self, waypoint: &Waypoint) -> Result<WaypointId> {
        let rec = sqlx::query(
            "INSERT INTO waypoints (x, y, heading, is_initial_guess, translation_constrained,
                 heading_constrained, control_interval_count)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(waypoint.x)
        .bind(waypoint.y)
        .bind(waypoint.heading)
        .bind(waypoint.is_initial_guess)
        .bind(waypoint.translation_constrained)
        .bind(waypoint.heading_constrained)
        .bind(i64::from(waypoint.control_interval_count))
        .fetch_one(&self.pool)
        .await
        .context("failed to insert waypoint")?;
        Ok(WaypointId(rec.get::<i64, _>(0)))
    }

    pub async fn get_waypoint(&self, id: WaypointId) -> Result<Option<Waypoint>> {
        let row = sqlx::query(&format!(
            "SELECT {WAYPOINT_COLUMNS} FROM waypoints WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| waypoint_from_row(&row)).transpose()
    }

    /// Applies a partial update and returns the resulting waypoint, or `None`
    /// when no waypoint has that id.
    pub async fn update_waypoint(
        &self,
        id: WaypointId,
        update: &WaypointUpdate,
    ) -> Result<Option<Waypoint>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {WAYPOINT_COLUMNS} FROM waypoints WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut waypoint = waypoint_from_row(&row)?;
        waypoint.apply(update);

        sqlx::query(
            "UPDATE waypoints SET x = ?, y = ?, heading = ?, is_initial_guess = ?,
                 translation_constrained = ?, heading_constrained = ?, control_interval_count = ?
             WHERE id = ?",
        )
        .bind(waypoint.x)
        .bind(waypoint.y)
        .bind(waypoint.heading)
        .bind(waypoint.is_initial_guess)
        .bind(waypoint.translation_constrained)
        .bind(waypoint.heading_constrained)
        .bind(i64::from(waypoint.control_interval_count))
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update waypoint {id}"))?;

        tx.commit().await?;
        Ok(Some(waypoint))
    }

    /// Links `wpt_id` after the current tail of `path_id`.
    pub async fn append_path_waypoint(&self, path_id: PathId, wpt_id: WaypointId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO paths (path_id) VALUES (?)")
            .bind(path_id.0)
            .execute(&mut *tx)
            .await?;

        let current_tail: Option<i64> =
            sqlx::query_scalar("SELECT wpt FROM path_waypoints WHERE path = ? AND next IS NULL")
                .bind(path_id.0)
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query("INSERT INTO path_waypoints (path, wpt, prev, next) VALUES (?, ?, ?, NULL)")
            .bind(path_id.0)
            .bind(wpt_id.0)
            .bind(current_tail)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to link waypoint {wpt_id} into path {path_id}"))?;

        if let Some(tail) = current_tail {
            sqlx::query("UPDATE path_waypoints SET next = ? WHERE path = ? AND wpt = ?")
                .bind(wpt_id.0)
                .bind(path_id.0)
                .bind(tail)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(path_id = path_id.0, wpt_id = wpt_id.0, "storage: appended path waypoint");
        Ok(())
    }

    pub async fn path_waypoint_ids(&self, path_id: PathId) -> Result<Vec<WaypointId>> {
        Ok(self
            .path_waypoints(path_id)
            .await?
            .into_iter()
            .map(|waypoint| waypoint.id)
            .collect())
    }

    /// Waypoints of a path in traversal order, walking the list from its head.
    pub async fn path_waypoints(&self, path_id: PathId) -> Result<Vec<Waypoint>> {
        let rows = sqlx::query(&format!(
            "WITH RECURSIVE chain(wpt, next, depth) AS (
                 SELECT wpt, next, 0 FROM path_waypoints WHERE path = ? AND prev IS NULL
                 UNION ALL
                 SELECT m.wpt, m.next, c.depth + 1
                 FROM path_waypoints AS m
                 JOIN chain AS c ON m.wpt = c.next
                 WHERE m.path = ?
             )
             SELECT {WAYPOINT_COLUMNS}
             FROM chain INNER JOIN waypoints ON chain.wpt = waypoints.id
             ORDER BY chain.depth"
        ))
        .bind(path_id.0)
        .bind(path_id.0)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to read waypoints of path {path_id}"))?;

        rows.iter().map(waypoint_from_row).collect()
    }

    /// Unlinks `wpt_id` from `path_id`, relinking its neighbours. The waypoint
    /// row itself is removed once no path references it. Returns `false` when
    /// the waypoint was not on the path.
    pub async fn delete_path_waypoint(&self, path_id: PathId, wpt_id: WaypointId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let links = sqlx::query("SELECT prev, next FROM path_waypoints WHERE path = ? AND wpt = ?")
            .bind(path_id.0)
            .bind(wpt_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(links) = links else {
            return Ok(false);
        };
        let prev: Option<i64> = links.try_get("prev")?;
        let next: Option<i64> = links.try_get("next")?;

        if let Some(prev) = prev {
            sqlx::query("UPDATE path_waypoints SET next = ? WHERE path = ? AND wpt = ?")
                .bind(next)
                .bind(path_id.0)
                .bind(prev)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(next) = next {
            sqlx::query("UPDATE path_waypoints SET prev = ? WHERE path = ? AND wpt = ?")
                .bind(prev)
                .bind(path_id.0)
                .bind(next)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM path_waypoints WHERE path = ? AND wpt = ?")
            .bind(path_id.0)
            .bind(wpt_id.0)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM waypoints WHERE id = ?
             AND NOT EXISTS (SELECT 1 FROM path_waypoints WHERE wpt = ?)",
        )
        .bind(wpt_id.0)
        .bind(wpt_id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(path_id = path_id.0, wpt_id = wpt_id.0, "storage: deleted path waypoint");
        Ok(true)
    }
}

fn waypoint_from_row(row: &SqliteRow) -> Result<Waypoint> {
    let control_interval_count: i64 = row.try_get("control_interval_count")?;
    Ok(Waypoint {
        id: WaypointId(row.try_get("id")?),
        x: row.try_get("x")?,
        y: row.try_get("y")?,
        heading: row.try_get("heading")?,
        is_initial_guess: row.try_get("is_initial_guess")?,
        translation_constrained: row.try_get("translation_constrained")?,
        heading_constrained: row.try_get("heading_constrained")?,
        control_interval_count: u32::try_from(control_interval_count)
            .map_err(|_| anyhow!("control_interval_count out of range: {control_interval_count}"))?,
    })
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

/// Creates the directory a file-backed sqlite url points into. Memory and
/// non-sqlite urls are left alone.
pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
