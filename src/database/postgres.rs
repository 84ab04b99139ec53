use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{Board, PasswordHash, Pin, PinType, User};
use super::store::{EntityStore, PinQuery};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    avatar: String,
    bio: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: PasswordHash::new(row.password_hash),
            avatar: row.avatar,
            bio: row.bio,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BoardRow {
    id: Uuid,
    title: String,
    description: String,
    owner_id: Uuid,
    collaborators: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Board {
            id: row.id,
            title: row.title,
            description: row.description,
            owner_id: row.owner_id,
            collaborators: row.collaborators,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PinRow {
    id: Uuid,
    board_id: Uuid,
    pin_type: String,
    content_url: String,
    title: String,
    tags: Vec<String>,
    creator_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PinRow> for Pin {
    type Error = DatabaseError;

    fn try_from(row: PinRow) -> Result<Self, Self::Error> {
        let pin_type: PinType = row
            .pin_type
            .parse()
            .map_err(|e| DatabaseError::Corrupt(format!("pin {}: {}", row.id, e)))?;
        Ok(Pin {
            id: row.id,
            board_id: row.board_id,
            pin_type,
            content_url: row.content_url,
            title: row.title,
            tags: row.tags,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, avatar, bio, created_at, updated_at";
const BOARD_COLUMNS: &str = "id, title, description, owner_id, collaborators, created_at, updated_at";
const PIN_COLUMNS: &str =
    "id, board_id, pin_type, content_url, title, tags, creator_id, created_at, updated_at";

/// PostgreSQL-backed entity store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error, field: &'static str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Duplicate(field),
        _ => DatabaseError::Sqlx(err),
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, avatar, bio, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), DatabaseError> {
        // email and password are not writable through this path
        let result = sqlx::query(
            "UPDATE users SET name = $2, avatar = $3, bio = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::Corrupt(format!("user {} does not exist", user.id)));
        }
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn save_board(&self, board: &Board) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO boards (id, title, description, owner_id, collaborators, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 description = EXCLUDED.description, \
                 collaborators = EXCLUDED.collaborators, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(board.id)
        .bind(&board.title)
        .bind(&board.description)
        .bind(board.owner_id)
        .bind(&board.collaborators)
        .bind(board.created_at)
        .bind(board.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn board_by_id(&self, id: Uuid) -> Result<Option<Board>, DatabaseError> {
        let sql = format!("SELECT {} FROM boards WHERE id = $1", BOARD_COLUMNS);
        let row = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Board::from))
    }

    async fn boards_for_member(&self, user_id: Uuid) -> Result<Vec<Board>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM boards WHERE owner_id = $1 OR $1 = ANY(collaborators) ORDER BY created_at DESC",
            BOARD_COLUMNS
        );
        let rows = sqlx::query_as::<_, BoardRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Board::from).collect())
    }

    async fn delete_board(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_pin(&self, pin: &Pin) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO pins (id, board_id, pin_type, content_url, title, tags, creator_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                 pin_type = EXCLUDED.pin_type, \
                 content_url = EXCLUDED.content_url, \
                 title = EXCLUDED.title, \
                 tags = EXCLUDED.tags, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(pin.id)
        .bind(pin.board_id)
        .bind(pin.pin_type.as_str())
        .bind(&pin.content_url)
        .bind(&pin.title)
        .bind(&pin.tags)
        .bind(pin.creator_id)
        .bind(pin.created_at)
        .bind(pin.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pin_by_id(&self, id: Uuid) -> Result<Option<Pin>, DatabaseError> {
        let sql = format!("SELECT {} FROM pins WHERE id = $1", PIN_COLUMNS);
        let row = sqlx::query_as::<_, PinRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Pin::try_from).transpose()
    }

    async fn find_pins(&self, query: &PinQuery) -> Result<Vec<Pin>, DatabaseError> {
        if query.board_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM pins \
             WHERE board_id = ANY($1) \
               AND ($2::text IS NULL OR $2 = ANY(tags)) \
               AND ($3::text IS NULL OR pin_type = $3) \
             ORDER BY created_at DESC",
            PIN_COLUMNS
        );
        let rows = sqlx::query_as::<_, PinRow>(&sql)
            .bind(&query.board_ids)
            .bind(query.tag.as_deref())
            .bind(query.pin_type.map(|t| t.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Pin::try_from).collect()
    }

    async fn delete_pin(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM pins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
