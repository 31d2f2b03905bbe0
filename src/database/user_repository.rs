use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// User entity from the identity/referral directory.
///
/// This service only reads users: token subjects are resolved to accounts and
/// referral codes to interns. Account management lives in the identity
/// service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub referral_code: String,
    pub role: String,
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, referral_code, role";

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_referral_code(&self, code: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE referral_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }
}
