use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "customer_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

impl Customer {
    // Look up an active account by email
    pub async fn find_by_email(email: &str, db: &crate::database::Database) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, username, email, password_hash, role, is_active
             FROM customers
             WHERE email = $1 AND is_active = true"
        )
        .bind(email)
        .fetch_optional(&db.pool)
        .await
    }

    // bcrypt is CPU bound, run it on the blocking pool
    pub async fn verify_password(&self, password: &str) -> bool {
        let password = password.to_owned();
        let hash = self.password_hash.clone();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }
}
