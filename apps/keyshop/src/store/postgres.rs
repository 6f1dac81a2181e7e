// keyshop/src/store/postgres.rs

use crate::errors::{AppError, Result};
use crate::models::{NewUser, Payment, PaymentStatus, User};
use crate::store::{CheckoutStore, Fulfillment, NewPayment};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const USER_COLUMNS: &str =
  "id, email, name, username, password_hash, country, postcode, address, phone, created_at, updated_at";
const PAYMENT_COLUMNS: &str =
  "id, user_id, amount, currency, status, gateway_reference, license_key, created_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Applies the bundled migrations in `migrations/`.
  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }

  async fn insert_payment(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    payment: &NewPayment,
  ) -> Result<Payment> {
    let sql = format!(
      "INSERT INTO payments (id, user_id, amount, currency, status, gateway_reference, license_key) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      PAYMENT_COLUMNS
    );
    let row = sqlx::query_as::<_, Payment>(&sql)
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(payment.amount)
      .bind(&payment.currency)
      .bind(PaymentStatus::Success)
      .bind(&payment.gateway_reference)
      .bind(&payment.license_key)
      .fetch_one(&mut **tx)
      .await?;
    Ok(row)
  }
}

fn unique_violation_to_conflict(err: sqlx::Error, what: &str) -> AppError {
  match &err {
    sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
      AppError::Conflict(format!("An account with this {} already exists.", what))
    }
    _ => AppError::Sqlx(err),
  }
}

#[async_trait]
impl CheckoutStore for PgStore {
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
      .bind(email)
      .fetch_optional(&self.pool)
      .await?;
    Ok(user)
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?;
    Ok(user)
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
      .bind(username)
      .fetch_optional(&self.pool)
      .await?;
    Ok(user)
  }

  #[instrument(name = "PgStore::register_user", skip(self, user), fields(email = %user.email))]
  async fn register_user(&self, user: NewUser) -> Result<User> {
    let sql = format!(
      "INSERT INTO users (id, email, name, username, password_hash, country, postcode, address, phone) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(Uuid::new_v4())
      .bind(&user.email)
      .bind(&user.name)
      .bind(&user.username)
      .bind(&user.password_hash)
      .bind(&user.country)
      .bind(&user.postcode)
      .bind(&user.address)
      .bind(&user.phone)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| unique_violation_to_conflict(e, "email or username"))
  }

  #[instrument(name = "PgStore::fulfill", skip(self, buyer, payment), fields(email = %buyer.email, amount = payment.amount))]
  async fn fulfill(&self, buyer: NewUser, payment: NewPayment) -> Result<Fulfillment> {
    payment.validate()?;
    let mut tx = self.pool.begin().await?;

    // Concurrent checkouts for one email: the loser's insert does nothing
    // and the re-read below sees the winner's row.
    let insert_sql = format!(
      "INSERT INTO users (id, email, name, username, password_hash, country, postcode, address, phone) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT (email) DO NOTHING RETURNING {}",
      USER_COLUMNS
    );
    let inserted = sqlx::query_as::<_, User>(&insert_sql)
      .bind(Uuid::new_v4())
      .bind(&buyer.email)
      .bind(&buyer.name)
      .bind(&buyer.username)
      .bind(&buyer.password_hash)
      .bind(&buyer.country)
      .bind(&buyer.postcode)
      .bind(&buyer.address)
      .bind(&buyer.phone)
      .fetch_optional(&mut *tx)
      .await
      .map_err(|e| unique_violation_to_conflict(e, "username"))?;

    let (user, user_created) = match inserted {
      Some(user) => (user, true),
      None => {
        let select_sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&select_sql)
          .bind(&buyer.email)
          .fetch_one(&mut *tx)
          .await?;
        (user, false)
      }
    };
    debug!(user_id = %user.id, user_created, "Buyer resolved.");

    let payment = Self::insert_payment(&mut tx, user.id, &payment).await?;
    tx.commit().await?;
    info!(payment_id = %payment.id, user_id = %user.id, "Fulfillment committed.");

    Ok(Fulfillment {
      user,
      payment,
      user_created,
    })
  }

  async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>> {
    let sql = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
    let payment = sqlx::query_as::<_, Payment>(&sql).bind(id).fetch_optional(&self.pool).await?;
    Ok(payment)
  }

  async fn payments_for_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
    let sql = format!(
      "SELECT {} FROM payments WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
      PAYMENT_COLUMNS
    );
    let payments = sqlx::query_as::<_, Payment>(&sql).bind(user_id).fetch_all(&self.pool).await?;
    Ok(payments)
  }
}
