// In crates/database/src/lib.rs

use app_config::types::DatabaseSettings;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};
use uuid::Uuid;

pub mod error;
pub mod models;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use models::{
    Alert, DailyTradeStats, NewTrade, PortfolioPosition, Strategy, SubmissionUpdate, Trade, User,
};

/// A wrapper around the `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct Db(PgPool);

/// Establishes a connection pool to the PostgreSQL database and runs migrations.
pub async fn connect(settings: &DatabaseSettings) -> Result<Db> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        // The `?` operator uses the `#[from]` attribute in our error enum
        // to automatically convert the `sqlx::Error` into a `database::Error`.
        .connect(&settings.url)
        .await?;

    // Run database migrations. This ensures the database schema is up-to-date.
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(Error::from)?;

    Ok(Db(pool))
}

impl Db {
    // --- Alerts ---

    pub async fn get_alert(&self, alert_id: Uuid) -> Result<Option<Alert>> {
        sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1")
            .bind(alert_id)
            .fetch_optional(&self.0)
            .await
            .map_err(Error::OperationFailed)
    }

    /// Attempts to claim an alert for processing.
    ///
    /// The transition `received -> processing` is conditional on the current
    /// status; the affected-row count is the lock-acquisition signal, so two
    /// consumers racing on the same alert id cannot both win.
    pub async fn claim_alert_for_processing(&self, alert_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE alerts SET status = 'processing', updated_at = now() \
             WHERE id = $1 AND status = 'received'",
        )
        .bind(alert_id)
        .execute(&self.0)
        .await
        .map_err(Error::OperationFailed)?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_alert_processed(&self, alert_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE alerts SET status = 'processed', processed_at = now(), updated_at = now() \
             WHERE id = $1",
        )
        .bind(alert_id)
        .execute(&self.0)
        .await
        .map_err(Error::OperationFailed)?;
        Ok(())
    }

    pub async fn mark_alert_ignored(&self, alert_id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            "UPDATE alerts SET status = 'ignored', error_message = $2, processed_at = now(), \
             updated_at = now() WHERE id = $1",
        )
        .bind(alert_id)
        .bind(reason)
        .execute(&self.0)
        .await
        .map_err(Error::OperationFailed)?;
        Ok(())
    }

    pub async fn mark_alert_failed(&self, alert_id: Uuid, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE alerts SET status = 'failed', error_message = $2, processed_at = now(), \
             updated_at = now() WHERE id = $1",
        )
        .bind(alert_id)
        .bind(error_message)
        .execute(&self.0)
        .await
        .map_err(Error::OperationFailed)?;
        Ok(())
    }

    pub async fn recent_alerts(&self, limit: i64) -> Result<Vec<Alert>> {
        sqlx::query_as::<_, Alert>("SELECT * FROM alerts ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.0)
            .await
            .map_err(Error::OperationFailed)
    }

    // --- Users & strategies ---

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.0)
            .await
            .map_err(Error::OperationFailed)
    }

    /// Active strategies for a user, in stable creation order.
    pub async fn get_active_strategies(&self, user_id: Uuid) -> Result<Vec<Strategy>> {
        sqlx::query_as::<_, Strategy>(
            "SELECT * FROM strategies WHERE user_id = $1 AND is_active ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.0)
        .await
        .map_err(Error::OperationFailed)
    }

    // --- Trades ---

    pub async fn insert_trade(&self, new_trade: &NewTrade) -> Result<Trade> {
        sqlx::query_as::<_, Trade>(
            r#"
            INSERT INTO trades (
                user_id, strategy_id, alert_id, symbol, exchange,
                side, order_type, quantity, price, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new_trade.user_id)
        .bind(new_trade.strategy_id)
        .bind(new_trade.alert_id)
        .bind(&new_trade.symbol)
        .bind(&new_trade.exchange)
        .bind(new_trade.side)
        .bind(new_trade.order_type)
        .bind(new_trade.quantity)
        .bind(new_trade.price)
        .bind(new_trade.status)
        .bind(&new_trade.notes)
        .fetch_one(&self.0)
        .await
        .map_err(Error::OperationFailed)
    }

    pub async fn get_trade(&self, trade_id: Uuid) -> Result<Option<Trade>> {
        sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1")
            .bind(trade_id)
            .fetch_optional(&self.0)
            .await
            .map_err(Error::OperationFailed)
    }

    /// Records a successful executor dispatch and the strategy's submission
    /// accounting in one transaction, so a failure partway leaves neither a
    /// half-updated trade nor a phantom counter bump.
    pub async fn record_trade_submitted(
        &self,
        trade_id: Uuid,
        strategy_id: Uuid,
        update: &SubmissionUpdate,
    ) -> Result<()> {
        let mut tx = self.0.begin().await.map_err(Error::OperationFailed)?;

        match update {
            SubmissionUpdate::Filled {
                filled_quantity,
                average_price,
            } => {
                sqlx::query(
                    r#"
                    UPDATE trades SET
                        status = 'filled', submitted_at = now(), filled_at = now(),
                        filled_quantity = $2, average_price = $3, total_amount = $4,
                        broker_status = 'filled', updated_at = now()
                    WHERE id = $1
                    "#,
                )
                .bind(trade_id)
                .bind(filled_quantity)
                .bind(average_price)
                .bind(Decimal::from(*filled_quantity) * *average_price)
                .execute(&mut *tx)
                .await
                .map_err(Error::OperationFailed)?;
            }
            SubmissionUpdate::Accepted {
                order_id,
                status,
                message,
            } => {
                sqlx::query(
                    r#"
                    UPDATE trades SET
                        status = 'submitted', submitted_at = now(),
                        broker_order_id = $2, broker_status = $3, broker_message = $4,
                        updated_at = now()
                    WHERE id = $1
                    "#,
                )
                .bind(trade_id)
                .bind(order_id)
                .bind(status)
                .bind(message)
                .execute(&mut *tx)
                .await
                .map_err(Error::OperationFailed)?;
            }
        }

        record_strategy_submission(&mut tx, strategy_id).await?;

        tx.commit().await.map_err(Error::OperationFailed)?;
        Ok(())
    }

    pub async fn record_trade_failed(&self, trade_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE trades SET status = 'failed', updated_at = now() WHERE id = $1")
            .bind(trade_id)
            .execute(&self.0)
            .await
            .map_err(Error::OperationFailed)?;
        Ok(())
    }

    /// Persists the reconciliation-relevant fields of a trade.
    pub async fn save_trade_reconciliation(&self, trade: &Trade) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE trades SET
                status = $2, broker_status = $3, filled_quantity = $4,
                average_price = $5, total_amount = $6, filled_at = $7,
                cancelled_at = $8, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(trade.id)
        .bind(trade.status)
        .bind(&trade.broker_status)
        .bind(trade.filled_quantity)
        .bind(trade.average_price)
        .bind(trade.total_amount)
        .bind(trade.filled_at)
        .bind(trade.cancelled_at)
        .execute(&self.0)
        .await
        .map_err(Error::OperationFailed)?;
        Ok(())
    }

    /// Count and realized loss of today's settled trades for a user.
    pub async fn daily_trade_stats(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<DailyTradeStats> {
        sqlx::query_as::<_, DailyTradeStats>(
            r#"
            SELECT
                COUNT(*) AS filled_count,
                COALESCE(SUM(CASE WHEN net_pnl < 0 THEN net_pnl ELSE 0 END), 0) AS realized_loss
            FROM trades
            WHERE user_id = $1
              AND created_at >= $2
              AND status IN ('filled', 'partially_filled')
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.0)
        .await
        .map_err(Error::OperationFailed)
    }

    pub async fn recent_trades(&self, limit: i64) -> Result<Vec<Trade>> {
        sqlx::query_as::<_, Trade>("SELECT * FROM trades ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.0)
            .await
            .map_err(Error::OperationFailed)
    }

    // --- Portfolio ---

    pub async fn get_position(
        &self,
        user_id: Uuid,
        symbol: &str,
    ) -> Result<Option<PortfolioPosition>> {
        sqlx::query_as::<_, PortfolioPosition>(
            "SELECT * FROM portfolio_positions WHERE user_id = $1 AND symbol = $2",
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_optional(&self.0)
        .await
        .map_err(Error::OperationFailed)
    }
}

/// The single place where submission-time strategy accounting happens.
///
/// Counters bump when an order is submitted, not when it fills; a
/// submitted-but-never-filled order still counts as executed. Changing that
/// policy means changing this function only.
async fn record_strategy_submission(
    tx: &mut Transaction<'_, Postgres>,
    strategy_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE strategies SET total_trades = total_trades + 1, last_executed_at = now(), \
         updated_at = now() WHERE id = $1",
    )
    .bind(strategy_id)
    .execute(&mut **tx)
    .await
    .map_err(Error::OperationFailed)?;
    Ok(())
}
