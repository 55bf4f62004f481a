// In crates/engine/src/lib.rs

use app_config::types::{EngineSettings, Settings};
use broker_client::BrokerClient;
use chrono::{NaiveTime, Utc};
use core_types::{AlertStatus, AlertType, OrderSide, OrderTicket, OrderType, Symbol, TradeStatus};
use database::{Alert, Db, NewTrade, Strategy, SubmissionUpdate, User};
use execution::{Executor, LiveExecutor, PaperExecutor, PaperSettings, Submission};
use risk::{AccountSnapshot, PositionExposure, RiskManager, TradeCandidate};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub mod clients;
pub mod consumer;
pub mod error;
pub mod sizing;
pub mod status;

pub use clients::ClientCache;
pub use consumer::QueueConsumer;
pub use error::{Error, Result};

/// Turns incoming alerts into risk-checked, sized, executed trades and keeps
/// trade records reconciled with the broker.
pub struct TradeEngine {
    db: Db,
    risk: RiskManager,
    clients: ClientCache,
    settings: EngineSettings,
}

impl TradeEngine {
    pub fn new(db: Db, settings: &Settings) -> Self {
        TradeEngine {
            db,
            risk: RiskManager::new(settings.risk.clone()),
            clients: ClientCache::new(settings.broker.clone()),
            settings: settings.engine.clone(),
        }
    }

    /// Processes one alert end to end. Returns whether the alert reached a
    /// successful terminal state.
    ///
    /// Never propagates an error: any failure is recorded on the alert (best
    /// effort) so a poisoned alert cannot wedge the consumer loop.
    pub async fn process_alert(&self, alert_id: Uuid) -> bool {
        match self.process_alert_inner(alert_id).await {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!(%alert_id, error = %e, "Alert processing failed");
                if let Err(mark_err) = self.db.mark_alert_failed(alert_id, &e.to_string()).await {
                    tracing::error!(%alert_id, error = %mark_err, "Could not record alert failure");
                }
                false
            }
        }
    }

    async fn process_alert_inner(&self, alert_id: Uuid) -> Result<bool> {
        let Some(alert) = self.db.get_alert(alert_id).await? else {
            tracing::warn!(%alert_id, "Alert not found");
            return Ok(false);
        };

        // The conditional claim is the concurrency gate: redelivered or
        // concurrently-consumed alerts lose the claim and are dropped here.
        if !self.db.claim_alert_for_processing(alert_id).await? {
            tracing::info!(%alert_id, status = ?alert.status, "Alert already claimed, skipping");
            return Ok(lost_claim_is_success(alert.status));
        }

        if !alert.alert_type.is_actionable() {
            let reason = format!("Alert type {:?} is not actionable", alert.alert_type);
            self.db.mark_alert_ignored(alert_id, &reason).await?;
            tracing::info!(%alert_id, %reason, "Alert ignored");
            return Ok(true);
        }

        if alert.is_scan_alert() {
            self.db
                .mark_alert_ignored(alert_id, "Scan alerts are informational only")
                .await?;
            tracing::info!(%alert_id, "Scan alert ignored");
            return Ok(true);
        }

        let Some(user) = self.db.get_user(alert.user_id).await? else {
            self.db
                .mark_alert_failed(alert_id, "Alert owner not found")
                .await?;
            return Ok(false);
        };
        if !user.is_active {
            self.db
                .mark_alert_ignored(alert_id, "User account is inactive")
                .await?;
            return Ok(true);
        }
        if !user.has_broker_credentials() {
            self.db
                .mark_alert_failed(alert_id, "User has no valid broker credentials")
                .await?;
            return Ok(false);
        }

        let strategies = self.db.get_active_strategies(user.id).await?;
        if strategies.is_empty() {
            self.db
                .mark_alert_ignored(alert_id, "No active strategies for user")
                .await?;
            return Ok(true);
        }

        // One strategy's failure must not starve the others; errors are
        // logged per strategy and the alert still completes.
        let mut executed = 0usize;
        for strategy in &strategies {
            match self.execute_for_strategy(&alert, &user, strategy).await {
                Ok(true) => executed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        %alert_id,
                        strategy_id = %strategy.id,
                        error = %e,
                        "Trade execution failed for strategy"
                    );
                }
            }
        }

        match completion_reason(executed) {
            None => {
                self.db.mark_alert_processed(alert_id).await?;
                tracing::info!(%alert_id, executed, strategies = strategies.len(), "Alert processed");
            }
            Some(reason) => {
                self.db.mark_alert_ignored(alert_id, reason).await?;
                tracing::info!(%alert_id, strategies = strategies.len(), %reason, "Alert ignored");
            }
        }
        Ok(true)
    }

    /// Runs the full decision pipeline for one (alert, strategy) pair.
    ///
    /// Returns `Ok(true)` when an order was submitted, `Ok(false)` when the
    /// pair was skipped without error.
    async fn execute_for_strategy(
        &self,
        alert: &Alert,
        user: &User,
        strategy: &Strategy,
    ) -> Result<bool> {
        let client = self.clients.for_user(user).await?;

        if !self.should_execute_trade(strategy, &client).await {
            return Ok(false);
        }

        let symbol = Symbol(alert.symbol.clone());
        // One quote per decision; the alert's own price is the fallback so a
        // quote outage does not silently reprice the trade later.
        let price = match client.get_current_price(&symbol).await.or(alert.price) {
            Some(price) => price,
            None => {
                return Err(Error::NoPrice {
                    symbol: alert.symbol.clone(),
                });
            }
        };

        let side = match alert.alert_type {
            AlertType::Buy => OrderSide::Buy,
            AlertType::Sell => OrderSide::Sell,
            // Non-actionable types were filtered before this point.
            _ => return Ok(false),
        };

        let quantity = self.calculate_position_size(strategy, price, &client).await?;
        if quantity == 0 {
            tracing::warn!(
                strategy_id = %strategy.id,
                symbol = %symbol,
                "Sized to zero shares, skipping"
            );
            return Ok(false);
        }

        // Fail closed: if the snapshot cannot be assembled, the `?` aborts
        // before any trade row exists.
        let snapshot = self.account_snapshot(user.id, &alert.symbol).await?;
        let candidate = TradeCandidate {
            side,
            quantity,
            price,
        };
        if let Err(risk::Error::Vetoed { reason }) =
            self.risk.check_risk_limits(&candidate, &snapshot)
        {
            tracing::warn!(
                strategy_id = %strategy.id,
                symbol = %symbol,
                %reason,
                "Trade vetoed by risk limits"
            );
            // Persist the veto for the audit trail.
            self.db
                .insert_trade(&NewTrade {
                    user_id: user.id,
                    strategy_id: strategy.id,
                    alert_id: Some(alert.id),
                    symbol: alert.symbol.clone(),
                    exchange: alert.exchange.clone(),
                    side,
                    order_type: OrderType::Market,
                    quantity,
                    price: Some(price),
                    status: TradeStatus::RiskRejected,
                    notes: Some(reason),
                })
                .await?;
            return Ok(false);
        }

        let trade = self
            .db
            .insert_trade(&NewTrade {
                user_id: user.id,
                strategy_id: strategy.id,
                alert_id: Some(alert.id),
                symbol: alert.symbol.clone(),
                exchange: alert.exchange.clone(),
                side,
                order_type: OrderType::Market,
                quantity,
                price: Some(price),
                status: TradeStatus::Pending,
                notes: None,
            })
            .await?;

        let executor: Box<dyn Executor> = if strategy.is_paper_trading {
            Box::new(PaperExecutor::new(PaperSettings {
                fill_delay_ms: self.settings.paper_fill_delay_ms,
            }))
        } else {
            Box::new(LiveExecutor::new(client.clone()))
        };

        match executor.submit(&order_ticket(&symbol, alert, side, quantity, price)).await {
            Ok(submission) => {
                let update = match submission {
                    Submission::Filled {
                        filled_quantity,
                        average_price,
                    } => SubmissionUpdate::Filled {
                        filled_quantity,
                        average_price,
                    },
                    Submission::Accepted {
                        order_id,
                        status,
                        message,
                    } => SubmissionUpdate::Accepted {
                        order_id,
                        status,
                        message,
                    },
                };
                self.db
                    .record_trade_submitted(trade.id, strategy.id, &update)
                    .await?;
                tracing::info!(
                    trade_id = %trade.id,
                    executor = executor.name(),
                    symbol = %symbol,
                    quantity,
                    "Trade submitted"
                );
                Ok(true)
            }
            Err(e) => {
                tracing::error!(trade_id = %trade.id, error = %e, "Executor failed to submit order");
                self.db.record_trade_failed(trade.id).await?;
                Err(e.into())
            }
        }
    }

    /// Market-hours gate. Paper strategies trade any time; live strategies
    /// skip when the market is known to be closed, but a failed status check
    /// does not block (the broker rejects off-hours orders itself).
    async fn should_execute_trade(&self, strategy: &Strategy, client: &BrokerClient) -> bool {
        if strategy.is_paper_trading {
            return true;
        }
        match client.is_market_open().await {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!(strategy_id = %strategy.id, "Market is closed, skipping live trade");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Market status check failed, proceeding");
                true
            }
        }
    }

    /// Resolves the strategy's sizing rule into a share count, fetching
    /// available funds only when the rule needs them.
    async fn calculate_position_size(
        &self,
        strategy: &Strategy,
        price: Decimal,
        client: &BrokerClient,
    ) -> Result<i64> {
        let rule = strategy.position_sizing.0.resolve();
        let available_funds = if sizing::needs_funds(rule) {
            client.get_funds().await?.fund_limit
        } else {
            Decimal::ZERO
        };
        Ok(sizing::resolve_quantity(
            rule,
            price,
            available_funds,
            strategy.max_position_size,
        ))
    }

    /// Assembles today's account activity for the risk check.
    async fn account_snapshot(&self, user_id: Uuid, symbol: &str) -> Result<AccountSnapshot> {
        let day_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let stats = self.db.daily_trade_stats(user_id, day_start).await?;
        let position = self
            .db
            .get_position(user_id, symbol)
            .await?
            .map(|position| PositionExposure {
                quantity: position.quantity,
            });
        Ok(AccountSnapshot {
            daily_filled_trades: stats.filled_count,
            daily_realized_loss: stats.realized_loss,
            position,
        })
    }

    /// Reconciles one trade with the broker's authoritative order state.
    ///
    /// Idempotent: re-running against an unchanged broker state rewrites the
    /// same values. Returns whether a reconciliation was performed.
    pub async fn update_trade_status(&self, trade_id: Uuid) -> Result<bool> {
        let Some(mut trade) = self.db.get_trade(trade_id).await? else {
            tracing::warn!(%trade_id, "Trade not found");
            return Ok(false);
        };
        let Some(order_id) = trade.broker_order_id.clone() else {
            tracing::debug!(%trade_id, "Trade has no broker order id, nothing to reconcile");
            return Ok(false);
        };
        let Some(user) = self.db.get_user(trade.user_id).await? else {
            tracing::warn!(%trade_id, "Trade owner not found");
            return Ok(false);
        };

        let client = self.clients.for_user(&user).await?;
        let order_status = client.get_order_status(&order_id).await?;
        status::apply_broker_status(&mut trade, &order_status, Utc::now());
        self.db.save_trade_reconciliation(&trade).await?;

        tracing::info!(%trade_id, status = ?trade.status, "Trade reconciled with broker");
        Ok(true)
    }
}

/// Outcome of losing the processing claim under at-least-once delivery.
///
/// A redelivery of an alert that already reached a terminal state is finished
/// work and counts as success; losing a live race (another consumer holds the
/// claim) does not.
fn lost_claim_is_success(status: AlertStatus) -> bool {
    status.is_terminal()
}

/// Terminal transition for an alert whose strategies have all been tried:
/// at least one submitted trade makes it processed, none makes it ignored
/// with the reason recorded.
fn completion_reason(executed: usize) -> Option<&'static str> {
    if executed == 0 {
        Some("No trades executed")
    } else {
        None
    }
}

fn order_ticket(
    symbol: &Symbol,
    alert: &Alert,
    side: OrderSide,
    quantity: i64,
    price: Decimal,
) -> OrderTicket {
    OrderTicket {
        symbol: symbol.clone(),
        exchange: alert.exchange.clone(),
        side,
        order_type: OrderType::Market,
        quantity,
        price: Some(price),
    }
}

/// Shared handle used by the consumer and the web server.
pub type SharedEngine = Arc<TradeEngine>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redelivered_terminal_alerts_count_as_success() {
        assert!(lost_claim_is_success(AlertStatus::Processed));
        assert!(lost_claim_is_success(AlertStatus::Failed));
        assert!(lost_claim_is_success(AlertStatus::Ignored));
    }

    #[test]
    fn losing_a_live_claim_race_is_not_success() {
        assert!(!lost_claim_is_success(AlertStatus::Received));
        assert!(!lost_claim_is_success(AlertStatus::Processing));
    }

    #[test]
    fn alerts_without_a_single_trade_end_ignored() {
        assert_eq!(completion_reason(0), Some("No trades executed"));
        assert_eq!(completion_reason(1), None);
        assert_eq!(completion_reason(3), None);
    }
}
