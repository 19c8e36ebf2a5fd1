//! Rule hook invoked for decoded events before they are persisted.
//!
//! [`BalanceRules`] matches coin balance changes against per-owner rules and
//! publishes an [`Alert`] for every match.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::events::{
    normalize_address, BalanceChangeType, CoinBalanceChange, DecodedEvent, EnvelopeMeta,
};

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Balance change {tx_digest}/{event_seq} has no owner address")]
    MissingOwner { tx_digest: String, event_seq: i64 },

    #[error("Alert channel full, dropped alert for rule {rule}")]
    SinkFull { rule: String },

    #[error("Alert channel closed")]
    SinkClosed,
}

/// Called once per decoded event. Errors are logged by the caller only.
#[async_trait]
pub trait RuleHook: Send + Sync {
    async fn on_decoded_event(
        &self,
        meta: &EnvelopeMeta,
        event: &DecodedEvent,
    ) -> Result<(), RuleError>;
}

/// Conditions on a coin balance change. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceRule {
    pub name: String,
    pub change_type: Option<BalanceChangeType>,
    pub transaction_module: Option<String>,
    pub coin_type: Option<String>,
    /// Lower bound on the absolute amount.
    pub min_amount: Option<u64>,
}

impl BalanceRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_change_type(mut self, change_type: BalanceChangeType) -> Self {
        self.change_type = Some(change_type);
        self
    }

    pub fn with_transaction_module(mut self, module: impl Into<String>) -> Self {
        self.transaction_module = Some(module.into());
        self
    }

    pub fn with_coin_type(mut self, coin_type: impl Into<String>) -> Self {
        self.coin_type = Some(coin_type.into());
        self
    }

    pub fn with_min_amount(mut self, min_amount: u64) -> Self {
        self.min_amount = Some(min_amount);
        self
    }

    pub fn matches(&self, change: &CoinBalanceChange) -> bool {
        self.change_type.map_or(true, |t| t == change.change_type)
            && self
                .transaction_module
                .as_deref()
                .map_or(true, |m| m == change.transaction_module)
            && self
                .coin_type
                .as_deref()
                .map_or(true, |c| c == change.coin_type)
            && self
                .min_amount
                .map_or(true, |min| change.amount.unsigned_abs() >= min)
    }
}

/// A rule match, delivered to the notification front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub rule: String,
    pub owner: String,
    pub tx_digest: String,
    pub event_seq: i64,
    pub timestamp: u64,
    pub change_type: BalanceChangeType,
    pub coin_type: String,
    pub amount: i64,
}

/// Owner-keyed balance-change rules.
///
/// Alerts are offered to the channel without waiting; a full channel drops
/// the alert so a slow consumer never holds up ingestion.
pub struct BalanceRules {
    rules: RwLock<HashMap<String, Vec<BalanceRule>>>,
    alerts: mpsc::Sender<Alert>,
}

impl BalanceRules {
    pub fn new(alerts: mpsc::Sender<Alert>) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            alerts,
        }
    }

    /// Rules plus the receiving end of their alert channel.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Alert>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    pub async fn add_rule(&self, owner: &str, rule: BalanceRule) {
        self.rules
            .write()
            .await
            .entry(normalize_address(owner))
            .or_default()
            .push(rule);
    }

    /// Drop every rule for an owner, returning how many were removed.
    pub async fn remove_rules(&self, owner: &str) -> usize {
        self.rules
            .write()
            .await
            .remove(&normalize_address(owner))
            .map_or(0, |rules| rules.len())
    }

    pub async fn rules_for(&self, owner: &str) -> Vec<BalanceRule> {
        self.rules
            .read()
            .await
            .get(&normalize_address(owner))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RuleHook for BalanceRules {
    async fn on_decoded_event(
        &self,
        meta: &EnvelopeMeta,
        event: &DecodedEvent,
    ) -> Result<(), RuleError> {
        let DecodedEvent::CoinBalanceChange(change) = event else {
            return Ok(());
        };

        let owner = change
            .owner
            .as_ref()
            .and_then(|owner| owner.address())
            .ok_or_else(|| RuleError::MissingOwner {
                tx_digest: meta.tx_digest.clone(),
                event_seq: meta.event_seq,
            })?;

        let matched: Vec<BalanceRule> = self
            .rules_for(&owner)
            .await
            .into_iter()
            .filter(|rule| rule.matches(change))
            .collect();

        for rule in matched {
            debug!(rule = %rule.name, owner = %owner, tx_digest = %meta.tx_digest, "Balance rule matched");
            let alert = Alert {
                rule: rule.name,
                owner: owner.clone(),
                tx_digest: meta.tx_digest.clone(),
                event_seq: meta.event_seq,
                timestamp: meta.timestamp,
                change_type: change.change_type,
                coin_type: change.coin_type.clone(),
                amount: change.amount,
            };
            self.alerts.try_send(alert).map_err(|e| match e {
                TrySendError::Full(alert) => RuleError::SinkFull { rule: alert.rule },
                TrySendError::Closed(_) => RuleError::SinkClosed,
            })?;
        }

        Ok(())
    }
}
