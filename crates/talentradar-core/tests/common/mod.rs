//! A small ledger aggregate used to exercise the runtime end to end.

#![allow(dead_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use talentradar_core::aggregate::Aggregate;
use talentradar_core::command::{Changes, Command};
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::{Event, EventPayload};
use uuid::Uuid;

pub const ACCOUNT_OPENED: &str = "account.opened";
pub const ACCOUNT_DEPOSITED: &str = "account.deposited";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub owner: String,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountEvent {
    Opened {
        id: Uuid,
        organization_id: Option<Uuid>,
        owner: String,
    },
    Deposited {
        amount: i64,
    },
}

impl EventPayload for AccountEvent {
    const EVENT_TYPES: &'static [&'static str] = &[ACCOUNT_OPENED, ACCOUNT_DEPOSITED];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Opened { .. } => ACCOUNT_OPENED,
            Self::Deposited { .. } => ACCOUNT_DEPOSITED,
        }
    }
}

impl Aggregate for Account {
    const AGGREGATE_TYPE: &'static str = "account";
    const TOPIC: &'static str = "events.accounts";
    const TABLE_NAME: &'static str = "accounts";
    type Event = AccountEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        self.organization_id
    }

    fn apply(&mut self, event: &Event<AccountEvent>) {
        match &event.data {
            AccountEvent::Opened {
                id,
                organization_id,
                owner,
            } => {
                self.id = *id;
                self.organization_id = *organization_id;
                self.owner.clone_from(owner);
            }
            AccountEvent::Deposited { amount } => self.balance += amount,
        }
    }
}

/// Opens an account and optionally makes initial deposits in the same call.
#[derive(Debug)]
pub struct OpenAccount {
    pub owner: String,
    pub deposits: Vec<i64>,
}

#[async_trait]
impl Command for OpenAccount {
    type Aggregate = Account;

    fn command_type(&self) -> &'static str {
        "account.open"
    }

    async fn validate(&self, _ctx: &Context, _account: &Account) -> Result<(), DomainError> {
        if self.owner.trim().is_empty() {
            return Err(DomainError::validation("owner is required"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Account>,
    ) -> Result<(), DomainError> {
        changes.apply(AccountEvent::Opened {
            id: Uuid::now_v7(),
            organization_id: ctx.identity().organization_id,
            owner: self.owner.clone(),
        });
        for amount in &self.deposits {
            changes.apply(AccountEvent::Deposited { amount: *amount });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Deposit {
    pub amount: i64,
}

#[async_trait]
impl Command for Deposit {
    type Aggregate = Account;

    fn command_type(&self) -> &'static str {
        "account.deposit"
    }

    async fn validate(&self, _ctx: &Context, account: &Account) -> Result<(), DomainError> {
        if account.id.is_nil() {
            return Err(DomainError::validation("account is not open"));
        }
        if self.amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        Ok(())
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Account>,
    ) -> Result<(), DomainError> {
        changes.apply(AccountEvent::Deposited {
            amount: self.amount,
        });
        Ok(())
    }
}

/// Records a deposit, then fails.
#[derive(Debug)]
pub struct DepositThenFail;

#[async_trait]
impl Command for DepositThenFail {
    type Aggregate = Account;

    fn command_type(&self) -> &'static str {
        "account.deposit_then_fail"
    }

    async fn perform(
        &self,
        _ctx: &Context,
        changes: &mut Changes<'_, Account>,
    ) -> Result<(), DomainError> {
        changes.apply(AccountEvent::Deposited { amount: 100 });
        Err(DomainError::Collaborator("ledger offline".into()))
    }
}

/// Decides nothing happened.
#[derive(Debug)]
pub struct Touch;

#[async_trait]
impl Command for Touch {
    type Aggregate = Account;

    fn command_type(&self) -> &'static str {
        "account.touch"
    }

    async fn perform(
        &self,
        _ctx: &Context,
        _changes: &mut Changes<'_, Account>,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}
