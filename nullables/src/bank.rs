//! Nullable bank: a minimal transfer handler for exercising proposal
//! execution.
//!
//! Balances live in the same [`KvStore`] as the group state, under their own
//! table prefix, so a failed execution rolls back transfers together with
//! everything else.

use cohort_group::{Action, ActionError, ActionHandler};
use cohort_store::{KvStore, StoreError};
use cohort_types::Address;
use serde::{Deserialize, Serialize};

const BALANCE: u8 = 0xB0;

/// Payload of a `/bank.Send` action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayload {
    pub from: Address,
    pub to: Address,
    pub amount: u128,
}

/// Moves balance between accounts. The sender is the only required signer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBank;

impl NullBank {
    pub const TYPE_URL: &'static str = "/bank.Send";

    pub fn send_action(from: &Address, to: &Address, amount: u128) -> Result<Action, ActionError> {
        let payload = SendPayload {
            from: from.clone(),
            to: to.clone(),
            amount,
        };
        let bytes =
            bincode::serialize(&payload).map_err(|e| ActionError::Malformed(e.to_string()))?;
        Ok(Action::new(Self::TYPE_URL, bytes))
    }

    pub fn balance(store: &dyn KvStore, account: &Address) -> Result<u128, StoreError> {
        let Some(raw) = store.get(&balance_key(account))? else {
            return Ok(0);
        };
        let bytes: [u8; 16] = raw
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Corruption(format!("balance of {account}")))?;
        Ok(u128::from_be_bytes(bytes))
    }

    /// Credit `amount` to `account` out of thin air.
    pub fn fund(store: &mut dyn KvStore, account: &Address, amount: u128) -> Result<(), StoreError> {
        let current = Self::balance(store, account)?;
        let next = current
            .checked_add(amount)
            .ok_or_else(|| StoreError::Backend("balance overflow".into()))?;
        store.put(&balance_key(account), &next.to_be_bytes())
    }

    fn decode(payload: &[u8]) -> Result<SendPayload, ActionError> {
        bincode::deserialize(payload).map_err(|e| ActionError::Malformed(e.to_string()))
    }
}

fn balance_key(account: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + account.as_bytes().len());
    key.push(BALANCE);
    key.extend_from_slice(account.as_bytes());
    key
}

impl ActionHandler for NullBank {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn required_signers(&self, payload: &[u8]) -> Result<Vec<Address>, ActionError> {
        Ok(vec![Self::decode(payload)?.from])
    }

    fn execute(&self, store: &mut dyn KvStore, payload: &[u8]) -> Result<(), ActionError> {
        let send = Self::decode(payload)?;
        let from_balance = Self::balance(store, &send.from)?;
        if from_balance < send.amount {
            return Err(ActionError::Failed(format!(
                "insufficient funds: {} has {from_balance}, needs {}",
                send.from, send.amount
            )));
        }
        store.put(
            &balance_key(&send.from),
            &(from_balance - send.amount).to_be_bytes(),
        )?;
        let to_balance = Self::balance(store, &send.to)?;
        let credited = to_balance
            .checked_add(send.amount)
            .ok_or_else(|| ActionError::Failed("balance overflow".into()))?;
        store.put(&balance_key(&send.to), &credited.to_be_bytes())?;
        Ok(())
    }
}
