//! Escrow ledger — holds a buyer's deposit until it is released.
//!
//! One record per (buyer, seller, asset). The buyer may approve the release
//! or cancel and take the funds back; the seller may withdraw once the buyer
//! approves, or unconditionally once the timeout has elapsed.
//!
//! Outbound transfers happen strictly after the record is cleared. If the
//! ledger reports failure the record is put back and the call fails, so
//! custody and bookkeeping never disagree.

use std::{cell::RefCell, collections::BTreeMap};

use openbond_runtime::ReentrancyLock;
use openbond_types::{
    AccountId, AssetId, CallContext, EngineEvent, EscrowConfig, EscrowKey, EscrowRecord, EventLog,
    EventRecord, FungibleLedger, OpenbondError, Result, Timestamp,
};

#[derive(Debug, Default)]
struct EscrowBook {
    /// Live records only; a zeroed record is removed.
    records: BTreeMap<EscrowKey, EscrowRecord>,
    events: EventLog,
}

/// Deposit / approve / cancel / withdraw engine.
pub struct EscrowLedger {
    config: EscrowConfig,
    book: RefCell<EscrowBook>,
    lock: ReentrancyLock,
}

impl EscrowLedger {
    /// Create an empty escrow.
    ///
    /// # Errors
    /// Returns `Configuration` if the config does not validate.
    pub fn new(config: EscrowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            book: RefCell::new(EscrowBook::default()),
            lock: ReentrancyLock::new(),
        })
    }

    /// Pull `amount` of `asset` from the caller and hold it for `seller`.
    ///
    /// The stored amount is what the escrow account actually received,
    /// measured as the change in its own balance. A previous record for the
    /// same triple is overwritten, not added to.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0` or nothing arrived
    /// - `ZeroAddress` if `asset` or `seller` is null
    /// - `TransferFailed` if the ledger refuses the pull
    /// - `ArithmeticOverflow` if the escrow balance went down during the pull
    /// - `ReentrantCall` if invoked from inside another escrow call
    pub fn deposit(
        &self,
        ctx: CallContext,
        ledger: &dyn FungibleLedger,
        asset: AssetId,
        seller: AccountId,
        amount: u128,
    ) -> Result<u128> {
        let _guard = self.lock.enter()?;

        if amount == 0 {
            return Err(OpenbondError::ZeroAmount);
        }
        if asset.is_zero() || seller.is_zero() {
            return Err(OpenbondError::ZeroAddress);
        }

        let before = ledger.balance_of(asset, self.config.account);
        if !ledger.transfer_from(asset, self.config.account, ctx.caller, self.config.account, amount)
        {
            tracing::warn!(buyer = %ctx.caller, asset = %asset, amount, "Deposit aborted: pull failed");
            return Err(OpenbondError::TransferFailed);
        }
        let after = ledger.balance_of(asset, self.config.account);
        let received = after
            .checked_sub(before)
            .ok_or(OpenbondError::ArithmeticOverflow)?;
        if received == 0 {
            return Err(OpenbondError::ZeroAmount);
        }

        let key = EscrowKey::new(ctx.caller, seller, asset);
        let record = EscrowRecord {
            amount: received,
            approved: false,
            created_at: ctx.now,
        };

        let mut book = self.book.borrow_mut();
        if let Some(previous) = book.records.insert(key, record) {
            tracing::warn!(
                escrow = %key,
                previous = previous.amount,
                replacement = received,
                "Live deposit overwritten"
            );
        }
        book.events.emit(
            ctx.now,
            EngineEvent::Deposited {
                buyer: ctx.caller,
                seller,
                asset,
                amount: received,
            },
        );

        tracing::info!(escrow = %key, requested = amount, received, "Deposit held");
        Ok(received)
    }

    /// Buyer releases the funds to `seller`. Approving twice is a no-op.
    ///
    /// # Errors
    /// - `NotAuthorizedOrNoDepositFound` without a live record
    /// - `ReentrantCall` if invoked from inside another escrow call
    pub fn approve_withdraw(&self, ctx: CallContext, asset: AssetId, seller: AccountId) -> Result<()> {
        let _guard = self.lock.enter()?;

        let key = EscrowKey::new(ctx.caller, seller, asset);
        let mut book = self.book.borrow_mut();
        let record = book
            .records
            .get_mut(&key)
            .filter(|r| r.is_live())
            .ok_or(OpenbondError::NotAuthorizedOrNoDepositFound)?;

        if record.approved {
            return Ok(());
        }
        record.approved = true;
        book.events.emit(
            ctx.now,
            EngineEvent::WithdrawApproved {
                buyer: ctx.caller,
                seller,
                asset,
            },
        );

        tracing::info!(escrow = %key, "Withdraw approved");
        Ok(())
    }

    /// Buyer takes the deposit back.
    ///
    /// # Errors
    /// - `NotAuthorizedOrNoDepositFound` without a live record
    /// - `TransferFailed` if the ledger refuses the refund (record restored)
    /// - `ReentrantCall` if invoked from inside another escrow call
    pub fn cancel_deposit(
        &self,
        ctx: CallContext,
        ledger: &dyn FungibleLedger,
        asset: AssetId,
        seller: AccountId,
    ) -> Result<u128> {
        let _guard = self.lock.enter()?;

        let key = EscrowKey::new(ctx.caller, seller, asset);
        let record = self.take_live(key)?;
        self.pay_out(ledger, key, record, ctx.caller)?;

        self.book.borrow_mut().events.emit(
            ctx.now,
            EngineEvent::DepositCancelled {
                buyer: ctx.caller,
                seller,
                asset,
                amount: record.amount,
            },
        );

        tracing::info!(escrow = %key, amount = record.amount, "Deposit cancelled");
        Ok(record.amount)
    }

    /// Seller collects the deposit `buyer` placed for them.
    ///
    /// Allowed once the buyer approved, or from `created_at + timeout` on.
    ///
    /// # Errors
    /// - `NotAuthorizedOrNoDepositFound` without a live record
    /// - `WithdrawNotAllowed` before approval and before the timeout
    /// - `TransferFailed` if the ledger refuses the payout (record restored)
    /// - `ReentrantCall` if invoked from inside another escrow call
    pub fn withdraw(
        &self,
        ctx: CallContext,
        ledger: &dyn FungibleLedger,
        asset: AssetId,
        buyer: AccountId,
    ) -> Result<u128> {
        let _guard = self.lock.enter()?;

        let key = EscrowKey::new(buyer, ctx.caller, asset);
        let current = self.live_record(key)?;
        if !current.approved {
            let unlocks_at = self.unlocks_at(&current)?;
            if ctx.now < unlocks_at {
                tracing::debug!(escrow = %key, now = ctx.now, unlocks_at, "Withdraw rejected: not approved");
                return Err(OpenbondError::WithdrawNotAllowed { unlocks_at });
            }
        }

        let record = self.take_live(key)?;
        self.pay_out(ledger, key, record, ctx.caller)?;

        self.book.borrow_mut().events.emit(
            ctx.now,
            EngineEvent::Withdrawn {
                buyer,
                seller: ctx.caller,
                asset,
                amount: record.amount,
            },
        );

        tracing::info!(
            escrow = %key,
            amount = record.amount,
            approved = record.approved,
            "Deposit withdrawn"
        );
        Ok(record.amount)
    }

    /// Record for `key`; the zeroed default when nothing is held.
    #[must_use]
    pub fn record(&self, key: EscrowKey) -> EscrowRecord {
        self.book
            .borrow()
            .records
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    /// All live records, ordered by key.
    #[must_use]
    pub fn live_records(&self) -> Vec<(EscrowKey, EscrowRecord)> {
        self.book
            .borrow()
            .records
            .iter()
            .filter(|(_, r)| r.is_live())
            .map(|(k, r)| (*k, *r))
            .collect()
    }

    /// Sum of live record amounts for `asset`.
    pub fn locked_total(&self, asset: AssetId) -> Result<u128> {
        self.book
            .borrow()
            .records
            .iter()
            .filter(|(k, _)| k.asset == asset)
            .try_fold(0u128, |acc, (_, r)| {
                acc.checked_add(r.amount)
                    .ok_or(OpenbondError::ArithmeticOverflow)
            })
    }

    /// When the seller may withdraw `key` without approval, if it is live.
    #[must_use]
    pub fn withdraw_unlocks_at(&self, key: EscrowKey) -> Option<Timestamp> {
        let record = self.record(key);
        if record.is_live() {
            self.unlocks_at(&record).ok()
        } else {
            None
        }
    }

    #[must_use]
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Snapshot of the buffered events.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.book.borrow().events.records().to_vec()
    }

    /// Hand the buffered events to an indexer.
    pub fn drain_events(&self) -> Vec<EventRecord> {
        self.book.borrow_mut().events.drain()
    }

    /// Digest of the buffered events.
    #[must_use]
    pub fn event_root(&self) -> [u8; 32] {
        let root = self.book.borrow().events.root();
        tracing::trace!(root = hex::encode(root), "Escrow event root");
        root
    }

    fn unlocks_at(&self, record: &EscrowRecord) -> Result<Timestamp> {
        record
            .created_at
            .checked_add(self.config.withdraw_timeout_secs)
            .ok_or(OpenbondError::ArithmeticOverflow)
    }

    fn live_record(&self, key: EscrowKey) -> Result<EscrowRecord> {
        let record = self.record(key);
        if record.is_live() {
            Ok(record)
        } else {
            Err(OpenbondError::NotAuthorizedOrNoDepositFound)
        }
    }

    /// Remove and return the live record for `key`.
    fn take_live(&self, key: EscrowKey) -> Result<EscrowRecord> {
        let mut book = self.book.borrow_mut();
        match book.records.remove(&key) {
            Some(record) if record.is_live() => Ok(record),
            _ => Err(OpenbondError::NotAuthorizedOrNoDepositFound),
        }
    }

    /// Send `record.amount` to `to`; on failure restore the record.
    fn pay_out(
        &self,
        ledger: &dyn FungibleLedger,
        key: EscrowKey,
        record: EscrowRecord,
        to: AccountId,
    ) -> Result<()> {
        if ledger.transfer(key.asset, self.config.account, to, record.amount) {
            return Ok(());
        }
        self.book.borrow_mut().records.insert(key, record);
        tracing::warn!(escrow = %key, amount = record.amount, "Payout failed, record restored");
        Err(OpenbondError::TransferFailed)
    }
}
