//! Bonding-curve market.
//!
//! The market issues its own supply unit against payment in an external
//! asset and buys it back along the same curve. It keeps the issued-unit
//! balances itself; payment custody lives on the external ledger under the
//! market's account.
//!
//! A buyer cannot sell until `cooldown_secs` after their last purchase,
//! which keeps a single account from wrapping a victim's trade in a
//! buy/sell pair.

use std::{cell::RefCell, collections::HashMap};

use openbond_runtime::ReentrancyLock;
use openbond_types::{
    AccountId, CallContext, EngineEvent, EventLog, EventRecord, FungibleLedger, MarketConfig,
    OpenbondError, Result, Timestamp,
};

use crate::math;

/// Mutable market state. Only ever borrowed for the duration of a single
/// step, never across a ledger call.
#[derive(Debug, Default)]
struct CurveState {
    total_supply: u128,
    balances: HashMap<AccountId, u128>,
    /// Time of each account's last purchase; absent means zero.
    last_action: HashMap<AccountId, Timestamp>,
    events: EventLog,
}

/// Linear bonding-curve market over a payment asset.
pub struct BondingCurveMarket {
    config: MarketConfig,
    state: RefCell<CurveState>,
    lock: ReentrancyLock,
}

impl BondingCurveMarket {
    /// Create a market with zero supply.
    ///
    /// # Errors
    /// Returns `Configuration` if the config does not validate.
    pub fn new(config: MarketConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: RefCell::new(CurveState::default()),
            lock: ReentrancyLock::new(),
        })
    }

    /// Issue supply for `payment`.
    ///
    /// Pulls `payment` from the caller into the market account, mints
    /// `floor(sqrt(2*payment + S²)) - S` units to the caller and starts the
    /// caller's sell cooldown.
    ///
    /// The market account's balance is measured around the pull. If less
    /// than `payment` arrived (a fee-charging asset) whatever did arrive is
    /// sent back and nothing is minted.
    ///
    /// # Errors
    /// - `ZeroPayment` if `payment == 0`
    /// - `SlippageExceeded` if fewer than `min_out` units would be minted
    /// - `ArithmeticOverflow` if the curve math overflows
    /// - `TransferFailed` if the ledger refuses the payment or delivers
    ///   less than `payment`
    /// - `ReentrantCall` if invoked from inside another market call
    pub fn buy(
        &self,
        ctx: CallContext,
        ledger: &dyn FungibleLedger,
        payment: u128,
        min_out: u128,
    ) -> Result<u128> {
        let _guard = self.lock.enter()?;

        if payment == 0 {
            return Err(OpenbondError::ZeroPayment);
        }

        let (supply, balance) = {
            let state = self.state.borrow();
            (state.total_supply, state.balance(ctx.caller))
        };
        let minted = math::mint_for_payment(supply, payment)?;
        if minted < min_out {
            tracing::debug!(buyer = %ctx.caller, minted, min_out, "Buy rejected: slippage");
            return Err(OpenbondError::SlippageExceeded {
                got: minted,
                want: min_out,
            });
        }
        let new_balance = balance
            .checked_add(minted)
            .ok_or(OpenbondError::ArithmeticOverflow)?;

        let before = self.reserve(ledger);
        if !ledger.transfer_from(
            self.config.payment_asset,
            self.config.account,
            ctx.caller,
            self.config.account,
            payment,
        ) {
            tracing::warn!(buyer = %ctx.caller, payment, "Buy aborted: payment transfer failed");
            return Err(OpenbondError::TransferFailed);
        }
        let received = self.reserve(ledger).saturating_sub(before);
        if received < payment {
            self.return_short_payment(ledger, ctx.caller, received, payment);
            return Err(OpenbondError::TransferFailed);
        }

        let mut state = self.state.borrow_mut();
        state.total_supply = supply + minted;
        state.balances.insert(ctx.caller, new_balance);
        state.last_action.insert(ctx.caller, ctx.now);
        state.events.emit(
            ctx.now,
            EngineEvent::Purchased {
                buyer: ctx.caller,
                payment,
                minted,
            },
        );

        tracing::info!(
            buyer = %ctx.caller,
            payment,
            minted,
            supply = state.total_supply,
            "Purchase executed"
        );
        Ok(minted)
    }

    /// Burn `amount` of the caller's supply and pay out the curve area,
    /// rounded up.
    ///
    /// State is updated before the payout; if the ledger refuses the payout
    /// every change is rolled back.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount == 0`
    /// - `InsufficientBalance` if the caller holds less than `amount`
    /// - `CooldownActive` if the caller bought less than `cooldown_secs` ago
    /// - `SlippageExceeded` if the refund is below `min_out`
    /// - `InsufficientReserve` if the market cannot cover the refund
    /// - `TransferFailed` if the ledger refuses the payout
    /// - `ReentrantCall` if invoked from inside another market call
    pub fn sell(
        &self,
        ctx: CallContext,
        ledger: &dyn FungibleLedger,
        amount: u128,
        min_out: u128,
    ) -> Result<u128> {
        let _guard = self.lock.enter()?;

        if amount == 0 {
            return Err(OpenbondError::InvalidAmount);
        }

        let (supply, balance, last_action) = {
            let state = self.state.borrow();
            (
                state.total_supply,
                state.balance(ctx.caller),
                state.last_action(ctx.caller),
            )
        };

        if balance < amount {
            return Err(OpenbondError::InsufficientBalance {
                needed: amount,
                available: balance,
            });
        }

        let expiry = last_action
            .checked_add(self.config.cooldown_secs)
            .ok_or(OpenbondError::ArithmeticOverflow)?;
        if ctx.now < expiry {
            tracing::debug!(seller = %ctx.caller, now = ctx.now, expiry, "Sell rejected: cooldown");
            return Err(OpenbondError::CooldownActive { expiry });
        }

        let refund = math::refund_for_burn(supply, amount)?;
        if refund < min_out {
            tracing::debug!(seller = %ctx.caller, refund, min_out, "Sell rejected: slippage");
            return Err(OpenbondError::SlippageExceeded {
                got: refund,
                want: min_out,
            });
        }

        let reserve = self.reserve(ledger);
        if reserve < refund {
            tracing::warn!(refund, reserve, "Sell rejected: reserve cannot cover refund");
            return Err(OpenbondError::InsufficientReserve {
                needed: refund,
                available: reserve,
            });
        }

        // Effects.
        {
            let mut state = self.state.borrow_mut();
            state.total_supply = supply - amount;
            state.set_balance(ctx.caller, balance - amount);
            state.last_action.remove(&ctx.caller);
        }

        // Interaction.
        if !ledger.transfer(
            self.config.payment_asset,
            self.config.account,
            ctx.caller,
            refund,
        ) {
            let mut state = self.state.borrow_mut();
            state.total_supply = supply;
            state.set_balance(ctx.caller, balance);
            if last_action != 0 {
                state.last_action.insert(ctx.caller, last_action);
            }
            tracing::warn!(seller = %ctx.caller, refund, "Sell rolled back: refund transfer failed");
            return Err(OpenbondError::TransferFailed);
        }

        let mut state = self.state.borrow_mut();
        state.events.emit(
            ctx.now,
            EngineEvent::Sold {
                seller: ctx.caller,
                burned: amount,
                refund,
            },
        );

        tracing::info!(
            seller = %ctx.caller,
            burned = amount,
            refund,
            supply = state.total_supply,
            "Sale executed"
        );
        Ok(refund)
    }

    /// Send a short-delivered payment back to `buyer`.
    fn return_short_payment(
        &self,
        ledger: &dyn FungibleLedger,
        buyer: AccountId,
        received: u128,
        payment: u128,
    ) {
        if received == 0
            || ledger.transfer(self.config.payment_asset, self.config.account, buyer, received)
        {
            tracing::warn!(buyer = %buyer, payment, received, "Buy aborted: short payment returned");
        } else {
            tracing::error!(buyer = %buyer, payment, received, "Short payment could not be returned");
        }
    }

    /// Units `payment` would mint at the current supply.
    pub fn quote_buy(&self, payment: u128) -> Result<u128> {
        math::mint_for_payment(self.total_supply(), payment)
    }

    /// Payment returned for burning `amount` at the current supply.
    pub fn quote_sell(&self, amount: u128) -> Result<u128> {
        math::refund_for_burn(self.total_supply(), amount)
    }

    /// Marginal price at supply level `quantity`.
    #[must_use]
    pub fn price_per_token(&self, quantity: u128) -> u128 {
        math::price_per_token(quantity)
    }

    /// Marginal price at the current supply.
    #[must_use]
    pub fn spot_price(&self) -> u128 {
        math::price_per_token(self.total_supply())
    }

    #[must_use]
    pub fn total_supply(&self) -> u128 {
        self.state.borrow().total_supply
    }

    /// Issued units held by `account`.
    #[must_use]
    pub fn balance_of(&self, account: AccountId) -> u128 {
        self.state.borrow().balance(account)
    }

    /// Time of `account`'s last purchase, or zero.
    #[must_use]
    pub fn last_action(&self, account: AccountId) -> Timestamp {
        self.state.borrow().last_action(account)
    }

    /// Earliest time `account` may sell.
    #[must_use]
    pub fn cooldown_expiry(&self, account: AccountId) -> Timestamp {
        self.last_action(account)
            .saturating_add(self.config.cooldown_secs)
    }

    /// Payment held by the market account on `ledger`.
    #[must_use]
    pub fn reserve(&self, ledger: &dyn FungibleLedger) -> u128 {
        ledger.balance_of(self.config.payment_asset, self.config.account)
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Snapshot of the buffered events.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.borrow().events.records().to_vec()
    }

    /// Hand the buffered events to an indexer.
    pub fn drain_events(&self) -> Vec<EventRecord> {
        let records = self.state.borrow_mut().events.drain();
        tracing::debug!(count = records.len(), "Market events drained");
        records
    }

    /// Digest of the buffered events.
    #[must_use]
    pub fn event_root(&self) -> [u8; 32] {
        let root = self.state.borrow().events.root();
        tracing::trace!(root = hex::encode(root), "Market event root");
        root
    }
}

impl CurveState {
    fn balance(&self, account: AccountId) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, account: AccountId, amount: u128) {
        if amount == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    fn last_action(&self, account: AccountId) -> Timestamp {
        self.last_action.get(&account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use openbond_runtime::{InMemoryLedger, UNLIMITED_ALLOWANCE};
    use openbond_types::{AssetId, OpenbondError};

    use super::*;

    const T0: Timestamp = 1_700_000_000;

    struct Setup {
        market: BondingCurveMarket,
        ledger: InMemoryLedger,
        alice: AccountId,
    }

    fn setup() -> Setup {
        let config = MarketConfig::new(AccountId::random(), AssetId::random());
        let ledger = InMemoryLedger::new();
        let alice = AccountId::random();
        fund(&ledger, &config, alice, 1_000_000);
        Setup {
            market: BondingCurveMarket::new(config).unwrap(),
            ledger,
            alice,
        }
    }

    fn fund(ledger: &InMemoryLedger, config: &MarketConfig, who: AccountId, amount: u128) {
        ledger.mint(who, config.payment_asset, amount).unwrap();
        ledger.approve(who, config.account, config.payment_asset, UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = MarketConfig::new(AccountId::random(), AssetId::ZERO);
        assert!(BondingCurveMarket::new(config.clone()).is_err());
        config.payment_asset = AssetId::random();
        config.cooldown_secs = 0;
        assert!(BondingCurveMarket::new(config).is_err());
    }

    #[test]
    fn triangular_scenario() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);

        assert_eq!(s.market.buy(ctx, &s.ledger, 6, 0).unwrap(), 3);
        assert_eq!(s.market.buy(ctx, &s.ledger, 20, 0).unwrap(), 4);
        assert_eq!(s.market.total_supply(), 7);
        assert_eq!(s.market.quote_sell(4).unwrap(), 20);
        assert_eq!(s.market.reserve(&s.ledger), 26);
        assert_eq!(s.market.spot_price(), 7);
    }

    #[test]
    fn buy_updates_balance_and_timestamp() {
        let s = setup();
        s.market
            .buy(CallContext::new(s.alice, T0), &s.ledger, 6, 3)
            .unwrap();
        assert_eq!(s.market.balance_of(s.alice), 3);
        assert_eq!(s.market.last_action(s.alice), T0);
        assert_eq!(s.market.cooldown_expiry(s.alice), T0 + 60);
        assert_eq!(
            s.ledger.balance_of(s.market.config().payment_asset, s.alice),
            1_000_000 - 6
        );
    }

    #[test]
    fn zero_payment_rejected() {
        let s = setup();
        let err = s
            .market
            .buy(CallContext::new(s.alice, T0), &s.ledger, 0, 0)
            .unwrap_err();
        assert_eq!(err, OpenbondError::ZeroPayment);
    }

    #[test]
    fn buy_slippage_rejected_without_side_effects() {
        let s = setup();
        let err = s
            .market
            .buy(CallContext::new(s.alice, T0), &s.ledger, 6, 4)
            .unwrap_err();
        assert_eq!(err, OpenbondError::SlippageExceeded { got: 3, want: 4 });
        assert_eq!(s.market.total_supply(), 0);
        assert_eq!(s.market.reserve(&s.ledger), 0);
        assert!(s.market.events().is_empty());
    }

    #[test]
    fn buy_without_allowance_fails_transfer() {
        let s = setup();
        let bob = AccountId::random();
        s.ledger
            .mint(bob, s.market.config().payment_asset, 100)
            .unwrap();
        let err = s
            .market
            .buy(CallContext::new(bob, T0), &s.ledger, 6, 0)
            .unwrap_err();
        assert_eq!(err, OpenbondError::TransferFailed);
        assert_eq!(s.market.total_supply(), 0);
        assert_eq!(s.market.last_action(bob), 0);
    }

    #[test]
    fn fee_charging_payment_is_returned_unminted() {
        let s = setup();
        let asset = s.market.config().payment_asset;
        s.ledger.set_transfer_fee_bps(asset, 100).unwrap();

        let err = s
            .market
            .buy(CallContext::new(s.alice, T0), &s.ledger, 10_000, 0)
            .unwrap_err();
        assert_eq!(err, OpenbondError::TransferFailed);

        // 9_900 arrived and went back, losing another 1% on the way.
        assert_eq!(s.market.reserve(&s.ledger), 0);
        assert_eq!(s.ledger.balance_of(asset, s.alice), 1_000_000 - 10_000 + 9_801);
        assert_eq!(s.market.total_supply(), 0);
        assert_eq!(s.market.balance_of(s.alice), 0);
        assert_eq!(s.market.last_action(s.alice), 0);
        assert!(s.market.events().is_empty());
    }

    #[test]
    fn fee_small_enough_to_round_away_is_accepted() {
        let s = setup();
        s.ledger
            .set_transfer_fee_bps(s.market.config().payment_asset, 100)
            .unwrap();
        // 1% of 26 rounds down to zero, so the full payment lands.
        assert_eq!(
            s.market
                .buy(CallContext::new(s.alice, T0), &s.ledger, 26, 0)
                .unwrap(),
            7
        );
        assert_eq!(s.market.reserve(&s.ledger), 26);
    }

    #[test]
    fn sell_inside_cooldown_rejected() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();

        let err = s.market.sell(ctx, &s.ledger, 3, 0).unwrap_err();
        assert_eq!(err, OpenbondError::CooldownActive { expiry: T0 + 60 });

        let err = s
            .market
            .sell(ctx.advanced_by(59), &s.ledger, 3, 0)
            .unwrap_err();
        assert!(matches!(err, OpenbondError::CooldownActive { .. }));

        assert_eq!(s.market.sell(ctx.advanced_by(60), &s.ledger, 3, 0).unwrap(), 5);
    }

    #[test]
    fn sell_clears_cooldown_timestamp() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();
        s.market.sell(ctx.advanced_by(60), &s.ledger, 1, 0).unwrap();
        assert_eq!(s.market.last_action(s.alice), 0);
    }

    #[test]
    fn sell_pays_ceil_refund_and_burns() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 26, 0).unwrap(); // sqrt(52) = 7
        assert_eq!(s.market.total_supply(), 7);

        let refund = s.market.sell(ctx.advanced_by(60), &s.ledger, 4, 20).unwrap();
        assert_eq!(refund, 20);
        assert_eq!(s.market.total_supply(), 3);
        assert_eq!(s.market.balance_of(s.alice), 3);
        assert_eq!(s.market.reserve(&s.ledger), 6);
    }

    #[test]
    fn sell_zero_rejected() {
        let s = setup();
        let err = s
            .market
            .sell(CallContext::new(s.alice, T0), &s.ledger, 0, 0)
            .unwrap_err();
        assert_eq!(err, OpenbondError::InvalidAmount);
    }

    #[test]
    fn sell_more_than_held_rejected() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();
        let err = s
            .market
            .sell(ctx.advanced_by(60), &s.ledger, 4, 0)
            .unwrap_err();
        assert_eq!(
            err,
            OpenbondError::InsufficientBalance {
                needed: 4,
                available: 3
            }
        );
    }

    #[test]
    fn sell_slippage_rejected() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();
        let err = s
            .market
            .sell(ctx.advanced_by(60), &s.ledger, 3, 6)
            .unwrap_err();
        assert_eq!(err, OpenbondError::SlippageExceeded { got: 5, want: 6 });
        assert_eq!(s.market.balance_of(s.alice), 3);
    }

    #[test]
    fn sell_rounding_is_covered_by_reserve_check() {
        // Buy 3 for 5 (under-mint), sell all 3 back: ceil(9/2) = 5 fits the
        // reserve exactly.
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        assert_eq!(s.market.buy(ctx, &s.ledger, 5, 0).unwrap(), 3);
        assert_eq!(s.market.sell(ctx.advanced_by(60), &s.ledger, 3, 0).unwrap(), 5);
        assert_eq!(s.market.reserve(&s.ledger), 0);
    }

    #[test]
    fn sell_rejected_when_reserve_short() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();

        // Drain the reserve out from under the market.
        let cfg = s.market.config().clone();
        assert!(s.ledger.transfer(cfg.payment_asset, cfg.account, AccountId::random(), 2));

        let err = s
            .market
            .sell(ctx.advanced_by(60), &s.ledger, 3, 0)
            .unwrap_err();
        assert_eq!(
            err,
            OpenbondError::InsufficientReserve {
                needed: 5,
                available: 4
            }
        );
        assert_eq!(s.market.total_supply(), 3);
    }

    #[test]
    fn failed_refund_rolls_back_everything() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();
        let root_before = s.market.event_root();

        s.ledger.set_transfers_failing(true);
        let err = s
            .market
            .sell(ctx.advanced_by(60), &s.ledger, 3, 0)
            .unwrap_err();
        assert_eq!(err, OpenbondError::TransferFailed);

        assert_eq!(s.market.total_supply(), 3);
        assert_eq!(s.market.balance_of(s.alice), 3);
        assert_eq!(s.market.last_action(s.alice), T0);
        assert_eq!(s.market.event_root(), root_before);
    }

    #[test]
    fn events_record_literal_amounts() {
        let s = setup();
        let ctx = CallContext::new(s.alice, T0);
        s.market.buy(ctx, &s.ledger, 6, 0).unwrap();
        s.market.sell(ctx.advanced_by(60), &s.ledger, 1, 0).unwrap();

        let events = s.market.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].event,
            EngineEvent::Purchased {
                buyer: s.alice,
                payment: 6,
                minted: 3
            }
        );
        assert_eq!(
            events[1].event,
            EngineEvent::Sold {
                seller: s.alice,
                burned: 1,
                refund: 3
            }
        );
        assert_eq!(events[1].at, T0 + 60);
        assert!(s.market.events().is_empty());
    }

    #[test]
    fn event_records_serialize() {
        let s = setup();
        s.market
            .buy(CallContext::new(s.alice, T0), &s.ledger, 6, 0)
            .unwrap();
        let json = serde_json::to_string(&s.market.events()).unwrap();
        assert!(json.contains("Purchased"));
    }

    /// Ledger that calls back into the market while it moves funds: a sell
    /// during a payout, a buy during a payment pull.
    struct ReentrantLedger {
        inner: InMemoryLedger,
        market: RefCell<Option<Rc<BondingCurveMarket>>>,
        attempt: RefCell<Option<Result<u128>>>,
        ctx: CallContext,
    }

    impl FungibleLedger for ReentrantLedger {
        fn balance_of(&self, asset: AssetId, account: AccountId) -> u128 {
            self.inner.balance_of(asset, account)
        }

        fn transfer(&self, asset: AssetId, from: AccountId, to: AccountId, amount: u128) -> bool {
            if let Some(market) = self.market.borrow().as_ref() {
                *self.attempt.borrow_mut() = Some(market.sell(self.ctx, self, 1, 0));
            }
            self.inner.transfer(asset, from, to, amount)
        }

        fn transfer_from(
            &self,
            asset: AssetId,
            spender: AccountId,
            from: AccountId,
            to: AccountId,
            amount: u128,
        ) -> bool {
            if let Some(market) = self.market.borrow().as_ref() {
                *self.attempt.borrow_mut() = Some(market.buy(self.ctx, self, 6, 0));
            }
            self.inner.transfer_from(asset, spender, from, to, amount)
        }
    }

    #[test]
    fn reentrant_buy_during_payment_rejected() {
        let config = MarketConfig::new(AccountId::random(), AssetId::random());
        let alice = AccountId::random();
        let ctx = CallContext::new(alice, T0);
        let ledger = ReentrantLedger {
            inner: InMemoryLedger::new(),
            market: RefCell::new(None),
            attempt: RefCell::new(None),
            ctx,
        };
        fund(&ledger.inner, &config, alice, 1_000);

        let market = Rc::new(BondingCurveMarket::new(config).unwrap());
        *ledger.market.borrow_mut() = Some(Rc::clone(&market));

        assert_eq!(market.buy(ctx, &ledger, 26, 0).unwrap(), 7);
        assert_eq!(
            ledger.attempt.borrow_mut().take(),
            Some(Err(OpenbondError::ReentrantCall))
        );
        assert_eq!(market.total_supply(), 7);
        assert_eq!(market.reserve(&ledger), 26);
        assert_eq!(market.events().len(), 1);
    }

    #[test]
    fn reentrant_sell_rejected() {
        let config = MarketConfig::new(AccountId::random(), AssetId::random());
        let alice = AccountId::random();
        let ctx = CallContext::new(alice, T0);
        let ledger = ReentrantLedger {
            inner: InMemoryLedger::new(),
            market: RefCell::new(None),
            attempt: RefCell::new(None),
            ctx: ctx.advanced_by(60),
        };
        fund(&ledger.inner, &config, alice, 1_000);

        let market = Rc::new(BondingCurveMarket::new(config).unwrap());
        market.buy(ctx, &ledger, 26, 0).unwrap();
        *ledger.market.borrow_mut() = Some(Rc::clone(&market));

        let refund = market.sell(ctx.advanced_by(60), &ledger, 4, 0).unwrap();
        assert_eq!(refund, 20);
        assert_eq!(
            ledger.attempt.borrow_mut().take(),
            Some(Err(OpenbondError::ReentrantCall))
        );
        assert_eq!(market.total_supply(), 3);

        // Lock released after the outer call.
        ledger.market.borrow_mut().take();
        assert!(market.buy(ctx.advanced_by(61), &ledger, 1, 0).is_ok());
    }
}
